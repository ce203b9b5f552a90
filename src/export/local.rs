#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use super::points;
use crate::{constants::AUTOGRADER_FAULT_NOTE, fraction::Fraction, grade::AssignmentGrade};

/// The local report: one block per errored component or per part, then the
/// total. Blocks are separated by blank lines.
///
/// The displayed total is capped at 100%. The grade document itself is never
/// capped.
pub fn render(grade: &AssignmentGrade) -> String {
    let mut blocks = Vec::new();
    let mut any_errors = false;

    for component in &grade.components {
        if let Some(error) = component.error() {
            any_errors = true;
            blocks.push(format!("ERROR: {:45} {:15}", component.name, error.message));
            if let Some(verbose) = &error.verbose {
                blocks.push(format!("Details: {verbose:45}"));
            }
            if error.is_autograder_fault {
                blocks.push(AUTOGRADER_FAULT_NOTE.to_string());
            }
            continue;
        }

        for part in component.parts().unwrap_or_default() {
            let got = part.points_received() * &component.norm_weight * &grade.max_points;
            let max = &part.norm_weight * &component.norm_weight * &grade.max_points;
            let status = if part.passed() { "PASSED" } else { "FAILED" };

            blocks.push(format!(
                "TEST: {:45} {:15} ({})",
                part.description,
                status,
                points(&got, &max)
            ));
            if !part.passed()
                && let Some(log) = &part.result.log
            {
                blocks.push(log.clone());
            }
        }
    }

    let shown = grade.final_score.clone().min(Fraction::one());
    blocks.push(format!("Total score: {:.2}%", 100.0 * shown.to_f64()));
    if any_errors {
        blocks.push("Some errors occurred; the score above may not be your final grade".to_string());
    }

    blocks.join("\n\n")
}
