#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Panel, Style, Width, object::Rows},
};

use super::points;
use crate::{fraction::Fraction, grade::AssignmentGrade};

/// One row of the overview.
#[derive(Tabled, Debug, Clone)]
struct OverviewRow {
    /// Component and part.
    #[tabled(rename = "Requirement")]
    requirement: String,
    /// `got/max`, or the points a penalty took off.
    #[tabled(rename = "Grade")]
    grade:       String,
    /// Deductions or the component error.
    #[tabled(rename = "Reason")]
    reason:      String,
}

/// A "Grading Overview" table with a row per part, errored component and
/// applied penalty, and the final points in the footer.
pub fn render(grade: &AssignmentGrade) -> String {
    let mut rows = Vec::new();

    for component in &grade.components {
        let component_max = &component.norm_weight * &grade.max_points;
        match (component.parts(), component.error()) {
            (Some(parts), _) => rows.extend(parts.iter().map(|part| OverviewRow {
                requirement: format!("{}: {}", component.name, part.description),
                grade:       points(
                    &(part.points_received() * &component_max),
                    &(&part.norm_weight * &component_max),
                ),
                reason:      part.result.deductions.join(", "),
            })),
            (None, Some(error)) => rows.push(OverviewRow {
                requirement: component.name.clone(),
                grade:       points(&Fraction::zero(), &component_max),
                reason:      error.message.clone(),
            }),
            (None, None) => {}
        }
    }

    for penalty in &grade.penalties {
        if penalty.points_deducted != Fraction::zero() {
            rows.push(OverviewRow {
                requirement: penalty.name.clone(),
                grade:       format!("{:.2}", (-&penalty.points_deducted * &grade.max_points).to_f64()),
                reason:      "penalty".to_string(),
            });
        }
    }

    Table::new(&rows)
        .with(Panel::header(format!("Grading Overview: {}", grade.name)))
        .with(Panel::footer(format!("Total: {}", points(&grade.final_points(), &grade.max_points))))
        .with(Modify::new(Rows::new(1..)).with(Width::wrap(24).keep_words(true)))
        .with(
            Modify::new(Rows::first())
                .with(Alignment::center())
                .with(Alignment::center_vertical()),
        )
        .with(
            Modify::new(Rows::last())
                .with(Alignment::center())
                .with(Alignment::center_vertical()),
        )
        .with(Style::modern())
        .to_string()
}
