#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{
    error::ComponentError,
    fraction::Fraction,
    grade::AssignmentGrade,
};

/// How Gradescope renders `output` strings.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GradescopeOutputFormat {
    /// Shown verbatim.
    Text,
    /// Terminal colour codes are rendered.
    Ansi,
}

/// Pass/fail marker on a test.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GradescopeStatus {
    /// Full credit.
    Passed,
    /// Anything less.
    Failed,
}

impl GradescopeStatus {
    /// Gradescope treats 0 of 0 points as a pass, so the status is set
    /// explicitly from whether the part earned full credit.
    fn from_passed(passed: bool) -> Self {
        if passed {
            GradescopeStatus::Passed
        } else {
            GradescopeStatus::Failed
        }
    }
}

/// The `results.json` document Gradescope reads after the autograder runs.
/// Only the keys this exporter fills in are modelled.
#[derive(Serialize, Deserialize, Debug, TypedBuilder)]
#[builder(field_defaults(default, setter(into)))]
#[builder(doc)]
pub struct GradescopeSubmission {
    /// Points awarded, overriding the sum of the tests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Format of the top-level output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<GradescopeOutputFormat>,

    /// Format of every test's output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_output_format: Option<GradescopeOutputFormat>,

    /// Stored alongside the results, not shown to students.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<serde_json::Value>,

    /// One entry per penalty, errored component or part.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tests: Option<Vec<GradescopeTestCase>>,
}

/// One row of the results page.
#[derive(Serialize, Deserialize, Debug, TypedBuilder)]
#[builder(field_defaults(default, setter(into)))]
#[builder(doc)]
pub struct GradescopeTestCase {
    /// Points earned; negative for penalties.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Points available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f64>,

    /// Pass/fail marker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<GradescopeStatus>,

    /// Row title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Logs, deductions or the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// Error text for a component, with the staff note in red when the
/// autograder is at fault.
fn error_output(error: &ComponentError) -> String {
    let mut output = format!("{}\n{}", error.message, error.verbose.as_deref().unwrap_or(""))
        .trim()
        .to_string();
    if error.is_autograder_fault {
        output.push_str(&format!(
            "\n\n\x1b[31m{}\x1b[0m",
            crate::constants::AUTOGRADER_FAULT_NOTE
        ));
    }
    output
}

impl GradescopeSubmission {
    /// Builds Gradescope results from a grade document.
    ///
    /// Penalties that changed the grade come first, as zero-point tests with
    /// a negative score. Each errored component is a single test; every other
    /// component contributes one test per part.
    pub fn from_grade(grade: &AssignmentGrade) -> Result<Self> {
        let mut tests = Vec::new();

        for penalty in &grade.penalties {
            if penalty.points_deducted != Fraction::zero() {
                let deducted = penalty.points_deducted.clone().max(Fraction::zero());
                tests.push(
                    GradescopeTestCase::builder()
                        .name(penalty.name.clone())
                        .score(-(deducted * &grade.max_points).to_f64())
                        .max_score(0.0)
                        .status(GradescopeStatus::from_passed(penalty.points_deducted < Fraction::zero()))
                        .build(),
                );
            }
        }

        for component in &grade.components {
            let component_max = &component.norm_weight * &grade.max_points;

            if let Some(error) = component.error() {
                tests.push(
                    GradescopeTestCase::builder()
                        .name(component.name.clone())
                        .score((component.points_received() * &grade.max_points).to_f64())
                        .max_score(component_max.to_f64())
                        .status(GradescopeStatus::Failed)
                        .output(error_output(error))
                        .build(),
                );
                continue;
            }

            for part in component.parts().unwrap_or_default() {
                let mut output = String::new();
                if !part.result.deductions.is_empty() {
                    output.push_str(&format!("Deductions: {}\n\n", part.result.deductions.join(", ")));
                }
                output.push_str(part.result.log.as_deref().unwrap_or(""));

                tests.push(
                    GradescopeTestCase::builder()
                        .name(format!("{}: {}", component.name, part.description))
                        .score((part.points_received() * &component_max).to_f64())
                        .max_score((&part.norm_weight * &component_max).to_f64())
                        .status(GradescopeStatus::from_passed(part.passed()))
                        .output(output)
                        .build(),
                );
            }
        }

        let component_grades =
            serde_json::to_value(&grade.components).context("Could not serialize component grades")?;

        Ok(GradescopeSubmission::builder()
            .score(grade.final_points().to_f64())
            .tests(tests)
            .extra_data(serde_json::json!({ "component_grades": component_grades }))
            .output_format(GradescopeOutputFormat::Ansi)
            .test_output_format(GradescopeOutputFormat::Ansi)
            .build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grade::{BoundPartGrade, ComponentGrade, Part, PartResult, PenaltyDeduction};

    #[test]
    fn penalties_come_first_and_parts_are_scaled() {
        let part = Part::builder().description("push").build();
        let bound = BoundPartGrade::bind(
            &part,
            PartResult::failed().with_deduction("failed").with_log("boom"),
            &Fraction::one(),
        );
        let grade = AssignmentGrade {
            name:        "HW".into(),
            raw_score:   Fraction::new(1, 2),
            final_score: Fraction::new(1, 4),
            max_points:  Fraction::from(50),
            components:  vec![
                ComponentGrade::graded("Tests", Fraction::new(1, 2), vec![bound]),
                ComponentGrade::errored(
                    "Style",
                    Fraction::new(1, 2),
                    ComponentError::autograder("linter crashed", None),
                ),
            ],
            penalties:   vec![
                PenaltyDeduction {
                    name:            "LATE".into(),
                    points_deducted: Fraction::new(1, 4),
                },
                PenaltyDeduction {
                    name:            "CHECKOFF".into(),
                    points_deducted: Fraction::zero(),
                },
            ],
        };

        let results = GradescopeSubmission::from_grade(&grade).expect("exports");
        assert_eq!(results.score, Some(12.5));

        let tests = results.tests.expect("tests");
        assert_eq!(tests.len(), 3);
        assert_eq!(tests[0].name.as_deref(), Some("LATE"));
        assert_eq!(tests[0].score, Some(-12.5));
        assert_eq!(tests[0].max_score, Some(0.0));
        assert_eq!(tests[0].status, Some(GradescopeStatus::Failed));

        assert_eq!(tests[1].name.as_deref(), Some("Tests: push"));
        assert_eq!(tests[1].max_score, Some(25.0));
        assert_eq!(tests[1].output.as_deref(), Some("Deductions: failed\n\nboom"));

        assert_eq!(tests[2].score, Some(0.0));
        assert!(tests[2].output.as_deref().is_some_and(|o| o.contains("\x1b[31m")));

        let json = serde_json::to_value(GradescopeSubmission::from_grade(&grade).expect("exports"))
            .expect("serializes");
        assert_eq!(json["output_format"], "ansi");
        assert_eq!(json["extra_data"]["component_grades"][1]["error"]["message"], "linter crashed");
    }
}
