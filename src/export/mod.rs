#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Renders an [`AssignmentGrade`] for people and for Gradescope.
//!
//! Exporters only read the grade document, so they can run on a document
//! produced by an earlier `tally grade`.

use std::{fmt, str::FromStr};

use anyhow::{Context, Result, bail};

use crate::{fraction::Fraction, grade::AssignmentGrade};

/// Gradescope `results.json`.
pub mod gradescope;
/// Plain text report for students running the grader locally.
pub mod local;
/// A table summarizing every part.
pub mod table;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// See [`local::render`].
    Local,
    /// See [`gradescope::GradescopeSubmission::from_grade`].
    Gradescope,
    /// See [`table::render`].
    Table,
}

impl ExportFormat {
    /// Every format, in the order shown in help text.
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Local, ExportFormat::Gradescope, ExportFormat::Table];
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(ExportFormat::Local),
            "gradescope" => Ok(ExportFormat::Gradescope),
            "table" => Ok(ExportFormat::Table),
            other => bail!("unknown export format `{other}`, expected one of local, gradescope, table"),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Local => "local",
            ExportFormat::Gradescope => "gradescope",
            ExportFormat::Table => "table",
        })
    }
}

/// Renders `grade` in `format`.
pub fn export(grade: &AssignmentGrade, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Local => Ok(local::render(grade)),
        ExportFormat::Gradescope => {
            let submission = gradescope::GradescopeSubmission::from_grade(grade)?;
            serde_json::to_string_pretty(&submission).context("Could not serialize Gradescope results")
        }
        ExportFormat::Table => Ok(table::render(grade)),
    }
}

/// `got/max` points with two decimals.
pub(crate) fn points(got: &Fraction, max: &Fraction) -> String {
    format!("{:.2}/{:.2}", got.to_f64(), max.to_f64())
}
