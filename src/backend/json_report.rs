#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{collections::HashMap, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::seconds;
use crate::{
    constants::{DEFAULT_REPORT_TIMEOUT_SECS, RESULT_NOT_FOUND},
    error::BrokenSubmission,
    fraction::Fraction,
    grade::{Part, PartResult},
    process::run_command,
    util::split_command,
};

/// Default timeout for the tester run.
fn default_timeout() -> f64 {
    DEFAULT_REPORT_TIMEOUT_SECS
}

/// Runs one tester that prints a JSON report on stdout:
///
/// ```json
/// { "error": "optional, breaks the submission",
///   "tests": { "name": { "passed": 3, "total": 4, "message": "...", "deductions": ["..."] } } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JsonReportBackend {
    /// Command printing the report.
    pub command:       String,
    /// Seconds the tester may run.
    #[serde(default = "default_timeout")]
    pub timeout:       f64,
    /// Whether the tester needs a graphical display.
    #[serde(default)]
    pub display:       bool,
    /// System packages the tester relies on.
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

/// Top level of the tester's report.
#[derive(Debug, Deserialize)]
struct Report {
    /// Set when the tester could not run the submission at all.
    error: Option<String>,
    /// Per-test results keyed by test name.
    #[serde(default)]
    tests: HashMap<String, TestReport>,
}

/// One test's entry in the report.
#[derive(Debug, Deserialize)]
struct TestReport {
    /// Checks passed.
    passed:     u64,
    /// Checks run.
    total:      u64,
    /// Free-form output.
    message:    Option<String>,
    /// Rule violations; any violation zeroes the test.
    #[serde(default)]
    deductions: Vec<String>,
}

impl TestReport {
    /// Converts the entry into a part result.
    fn to_result(&self) -> PartResult {
        if self.total == 0 {
            return PartResult::failed().with_log("No test cases were found");
        }

        let mut result = if self.deductions.is_empty() {
            let passed = self.passed.min(self.total);
            PartResult::graded(Fraction::from(passed) / Fraction::from(self.total))
        } else {
            PartResult {
                deductions: self.deductions.clone(),
                ..PartResult::failed()
            }
        };
        result.log = self.message.clone();
        result
    }
}

impl JsonReportBackend {
    /// A backend running `command` with default settings.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command:       command.into(),
            timeout:       default_timeout(),
            display:       false,
            prerequisites: Vec::new(),
        }
    }

    /// Runs the tester once and looks up every part in its report. Parts with
    /// the same selector read the same entry.
    pub async fn grade(&self, dir: &Path, parts: &[Part]) -> Result<Vec<PartResult>> {
        let command = split_command(&self.command)?;
        let collected = run_command(&command, dir, &[], Some(seconds(self.timeout)?)).await?;

        let report: Report =
            serde_json::from_slice(&collected.stdout).with_context(|| match collected.code() {
                0 => format!("`{}` did not print a valid JSON report", self.command),
                code => format!(
                    "`{}` exited with exit code {code} without printing a valid JSON report\n\n{}",
                    self.command,
                    collected.combined_output()
                ),
            })?;

        if let Some(error) = report.error {
            return Err(BrokenSubmission::new(error).into());
        }

        Ok(parts
            .iter()
            .map(|part| match report.tests.get(part.selector()) {
                Some(entry) => entry.to_result(),
                None => PartResult::failed().with_log(RESULT_NOT_FOUND),
            })
            .collect())
    }
}
