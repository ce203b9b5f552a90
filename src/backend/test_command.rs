#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{ffi::OsString, path::Path};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::seconds;
use crate::{
    constants::{DEFAULT_COMMAND_TIMEOUT_SECS, TEST_PLACEHOLDER},
    engine::GradingEngine,
    error::BrokenSubmission,
    grade::{Part, PartResult},
    process::run_command,
    util::split_command,
};

/// Default timeout for the build step and for each test.
fn default_timeout() -> f64 {
    DEFAULT_COMMAND_TIMEOUT_SECS
}

/// Exit codes of a build step that still allow testing. Test harnesses that
/// build and run in one go commonly exit 1 when some tests fail.
fn default_accepted_build_codes() -> Vec<i32> {
    vec![0, 1]
}

/// Builds the tester once, then runs one command per part in parallel.
///
/// `run` is a command template where `{test}` is replaced by the part's test
/// name (shell-quoted). The name is also exported as `TALLY_TEST`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestCommandBackend {
    /// Optional build command, run once before any test.
    #[serde(default)]
    pub build:                Option<String>,
    /// Build exit codes that do not break the submission.
    #[serde(default = "default_accepted_build_codes")]
    pub accepted_build_codes: Vec<i32>,
    /// Seconds the build may take.
    #[serde(default = "default_timeout")]
    pub build_timeout:        f64,
    /// Per-test command template.
    pub run:                  String,
    /// Seconds each test may take.
    #[serde(default = "default_timeout")]
    pub timeout:              f64,
    /// How many tests run at once. Defaults to the engine default.
    #[serde(default)]
    pub workers:              Option<usize>,
    /// System packages the tester relies on.
    #[serde(default)]
    pub prerequisites:        Vec<String>,
}

impl TestCommandBackend {
    /// A backend running `run` per test with default settings.
    pub fn new(run: impl Into<String>) -> Self {
        Self {
            build:                None,
            accepted_build_codes: default_accepted_build_codes(),
            build_timeout:        default_timeout(),
            run:                  run.into(),
            timeout:              default_timeout(),
            workers:              None,
            prerequisites:        Vec::new(),
        }
    }

    /// Runs the build step, then every test through the grading engine.
    pub async fn grade(&self, dir: &Path, parts: &[Part]) -> Result<Vec<PartResult>> {
        if let Some(build) = &self.build {
            let command = split_command(build)?;
            let collected = run_command(&command, dir, &[], Some(seconds(self.build_timeout)?))
                .await?;
            if !self.accepted_build_codes.contains(&collected.code()) {
                return Err(BrokenSubmission::new(format!(
                    "grader command exited with exit code {}",
                    collected.code()
                ))
                .with_verbose(collected.combined_output())
                .into());
            }
        }

        let engine = self
            .workers
            .map(GradingEngine::new)
            .unwrap_or_default();
        let template = self.run.clone();
        let dir = dir.to_path_buf();
        let deadline = seconds(self.timeout)?;
        let tests: Vec<String> = parts.iter().map(|part| part.selector().to_string()).collect();

        engine
            .run(tests, move |_, test| {
                let line = template.replace(TEST_PLACEHOLDER, &shell_words::quote(&test));
                let dir = dir.clone();
                async move {
                    let command = split_command(&line)?;
                    let env = [(OsString::from("TALLY_TEST"), OsString::from(&test))];
                    let collected = run_command(&command, &dir, &env, Some(deadline)).await?;
                    let output = collected.combined_output();

                    let result = if collected.code() == 0 {
                        PartResult::passed()
                    } else {
                        PartResult::failed().with_deduction("failed")
                    };
                    Ok(if output.is_empty() { result } else { result.with_log(output) })
                }
            })
            .await
    }
}
