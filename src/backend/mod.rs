#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Backends run external testers and turn their output into one
//! [`PartResult`] per [`Part`].
//!
//! A backend returns exactly one result per part, in part order. It signals a
//! problem with the submission by returning a
//! [`BrokenSubmission`](crate::error::BrokenSubmission); any other error is
//! treated as the autograder's fault by the component that called it.

use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    grade::{Part, PartResult},
    submission::Submission,
};

/// Runs one command per part and checks exit codes.
pub mod multi_command;
/// Parses a JSON report printed by a single tester run.
pub mod json_report;
/// Builds once, then runs one test command per part on the grading engine.
pub mod test_command;

pub use json_report::JsonReportBackend;
pub use multi_command::MultiCommandBackend;
pub use test_command::TestCommandBackend;

/// What a backend expects in [`Part::target`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PartType {
    /// A command line to run.
    Command,
    /// The name of a test known to the tester. Defaults to the description.
    TestName,
}

/// A grading strategy, selected by `kind` in the component configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Backend {
    /// See [`MultiCommandBackend`].
    MultiCommand(MultiCommandBackend),
    /// See [`TestCommandBackend`].
    TestCommand(TestCommandBackend),
    /// See [`JsonReportBackend`].
    JsonReport(JsonReportBackend),
}

impl Backend {
    /// Grades `parts` of `submission`, whose files have been prepared in
    /// `dir`.
    pub async fn grade(
        &self,
        submission: &Submission,
        dir: &Path,
        parts: &[Part],
    ) -> Result<Vec<PartResult>> {
        tracing::debug!(
            backend = self.name(),
            parts = parts.len(),
            submission = %submission.root().display(),
            "running backend"
        );
        match self {
            Backend::MultiCommand(backend) => backend.grade(dir, parts).await,
            Backend::TestCommand(backend) => backend.grade(dir, parts).await,
            Backend::JsonReport(backend) => backend.grade(dir, parts).await,
        }
    }

    /// Configuration name of the variant.
    pub fn name(&self) -> &'static str {
        match self {
            Backend::MultiCommand(_) => "multi-command",
            Backend::TestCommand(_) => "test-command",
            Backend::JsonReport(_) => "json-report",
        }
    }

    /// System packages the tester needs.
    pub fn list_prerequisites(&self) -> Vec<String> {
        match self {
            Backend::MultiCommand(backend) => backend.prerequisites.clone(),
            Backend::TestCommand(backend) => backend.prerequisites.clone(),
            Backend::JsonReport(backend) => backend.prerequisites.clone(),
        }
    }

    /// One-time commands to run when the grading image is built.
    pub fn list_setup_commands(&self) -> Result<Vec<Vec<String>>> {
        match self {
            Backend::MultiCommand(backend) => backend
                .setup_commands
                .iter()
                .map(|line| crate::util::split_command(line))
                .try_collect(),
            Backend::TestCommand(_) | Backend::JsonReport(_) => Ok(Vec::new()),
        }
    }

    /// Whether the tester prompts on the command line. No backend kind
    /// prompts yet.
    pub fn is_interactive(&self) -> bool {
        false
    }

    /// Whether the tester needs a graphical display.
    pub fn needs_display(&self) -> bool {
        match self {
            Backend::JsonReport(backend) => backend.display,
            Backend::MultiCommand(_) | Backend::TestCommand(_) => false,
        }
    }

    /// What [`Part::target`] means for this backend.
    pub fn part_type(&self) -> PartType {
        match self {
            Backend::MultiCommand(_) => PartType::Command,
            Backend::TestCommand(_) | Backend::JsonReport(_) => PartType::TestName,
        }
    }

    /// Checks at load time that `part` carries what this backend needs.
    pub fn validate_part(&self, part: &Part) -> std::result::Result<(), String> {
        match self.part_type() {
            PartType::Command => match part.target.as_deref() {
                None => Err("a `target` command is required".to_string()),
                Some(line) => crate::util::split_command(line)
                    .map(|_| ())
                    .map_err(|err| format!("{err:#}")),
            },
            PartType::TestName if part.selector().trim().is_empty() => {
                Err("the test name is empty".to_string())
            }
            PartType::TestName => Ok(()),
        }
    }

    /// Programs named by this backend's commands that are not on `PATH`.
    pub fn missing_programs(&self, parts: &[Part]) -> Vec<String> {
        let mut lines: Vec<String> = match self {
            Backend::MultiCommand(_) => parts.iter().filter_map(|p| p.target.clone()).collect(),
            Backend::TestCommand(backend) => {
                backend.build.iter().cloned().chain([backend.run.clone()]).collect()
            }
            Backend::JsonReport(backend) => vec![backend.command.clone()],
        };
        if let Backend::MultiCommand(backend) = self {
            lines.extend(backend.setup_commands.iter().cloned());
        }

        lines
            .iter()
            .filter_map(|line| shell_words::split(line).ok())
            .filter_map(|words| words.into_iter().next())
            .filter(|program| !program.contains('/') && which::which(program).is_err())
            .unique()
            .collect()
    }
}

/// Converts a configured timeout in seconds.
pub(crate) fn seconds(value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("{value} is not a valid timeout"))
}
