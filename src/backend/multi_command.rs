#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::seconds;
use crate::{
    constants::DEFAULT_COMMAND_TIMEOUT_SECS,
    grade::{Part, PartResult},
    process::run_command,
    util::split_command,
};

/// Default per-command timeout.
fn default_timeout() -> f64 {
    DEFAULT_COMMAND_TIMEOUT_SECS
}

/// Runs each part's command in turn. Exit code 0 earns full credit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MultiCommandBackend {
    /// Seconds each command may run before the submission is considered
    /// broken.
    #[serde(default = "default_timeout")]
    pub timeout:        f64,
    /// Commands to run once when the grading image is built.
    #[serde(default)]
    pub setup_commands: Vec<String>,
    /// System packages the commands rely on.
    #[serde(default)]
    pub prerequisites:  Vec<String>,
}

impl Default for MultiCommandBackend {
    fn default() -> Self {
        Self {
            timeout:        default_timeout(),
            setup_commands: Vec::new(),
            prerequisites:  Vec::new(),
        }
    }
}

impl MultiCommandBackend {
    /// Runs every part's command sequentially in `dir`.
    pub async fn grade(&self, dir: &Path, parts: &[Part]) -> Result<Vec<PartResult>> {
        let deadline = seconds(self.timeout)?;
        let mut results = Vec::with_capacity(parts.len());

        for part in parts {
            let command = split_command(part.selector())?;
            let collected = run_command(&command, dir, &[], Some(deadline)).await?;

            let mut log = collected.combined_output();
            if log.is_empty() {
                log = "(no output)".to_string();
            }

            let result = match collected.code() {
                0 => PartResult::passed(),
                code => {
                    log.push_str(&format!("\n\nprocess exited with exit code {code} != 0"));
                    PartResult::failed()
                }
            };
            results.push(result.with_log(log));
        }

        Ok(results)
    }
}
