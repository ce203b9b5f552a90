#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{ffi::OsString, path::Path, process::Stdio, time::Duration};

use anyhow::{Context, Result};
use tokio::{process::Command, time::timeout};

use crate::error::BrokenSubmission;

/// Captured result of a finished tester process.
#[derive(Debug)]
pub struct Collected {
    /// Exit status returned by the process.
    pub status: std::process::ExitStatus,
    /// Contents written to stdout.
    pub stdout: Vec<u8>,
    /// Contents written to stderr.
    pub stderr: Vec<u8>,
}

impl Collected {
    /// Exit code, or `-1` when the process was killed by a signal.
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }

    /// Stdout as text, invalid UTF-8 replaced.
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Stdout followed by stderr, as text.
    pub fn combined_output(&self) -> String {
        let mut out = self.stdout_lossy();
        let err = String::from_utf8_lossy(&self.stderr);
        if !err.is_empty() {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&err);
        }
        out
    }
}

/// Runs an already split command line in `cwd` with stdin closed and
/// collects its output.
///
/// When `deadline` expires the process is killed and a [`BrokenSubmission`]
/// is returned: a tester that does not finish in time is the submission's
/// fault. Failing to start the program at all is not.
pub async fn run_command(
    command: &[String],
    cwd: &Path,
    env: &[(OsString, OsString)],
    deadline: Option<Duration>,
) -> Result<Collected> {
    let (program, args) = command
        .split_first()
        .context("cannot run an empty command")?;

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(cwd)
        .envs(env.iter().map(|(key, value)| (key, value)))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    tracing::debug!(%program, cwd = %cwd.display(), "spawning tester");
    let child = cmd
        .spawn()
        .with_context(|| format!("failed to spawn `{program}`"))?;

    let finished = child.wait_with_output();
    let output = match deadline {
        Some(limit) => timeout(limit, finished).await.map_err(|_| {
            BrokenSubmission::new(format!("timeout of {} seconds expired", limit.as_secs_f64()))
        })?,
        None => finished.await,
    }
    .with_context(|| format!("failed to wait on `{program}`"))?;

    Ok(Collected {
        status: output.status,
        stdout: output.stdout,
        stderr: output.stderr,
    })
}
