#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The submission being graded and the metadata that comes with it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, TimeDelta};
use serde::Deserialize;

use crate::{fraction::Fraction, grade::AssignmentMetadata};

/// A student submission: a directory of files and how late it arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Directory the submission globs are resolved against.
    root:    PathBuf,
    /// `submitted_at - due_date`. Negative when early, `None` when either date
    /// is unknown.
    late_by: Option<TimeDelta>,
}

impl Submission {
    /// A submission with no lateness information.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root:    root.into(),
            late_by: None,
        }
    }

    /// Sets how late the submission was.
    pub fn with_late_by(mut self, late_by: TimeDelta) -> Self {
        self.late_by = Some(late_by);
        self
    }

    /// Root directory of the submitted files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// How late the submission was, if known.
    pub fn late_by(&self) -> Option<TimeDelta> {
        self.late_by
    }
}

/// Per-user assignment dates in Gradescope's `submission_metadata.json`.
#[derive(Debug, Clone, Deserialize)]
struct GradescopeUserAssignment {
    /// Due date for this user (extensions included).
    due_date: DateTime<FixedOffset>,
}

/// A submitter in Gradescope's metadata.
#[derive(Debug, Clone, Deserialize)]
struct GradescopeUser {
    /// The user's view of the assignment.
    assignment: GradescopeUserAssignment,
}

/// The assignment block of Gradescope's metadata.
#[derive(Debug, Clone, Deserialize)]
struct GradescopeAssignment {
    /// Default due date.
    due_date:     Option<DateTime<FixedOffset>>,
    /// Points the autograder is worth.
    total_points: Option<Fraction>,
}

/// The parts of Gradescope's `submission_metadata.json` that grading needs.
#[derive(Debug, Clone, Deserialize)]
pub struct GradescopeMetadata {
    /// When the submission was created.
    created_at: DateTime<FixedOffset>,
    /// Everyone who submitted together.
    #[serde(default)]
    users:      Vec<GradescopeUser>,
    /// Assignment-wide settings.
    assignment: GradescopeAssignment,
}

impl GradescopeMetadata {
    /// Parses the metadata document.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Could not parse submission metadata")
    }

    /// The latest due date among the submitters, falling back to the
    /// assignment's default.
    pub fn due_date(&self) -> Option<DateTime<FixedOffset>> {
        self.users
            .iter()
            .map(|user| user.assignment.due_date)
            .max()
            .or(self.assignment.due_date)
    }

    /// How late the submission was relative to [`Self::due_date`].
    pub fn late_by(&self) -> Option<TimeDelta> {
        self.due_date().map(|due| self.created_at - due)
    }

    /// Assignment metadata used by grading and penalties.
    pub fn as_metadata(&self) -> AssignmentMetadata {
        let mut metadata = AssignmentMetadata::default();
        if let Some(total) = &self.assignment.total_points {
            metadata.total_points = total.clone();
        }
        metadata.due_date = self.due_date();
        metadata
    }
}

/// Loads a submission and the assignment metadata from Gradescope's files.
/// A missing metadata file means default points and no lateness.
pub fn load_submission(
    submission_dir: &Path,
    metadata_path: &Path,
) -> Result<(Submission, AssignmentMetadata)> {
    let submission = Submission::new(submission_dir);

    if !metadata_path.exists() {
        tracing::info!(
            "No submission metadata at {}, grading without lateness information",
            metadata_path.display()
        );
        return Ok((submission, AssignmentMetadata::default()));
    }

    let text = std::fs::read_to_string(metadata_path)
        .with_context(|| format!("Could not read {}", metadata_path.display()))?;
    let metadata = GradescopeMetadata::from_json(&text)
        .with_context(|| format!("in {}", metadata_path.display()))?;

    let submission = match metadata.late_by() {
        Some(late_by) => submission.with_late_by(late_by),
        None => submission,
    };
    Ok((submission, metadata.as_metadata()))
}
