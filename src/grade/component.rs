#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{future::Future, panic::AssertUnwindSafe, path::Path};

use anyhow::{Context, Result, bail};
use futures::FutureExt;
use serde::{Deserialize, Serialize};

use super::part::{BoundPartGrade, Part};
use crate::{
    backend::Backend,
    constants::WORKING_DIR_PREFIX,
    engine::panic_message,
    error::{BrokenSubmission, ComponentError},
    fraction::Fraction,
    submission::Submission,
    util::{MissingFile, copy_globs},
};

/// Default component weight.
fn one() -> Fraction {
    Fraction::one()
}

/// A named, weighted group of parts graded by one backend over one set of
/// files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Component {
    /// Name shown in reports.
    pub name:          String,
    /// Relative weight within the assignment.
    #[serde(default = "one")]
    pub weight:        Fraction,
    /// How the parts are graded.
    pub backend:       Backend,
    /// Globs copied from the submission.
    #[serde(default)]
    pub files:         Vec<String>,
    /// Globs copied from the grading files. These are copied after the
    /// submission files and replace any file with the same path.
    #[serde(default)]
    pub grading_files: Vec<String>,
    /// What gets graded.
    pub parts:         Vec<Part>,
}

impl Component {
    /// Sum of all part weights.
    pub fn total_part_weight(&self) -> Fraction {
        self.parts.iter().map(|part| &part.weight).sum()
    }

    /// Grades this component of `submission`.
    ///
    /// Never fails: a broken submission, an autograder error, or a panicking
    /// backend all become a [`ComponentGrade`] carrying a [`ComponentError`].
    pub async fn grade(
        &self,
        submission: &Submission,
        total_component_weight: &Fraction,
        grading_files_root: &Path,
    ) -> ComponentGrade {
        let norm_weight = self.weight.div_or_zero(total_component_weight);
        tracing::info!(component = %self.name, "grading component");

        settle(&self.name, norm_weight, self.grade_parts(submission, grading_files_root)).await
    }

    /// Prepares a private working directory, runs the backend, and binds its
    /// results. The directory is removed when this returns or unwinds.
    async fn grade_parts(
        &self,
        submission: &Submission,
        grading_files_root: &Path,
    ) -> Result<Vec<BoundPartGrade>> {
        let workdir = tempfile::Builder::new()
            .prefix(WORKING_DIR_PREFIX)
            .tempdir()
            .context("Could not create a working directory")?;

        copy_globs(&self.files, submission.root(), workdir.path()).map_err(|err| {
            match err.downcast::<MissingFile>() {
                Ok(missing) => anyhow::Error::from(BrokenSubmission::new(missing.to_string())),
                Err(err) => err.context("Could not copy submission files"),
            }
        })?;
        copy_globs(&self.grading_files, grading_files_root, workdir.path())
            .context("Could not copy grading files")?;

        let results = self
            .backend
            .grade(submission, workdir.path(), &self.parts)
            .await?;

        if results.len() != self.parts.len() {
            bail!(
                "{} backend returned {} results for {} parts",
                self.backend.name(),
                results.len(),
                self.parts.len()
            );
        }

        let total_part_weight = self.total_part_weight();
        self.parts
            .iter()
            .zip(results)
            .map(|(part, result)| {
                if !result.is_in_range() {
                    bail!(
                        "{} backend scored part `{}` {} which is outside [0, 1]",
                        self.backend.name(),
                        part.description,
                        result.score
                    );
                }
                Ok(BoundPartGrade::bind(part, result, &total_part_weight))
            })
            .collect()
    }
}

/// Runs `grading` to completion and records whatever it produced, an error,
/// or a panic as the grade of component `name`.
async fn settle<F>(name: &str, norm_weight: Fraction, grading: F) -> ComponentGrade
where
    F: Future<Output = Result<Vec<BoundPartGrade>>>,
{
    match AssertUnwindSafe(grading).catch_unwind().await {
        Ok(Ok(parts)) => {
            let grade = ComponentGrade::graded(name, norm_weight, parts);
            tracing::info!(
                component = %name,
                points = %grade.points_received(),
                "finished component"
            );
            grade
        }
        Ok(Err(err)) => {
            let error = ComponentError::classify(&err);
            tracing::warn!(
                component = %name,
                autograder_fault = error.is_autograder_fault,
                "component could not be graded: {err:#}"
            );
            ComponentGrade::errored(name, norm_weight, error)
        }
        Err(payload) => {
            let message = format!("backend panicked: {}", panic_message(payload.as_ref()));
            tracing::warn!(component = %name, "{message}");
            ComponentGrade::errored(name, norm_weight, ComponentError::autograder(message, None))
        }
    }
}

/// Either the bound part grades or the reason there are none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentOutcome {
    /// One grade per part, in part order.
    Parts(Vec<BoundPartGrade>),
    /// The component could not be graded and earns nothing.
    Error(ComponentError),
}

/// The graded form of a [`Component`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentGrade {
    /// Component name.
    pub name:        String,
    /// `weight / total component weight` of the assignment.
    pub norm_weight: Fraction,
    /// What happened.
    #[serde(flatten)]
    pub outcome:     ComponentOutcome,
}

impl ComponentGrade {
    /// A successfully graded component.
    pub fn graded(name: impl Into<String>, norm_weight: Fraction, parts: Vec<BoundPartGrade>) -> Self {
        Self {
            name: name.into(),
            norm_weight,
            outcome: ComponentOutcome::Parts(parts),
        }
    }

    /// A component that could not be graded.
    pub fn errored(name: impl Into<String>, norm_weight: Fraction, error: ComponentError) -> Self {
        Self {
            name: name.into(),
            norm_weight,
            outcome: ComponentOutcome::Error(error),
        }
    }

    /// Part grades, unless the component errored.
    pub fn parts(&self) -> Option<&[BoundPartGrade]> {
        match &self.outcome {
            ComponentOutcome::Parts(parts) => Some(parts),
            ComponentOutcome::Error(_) => None,
        }
    }

    /// The error, if the component could not be graded.
    pub fn error(&self) -> Option<&ComponentError> {
        match &self.outcome {
            ComponentOutcome::Parts(_) => None,
            ComponentOutcome::Error(error) => Some(error),
        }
    }

    /// Share of the assignment earned by this component. Zero when errored.
    pub fn points_received(&self) -> Fraction {
        match &self.outcome {
            ComponentOutcome::Parts(parts) => {
                parts.iter().map(BoundPartGrade::points_received).sum::<Fraction>() * &self.norm_weight
            }
            ComponentOutcome::Error(_) => Fraction::zero(),
        }
    }
}
