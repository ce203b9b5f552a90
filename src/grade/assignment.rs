#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use bon::Builder;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::component::{Component, ComponentGrade};
use crate::{
    constants::DEFAULT_TOTAL_POINTS,
    engine::GradingEngine,
    error::ComponentError,
    fraction::Fraction,
    penalty::Penalty,
    submission::Submission,
};

/// The contents of an assignment configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AssignmentConfig {
    /// Assignment name.
    pub name:       String,
    /// Who wrote the autograder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author:     Option<String>,
    /// Adjustments applied after aggregation, in order.
    #[serde(default)]
    pub penalties:  Vec<Penalty>,
    /// What gets graded.
    pub components: Vec<Component>,
}

impl AssignmentConfig {
    /// Sum of all component weights.
    pub fn total_component_weight(&self) -> Fraction {
        self.components.iter().map(|component| &component.weight).sum()
    }
}

/// Per-run facts about the assignment that do not come from its
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentMetadata {
    /// Points the grade is scaled to on export.
    pub total_points: Fraction,
    /// Effective due date, if known.
    pub due_date:     Option<DateTime<FixedOffset>>,
}

impl Default for AssignmentMetadata {
    fn default() -> Self {
        Self {
            total_points: Fraction::from_integer(DEFAULT_TOTAL_POINTS),
            due_date:     None,
        }
    }
}

/// What a penalty took off, for the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyDeduction {
    /// Penalty name.
    pub name:            String,
    /// Grade before minus grade after, as a share of the total.
    pub points_deducted: Fraction,
}

/// The grade document: everything needed to explain a final score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentGrade {
    /// Assignment name.
    pub name:        String,
    /// Sum of component points before penalties.
    pub raw_score:   Fraction,
    /// Score after every penalty.
    pub final_score: Fraction,
    /// Points the assignment is worth.
    pub max_points:  Fraction,
    /// One grade per component, in configuration order.
    pub components:  Vec<ComponentGrade>,
    /// One deduction per penalty, in application order.
    pub penalties:   Vec<PenaltyDeduction>,
}

impl AssignmentGrade {
    /// Final score scaled to [`Self::max_points`].
    pub fn final_points(&self) -> Fraction {
        &self.final_score * &self.max_points
    }

    /// Whether any component could not be graded.
    pub fn has_errors(&self) -> bool {
        self.components.iter().any(|component| component.error().is_some())
    }

    /// Parses a grade document.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Could not parse the grade document")
    }
}

/// A loaded assignment, ready to grade submissions.
#[derive(Debug, Clone, Builder)]
pub struct Assignment {
    /// The configuration, shared with component workers.
    #[builder(into)]
    config:        Arc<AssignmentConfig>,
    /// Root that component `grading-files` globs are resolved against.
    #[builder(into)]
    grading_files: PathBuf,
    /// Points and due date for this run.
    #[builder(default)]
    metadata:      AssignmentMetadata,
    /// Pool the components are graded on.
    #[builder(default)]
    engine:        GradingEngine,
}

impl Assignment {
    /// The configuration.
    pub fn config(&self) -> &AssignmentConfig {
        &self.config
    }

    /// The metadata used for penalties and export.
    pub fn metadata(&self) -> &AssignmentMetadata {
        &self.metadata
    }

    /// Grades every component, applies the penalties in order, and returns
    /// the full grade document. Never fails; problems are recorded in the
    /// components they happened in.
    pub async fn grade(&self, submission: &Submission) -> AssignmentGrade {
        tracing::info!(
            assignment = %self.config.name,
            submission = %submission.root().display(),
            workers = self.engine.workers(),
            "grading submission"
        );

        let components = self.grade_components(submission).await;
        let raw_score: Fraction = components.iter().map(ComponentGrade::points_received).sum();

        let mut final_score = raw_score.clone();
        let mut penalties = Vec::with_capacity(self.config.penalties.len());
        for penalty in &self.config.penalties {
            let adjusted = penalty.adjust(&final_score, submission, &self.metadata);
            penalties.push(PenaltyDeduction {
                name:            penalty.name.clone(),
                points_deducted: &final_score - &adjusted,
            });
            final_score = adjusted;
        }

        tracing::info!(
            assignment = %self.config.name,
            raw = %raw_score,
            final_score = %final_score,
            "finished grading"
        );

        AssignmentGrade {
            name: self.config.name.clone(),
            raw_score,
            final_score,
            max_points: self.metadata.total_points.clone(),
            components,
            penalties,
        }
    }

    /// Grades the components concurrently. If the engine itself fails, every
    /// component is recorded as an autograder error.
    async fn grade_components(&self, submission: &Submission) -> Vec<ComponentGrade> {
        let total_weight = self.config.total_component_weight();
        let shared = Arc::new((submission.clone(), self.grading_files.clone(), total_weight.clone()));

        let graded = self
            .engine
            .run(self.config.components.clone(), move |_, component| {
                let shared = Arc::clone(&shared);
                async move {
                    let (submission, grading_files, total_weight) = shared.as_ref();
                    Ok(component.grade(submission, total_weight, grading_files).await)
                }
            })
            .await;

        match graded {
            Ok(grades) => grades,
            Err(err) => {
                tracing::error!("grading engine failed, discarding every component: {err:#}");
                let error = ComponentError::autograder(
                    "The grading engine failed before this component finished",
                    Some(format!("{err:?}")),
                );
                self.config
                    .components
                    .iter()
                    .map(|component| {
                        ComponentGrade::errored(
                            &component.name,
                            component.weight.div_or_zero(&total_weight),
                            error.clone(),
                        )
                    })
                    .collect()
            }
        }
    }
}
