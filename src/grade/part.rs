#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::fraction::Fraction;

/// Default part weight.
fn one() -> Fraction {
    Fraction::one()
}

/// Default for `partial-credit`.
fn yes() -> bool {
    true
}

/// One checkable unit of a component: a test case, a command, a check.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[builder(on(String, into))]
pub struct Part {
    /// Human readable description shown in reports.
    pub description:    String,
    /// Relative weight within the component.
    #[serde(default = "one")]
    #[builder(default = Fraction::one(), into)]
    pub weight:         Fraction,
    /// When `false`, any score below 1 counts as 0.
    #[serde(default = "yes")]
    #[builder(default = true)]
    pub partial_credit: bool,
    /// Backend-specific selector (a command line or a test name). Falls back
    /// to the description when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target:         Option<String>,
}

impl Part {
    /// The backend selector for this part.
    pub fn selector(&self) -> &str {
        self.target.as_deref().unwrap_or(&self.description)
    }
}

/// How a backend arrived at a part's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartStatus {
    /// The tester ran and reported a score.
    Graded,
    /// The tester deliberately did not run this part.
    Skipped,
    /// The tester failed on this part alone; the part earns nothing but the
    /// rest of the batch is still valid.
    Errored,
}

/// The unweighted outcome of grading one [`Part`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartResult {
    /// How the result came about.
    pub status:     PartStatus,
    /// Fraction of the part's credit earned, in `[0, 1]`.
    pub score:      Fraction,
    /// Short tags naming why credit was lost.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deductions: Vec<String>,
    /// Verbose tester output for this part.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log:        Option<String>,
}

impl PartResult {
    /// A graded result with the given score.
    pub fn graded(score: Fraction) -> Self {
        Self {
            status: PartStatus::Graded,
            score,
            deductions: Vec::new(),
            log: None,
        }
    }

    /// Full credit.
    pub fn passed() -> Self {
        Self::graded(Fraction::one())
    }

    /// No credit.
    pub fn failed() -> Self {
        Self::graded(Fraction::zero())
    }

    /// The part was not run.
    pub fn skipped() -> Self {
        Self {
            status:     PartStatus::Skipped,
            score:      Fraction::zero(),
            deductions: Vec::new(),
            log:        Some("(SKIPPED)".to_string()),
        }
    }

    /// The tester broke on this part only.
    pub fn errored(message: impl Into<String>) -> Self {
        Self {
            status:     PartStatus::Errored,
            score:      Fraction::zero(),
            deductions: vec!["error".to_string()],
            log:        Some(message.into()),
        }
    }

    /// Replaces the log.
    pub fn with_log(mut self, log: impl Into<String>) -> Self {
        self.log = Some(log.into());
        self
    }

    /// Adds a deduction tag.
    pub fn with_deduction(mut self, tag: impl Into<String>) -> Self {
        self.deductions.push(tag.into());
        self
    }

    /// The score that counts toward the grade. Skipped and errored parts
    /// earn nothing whatever score they carry.
    pub fn credited_score(&self) -> Fraction {
        match self.status {
            PartStatus::Graded => self.score.clone(),
            PartStatus::Skipped | PartStatus::Errored => Fraction::zero(),
        }
    }

    /// Whether the score lies in `[0, 1]`.
    pub fn is_in_range(&self) -> bool {
        self.score >= Fraction::zero() && self.score <= Fraction::one()
    }
}

/// A [`Part`] joined with its [`PartResult`] and normalized weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundPartGrade {
    /// Part description.
    pub description: String,
    /// `part.weight / total part weight` of the component.
    pub norm_weight: Fraction,
    /// The result, after the part's partial-credit rule.
    #[serde(flatten)]
    pub result:      PartResult,
}

impl BoundPartGrade {
    /// Binds a result to its part. `total_part_weight` is the sum of all part
    /// weights in the component.
    pub fn bind(part: &Part, mut result: PartResult, total_part_weight: &Fraction) -> Self {
        if !part.partial_credit && result.score < Fraction::one() {
            result.score = Fraction::zero();
        }

        Self {
            description: part.description.clone(),
            norm_weight: part.weight.div_or_zero(total_part_weight),
            result,
        }
    }

    /// Whether the part earned full credit.
    pub fn passed(&self) -> bool {
        self.result.credited_score() == Fraction::one()
    }

    /// Points earned within the component, in `[0, norm_weight]`.
    pub fn points_received(&self) -> Fraction {
        self.result.credited_score() * &self.norm_weight
    }
}
