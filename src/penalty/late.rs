#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use super::{AmountInput, PenaltyAmount, split_units};
use crate::{
    error::ConfigError,
    fraction::Fraction,
    grade::AssignmentMetadata,
    submission::Submission,
};

/// How late a submission must be before a rule applies.
///
/// Written `"<n>[s|m|h|d]"`, where `n` may be a fraction (`3/2h`) and the
/// unit defaults to seconds. Bare numbers are seconds.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "AmountInput", into = "String")]
pub struct LateThreshold {
    /// Threshold in seconds.
    seconds: Fraction,
}

impl LateThreshold {
    /// A threshold of `seconds`.
    pub fn from_seconds(seconds: impl Into<Fraction>) -> Self {
        Self {
            seconds: seconds.into(),
        }
    }

    /// Whether a submission `late_by` this much is past the threshold. An
    /// unknown lateness is never late.
    pub fn is_exceeded_by(&self, late_by: Option<TimeDelta>) -> bool {
        late_by.is_some_and(|late_by| {
            Fraction::new(i128::from(late_by.num_milliseconds()), 1000) > self.seconds
        })
    }
}

impl TryFrom<AmountInput> for LateThreshold {
    type Error = ConfigError;

    fn try_from(input: AmountInput) -> Result<Self, Self::Error> {
        let (magnitude, unit) = match input {
            AmountInput::Text(text) => split_units(&text, "lateness")?,
            AmountInput::Number(seconds) => (seconds, None),
        };

        let scale: i32 = match unit.as_deref().unwrap_or("s") {
            "s" => 1,
            "m" => 60,
            "h" => 60 * 60,
            "d" => 24 * 60 * 60,
            other => {
                return Err(ConfigError::UnknownUnit {
                    what:     "time",
                    unit:     other.to_string(),
                    expected: "s, m, h, d",
                });
            }
        };
        Ok(Self::from_seconds(magnitude * Fraction::from(scale)))
    }
}

impl fmt::Display for LateThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.seconds)
    }
}

impl From<LateThreshold> for String {
    fn from(threshold: LateThreshold) -> Self {
        threshold.to_string()
    }
}

/// Applies `penalty` once the submission is more than `after` late.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LateRule {
    /// Lateness threshold.
    pub after:   LateThreshold,
    /// Amount taken off.
    pub penalty: PenaltyAmount,
}

/// Penalizes late submissions.
///
/// ```toml
/// [[penalties]]
/// name = "LATE"
///
/// [penalties.backend]
/// kind = "late"
/// rules = [
///     { after = "1h", penalty = "25 pts" },
///     { after = "8h", penalty = "50 pts" },
/// ]
/// ```
///
/// Rules are considered in increasing `after` order. Every rule the
/// submission is late under applies, so an 85 that is 9 hours late drops to
/// 10. With `apply-first`, only the earliest matching rule applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LatePenalizer {
    /// The rules, in any order.
    pub rules:       Vec<LateRule>,
    /// Stop after the first matching rule.
    #[serde(default)]
    pub apply_first: bool,
}

impl LatePenalizer {
    /// Applies every matching rule to `grade`.
    pub fn adjust(
        &self,
        grade: &Fraction,
        submission: &Submission,
        _metadata: &AssignmentMetadata,
    ) -> Fraction {
        let late_by = submission.late_by();
        let mut rules: Vec<&LateRule> = self.rules.iter().collect();
        rules.sort_by(|a, b| a.after.cmp(&b.after));

        let mut grade = grade.clone();
        for rule in rules {
            if rule.after.is_exceeded_by(late_by) {
                grade = rule.penalty.apply(&grade);
                if self.apply_first {
                    break;
                }
            }
        }
        grade
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn penalizer(apply_first: bool) -> LatePenalizer {
        serde_json::from_value(serde_json::json!({
            "rules": [
                { "after": "8h", "penalty": "50 pts" },
                { "after": "1h", "penalty": "25pts" },
            ],
            "apply-first": apply_first,
        }))
        .expect("valid penalizer")
    }

    fn submission(late_by: TimeDelta) -> Submission {
        Submission::new("/submission").with_late_by(late_by)
    }

    #[test]
    fn all_matching_rules_apply() {
        let grade = penalizer(false).adjust(
            &Fraction::new(85, 100),
            &submission(TimeDelta::hours(9)),
            &AssignmentMetadata::default(),
        );
        assert_eq!(grade, Fraction::new(1, 10));
    }

    #[test]
    fn apply_first_stops_at_the_earliest_rule() {
        let grade = penalizer(true).adjust(
            &Fraction::new(85, 100),
            &submission(TimeDelta::hours(9)),
            &AssignmentMetadata::default(),
        );
        assert_eq!(grade, Fraction::new(3, 5));
    }

    #[test]
    fn on_time_and_unknown_lateness_are_untouched() {
        let metadata = AssignmentMetadata::default();
        let grade = Fraction::new(85, 100);
        assert_eq!(penalizer(false).adjust(&grade, &submission(TimeDelta::hours(1)), &metadata), grade);
        assert_eq!(penalizer(false).adjust(&grade, &Submission::new("/s"), &metadata), grade);
        assert_eq!(
            penalizer(false).adjust(&grade, &submission(TimeDelta::hours(-3)), &metadata),
            grade
        );
    }

    #[test]
    fn thresholds_accept_fractions_and_units() {
        let parse = |text: &str| LateThreshold::try_from(AmountInput::Text(text.into()));
        assert_eq!(parse("3/2h").expect("valid"), LateThreshold::from_seconds(5400));
        assert_eq!(parse("90").expect("valid"), LateThreshold::from_seconds(90));
        assert_eq!(parse("2d").expect("valid"), LateThreshold::from_seconds(172_800));
        assert!(matches!(parse("2w"), Err(ConfigError::UnknownUnit { .. })));
    }
}
