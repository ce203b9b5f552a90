#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Penalties adjust the aggregate grade after all components are graded.
//!
//! Penalties run in the order they are configured and each one sees the
//! grade left by the previous one, so reordering them can change the result.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    fraction::Fraction,
    grade::AssignmentMetadata,
    submission::Submission,
};

/// Lateness rules.
pub mod late;

pub use late::{LatePenalizer, LateRule};

/// A named grade adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Penalty {
    /// Name shown in reports, for example `LATE`.
    pub name:    String,
    /// The rule.
    pub backend: Penalizer,
}

impl Penalty {
    /// The adjusted grade.
    pub fn adjust(
        &self,
        grade: &Fraction,
        submission: &Submission,
        metadata: &AssignmentMetadata,
    ) -> Fraction {
        let adjusted = self.backend.adjust(grade, submission, metadata);
        tracing::debug!(penalty = %self.name, %grade, %adjusted, "applied penalty");
        adjusted
    }
}

/// A penalty rule, selected by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Penalizer {
    /// See [`LatePenalizer`].
    Late(LatePenalizer),
    /// Applies one amount unconditionally.
    Fixed {
        /// The amount.
        penalty: PenaltyAmount,
    },
}

impl Penalizer {
    /// Applies the rule to `grade`.
    pub fn adjust(
        &self,
        grade: &Fraction,
        submission: &Submission,
        metadata: &AssignmentMetadata,
    ) -> Fraction {
        match self {
            Penalizer::Late(late) => late.adjust(grade, submission, metadata),
            Penalizer::Fixed { penalty } => penalty.apply(grade),
        }
    }
}

/// How much a penalty takes off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AmountInput", into = "String")]
pub enum PenaltyAmount {
    /// Multiply the grade by `1 - n`. Written as a bare number, `1/4`.
    Percent(Fraction),
    /// Subtract `n`, never going below zero. Written `25 pts`, meaning 25/100.
    Points(Fraction),
    /// Cap the grade at `n`. Written `80 max-pts`, meaning 80/100.
    MaxPoints(Fraction),
}

impl PenaltyAmount {
    /// The penalized grade.
    pub fn apply(&self, grade: &Fraction) -> Fraction {
        match self {
            PenaltyAmount::Percent(amount) => grade * (Fraction::one() - amount),
            PenaltyAmount::Points(amount) => (grade - amount).max(Fraction::zero()),
            PenaltyAmount::MaxPoints(cap) => grade.min(cap).clone(),
        }
    }
}

/// Splits `"25 pts"` into its magnitude and lowercase unit.
pub(crate) fn split_units(text: &str, what: &'static str) -> Result<(Fraction, Option<String>), ConfigError> {
    let text = text.trim().to_lowercase();
    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '/' || c == '.'))
        .unwrap_or(text.len());
    let (magnitude, unit) = text.split_at(split);
    let unit = unit.trim_start();

    if magnitude.is_empty() || !unit.chars().all(|c| c.is_ascii_lowercase() || c == '_' || c == '-') {
        return Err(ConfigError::UnknownUnits {
            what,
            value: text.clone(),
        });
    }

    let magnitude = magnitude.parse::<Fraction>()?;
    Ok((magnitude, (!unit.is_empty()).then(|| unit.to_string())))
}

impl FromStr for PenaltyAmount {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hundred = Fraction::from(100);
        match split_units(s, "penalty")? {
            (amount, None) => Ok(PenaltyAmount::Percent(amount)),
            (amount, Some(unit)) => match unit.as_str() {
                "pt" | "pts" => Ok(PenaltyAmount::Points(amount / hundred)),
                "maxpts" | "max-pts" | "max_pts" | "maxpt" | "max-pt" | "max_pt" => {
                    Ok(PenaltyAmount::MaxPoints(amount / hundred))
                }
                _ => Err(ConfigError::UnknownUnit {
                    what: "penalty",
                    unit,
                    expected: "a fraction optionally followed by `pts` or `max-pts`",
                }),
            },
        }
    }
}

impl fmt::Display for PenaltyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hundred = Fraction::from(100);
        match self {
            PenaltyAmount::Percent(amount) => write!(f, "{amount}"),
            PenaltyAmount::Points(amount) => write!(f, "{} pts", amount * hundred),
            PenaltyAmount::MaxPoints(cap) => write!(f, "{} max-pts", cap * hundred),
        }
    }
}

impl From<PenaltyAmount> for String {
    fn from(amount: PenaltyAmount) -> Self {
        amount.to_string()
    }
}

/// Raw configuration value for amounts and thresholds: text with units, or a
/// bare number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum AmountInput {
    /// `"25 pts"`, `"1/4"`, `"2h"`.
    Text(String),
    /// `0.25`, `3`.
    Number(Fraction),
}

impl TryFrom<AmountInput> for PenaltyAmount {
    type Error = ConfigError;

    fn try_from(input: AmountInput) -> Result<Self, Self::Error> {
        match input {
            AmountInput::Text(text) => text.parse(),
            AmountInput::Number(amount) => Ok(PenaltyAmount::Percent(amount)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(text: &str) -> PenaltyAmount {
        text.parse().expect("valid amount")
    }

    #[test]
    fn parses_every_unit_spelling() {
        assert_eq!(amount("25pts"), PenaltyAmount::Points(Fraction::new(1, 4)));
        assert_eq!(amount("10 PT"), PenaltyAmount::Points(Fraction::new(1, 10)));
        assert_eq!(amount("1/4"), PenaltyAmount::Percent(Fraction::new(1, 4)));
        for unit in ["maxpts", "max-pts", "max_pts", "maxpt", "max-pt", "max_pt"] {
            assert_eq!(
                amount(&format!("80 {unit}")),
                PenaltyAmount::MaxPoints(Fraction::new(4, 5))
            );
        }
    }

    #[test]
    fn rejects_unknown_units() {
        assert!(matches!(
            "5 bananas".parse::<PenaltyAmount>(),
            Err(ConfigError::UnknownUnit { .. })
        ));
        assert!(matches!(
            "pts".parse::<PenaltyAmount>(),
            Err(ConfigError::UnknownUnits { .. })
        ));
    }

    #[test]
    fn points_floor_at_zero_and_caps_never_raise() {
        assert_eq!(amount("25 pts").apply(&Fraction::new(1, 10)), Fraction::zero());
        assert_eq!(amount("80 max-pts").apply(&Fraction::new(1, 2)), Fraction::new(1, 2));
        assert_eq!(amount("1/4").apply(&Fraction::new(4, 5)), Fraction::new(3, 5));
    }

    #[test]
    fn penalty_order_matters() {
        let grade = Fraction::new(9, 10);
        let flat = amount("10 pts");
        let cap = amount("80 max-pts");

        assert_eq!(cap.apply(&flat.apply(&grade)), Fraction::new(4, 5));
        assert_eq!(flat.apply(&cap.apply(&grade)), Fraction::new(7, 10));
    }

    #[test]
    fn numbers_and_text_deserialize() {
        let parsed: Vec<PenaltyAmount> =
            serde_json::from_str(r#"["50 pts", 0.5]"#).expect("deserializes");
        assert_eq!(parsed, vec![
            PenaltyAmount::Points(Fraction::new(1, 2)),
            PenaltyAmount::Percent(Fraction::new(1, 2)),
        ]);
        assert_eq!(serde_json::to_string(&parsed[0]).expect("serializes"), r#""50 pts""#);
    }
}
