#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Error taxonomy.
//!
//! Grading distinguishes failures caused by the submission from failures
//! caused by the autograder. Backends signal the former by returning a
//! [`BrokenSubmission`] inside an `anyhow::Error`; anything else that escapes a
//! backend is treated as the autograder's fault.

use serde::{Deserialize, Serialize};

use crate::fraction::ParseFractionError;

/// The submission could not be graded: a required file is missing, the code
/// does not build, a tester timed out, and so on.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct BrokenSubmission {
    /// Short, student-facing explanation.
    pub message: String,
    /// Longer diagnostic output (compiler output, tester logs).
    pub verbose: Option<String>,
}

impl BrokenSubmission {
    /// A broken-submission error without verbose output.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            verbose: None,
        }
    }

    /// Attaches verbose diagnostic output.
    pub fn with_verbose(mut self, verbose: impl Into<String>) -> Self {
        self.verbose = Some(verbose.into());
        self
    }
}

/// The autograder configuration is invalid.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// No `tally.toml` or `tally.json` in the autograder directory.
    #[error("Missing configuration file {file} in {dir}")]
    MissingConfig {
        /// The preferred config file name.
        file: String,
        /// The directory that was searched.
        dir:  String,
    },
    /// A penalty amount or lateness threshold could not be read.
    #[error("unknown {what} format `{value}`")]
    UnknownUnits {
        /// What was being parsed (for example "penalty").
        what:  &'static str,
        /// The offending value.
        value: String,
    },
    /// A penalty or time unit that is not supported.
    #[error("unknown {what} unit `{unit}`. try one of {expected}")]
    UnknownUnit {
        /// What was being parsed.
        what:     &'static str,
        /// The offending unit.
        unit:     String,
        /// Human readable list of accepted units.
        expected: &'static str,
    },
    /// A part does not carry what its backend needs.
    #[error("part `{part}` in component `{component}`: {reason}")]
    InvalidPart {
        /// Component name.
        component: String,
        /// Part description.
        part:      String,
        /// What is wrong with it.
        reason:    String,
    },
    /// A weight is negative.
    #[error("{what} `{name}` has negative weight {weight}")]
    NegativeWeight {
        /// "component" or "part".
        what:   &'static str,
        /// Name or description.
        name:   String,
        /// The weight as written.
        weight: String,
    },
    /// A fraction in the configuration could not be parsed.
    #[error(transparent)]
    Fraction(#[from] ParseFractionError),
}

/// Why a component could not be graded, as recorded in the grade document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentError {
    /// Short explanation.
    pub message:             String,
    /// Longer diagnostic output, if any.
    pub verbose:             Option<String>,
    /// `true` when the failure is not the student's fault.
    pub is_autograder_fault: bool,
}

impl ComponentError {
    /// Classifies an error that escaped a backend or the file preparation
    /// step. A [`BrokenSubmission`] anywhere in the chain is the student's
    /// fault; everything else is the autograder's.
    pub fn classify(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<BrokenSubmission>() {
            Some(broken) => Self {
                message:             broken.message.clone(),
                verbose:             broken.verbose.clone(),
                is_autograder_fault: false,
            },
            None => Self::autograder(format!("{err}"), Some(format!("{err:?}"))),
        }
    }

    /// An autograder-caused error.
    pub fn autograder(message: impl Into<String>, verbose: Option<String>) -> Self {
        Self {
            message: message.into(),
            verbose,
            is_autograder_fault: true,
        }
    }

    /// Message, verbose output, and the staff note for autograder faults, as
    /// shown to students.
    pub fn describe(&self) -> String {
        let mut text = format!("{}\n{}", self.message, self.verbose.as_deref().unwrap_or(""))
            .trim()
            .to_string();
        if self.is_autograder_fault {
            text.push_str("\n\n");
            text.push_str(crate::constants::AUTOGRADER_FAULT_NOTE);
        }
        text
    }
}
