//! # tally
//!
//! Grade aggregation for autograders. An assignment is a weighted tree of
//! components and parts; backends run external testers against a submission
//! and report per-part scores, which are combined with exact rational
//! arithmetic and then adjusted by penalties.
//!
//! One broken component never takes down the rest of the grade: every failure
//! is recorded in the component it happened in, marked as either the
//! submission's fault or the autograder's.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Backends that run testers and report part results
pub mod backend;
/// Assignment configuration loading and runtime settings
pub mod config;
/// A module defining a bunch of constant values to be used throughout
pub mod constants;
/// Bounded, order-preserving worker pool
pub mod engine;
/// Submission-caused and autograder-caused errors
pub mod error;
/// Renders grade documents for people and for Gradescope
pub mod export;
/// Exact rational scores
pub mod fraction;
/// Parts, components, assignments and the grade document
pub mod grade;
/// Grade adjustments such as late penalties
pub mod penalty;
/// Subprocess execution with deadlines
pub mod process;
/// What a grading image must provide
pub mod provision;
/// Submissions and their metadata
pub mod submission;
/// Utility functions for convenience
pub mod util;

pub use error::{BrokenSubmission, ComponentError, ConfigError};
pub use fraction::Fraction;
pub use grade::{Assignment, AssignmentGrade};
pub use submission::Submission;
