#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The grade tree: assignments hold weighted components, components hold
//! weighted parts, and penalties adjust the aggregate.
//!
//! Every score in this tree is a [`Fraction`](crate::fraction::Fraction).
//! Floating point only appears in the exporters.

/// Assignment configuration, aggregation and the grade document.
pub mod assignment;
/// Components: working directories, backend calls and error containment.
pub mod component;
/// Parts, their results, and bound part grades.
pub mod part;

pub use assignment::{
    Assignment,
    AssignmentConfig,
    AssignmentGrade,
    AssignmentMetadata,
    PenaltyDeduction,
};
pub use component::{Component, ComponentGrade, ComponentOutcome};
pub use part::{BoundPartGrade, Part, PartResult, PartStatus};
