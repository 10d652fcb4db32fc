//! Core domain types for Tarry.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies:
//! the comparison values, producer events, wait outcomes, and the failure taxonomy
//! together with the reporting capability every assertion goes through.

mod failure;
mod location;
mod node;
mod outcome;

pub use failure::{AssertionFailure, Failure, FailureReporter};
pub use location::SourceLocation;
pub use node::{Mapping, Node, NodeKind, NotAMappingError};
pub use outcome::{Event, WaitOutcome};
