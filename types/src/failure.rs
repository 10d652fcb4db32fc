//! Assertion failures and the capability used to report them.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::location::SourceLocation;
use crate::node::Node;

/// Every way an assertion or wait in this workspace can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssertionFailure {
    /// Key sets of two compared mappings differ.
    ///
    /// `missing` holds keys only the expected side has, `extra` keys only the
    /// actual side has.
    #[error("Fields in item don't match reference (missing: {missing:?}, extra: {extra:?})")]
    KeySetMismatch {
        missing: Vec<String>,
        extra: Vec<String>,
    },
    #[error(
        "Item's field '{field}' has value '{}', but reference '{field}' has '{}'",
        .actual.unquoted(),
        .expected.unquoted()
    )]
    FieldMismatch {
        field: String,
        actual: Node,
        expected: Node,
    },
    #[error("Could not compare {actual} and {expected} (field '{field}')")]
    UnsupportedPair {
        field: String,
        actual: Node,
        expected: Node,
    },
    #[error("Arrays do not match: {actual} elements, expected {expected}")]
    CountMismatch { actual: usize, expected: usize },
    #[error("Arrays do not match at index {index}\n{diff}")]
    ArraysDiffer { index: usize, diff: String },
    #[error(
        "failed to get publisher result before timeout of {} seconds",
        .timeout.as_secs_f64()
    )]
    WaitTimeout { timeout: Duration },
    #[error("Failed with {error}")]
    ProducerFailure { error: String },
    #[error("unexpectedly succeeded. {message}")]
    UnexpectedSuccess { message: String },
    #[error(
        "didn't get expected failure before timeout of {} seconds",
        .timeout.as_secs_f64()
    )]
    ExpectedFailureTimeout { timeout: Duration },
    #[error("finished without emitting a value")]
    CompletedWithoutValue,
    #[error("producer stopped without a terminal event: {reason}")]
    ProducerAbandoned { reason: String },
}

impl AssertionFailure {
    /// Short stable name, used as a structured logging field.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            AssertionFailure::KeySetMismatch { .. } => "key_set_mismatch",
            AssertionFailure::FieldMismatch { .. } => "field_mismatch",
            AssertionFailure::UnsupportedPair { .. } => "unsupported_pair",
            AssertionFailure::CountMismatch { .. } => "count_mismatch",
            AssertionFailure::ArraysDiffer { .. } => "arrays_differ",
            AssertionFailure::WaitTimeout { .. } => "wait_timeout",
            AssertionFailure::ProducerFailure { .. } => "producer_failure",
            AssertionFailure::UnexpectedSuccess { .. } => "unexpected_success",
            AssertionFailure::ExpectedFailureTimeout { .. } => "expected_failure_timeout",
            AssertionFailure::CompletedWithoutValue => "completed_without_value",
            AssertionFailure::ProducerAbandoned { .. } => "producer_abandoned",
        }
    }
}

/// A reported failure: what went wrong and at which assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    kind: AssertionFailure,
    location: SourceLocation,
    path: Option<String>,
}

impl Failure {
    #[must_use]
    pub fn new(kind: AssertionFailure, location: SourceLocation) -> Self {
        Self {
            kind,
            location,
            path: None,
        }
    }

    /// Attach the dotted path of the mapping the failure was found in.
    #[must_use]
    pub fn at_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.path = (!path.is_empty()).then_some(path);
        self
    }

    #[must_use]
    pub fn kind(&self) -> &AssertionFailure {
        &self.kind
    }

    #[must_use]
    pub fn into_kind(self) -> AssertionFailure {
        self.kind
    }

    #[must_use]
    pub fn location(&self) -> SourceLocation {
        self.location
    }

    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Human-readable message without the location.
    #[must_use]
    pub fn message(&self) -> String {
        match &self.path {
            Some(path) => format!("at {path}: {}", self.kind),
            None => self.kind.to_string(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message())
    }
}

/// The host's "report failure with message, file, line" capability.
///
/// Core components depend only on this trait, never on a concrete test
/// framework. Implementations decide whether a failure aborts the test.
pub trait FailureReporter {
    fn report(&self, failure: Failure);
}

impl<R: FailureReporter + ?Sized> FailureReporter for &R {
    fn report(&self, failure: Failure) {
        (**self).report(failure);
    }
}

impl<R: FailureReporter + ?Sized> FailureReporter for Box<R> {
    fn report(&self, failure: Failure) {
        (**self).report(failure);
    }
}

impl<R: FailureReporter + ?Sized> FailureReporter for Arc<R> {
    fn report(&self, failure: Failure) {
        (**self).report(failure);
    }
}
