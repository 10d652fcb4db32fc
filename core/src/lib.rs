//! Tarry - synchronous test assertions over asynchronous producers.
//!
//! Two independent pieces:
//!
//! - **Waits** ([`wait_for_value`], [`wait_for_failure`], [`Wait`]): subscribe to a
//!   push-based [`Producer`], block the test thread until a terminal event or a
//!   deadline, and classify the result as a [`WaitOutcome`].
//! - **Structural comparison** ([`assert_equal_dictionaries`], [`compare`]): walk two
//!   nested [`Mapping`]s and report every divergence, not just the first.
//!
//! Both report through an injected [`FailureReporter`]; [`PanicReporter`] and
//! [`Recorder`] adapt it to `cargo test`.

mod arrays;
mod compare;
pub mod logging;
mod phase;
pub mod producer;
mod report;
mod runtime;
mod waiter;

pub use arrays::{assert_equal_arrays, compare_arrays};
pub use compare::{Mismatch, assert_equal_dictionaries, compare};
pub use producer::{EventSink, Producer, Subscription};
pub use report::{PanicReporter, Recorder, TracingReporter};
pub use waiter::{Wait, wait_for_failure, wait_for_value};

pub use tarry_config::{EmptyCompletionPolicy, WaitConfig};
pub use tarry_types::{
    AssertionFailure, Event, Failure, FailureReporter, Mapping, Node, NodeKind, SourceLocation,
    WaitOutcome,
};
pub use tarry_utils::test_resource_directory;
