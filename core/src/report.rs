//! Adapters from [`FailureReporter`] to Rust's test harness.
//!
//! `cargo test` records a failure when the test panics. [`PanicReporter`]
//! does exactly that; [`Recorder`] collects instead, so a test can gather
//! every problem first and fail once at the end.

use std::mem;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tarry_types::{Failure, FailureReporter};

/// Panics on the first reported failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanicReporter;

impl FailureReporter for PanicReporter {
    fn report(&self, failure: Failure) {
        panic!("{failure}");
    }
}

/// Thread-safe failure collector.
#[derive(Debug, Default)]
pub struct Recorder {
    failures: Mutex<Vec<Failure>>,
}

impl Recorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Failure>> {
        // A panic while holding the lock cannot leave the Vec half-written.
        self.failures.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn failures(&self) -> Vec<Failure> {
        self.lock().clone()
    }

    /// Messages of every failure so far, without locations.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.lock().iter().map(Failure::message).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drain the recorded failures.
    pub fn take(&self) -> Vec<Failure> {
        mem::take(&mut *self.lock())
    }

    /// Panic once, listing every recorded failure, if there are any.
    #[track_caller]
    pub fn assert_clean(&self) {
        let failures = self.take();
        if failures.is_empty() {
            return;
        }
        let listing: Vec<String> = failures.iter().map(ToString::to_string).collect();
        panic!(
            "{} assertion failure(s):\n{}",
            failures.len(),
            listing.join("\n")
        );
    }
}

impl FailureReporter for Recorder {
    fn report(&self, failure: Failure) {
        self.lock().push(failure);
    }
}

/// Logs every failure at `error` level before forwarding it.
#[derive(Debug, Clone, Default)]
pub struct TracingReporter<R> {
    inner: R,
}

impl<R: FailureReporter> TracingReporter<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: FailureReporter> FailureReporter for TracingReporter<R> {
    fn report(&self, failure: Failure) {
        let location = failure.location();
        tracing::error!(
            failure = failure.kind().name(),
            file = location.file(),
            line = location.line(),
            "{}",
            failure.message()
        );
        self.inner.report(failure);
    }
}
