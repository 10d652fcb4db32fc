//! Synchronous waits on asynchronous producers.
//!
//! Every wait builds a fresh [`Waiter`]: its own producer runtime, its own
//! channel, one subscription. The calling thread blocks in a single bounded
//! receive against one monotonic deadline. Whatever happens, the waiter closes
//! the channel and cancels the subscription before returning, so late producer
//! callbacks are no-ops.

use std::fmt;
use std::io;
use std::panic::Location;
use std::time::Duration;

use thiserror::Error;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};

use tarry_config::{EmptyCompletionPolicy, WaitConfig};
use tarry_types::{AssertionFailure, Event, Failure, FailureReporter, SourceLocation, WaitOutcome};

use crate::phase::{self, WaitPhase};
use crate::producer::{EventSink, Producer, Subscription};
use crate::runtime::producer_runtime;

/// Stand-in deadline for timeouts too large to add to `Instant::now()`.
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

const SINK_DROPPED: &str = "event sink dropped before a terminal event";

#[derive(Debug, Error)]
pub(crate) enum WaitError {
    #[error("failed to start producer runtime: {0}")]
    Runtime(#[from] io::Error),
}

/// Whether intermediate values are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    Last,
    Discard,
}

struct Waiter {
    phase: WaitPhase,
    runtime: Runtime,
    subscription: Option<Subscription>,
    capture: Capture,
}

impl Waiter {
    fn new(config: &WaitConfig, capture: Capture) -> Result<Self, WaitError> {
        Ok(Self {
            phase: WaitPhase::Idle,
            runtime: producer_runtime(config.worker_threads())?,
            subscription: None,
            capture,
        })
    }

    /// The factory runs inside the producer runtime, so producers may create
    /// timers or I/O resources while being built.
    fn wait<F, P>(mut self, producer: F, timeout: Duration) -> WaitOutcome<P::Output, P::Error>
    where
        F: FnOnce() -> P,
        P: Producer,
    {
        let deadline = deadline_after(timeout);
        let (sink, mut receiver) = EventSink::channel();

        {
            let _context = self.runtime.enter();
            self.subscription = Some(producer().subscribe(sink));
        }
        self.transition(WaitPhase::Subscribed);
        tracing::debug!(timeout_ms = timeout.as_millis(), "Subscribed to producer");

        let outcome = self
            .runtime
            .block_on(receive(&mut receiver, deadline, self.capture));
        self.transition(phase_for(&outcome));

        receiver.close();
        drop(receiver);
        self.release();
        outcome
    }

    fn release(mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
        self.transition(WaitPhase::Released);
        self.runtime.shutdown_background();
    }

    #[track_caller]
    fn transition(&mut self, next: WaitPhase) {
        let from = self.phase;
        let edge = phase::transition_edge(from, next);
        let legal = edge.is_some_and(|edge| phase::is_legal_transition(from, edge, next));
        let loc = Location::caller();
        if legal {
            tracing::debug!(
                from = ?from,
                to = ?next,
                edge = edge.map_or("none", |edge| edge.as_str()),
                file = loc.file(),
                line = loc.line(),
                "Wait phase transition",
            );
        } else {
            tracing::warn!(
                from = ?from,
                to = ?next,
                file = loc.file(),
                line = loc.line(),
                column = loc.column(),
                "Illegal wait phase transition",
            );
            debug_assert!(
                legal,
                "Illegal wait phase transition: {from:?} -> {next:?} at {}:{}:{}",
                loc.file(),
                loc.line(),
                loc.column()
            );
        }
        self.phase = next;
    }
}

fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or(now + FAR_FUTURE)
}

fn phase_for<T, E>(outcome: &WaitOutcome<T, E>) -> WaitPhase {
    match outcome {
        WaitOutcome::Completed(_) | WaitOutcome::CompletedNoValue => WaitPhase::Completed,
        WaitOutcome::Failed(_) => WaitPhase::Failed,
        WaitOutcome::TimedOut => WaitPhase::TimedOut,
        WaitOutcome::Abandoned => WaitPhase::Abandoned,
    }
}

/// Drain events until a terminal one, the deadline, or a closed channel.
async fn receive<T, E>(
    receiver: &mut mpsc::UnboundedReceiver<Event<T, E>>,
    deadline: Instant,
    capture: Capture,
) -> WaitOutcome<T, E> {
    let mut last = None;
    loop {
        match time::timeout_at(deadline, receiver.recv()).await {
            Ok(Some(Event::Value(value))) => {
                if capture == Capture::Last {
                    last = Some(value);
                }
            }
            Ok(Some(Event::Finished)) => {
                return last.map_or(WaitOutcome::CompletedNoValue, WaitOutcome::Completed);
            }
            Ok(Some(Event::Failed(error))) => return WaitOutcome::Failed(error),
            Ok(None) => {
                tracing::warn!("{SINK_DROPPED}");
                return WaitOutcome::Abandoned;
            }
            Err(_) => return WaitOutcome::TimedOut,
        }
    }
}

/// One configured wait on a producer.
///
/// ```no_run
/// use std::time::Duration;
///
/// use tarry::{Recorder, Wait, producer};
///
/// let recorder = Recorder::new();
/// let outcome = Wait::new(&recorder)
///     .with_timeout(Duration::from_secs(1))
///     .for_value(|| producer::just::<u32, String>(42));
/// assert_eq!(outcome.into_value(), Some(42));
/// recorder.assert_clean();
/// ```
pub struct Wait<'r, R: ?Sized> {
    reporter: &'r R,
    config: WaitConfig,
    timeout: Option<Duration>,
}

impl<'r, R: FailureReporter + ?Sized> Wait<'r, R> {
    /// A wait using [`WaitConfig::global`].
    pub fn new(reporter: &'r R) -> Self {
        Self {
            reporter,
            config: *WaitConfig::global(),
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: WaitConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the configured default timeout for this wait.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn timeout(&self) -> Duration {
        self.timeout.unwrap_or(self.config.default_timeout())
    }

    /// Wait for the producer to finish and return its last value.
    ///
    /// Reports exactly one failure on `Failed`, `TimedOut` and `Abandoned`,
    /// none on `Completed`. `CompletedNoValue` is reported unless the
    /// configuration allows empty completions.
    ///
    /// # Panics
    ///
    /// If called from within an async execution context.
    #[track_caller]
    pub fn for_value<F, P>(self, producer: F) -> WaitOutcome<P::Output, P::Error>
    where
        F: FnOnce() -> P,
        P: Producer,
        P::Error: fmt::Display,
    {
        let location = SourceLocation::caller();
        let timeout = self.timeout();
        let outcome = self.run(producer, timeout, Capture::Last, location);

        match &outcome {
            WaitOutcome::Completed(_) | WaitOutcome::Abandoned => {}
            WaitOutcome::CompletedNoValue => {
                if self.config.empty_completion() == EmptyCompletionPolicy::Report {
                    self.report(AssertionFailure::CompletedWithoutValue, location);
                }
            }
            WaitOutcome::Failed(error) => self.report(
                AssertionFailure::ProducerFailure {
                    error: error.to_string(),
                },
                location,
            ),
            WaitOutcome::TimedOut => {
                self.report(AssertionFailure::WaitTimeout { timeout }, location);
            }
        }
        outcome
    }

    /// Wait for the producer to fail and return its error.
    ///
    /// Values are discarded. Success reports `unexpected_success_message`;
    /// running out of time reports a timeout.
    ///
    /// # Panics
    ///
    /// If called from within an async execution context.
    #[track_caller]
    pub fn for_failure<F, P>(
        self,
        unexpected_success_message: &str,
        producer: F,
    ) -> Option<P::Error>
    where
        F: FnOnce() -> P,
        P: Producer,
    {
        let location = SourceLocation::caller();
        let timeout = self.timeout();

        match self.run(producer, timeout, Capture::Discard, location) {
            WaitOutcome::Failed(error) => Some(error),
            WaitOutcome::Completed(_) | WaitOutcome::CompletedNoValue => {
                self.report(
                    AssertionFailure::UnexpectedSuccess {
                        message: unexpected_success_message.to_string(),
                    },
                    location,
                );
                None
            }
            WaitOutcome::TimedOut => {
                self.report(AssertionFailure::ExpectedFailureTimeout { timeout }, location);
                None
            }
            WaitOutcome::Abandoned => None,
        }
    }

    fn run<F, P>(
        &self,
        producer: F,
        timeout: Duration,
        capture: Capture,
        location: SourceLocation,
    ) -> WaitOutcome<P::Output, P::Error>
    where
        F: FnOnce() -> P,
        P: Producer,
    {
        match Waiter::new(&self.config, capture) {
            Ok(waiter) => {
                let outcome = waiter.wait(producer, timeout);
                if matches!(outcome, WaitOutcome::Abandoned) {
                    self.report(
                        AssertionFailure::ProducerAbandoned {
                            reason: SINK_DROPPED.to_string(),
                        },
                        location,
                    );
                }
                outcome
            }
            Err(err) => {
                tracing::warn!("Cannot wait on producer: {err}");
                self.report(
                    AssertionFailure::ProducerAbandoned {
                        reason: err.to_string(),
                    },
                    location,
                );
                WaitOutcome::Abandoned
            }
        }
    }

    fn report(&self, kind: AssertionFailure, location: SourceLocation) {
        tracing::debug!(failure = kind.name(), %location, "Reporting wait failure");
        self.reporter.report(Failure::new(kind, location));
    }
}

/// Block until `producer` finishes or `timeout` elapses; see [`Wait::for_value`].
#[track_caller]
pub fn wait_for_value<R, F, P>(
    reporter: &R,
    timeout: Duration,
    producer: F,
) -> WaitOutcome<P::Output, P::Error>
where
    R: FailureReporter + ?Sized,
    F: FnOnce() -> P,
    P: Producer,
    P::Error: fmt::Display,
{
    Wait::new(reporter).with_timeout(timeout).for_value(producer)
}

/// Block until `producer` fails or `timeout` elapses; see [`Wait::for_failure`].
#[track_caller]
pub fn wait_for_failure<R, F, P>(
    reporter: &R,
    timeout: Duration,
    unexpected_success_message: &str,
    producer: F,
) -> Option<P::Error>
where
    R: FailureReporter + ?Sized,
    F: FnOnce() -> P,
    P: Producer,
{
    Wait::new(reporter)
        .with_timeout(timeout)
        .for_failure(unexpected_success_message, producer)
}
