//! Producer events and classified wait outcomes.

/// One notification from a producer.
///
/// A well-behaved producer sends any number of `Value`s followed by exactly
/// one of `Finished` or `Failed`, and nothing after that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<T, E> {
    Value(T),
    Finished,
    Failed(E),
}

impl<T, E> Event<T, E> {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Event::Finished | Event::Failed(_))
    }
}

/// How a single wait on a producer ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome<T, E> {
    /// Finished after emitting at least one value; holds the last one.
    Completed(T),
    /// Finished without ever emitting a value.
    CompletedNoValue,
    Failed(E),
    TimedOut,
    /// The producer went away without a terminal event.
    Abandoned,
}

impl<T, E> WaitOutcome<T, E> {
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, WaitOutcome::Completed(_) | WaitOutcome::CompletedNoValue)
    }

    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            WaitOutcome::Completed(value) => Some(value),
            _ => None,
        }
    }

    /// The captured value, if the producer finished with one.
    #[must_use]
    pub fn into_value(self) -> Option<T> {
        match self {
            WaitOutcome::Completed(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_error(self) -> Option<E> {
        match self {
            WaitOutcome::Failed(error) => Some(error),
            _ => None,
        }
    }
}
