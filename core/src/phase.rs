//! Waiter lifecycle transition graph.
//!
//! Single encoding point for the legal `WaitPhase` edges. The waiter delegates
//! every legality decision here instead of checking phases at call sites.

/// Lifecycle of one waiter instance.
///
/// `Idle -> Subscribed -> {Completed | Failed | TimedOut | Abandoned} -> Released`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitPhase {
    Idle,
    Subscribed,
    Completed,
    Failed,
    TimedOut,
    Abandoned,
    Released,
}

impl WaitPhase {
    #[must_use]
    pub(crate) const fn is_terminal_event(self) -> bool {
        matches!(
            self,
            WaitPhase::Completed | WaitPhase::Failed | WaitPhase::TimedOut | WaitPhase::Abandoned
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitEdge {
    Subscribe,
    Complete,
    Fail,
    TimeOut,
    Abandon,
    Release,
}

impl WaitEdge {
    #[must_use]
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            WaitEdge::Subscribe => "subscribe",
            WaitEdge::Complete => "complete",
            WaitEdge::Fail => "fail",
            WaitEdge::TimeOut => "time_out",
            WaitEdge::Abandon => "abandon",
            WaitEdge::Release => "release",
        }
    }
}

#[must_use]
pub(crate) fn transition_edge(from: WaitPhase, to: WaitPhase) -> Option<WaitEdge> {
    use WaitPhase::{Abandoned, Completed, Failed, Idle, Released, Subscribed, TimedOut};

    match (from, to) {
        (Idle, Subscribed) => Some(WaitEdge::Subscribe),
        (Subscribed, Completed) => Some(WaitEdge::Complete),
        (Subscribed, Failed) => Some(WaitEdge::Fail),
        (Subscribed, TimedOut) => Some(WaitEdge::TimeOut),
        (Subscribed, Abandoned) => Some(WaitEdge::Abandon),
        (Completed | Failed | TimedOut | Abandoned, Released) => Some(WaitEdge::Release),
        _ => None,
    }
}

#[must_use]
pub(crate) fn is_legal_transition(from: WaitPhase, edge: WaitEdge, to: WaitPhase) -> bool {
    use WaitPhase::{Abandoned, Completed, Failed, Idle, Subscribed, TimedOut};

    match edge {
        WaitEdge::Subscribe => from == Idle && to == Subscribed,
        WaitEdge::Complete => from == Subscribed && to == Completed,
        WaitEdge::Fail => from == Subscribed && to == Failed,
        WaitEdge::TimeOut => from == Subscribed && to == TimedOut,
        WaitEdge::Abandon => from == Subscribed && to == Abandoned,
        WaitEdge::Release => from.is_terminal_event() && to == WaitPhase::Released,
    }
}
