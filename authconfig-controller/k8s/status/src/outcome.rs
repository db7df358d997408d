use kube::runtime::controller::Action;
use std::time::Duration;

/// The successful result of a reconciliation.
///
/// Failures are reported through [`Error`](crate::Error) instead, and the
/// dispatcher applies its own backoff to them, so a reconciliation never asks
/// for both a retry and a requeue.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing more to do until the AuthConfig changes.
    Done,

    /// The AuthConfig is managed but the cache has not caught up yet; check
    /// again after the given delay.
    Requeue(Duration),
}

impl From<Outcome> for Action {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Done => Action::await_change(),
            Outcome::Requeue(delay) => Action::requeue(delay),
        }
    }
}
