use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

/// An optional absolute point in time a suspending operation must resolve
/// by. `None` means "no deadline" — the operation only ever resolves on
/// completion or cancellation.
#[derive(Clone, Copy, Debug)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    pub const fn none() -> Self {
        Self(None)
    }

    pub fn after(timeout: Duration) -> Self {
        Self(Some(Instant::now() + timeout))
    }

    pub fn at(instant: Instant) -> Self {
        Self(Some(instant))
    }

    pub fn instant(&self) -> Option<Instant> {
        self.0
    }

    pub fn is_expired(&self) -> bool {
        matches!(self.0, Some(at) if at <= Instant::now())
    }

    /// Remaining time until the deadline, or `None` if there is none. A
    /// deadline already in the past reports `Duration::ZERO`, not an error —
    /// callers check `is_expired` first.
    pub fn remaining(&self) -> Option<Duration> {
        self.0
            .map(|at| at.saturating_duration_since(Instant::now()))
    }
}

/// Bundles the two things every suspending call in this workspace needs to
/// honor: a deadline and a cancellation token. Cheap to clone — the token is
/// reference counted and the deadline is a plain value.
///
/// `CallContext::child` derives a token tied to the parent's lifetime, so
/// cancelling an outer context (e.g. closing a `Connection`) cancels every
/// in-flight operation it spawned without each call site needing to know
/// about the relationship explicitly.
#[derive(Clone, Debug)]
pub struct CallContext {
    deadline: Deadline,
    cancellation: CancellationToken,
}

impl CallContext {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            deadline: timeout.map(Deadline::after).unwrap_or(Deadline::none()),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(timeout: Option<Duration>, cancellation: CancellationToken) -> Self {
        Self {
            deadline: timeout.map(Deadline::after).unwrap_or(Deadline::none()),
            cancellation,
        }
    }

    pub fn child(&self) -> Self {
        Self {
            deadline: self.deadline,
            cancellation: self.cancellation.child_token(),
        }
    }

    /// Derives a child context whose deadline is the earlier of this
    /// context's own deadline and `timeout` from now. Used at call sites
    /// that hold a per-operation timeout (e.g. `ConnectionOptions`'s
    /// `connect_timeout`/`read_timeout`/`write_timeout`) alongside a
    /// caller-supplied `CallContext` that may already carry a tighter
    /// deadline or an outer cancellation — neither is allowed to widen the
    /// other.
    pub fn bounded_by(&self, timeout: Option<Duration>) -> Self {
        let child = self.child();
        let bound = match timeout {
            Some(timeout) => Deadline::at(Instant::now() + timeout),
            None => return child,
        };
        let deadline = match child.deadline.instant() {
            Some(existing) => Deadline::at(existing.min(bound.instant().unwrap())),
            None => bound,
        };
        Self {
            deadline,
            cancellation: child.cancellation,
        }
    }

    pub fn deadline(&self) -> Deadline {
        self.deadline
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_after_reports_remaining_time() {
        let deadline = Deadline::after(Duration::from_millis(50));
        assert!(!deadline.is_expired());
        assert!(deadline.remaining().unwrap() <= Duration::from_millis(50));
    }

    #[test]
    fn deadline_none_never_expires() {
        let deadline = Deadline::none();
        assert!(!deadline.is_expired());
        assert!(deadline.remaining().is_none());
    }

    #[test]
    fn child_context_is_cancelled_when_parent_is() {
        let parent = CallContext::new(None);
        let child = parent.child();
        assert!(!child.is_cancelled());
        parent.cancel();
        assert!(child.is_cancelled());
    }

    #[test]
    fn bounded_by_tightens_an_unbounded_context() {
        let parent = CallContext::new(None);
        let bounded = parent.bounded_by(Some(Duration::from_millis(20)));
        assert!(bounded.deadline().remaining().unwrap() <= Duration::from_millis(20));
    }

    #[test]
    fn bounded_by_never_widens_an_existing_tighter_deadline() {
        let parent = CallContext::new(Some(Duration::from_millis(10)));
        let bounded = parent.bounded_by(Some(Duration::from_secs(60)));
        assert!(bounded.deadline().remaining().unwrap() <= Duration::from_millis(10));
    }

    #[test]
    fn bounded_by_none_keeps_the_parent_deadline() {
        let parent = CallContext::new(Some(Duration::from_millis(10)));
        let bounded = parent.bounded_by(None);
        assert!(bounded.deadline().remaining().unwrap() <= Duration::from_millis(10));
    }
}
