use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Where the current request is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,

    /// The request was sent, no response has been accepted yet.
    Sending,

    /// Response events are being received.
    Streaming,

    Completed,
    Aborted,
    Failed,
}

/// What [`AbortHandle::toggle`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// A running request was cancelled.
    Aborted,

    /// Nothing was running; the caller should submit.
    Submit,
}

#[derive(Debug, Default)]
struct Active {
    phase: Phase,
    token: Option<CancellationToken>,
}

/// A shareable handle to the active request of a [`Chat`](crate::Chat).
///
/// This is the only part of a chat that can be used from another task, e.g.
/// a signal handler cancelling the request while it streams.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    active: Arc<Mutex<Active>>,
}

impl AbortHandle {
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.active.lock().phase
    }

    /// Cancel the active request.
    ///
    /// Returns `false` if there is nothing to cancel.
    pub fn abort(&self) -> bool {
        let active = self.active.lock();
        match &active.token {
            Some(token) if !token.is_cancelled() => {
                debug!(phase = ?active.phase, "Aborting request.");
                token.cancel();
                true
            }
            _ => false,
        }
    }

    /// Abort the active request, or tell the caller to submit one.
    pub fn toggle(&self) -> Toggle {
        if self.abort() {
            Toggle::Aborted
        } else {
            Toggle::Submit
        }
    }

    /// Start a request, returning its cancellation token.
    ///
    /// The request ends when the returned guard is dropped.
    pub(crate) fn begin(&self) -> (ActiveGuard, CancellationToken) {
        let token = CancellationToken::new();
        let mut active = self.active.lock();
        active.token = Some(token.clone());
        active.phase = Phase::Sending;
        drop(active);

        (
            ActiveGuard {
                handle: self.clone(),
            },
            token,
        )
    }

    pub(crate) fn set_phase(&self, phase: Phase) {
        let mut active = self.active.lock();
        trace!(from = ?active.phase, to = ?phase, "Request phase changed.");
        active.phase = phase;
    }
}

/// Returns the handle to [`Phase::Idle`] when dropped, also if the request
/// future itself is dropped half-way.
pub(crate) struct ActiveGuard {
    handle: AbortHandle,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        let mut active = self.handle.active.lock();
        trace!(from = ?active.phase, "Request ended.");
        active.token = None;
        active.phase = Phase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_abort_when_idle_is_noop() {
        let handle = AbortHandle::default();

        assert!(!handle.abort());
        assert_eq!(handle.toggle(), Toggle::Submit);
        assert_eq!(handle.phase(), Phase::Idle);
    }

    #[test]
    fn test_abort_cancels_once() {
        let handle = AbortHandle::default();
        let (guard, token) = handle.begin();

        assert_eq!(handle.phase(), Phase::Sending);
        assert_eq!(handle.toggle(), Toggle::Aborted);
        assert!(token.is_cancelled());
        assert!(!handle.abort());

        drop(guard);
        assert_eq!(handle.phase(), Phase::Idle);
    }

    #[test]
    fn test_clones_share_state() {
        let handle = AbortHandle::default();
        let other = handle.clone();
        let (_guard, token) = handle.begin();
        handle.set_phase(Phase::Streaming);

        assert_eq!(other.phase(), Phase::Streaming);
        assert!(other.abort());
        assert!(token.is_cancelled());
    }
}
