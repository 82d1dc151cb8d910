//! Liveness flag shared between a client handle and its transport callbacks.

use std::sync::atomic::{AtomicBool, Ordering};

use super::ClientStatus;

/// One-way `disconnected` flag.
///
/// Written from transport callbacks on arbitrary threads and read by the
/// bridge tick. The flag is only ever stored `true`, so a reader can see
/// the transition early or late but never see it undone.
#[derive(Debug, Default)]
pub struct ClientLiveness {
    disconnected: AtomicBool,
}

impl ClientLiveness {
    /// Create a flag in the `Connected` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the client disconnected.
    ///
    /// Idempotent. Returns true only for the call that performed the
    /// transition.
    pub fn mark_disconnected(&self) -> bool {
        !self.disconnected.swap(true, Ordering::AcqRel)
    }

    /// Whether any disconnect, error or timeout has been observed.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::Acquire)
    }

    /// Snapshot of the flag as a lifecycle status.
    pub fn status(&self) -> ClientStatus {
        if self.is_disconnected() {
            ClientStatus::Disconnected
        } else {
            ClientStatus::Connected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn starts_connected() {
        let liveness = ClientLiveness::new();
        assert!(!liveness.is_disconnected());
        assert_eq!(liveness.status(), ClientStatus::Connected);
    }

    #[test]
    fn mark_disconnected_is_idempotent() {
        let liveness = ClientLiveness::new();
        assert!(liveness.mark_disconnected());
        assert!(!liveness.mark_disconnected());
        assert!(!liveness.mark_disconnected());
        assert_eq!(liveness.status(), ClientStatus::Disconnected);
    }

    #[test]
    fn exactly_one_thread_wins_the_transition() {
        let liveness = Arc::new(ClientLiveness::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let liveness = Arc::clone(&liveness);
                thread::spawn(move || liveness.mark_disconnected())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
        assert!(liveness.is_disconnected());
    }
}
