//! Single-flight guard for snapshot fetches
//!
//! A refetch storm (realtime events landing while a fetch is already out)
//! must not stack HTTP requests. The guard admits one fetch at a time per
//! feed instance; callers that lose the race skip their fetch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Admission control for at most one in-flight fetch
#[derive(Debug, Clone, Default)]
pub struct InflightGuard {
    busy: Arc<AtomicBool>,
}

impl InflightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to claim the in-flight slot
    ///
    /// Returns a token while the slot is free; the slot is released when
    /// the token drops, including on early return and panic.
    pub fn begin(&self) -> Option<InflightToken> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InflightToken {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn in_flight(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// RAII claim on the in-flight slot
#[derive(Debug)]
pub struct InflightToken {
    busy: Arc<AtomicBool>,
}

impl Drop for InflightToken {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_loses_while_token_held() {
        let guard = InflightGuard::new();
        let token = guard.begin();
        assert!(token.is_some());
        assert!(guard.in_flight());
        assert!(guard.begin().is_none());
    }

    #[test]
    fn dropping_the_token_releases_the_slot() {
        let guard = InflightGuard::new();
        drop(guard.begin());
        assert!(!guard.in_flight());
        assert!(guard.begin().is_some());
    }

    #[test]
    fn clones_share_the_slot() {
        let guard = InflightGuard::new();
        let other = guard.clone();
        let _token = guard.begin().unwrap();
        assert!(other.in_flight());
        assert!(other.begin().is_none());
    }
}
