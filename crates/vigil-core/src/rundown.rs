//! Rundown protection: admission gate plus drain barrier for shutdown.
//!
//! State lives in one atomic word: bit 0 is the draining flag, the remaining
//! bits count admitted work. Admission and the draining transition therefore
//! can never interleave: once the flag is set, no `acquire` succeeds.
//!
//! `Active -> Draining -> Drained`, one direction only.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

use crate::error::{Result, VigilError};

const DRAINING: usize = 1;
const ONE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RundownState {
    Active,
    Draining,
    Drained,
}

#[derive(Debug, Default)]
pub struct RundownGuard {
    state: AtomicUsize,
    drained: Notify,
}

impl RundownGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit one unit of work. Fails without side effects once draining.
    pub fn acquire(&self) -> bool {
        let mut cur = self.state.load(Ordering::Acquire);
        loop {
            if cur & DRAINING != 0 {
                return false;
            }
            match self.state.compare_exchange_weak(
                cur,
                cur + ONE,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => cur = actual,
            }
        }
    }

    /// Release one unit admitted by `acquire`. Wakes the waiter when the last
    /// unit leaves after draining began.
    pub fn release(&self) {
        let prev = self.state.fetch_sub(ONE, Ordering::AcqRel);
        debug_assert!(prev >= ONE, "rundown release without acquire");
        if prev == DRAINING | ONE {
            self.drained.notify_waiters();
        }
    }

    /// Scoped admission. The returned permit releases on drop, on every exit
    /// path of the holder.
    pub fn enter(self: &Arc<Self>) -> Result<RundownPermit> {
        if self.acquire() {
            Ok(RundownPermit {
                guard: Arc::clone(self),
            })
        } else {
            Err(VigilError::AdmissionDenied)
        }
    }

    /// Stop admitting new work. Idempotent.
    pub fn initiate_shutdown(&self) {
        let prev = self.state.fetch_or(DRAINING, Ordering::AcqRel);
        if prev & DRAINING == 0 {
            tracing::debug!(in_flight = prev / ONE, "rundown draining");
            if prev == 0 {
                self.drained.notify_waiters();
            }
        }
    }

    /// Resolve once draining has begun and all admitted work has released.
    pub async fn wait(&self) {
        loop {
            let mut notified = std::pin::pin!(self.drained.notified());
            notified.as_mut().enable();

            if self.state() == RundownState::Drained {
                return;
            }
            notified.await;
        }
    }

    /// `initiate_shutdown` followed by `wait`.
    pub async fn shutdown(&self) {
        self.initiate_shutdown();
        self.wait().await;
    }

    pub fn in_flight(&self) -> usize {
        self.state.load(Ordering::Acquire) / ONE
    }

    pub fn state(&self) -> RundownState {
        let s = self.state.load(Ordering::Acquire);
        match (s & DRAINING != 0, s / ONE) {
            (false, _) => RundownState::Active,
            (true, 0) => RundownState::Drained,
            (true, _) => RundownState::Draining,
        }
    }
}

/// Admitted slot. Dropping it releases the slot.
#[derive(Debug)]
pub struct RundownPermit {
    guard: Arc<RundownGuard>,
}

impl Drop for RundownPermit {
    fn drop(&mut self) {
        self.guard.release();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn acquire_fails_after_shutdown() {
        let g = RundownGuard::new();
        assert!(g.acquire());
        g.initiate_shutdown();
        assert!(!g.acquire());
        assert!(!g.acquire());
        assert_eq!(g.in_flight(), 1);
        assert_eq!(g.state(), RundownState::Draining);

        g.release();
        assert_eq!(g.state(), RundownState::Drained);
    }

    #[test]
    fn initiate_shutdown_is_idempotent() {
        let g = RundownGuard::new();
        g.initiate_shutdown();
        g.initiate_shutdown();
        assert_eq!(g.state(), RundownState::Drained);
        assert_eq!(g.in_flight(), 0);
    }

    #[test]
    fn permit_releases_on_drop() {
        let g = Arc::new(RundownGuard::new());
        {
            let _p = g.enter().unwrap();
            assert_eq!(g.in_flight(), 1);
        }
        assert_eq!(g.in_flight(), 0);

        g.initiate_shutdown();
        assert!(matches!(g.enter(), Err(VigilError::AdmissionDenied)));
    }

    #[tokio::test]
    async fn wait_returns_immediately_when_idle() {
        let g = RundownGuard::new();
        tokio::time::timeout(Duration::from_millis(100), g.shutdown())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn wait_blocks_until_last_release() {
        let g = Arc::new(RundownGuard::new());
        let a = g.enter().unwrap();
        let b = g.enter().unwrap();

        g.initiate_shutdown();
        let waiter = tokio::spawn({
            let g = Arc::clone(&g);
            async move { g.wait().await }
        });

        drop(a);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!waiter.is_finished());

        drop(b);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(g.state(), RundownState::Drained);
    }

    #[tokio::test]
    async fn wait_started_before_shutdown_resolves_after_it() {
        let g = Arc::new(RundownGuard::new());
        let waiter = tokio::spawn({
            let g = Arc::clone(&g);
            async move { g.wait().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        g.initiate_shutdown();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
