//! Visit registry - the single owner of mutable visit state.
//!
//! All counters live behind one mutex. Handlers and the scheduler share
//! the registry through an `Arc`; every operation takes the lock for its
//! full duration and completes in microseconds. The lock is never held
//! across an `.await` point or any I/O - report sending always works on a
//! copy obtained from [`VisitRegistry::snapshot`] or
//! [`VisitRegistry::drain_and_reset`].

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use visitd_core::{clock, VisitCounters, VisitRecord};

/// Shared in-memory visit state.
///
/// Created once at startup, empty, and shared as `Arc<VisitRegistry>`
/// between the HTTP handlers and the report scheduler.
#[derive(Debug, Default)]
pub struct VisitRegistry {
    counters: Mutex<VisitCounters>,
}

impl VisitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one visit stamped with the current site-local time.
    ///
    /// Atomic with respect to concurrent callers: the total, the hourly
    /// histogram, and the detail list move together under the lock.
    pub fn record_visit(&self, source: &str, user_agent: &str) -> VisitRecord {
        let visit = VisitRecord::new(clock::local_now(), source, user_agent);

        let total = {
            let mut counters = self.lock();
            counters.record(visit.clone());
            counters.total()
        };

        debug!(
            hour = visit.hour(),
            source = visit.source(),
            user_agent = visit.user_agent(),
            total,
            "Visit recorded"
        );

        visit
    }

    /// Read-only copy of the current counters. Does not mutate state.
    pub fn snapshot(&self) -> VisitCounters {
        self.lock().clone()
    }

    /// Atomically captures the current counters and resets them to empty.
    ///
    /// Any visit recorded before this call begins is in the returned
    /// snapshot exactly once; any visit recorded after it returns lands
    /// in the fresh counters.
    pub fn drain_and_reset(&self) -> VisitCounters {
        self.lock().take()
    }

    /// Recovers the guard even if a previous holder panicked. Counters are
    /// never left mid-update: all mutation happens inside
    /// `VisitCounters::record`, which cannot panic.
    fn lock(&self) -> MutexGuard<'_, VisitCounters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
