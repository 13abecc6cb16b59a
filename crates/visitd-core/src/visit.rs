//! Visit records and aggregated counters.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};

use crate::clock;

/// A single recorded visit.
///
/// Immutable once created: the hour label is fixed at record time in the
/// site timezone (see [`crate::clock`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitRecord {
    hour: String,
    source: String,
    user_agent: String,
}

impl VisitRecord {
    /// Creates a record stamped at `at`.
    pub fn new(
        at: DateTime<FixedOffset>,
        source: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            hour: clock::hour_label(at),
            source: source.into(),
            user_agent: user_agent.into(),
        }
    }

    /// The "HH:MM" bucket this visit falls into.
    pub fn hour(&self) -> &str {
        &self.hour
    }

    /// Source address of the visitor (forwarded-for value or peer address).
    pub fn source(&self) -> &str {
        &self.source
    }

    /// User agent reported by the visitor.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

/// Aggregated visit counters: running total, per-bucket histogram, and the
/// visitor detail list in arrival order.
///
/// Fields are private; the only mutators are [`VisitCounters::record`] and
/// [`VisitCounters::take`], which keep
/// `total == sum(hourly) == details.len()` by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitCounters {
    total: u64,
    hourly: BTreeMap<String, u64>,
    details: Vec<VisitRecord>,
}

impl VisitCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one visit into the counters.
    pub fn record(&mut self, visit: VisitRecord) {
        self.total += 1;
        *self.hourly.entry(visit.hour.clone()).or_insert(0) += 1;
        self.details.push(visit);
    }

    /// Total number of visits since the last drain.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Per-bucket histogram, iterated in ascending "HH:MM" order.
    pub fn hourly(&self) -> &BTreeMap<String, u64> {
        &self.hourly
    }

    /// Detail records in arrival order.
    pub fn details(&self) -> &[VisitRecord] {
        &self.details
    }

    /// True when nothing has been recorded since the last drain.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Returns the accumulated counters, leaving this value empty.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}
