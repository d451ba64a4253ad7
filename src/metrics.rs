//! Deterministic metrics snapshots, shared by both cache cores.
//!
//! Mirrors the shape the wider cache-rs family has always used: a
//! `BTreeMap` rather than a `HashMap` so two snapshots of an unchanged cache
//! compare equal and print in the same order, which matters for tests and
//! for diffing operational dashboards.

use alloc::collections::BTreeMap;

/// A cache or segment that can report a point-in-time metrics snapshot.
pub trait CacheMetrics {
    /// Returns a deterministic snapshot of this cache's counters.
    fn metrics(&self) -> BTreeMap<&'static str, u64>;

    /// Name of the replacement policy, for labeling dashboards and logs.
    fn algorithm_name(&self) -> &'static str;
}

/// Running counters shared by every Core A policy.
///
/// Policies embed this struct and update it from their `get`/`put`/eviction
/// paths; [`CacheMetrics::metrics`] implementations flatten it into the
/// public snapshot shape.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct CoreCounters {
    pub(crate) hits: u64,
    pub(crate) misses: u64,
    pub(crate) evictions: u64,
    pub(crate) writebacks: u64,
}

impl CoreCounters {
    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub(crate) fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub(crate) fn record_writeback(&mut self) {
        self.writebacks += 1;
    }

    pub(crate) fn snapshot_into(&self, map: &mut BTreeMap<&'static str, u64>) {
        map.insert("hits", self.hits);
        map.insert("misses", self.misses);
        map.insert("evictions", self.evictions);
        map.insert("writebacks", self.writebacks);
    }
}
