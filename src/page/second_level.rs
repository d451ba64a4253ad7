//! Second-level cache: wraps any base policy with a bounded backing tier
//! that gives evicted records a second chance to survive before they are
//! gone for good.
//!
//! The design speaks of a soft-referenced backing map that a garbage
//! collector reclaims under memory pressure. Rust has no such primitive
//! (§9's open question); the substitution named there is used here instead:
//! a small bounded map with its own FIFO eviction, so the backing tier has a
//! concrete, observable capacity rather than depending on a reclaimer this
//! crate doesn't have.

use crate::error::Result;
use crate::metrics::{CacheMetrics, CoreCounters};
use crate::page::record::Record;
use crate::page::Cache;
use alloc::collections::{BTreeMap, VecDeque};
use alloc::vec::Vec;

/// Default number of evicted records the backing tier retains before the
/// oldest is dropped for good. Chosen as a modest multiple of
/// `CACHE_MIN_RECORDS`; callers needing a different budget should configure
/// it through [`CacheSecondLevel::with_backing_capacity`].
const DEFAULT_BACKING_CAPACITY: usize = 256;

/// Wraps a base [`Cache`] with a bounded backing tier (`"SOFT_"` prefix in
/// the [`crate::page::factory`] selector).
pub struct CacheSecondLevel<R, C> {
    base: C,
    backing: BTreeMap<i32, R>,
    backing_order: VecDeque<i32>,
    backing_capacity: usize,
    counters: CoreCounters,
}

impl<R: Record + Clone, C: Cache<R>> CacheSecondLevel<R, C> {
    /// Wraps `base` with the default backing-tier capacity.
    pub fn new(base: C) -> Self {
        Self::with_backing_capacity(base, DEFAULT_BACKING_CAPACITY)
    }

    /// Wraps `base` with an explicit backing-tier capacity.
    pub fn with_backing_capacity(base: C, backing_capacity: usize) -> Self {
        CacheSecondLevel {
            base,
            backing: BTreeMap::new(),
            backing_order: VecDeque::new(),
            backing_capacity: backing_capacity.max(1),
            counters: CoreCounters::default(),
        }
    }

    fn backing_insert(&mut self, record: R) {
        let pos = record.pos();
        if self.backing.insert(pos, record).is_none() {
            self.backing_order.push_back(pos);
            while self.backing_order.len() > self.backing_capacity {
                if let Some(oldest) = self.backing_order.pop_front() {
                    self.backing.remove(&oldest);
                }
            }
        }
    }

    fn backing_remove(&mut self, pos: i32) {
        if self.backing.remove(&pos).is_some() {
            self.backing_order.retain(|&p| p != pos);
        }
    }

    /// Borrows the wrapped base cache.
    pub fn base(&self) -> &C {
        &self.base
    }
}

impl<R: Record + Clone, C: Cache<R>> Cache<R> for CacheSecondLevel<R, C> {
    fn get(&mut self, pos: i32) -> Option<&R> {
        if self.base.get(pos).is_some() {
            self.counters.record_hit();
            return self.base.find(pos);
        }
        // Miss in the base tier: probe the backing map and, if still
        // present, promote it back into the base before returning.
        if let Some(record) = self.backing.get(&pos).cloned() {
            self.backing_remove(pos);
            self.counters.record_hit();
            // `put` can fail only on a duplicate position, which cannot
            // happen here since the base just reported a miss.
            let _ = self.base.put(record);
            return self.base.find(pos);
        }
        self.counters.record_miss();
        None
    }

    fn find(&self, pos: i32) -> Option<&R> {
        self.base.find(pos).or_else(|| self.backing.get(&pos))
    }

    fn put(&mut self, record: R) -> Result<()> {
        self.backing_insert(record.clone());
        self.base.put(record)
    }

    fn update(&mut self, pos: i32, record: R) -> Result<Option<R>> {
        self.backing_insert(record.clone());
        self.base.update(pos, record)
    }

    fn remove(&mut self, pos: i32) -> bool {
        self.backing_remove(pos);
        self.base.remove(pos)
    }

    fn clear(&mut self) {
        self.backing.clear();
        self.backing_order.clear();
        self.base.clear();
    }

    fn set_max_memory(&mut self, kb: u64) -> Result<()> {
        self.base.set_max_memory(kb)
    }

    fn max_memory(&self) -> u64 {
        self.base.max_memory()
    }

    fn memory(&self) -> u64 {
        self.base.memory()
    }

    fn all_changed(&self) -> Vec<R> {
        // Backing-tier entries are evicted records, not dirty by definition.
        self.base.all_changed()
    }
}

impl<R: Record + Clone, C: Cache<R> + CacheMetrics> CacheMetrics for CacheSecondLevel<R, C> {
    fn metrics(&self) -> BTreeMap<&'static str, u64> {
        let mut map = self.base.metrics();
        self.counters.snapshot_into(&mut map);
        map.insert("backing_entries", self.backing.len() as u64);
        map
    }

    fn algorithm_name(&self) -> &'static str {
        "SOFT"
    }
}
