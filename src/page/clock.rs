//! Clock (second-chance) policy: a single hand sweeps the list looking for
//! a candidate whose `been_read()` bit is set, giving any record touched
//! since the hand last passed it one more circuit before eviction.
//!
//! The bit itself is owned and flipped by whatever reads the cached value,
//! not by this module — see [`crate::page::record::Record::been_read`].

use crate::arena::{Handle, NIL};
use crate::error::Result;
use crate::metrics::{CacheMetrics, CoreCounters};
use crate::page::config::PageCacheConfig;
use crate::page::record::Record;
use crate::page::skeleton::Skeleton;
use crate::page::writer::CacheWriter;
use crate::page::Cache;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;

/// A Clock page cache: `"Clock"` in the [`crate::page::factory`] selector.
pub struct ClockCache<R, W> {
    skeleton: Skeleton<R>,
    writer: W,
    counters: CoreCounters,
    /// Position of the next candidate the hand should examine, or `None`
    /// once the hand has fallen off the newest end and should restart from
    /// `oldest()`. Storing the position rather than a raw [`Handle`] avoids
    /// the hand going stale when its handle's arena slot gets recycled by
    /// an unrelated insert between eviction passes.
    hand_pos: Option<i32>,
}

impl<R: Record + Clone, W: CacheWriter<R>> ClockCache<R, W> {
    /// Builds a new Clock cache backed by `writer`.
    pub fn new(config: PageCacheConfig, writer: W) -> Result<Self> {
        Ok(ClockCache {
            skeleton: Skeleton::new(config.max_memory_kb())?,
            writer,
            counters: CoreCounters::default(),
            hand_pos: None,
        })
    }

    fn maybe_evict(&mut self) -> Result<()> {
        let ClockCache {
            skeleton,
            writer,
            hand_pos,
            ..
        } = self;
        skeleton.run_eviction(writer, |sk, _buffered, examined| {
            let total = sk.record_count();
            if total == 0 {
                return None;
            }
            let mut cursor: Handle = hand_pos
                .and_then(|pos| sk.handle_of(pos))
                .unwrap_or_else(|| sk.oldest());
            let mut steps = 0usize;
            loop {
                if cursor == NIL {
                    cursor = sk.oldest();
                    if cursor == NIL {
                        return None;
                    }
                }
                steps += 1;
                *examined += 1;
                let record = sk.record_at(cursor);
                if record.can_remove() && record.been_read() {
                    let next = sk.next_of(cursor);
                    *hand_pos = if next != NIL {
                        Some(sk.record_at(next).pos())
                    } else {
                        None
                    };
                    return Some(cursor);
                }
                if steps >= total {
                    return None;
                }
                cursor = sk.next_of(cursor);
            }
        })
    }
}

impl<R: Record + Clone, W: CacheWriter<R>> Cache<R> for ClockCache<R, W> {
    fn get(&mut self, pos: i32) -> Option<&R> {
        match self.skeleton.handle_of(pos) {
            Some(handle) => {
                self.counters.record_hit();
                Some(self.skeleton.record_at(handle))
            }
            None => {
                self.counters.record_miss();
                None
            }
        }
    }

    fn find(&self, pos: i32) -> Option<&R> {
        self.skeleton.find(pos)
    }

    fn put(&mut self, record: R) -> Result<()> {
        let handle = self.skeleton.insert_new(record)?;
        self.maybe_evict()?;
        self.skeleton.attach_as_newest(handle);
        Ok(())
    }

    fn update(&mut self, pos: i32, record: R) -> Result<Option<R>> {
        match self.skeleton.handle_of(pos) {
            None => {
                self.put(record)?;
                Ok(None)
            }
            Some(handle) => {
                let old = self.skeleton.replace_record(handle, record);
                self.maybe_evict()?;
                Ok(Some(old))
            }
        }
    }

    fn remove(&mut self, pos: i32) -> bool {
        if self.hand_pos == Some(pos) {
            self.hand_pos = None;
        }
        self.skeleton.remove_by_pos(pos).is_some()
    }

    fn clear(&mut self) {
        self.skeleton.clear();
        self.hand_pos = None;
    }

    fn set_max_memory(&mut self, kb: u64) -> Result<()> {
        self.skeleton.set_max_memory((kb.saturating_mul(1024)) / 4);
        self.maybe_evict()
    }

    fn max_memory(&self) -> u64 {
        self.skeleton.max_memory() * 4 / 1024
    }

    fn memory(&self) -> u64 {
        self.skeleton.memory() * 4 / 1024
    }

    fn all_changed(&self) -> Vec<R> {
        self.skeleton.all_changed().into_iter().cloned().collect()
    }
}

impl<R: Record + Clone, W: CacheWriter<R>> CacheMetrics for ClockCache<R, W> {
    fn metrics(&self) -> BTreeMap<&'static str, u64> {
        let mut map = BTreeMap::new();
        self.counters.snapshot_into(&mut map);
        map.insert("record_count", self.skeleton.record_count() as u64);
        map.insert("memory_words", self.skeleton.memory());
        map.insert("max_memory_words", self.skeleton.max_memory());
        map
    }

    fn algorithm_name(&self) -> &'static str {
        "Clock"
    }
}
