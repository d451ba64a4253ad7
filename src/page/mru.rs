//! Most Recently Used policy: evicts from the newest end of the list instead
//! of the oldest, on the theory that a record touched (or just inserted)
//! immediately before a memory squeeze is the one least likely to be needed
//! again soon — the classic answer to sequential-scan workloads that defeat
//! LRU.

use crate::arena::NIL;
use crate::error::Result;
use crate::metrics::{CacheMetrics, CoreCounters};
use crate::page::config::PageCacheConfig;
use crate::page::record::Record;
use crate::page::skeleton::Skeleton;
use crate::page::writer::CacheWriter;
use crate::page::Cache;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;

/// An MRU page cache: `"MRU"` in the [`crate::page::factory`] selector.
pub struct MruCache<R, W> {
    skeleton: Skeleton<R>,
    writer: W,
    counters: CoreCounters,
}

impl<R: Record + Clone, W: CacheWriter<R>> MruCache<R, W> {
    /// Builds a new MRU cache backed by `writer`.
    pub fn new(config: PageCacheConfig, writer: W) -> Result<Self> {
        Ok(MruCache {
            skeleton: Skeleton::new(config.max_memory_kb())?,
            writer,
            counters: CoreCounters::default(),
        })
    }

    fn maybe_evict(&mut self) -> Result<()> {
        let MruCache { skeleton, writer, counters } = self;
        let (evicted, writebacks) = skeleton.run_eviction(writer, |sk, _buffered, examined| {
            let mut cursor = sk.newest();
            while cursor != NIL {
                *examined += 1;
                if sk.record_at(cursor).can_remove() {
                    return Some(cursor);
                }
                let prev = sk.prev_of(cursor);
                sk.move_to_oldest(cursor);
                cursor = prev;
            }
            None
        })?;
        for _ in 0..evicted {
            counters.record_eviction();
        }
        for _ in 0..writebacks {
            counters.record_writeback();
        }
        Ok(())
    }
}

impl<R: Record + Clone, W: CacheWriter<R>> Cache<R> for MruCache<R, W> {
    fn get(&mut self, pos: i32) -> Option<&R> {
        match self.skeleton.handle_of(pos) {
            Some(handle) => {
                self.skeleton.move_to_newest(handle);
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
        // As with LRU/FIFO, the new record is indexed first and only
        // attached to the list after the eviction pass runs. For MRU this
        // matters even more: the pass examines the *previous* newest
        // record, not the one just inserted, so a burst of puts evicts the
        // one-before-last insertion each time rather than immediately
        // evicting the record it just made resident.
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
                self.skeleton.move_to_newest(handle);
                self.maybe_evict()?;
                Ok(Some(old))
            }
        }
    }

    fn remove(&mut self, pos: i32) -> bool {
        self.skeleton.remove_by_pos(pos).is_some()
    }

    fn clear(&mut self) {
        self.skeleton.clear();
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

impl<R: Record + Clone, W: CacheWriter<R>> CacheMetrics for MruCache<R, W> {
    fn metrics(&self) -> BTreeMap<&'static str, u64> {
        let mut map = BTreeMap::new();
        self.counters.snapshot_into(&mut map);
        map.insert("record_count", self.skeleton.record_count() as u64);
        map.insert("memory_words", self.skeleton.memory());
        map.insert("max_memory_words", self.skeleton.max_memory());
        map
    }

    fn algorithm_name(&self) -> &'static str {
        "MRU"
    }
}
