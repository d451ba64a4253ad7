//! First-In-First-Out policy: evicts from the oldest end of the list, like
//! LRU, but `get`/`update` never reorder the list — only insertion order
//! determines eviction order.

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

/// A FIFO page cache: `"FIFO"` in the [`crate::page::factory`] selector.
pub struct FifoCache<R, W> {
    skeleton: Skeleton<R>,
    writer: W,
    counters: CoreCounters,
}

impl<R: Record + Clone, W: CacheWriter<R>> FifoCache<R, W> {
    /// Builds a new FIFO cache backed by `writer`.
    pub fn new(config: PageCacheConfig, writer: W) -> Result<Self> {
        Ok(FifoCache {
            skeleton: Skeleton::new(config.max_memory_kb())?,
            writer,
            counters: CoreCounters::default(),
        })
    }

    fn maybe_evict(&mut self) -> Result<()> {
        let FifoCache { skeleton, writer, counters } = self;
        let (evicted, writebacks) = skeleton.run_eviction(writer, |sk, _buffered, examined| {
            let mut cursor = sk.oldest();
            while cursor != NIL {
                *examined += 1;
                if sk.record_at(cursor).can_remove() {
                    return Some(cursor);
                }
                let next = sk.next_of(cursor);
                sk.move_to_newest(cursor);
                cursor = next;
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

impl<R: Record + Clone, W: CacheWriter<R>> Cache<R> for FifoCache<R, W> {
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
        // See `LruCache::put`: the eviction pass runs against the list
        // state from before this record joins it.
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

impl<R: Record + Clone, W: CacheWriter<R>> CacheMetrics for FifoCache<R, W> {
    fn metrics(&self) -> BTreeMap<&'static str, u64> {
        let mut map = BTreeMap::new();
        self.counters.snapshot_into(&mut map);
        map.insert("record_count", self.skeleton.record_count() as u64);
        map.insert("memory_words", self.skeleton.memory());
        map.insert("max_memory_words", self.skeleton.max_memory());
        map
    }

    fn algorithm_name(&self) -> &'static str {
        "FIFO"
    }
}
