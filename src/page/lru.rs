//! Least Recently Used policy: evicts from the oldest end of the list;
//! `get`, `put`, and identity-preserving `update` all bump the touched
//! record to the newest end.

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

/// An LRU page cache: `"LRU"` in the [`crate::page::factory`] selector.
pub struct LruCache<R, W> {
    skeleton: Skeleton<R>,
    writer: W,
    counters: CoreCounters,
}

impl<R: Record + Clone, W: CacheWriter<R>> LruCache<R, W> {
    /// Builds a new LRU cache backed by `writer`.
    pub fn new(config: PageCacheConfig, writer: W) -> Result<Self> {
        Ok(LruCache {
            skeleton: Skeleton::new(config.max_memory_kb())?,
            writer,
            counters: CoreCounters::default(),
        })
    }

    fn maybe_evict(&mut self) -> Result<()> {
        let LruCache {
            skeleton,
            writer,
            counters,
        } = self;
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

impl<R: Record + Clone, W: CacheWriter<R>> Cache<R> for LruCache<R, W> {
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
        // The new record is indexed (and counted against memory/record_count)
        // before the eviction pass runs, but only attached to the policy
        // list afterward, so a just-inserted record can itself become the
        // prime eviction candidate next time around rather than shielding
        // itself from the pass that its own insertion triggered.
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

impl<R: Record + Clone, W: CacheWriter<R>> CacheMetrics for LruCache<R, W> {
    fn metrics(&self) -> BTreeMap<&'static str, u64> {
        let mut map = BTreeMap::new();
        self.counters.snapshot_into(&mut map);
        map.insert("record_count", self.skeleton.record_count() as u64);
        map.insert("memory_words", self.skeleton.memory());
        map.insert("max_memory_words", self.skeleton.max_memory());
        map
    }

    fn algorithm_name(&self) -> &'static str {
        "LRU"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::writer::{NullTrace, Trace};

    #[derive(Clone)]
    struct PageRecord {
        pos: i32,
        memory: i32,
        changed: bool,
    }

    impl Record for PageRecord {
        fn pos(&self) -> i32 {
            self.pos
        }
        fn memory(&self) -> i32 {
            self.memory
        }
        fn is_changed(&self) -> bool {
            self.changed
        }
        fn can_remove(&self) -> bool {
            true
        }
    }

    struct LoggingWriter {
        log: alloc::string::String,
        trace: NullTrace,
    }

    impl LoggingWriter {
        fn new() -> Self {
            LoggingWriter {
                log: alloc::string::String::new(),
                trace: NullTrace,
            }
        }
    }

    impl CacheWriter<PageRecord> for LoggingWriter {
        fn flush_log(&mut self) -> Result<()> {
            self.log.push_str("flush ");
            Ok(())
        }
        fn write_back(&mut self, record: &PageRecord) -> Result<()> {
            self.log.push_str(&alloc::format!("{} ", record.pos));
            Ok(())
        }
        fn trace(&self) -> &dyn Trace {
            &self.trace
        }
    }

    fn page(pos: i32, memory: i32, changed: bool) -> PageRecord {
        PageRecord {
            pos,
            memory,
            changed,
        }
    }

    /// Scenario 1 from the design's testable-properties section: max memory
    /// 16 KiB, 1024-word records `pos=0..19`, all dirty and removable.
    #[test]
    fn lru_eviction_ordering_flushes_oldest_first() {
        let mut cache = LruCache::new(PageCacheConfig::new(16), LoggingWriter::new()).unwrap();
        for pos in 0..20 {
            cache.put(page(pos, 1024, true)).unwrap();
        }
        assert!(cache.writer.log.contains("flush 0 flush 1 flush 2 flush 3 "));
    }

    #[test]
    fn get_promotes_to_newest() {
        let mut cache = LruCache::new(PageCacheConfig::new(16), LoggingWriter::new()).unwrap();
        cache.put(page(1, 4, false)).unwrap();
        cache.put(page(2, 4, false)).unwrap();
        cache.get(1);
        assert_eq!(cache.skeleton.newest(), cache.skeleton.handle_of(1).unwrap());
    }

    #[test]
    fn remove_then_find_returns_none() {
        let mut cache = LruCache::new(PageCacheConfig::new(16), LoggingWriter::new()).unwrap();
        cache.put(page(1, 4, false)).unwrap();
        assert!(cache.remove(1));
        assert!(cache.find(1).is_none());
    }

    #[test]
    fn update_returns_prior_record() {
        let mut cache = LruCache::new(PageCacheConfig::new(16), LoggingWriter::new()).unwrap();
        cache.put(page(1, 4, false)).unwrap();
        let old = cache.update(1, page(1, 8, true)).unwrap();
        assert_eq!(old.unwrap().memory, 4);
        assert_eq!(cache.find(1).unwrap().memory, 8);
    }

    #[test]
    fn duplicate_put_is_an_error() {
        let mut cache = LruCache::new(PageCacheConfig::new(16), LoggingWriter::new()).unwrap();
        cache.put(page(1, 4, false)).unwrap();
        assert!(cache.put(page(1, 4, false)).is_err());
    }
}
