//! Random policy: picks an eviction candidate by walking forward from the
//! sentinel to a randomly chosen index, skipping positions already claimed
//! for buffered write-back so a single pass cannot pick the same dirty
//! candidate twice.

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

/// A simple xorshift PRNG, good enough for eviction sampling and avoids a
/// dependency on a random-number crate for this single use.
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Rng(seed | 1)
    }

    fn next_below(&mut self, bound: usize) -> usize {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        (self.0 % bound as u64) as usize
    }
}

/// A Random page cache: `"Random"` in the [`crate::page::factory`] selector.
pub struct RandomCache<R, W> {
    skeleton: Skeleton<R>,
    writer: W,
    counters: CoreCounters,
    rng: Rng,
}

impl<R: Record + Clone, W: CacheWriter<R>> RandomCache<R, W> {
    /// Builds a new Random cache backed by `writer`.
    pub fn new(config: PageCacheConfig, writer: W) -> Result<Self> {
        Ok(RandomCache {
            skeleton: Skeleton::new(config.max_memory_kb())?,
            writer,
            counters: CoreCounters::default(),
            rng: Rng::new(0x9E37_79B9_7F4A_7C15),
        })
    }

    fn maybe_evict(&mut self) -> Result<()> {
        let RandomCache {
            skeleton,
            writer,
            rng,
            ..
        } = self;
        skeleton.run_eviction(writer, |sk, buffered, examined| {
            let total = sk.record_count();
            if total == 0 {
                return None;
            }
            // At most `total` attempts: every resident position is tried at
            // most once before giving up for this call.
            for _ in 0..total {
                *examined += 1;
                let index = rng.next_below(total);
                let mut cursor = sk.oldest();
                for _ in 0..index {
                    if cursor == NIL {
                        break;
                    }
                    cursor = sk.next_of(cursor);
                }
                if cursor == NIL {
                    continue;
                }
                let record = sk.record_at(cursor);
                if !record.can_remove() {
                    continue;
                }
                if buffered.contains(&record.pos()) {
                    continue;
                }
                return Some(cursor);
            }
            None
        })
    }
}

impl<R: Record + Clone, W: CacheWriter<R>> Cache<R> for RandomCache<R, W> {
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

impl<R: Record + Clone, W: CacheWriter<R>> CacheMetrics for RandomCache<R, W> {
    fn metrics(&self) -> BTreeMap<&'static str, u64> {
        let mut map = BTreeMap::new();
        self.counters.snapshot_into(&mut map);
        map.insert("record_count", self.skeleton.record_count() as u64);
        map.insert("memory_words", self.skeleton.memory());
        map.insert("max_memory_words", self.skeleton.max_memory());
        map
    }

    fn algorithm_name(&self) -> &'static str {
        "Random"
    }
}
