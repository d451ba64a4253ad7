//! The sharded, concurrent LIRS cache: one [`Segment`] per shard behind its
//! own `parking_lot::Mutex`, selected by the high bits of a mixed 64-bit key
//! hash.
//!
//! `Box<[Mutex<Segment<..>>]>` with the total memory budget split evenly
//! across segments and `segment_index` computed once per call to lock
//! exactly one shard — a fixed power-of-two segment count selected by the
//! high bits of a dedicated key mixer, so the same hash's low bits remain
//! free for each segment's own bucket index without the two indices
//! correlating.
//!
//! Reads lock their segment just like writes (a documented simplification):
//! this crate does not attempt a lock-free read path.

use crate::error::{CacheError, Result};
use crate::lirs::config::LirsConfig;
use crate::lirs::segment::Segment;
use alloc::boxed::Box;
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::sync::Arc;
use alloc::vec::Vec;
use parking_lot::Mutex;

/// Mixes a 64-bit key into a well-distributed 32-bit hash.
///
/// A fixed integer mixer (not the crate's configurable `hash_builder`
/// pattern) so the high bits used for segment selection and the low bits
/// used for a segment's own bucket index come from the same computation
/// without one determining the other.
fn mix_hash(key: u64) -> u32 {
    let mut h = (key ^ (key >> 32)) as u32;
    h ^= h >> 16;
    h = h.wrapping_mul(0x45d9_f3b);
    h ^= h >> 16;
    h = h.wrapping_mul(0x45d9_f3b);
    h ^= h >> 16;
    h
}

/// A sharded, concurrent LIRS cache keyed by `u64`.
pub struct SegmentedCache<V> {
    segments: Box<[Mutex<Segment<V>>]>,
    segment_shift: u32,
    config: LirsConfig,
}

impl<V> SegmentedCache<V> {
    /// Builds a new cache from `config`.
    pub fn new(config: LirsConfig) -> Result<Self> {
        let segment_count = config.segment_count();
        let per_segment = config.per_segment_max_memory();
        let mut segments = Vec::with_capacity(segment_count);
        for _ in 0..segment_count {
            segments.push(Mutex::new(Segment::new(
                per_segment,
                config.stack_move_distance(),
                config.non_resident_queue_size(),
                config.non_resident_queue_size_high(),
            )));
        }
        Ok(SegmentedCache {
            segments: segments.into_boxed_slice(),
            segment_shift: 32 - segment_count.trailing_zeros(),
            config,
        })
    }

    fn segment_for(&self, key: u64) -> (&Mutex<Segment<V>>, u32) {
        let hash = mix_hash(key);
        // A single-segment cache needs no routing at all: shifting a u32 by
        // a full 32 bits is a shift-past-width panic, not a no-op, so that
        // case is handled separately rather than folded into the formula.
        let index = if self.segments.len() == 1 {
            0
        } else {
            (hash >> self.segment_shift) as usize & (self.segments.len() - 1)
        };
        (&self.segments[index], hash)
    }

    /// Looks up `key`, promoting it per the LIRS access rules on a hit.
    pub fn get(&self, key: u64) -> Option<Arc<V>> {
        let (segment, hash) = self.segment_for(key);
        segment.lock().get(key, hash)
    }

    /// Looks up `key` without any side effect on its classification.
    pub fn peek(&self, key: u64) -> Option<Arc<V>> {
        let (segment, hash) = self.segment_for(key);
        segment.lock().peek(key, hash)
    }

    /// Inserts `key` with a memory cost of 1 unit.
    pub fn put(&self, key: u64, value: V) -> Option<Arc<V>> {
        self.put_with_memory(key, value, 1)
    }

    /// Inserts `key` with an explicit memory cost.
    ///
    /// Returns the previous resident or resurrectable value, if any. An
    /// entry whose `memory` exceeds the segment's entire budget is not
    /// inserted (the old value, if any, was still removed).
    pub fn put_with_memory(&self, key: u64, value: V, memory: u64) -> Option<Arc<V>> {
        let (segment, hash) = self.segment_for(key);
        segment.lock().put(key, hash, value, memory)
    }

    /// Removes `key`, returning its resident value if it had one.
    pub fn remove(&self, key: u64) -> Option<Arc<V>> {
        let (segment, hash) = self.segment_for(key);
        segment.lock().remove(key, hash)
    }

    /// True if `key` names any entry (hot, resident cold, or non-resident).
    pub fn contains_key(&self, key: u64) -> bool {
        let (segment, hash) = self.segment_for(key);
        segment.lock().contains_key(key, hash)
    }

    /// The memory cost recorded for `key`, if it names an entry.
    pub fn get_memory(&self, key: u64) -> Option<u64> {
        let (segment, hash) = self.segment_for(key);
        segment.lock().get_memory(key, hash)
    }

    /// True if `value` is the resident value of any entry.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.segments
            .iter()
            .any(|s| s.lock().resident_entries().iter().any(|(_, v)| v.as_ref() == value))
    }

    /// Re-applies `entries` in order via [`SegmentedCache::put`].
    pub fn put_all<I: IntoIterator<Item = (u64, V)>>(&self, entries: I) {
        for (key, value) in entries {
            self.put(key, value);
        }
    }

    /// Updates the total memory budget, redistributing it evenly across
    /// segments and evicting immediately if any segment is now over budget.
    pub fn set_max_memory(&mut self, max_memory: u64) -> Result<()> {
        if max_memory == 0 {
            return Err(CacheError::invalid_argument(
                "maxMemory",
                alloc::string::String::from("must be at least 1"),
            ));
        }
        self.config = LirsConfig::new(max_memory)?
            .with_segment_count(self.config.segment_count())?
            .with_stack_move_distance(self.config.stack_move_distance())
            .with_non_resident_queue_size(self.config.non_resident_queue_size())
            .with_non_resident_queue_size_high(self.config.non_resident_queue_size_high());
        let per_segment = self.config.per_segment_max_memory();
        for segment in self.segments.iter() {
            segment.lock().set_max_memory(per_segment);
        }
        Ok(())
    }

    /// The configured total memory budget across all segments.
    pub fn max_memory(&self) -> u64 {
        self.config.max_memory()
    }

    /// Memory currently charged to resident entries, summed across segments.
    pub fn used_memory(&self) -> u64 {
        self.segments.iter().map(|s| s.lock().used_memory()).sum()
    }

    /// Clears every segment.
    pub fn clear(&self) {
        for segment in self.segments.iter() {
            segment.lock().clear();
        }
    }

    /// Total entry count (hot + resident cold + non-resident) across all
    /// segments.
    pub fn len(&self) -> usize {
        self.segments.iter().map(|s| s.lock().len()).sum()
    }

    /// True if every segment is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hot-entry count across all segments.
    pub fn size_hot(&self) -> usize {
        self.segments.iter().map(|s| s.lock().hot_len()).sum()
    }

    /// Non-resident entry count across all segments.
    pub fn size_non_resident(&self) -> usize {
        self.segments.iter().map(|s| s.lock().non_resident_len()).sum()
    }

    /// Combined bucket-array capacity across all segments (a diagnostic, not
    /// an entry count).
    pub fn size_map_array(&self) -> usize {
        self.segments.iter().map(|s| s.lock().bucket_array_len()).sum()
    }

    /// Total cache hits recorded across all segments.
    pub fn hits(&self) -> u64 {
        self.segments.iter().map(|s| s.lock().hits()).sum()
    }

    /// Total cache misses recorded across all segments.
    pub fn misses(&self) -> u64 {
        self.segments.iter().map(|s| s.lock().misses()).sum()
    }

    /// Keys by classification: `non_resident` takes priority over `cold`;
    /// `(false, false)` reports hot keys, `(true, false)` resident-cold keys,
    /// and any `non_resident == true` reports non-resident keys.
    pub fn keys(&self, cold: bool, non_resident: bool) -> Vec<u64> {
        let mut out = Vec::new();
        for segment in self.segments.iter() {
            let segment = segment.lock();
            let mut part = if non_resident {
                segment.non_resident_keys()
            } else if cold {
                segment.resident_cold_keys()
            } else {
                segment.hot_keys()
            };
            out.append(&mut part);
        }
        out
    }

    /// All keys across every classification, deterministically ordered.
    pub fn key_set(&self) -> BTreeSet<u64> {
        let mut out = BTreeSet::new();
        for segment in self.segments.iter() {
            let segment = segment.lock();
            out.extend(segment.hot_keys());
            out.extend(segment.resident_cold_keys());
            out.extend(segment.non_resident_keys());
        }
        out
    }

    /// All resident values across every segment.
    pub fn values(&self) -> Vec<Arc<V>> {
        self.segments
            .iter()
            .flat_map(|s| s.lock().resident_entries().into_iter().map(|(_, v)| v).collect::<Vec<_>>())
            .collect()
    }

    /// A snapshot of every resident key/value pair, deterministically
    /// ordered by key.
    pub fn get_map(&self) -> BTreeMap<u64, Arc<V>> {
        let mut out = BTreeMap::new();
        for segment in self.segments.iter() {
            out.extend(segment.lock().resident_entries());
        }
        out
    }

    /// Forces the non-resident queue2 trim pass on every segment.
    pub fn trim_non_resident_queue(&self) {
        for segment in self.segments.iter() {
            segment.lock().trim_non_resident_queue();
        }
    }
}
