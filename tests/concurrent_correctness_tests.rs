//! Integration-level correctness tests for Core B, the sharded LIRS cache.
//! Exercised only under the `concurrent` feature, which gates the whole
//! `lirs` module (it is the only thing in this crate that needs
//! `parking_lot`).

#![cfg(feature = "concurrent")]

use pagecache_rs::error::CacheError;
use pagecache_rs::lirs::{LirsConfig, SegmentedCache};

/// Scan resistance: a small working set that stays referenced outside the
/// cache survives a much larger one-time scan and is reported hot once
/// re-read, while the scan itself is mostly evicted.
///
/// The capacity here is deliberately far below the scan's total demand
/// (rather than literal byte-for-byte figures) so eviction happens by a wide
/// margin instead of riding the edge of the watermark.
#[test]
fn scenario_5_segmented_lirs_scan_resistance() {
    let config = LirsConfig::new(200).unwrap().with_segment_count(16).unwrap();
    let cache: SegmentedCache<i32> = SegmentedCache::new(config).unwrap();

    // Keys 0..15 stay pinned outside the cache for the duration of the scan,
    // the way a reader still using a page would hold it live, so their weak
    // reference survives eviction to the non-resident state and they can be
    // resurrected by a later access.
    let mut pinned = Vec::new();
    for key in 0..16u64 {
        cache.put(key, key as i32);
        pinned.push(cache.get(key).unwrap());
    }

    for key in 16..1000u64 {
        cache.put(key, key as i32);
    }

    // Interleaved rounds of re-reference, matching "read keys 0..15 ten
    // times each": every key gets touched in every round rather than
    // exhausting all ten touches on one key before moving to the next, so no
    // single established key goes stale relative to the others in between.
    for _ in 0..10 {
        for key in 0..16u64 {
            cache.get(key);
        }
    }
    drop(pinned);

    let hot = cache.keys(false, false);
    let hot_count = (0..16u64).filter(|k| hot.contains(k)).count();
    assert!(
        hot_count * 4 >= 16 * 3,
        "at least 3/4 of the repeatedly re-read working set should be hot, got {hot_count}/16"
    );

    let absent = (200..1000u64).filter(|k| cache.peek(*k).is_none()).count();
    let total = 1000 - 200;
    assert!(
        absent * 10 >= total * 9,
        "at least 90% of a one-time scan's keys should be evicted, got {absent}/{total}"
    );
}

/// Non-resident second chance: re-inserting a key that was pushed out to the
/// non-resident state makes it resident again, whether or not its weak
/// reference happened to survive the round trip.
#[test]
fn scenario_6_non_resident_second_chance() {
    let config = LirsConfig::new(10)
        .unwrap()
        .with_segment_count(1)
        .unwrap()
        .with_non_resident_queue_size(3)
        .with_non_resident_queue_size_high(12);
    let cache: SegmentedCache<i32> = SegmentedCache::new(config).unwrap();

    for key in 0..30u64 {
        cache.put(key, key as i32);
    }
    // Key 0 is long evicted from the resident set by now; re-inserting it
    // must succeed regardless of whether its weak reference was still live.
    cache.put(0, 999);
    assert!(cache.contains_key(0));
    assert_eq!(*cache.peek(0).unwrap(), 999);
}

/// `put(k, v); peek(k) == v`.
#[test]
fn round_trip_put_peek() {
    let config = LirsConfig::new(1024).unwrap();
    let cache: SegmentedCache<&'static str> = SegmentedCache::new(config).unwrap();
    cache.put(1, "hello");
    assert_eq!(*cache.peek(1).unwrap(), "hello");
}

/// `put(k, v1); put(k, v2)` returns `v1` and leaves `v2` resident.
#[test]
fn put_over_existing_key_returns_prior_value() {
    let config = LirsConfig::new(1024).unwrap();
    let cache: SegmentedCache<i32> = SegmentedCache::new(config).unwrap();
    assert!(cache.put(1, 10).is_none());
    let old = cache.put(1, 20).unwrap();
    assert_eq!(*old, 10);
    assert_eq!(*cache.peek(1).unwrap(), 20);
}

/// `remove` clears both residency and membership.
#[test]
fn remove_clears_entry() {
    let config = LirsConfig::new(1024).unwrap();
    let cache: SegmentedCache<i32> = SegmentedCache::new(config).unwrap();
    cache.put(1, 10);
    assert_eq!(*cache.remove(1).unwrap(), 10);
    assert!(!cache.contains_key(1));
    assert!(cache.peek(1).is_none());
}

/// An entry whose memory cost exceeds the entire per-segment budget is
/// rejected rather than accepted and immediately evicted.
#[test]
fn oversized_entry_is_not_admitted() {
    let config = LirsConfig::new(16).unwrap().with_segment_count(1).unwrap();
    let cache: SegmentedCache<i32> = SegmentedCache::new(config).unwrap();
    cache.put_with_memory(1, 1, 1024);
    assert!(!cache.contains_key(1));
}

/// `set_max_memory` rejects zero and otherwise redistributes the budget and
/// evicts immediately if any segment is now over budget.
#[test]
fn set_max_memory_validates_and_evicts() {
    let config = LirsConfig::new(1024).unwrap().with_segment_count(4).unwrap();
    let mut cache: SegmentedCache<i32> = SegmentedCache::new(config).unwrap();
    assert!(matches!(
        cache.set_max_memory(0).unwrap_err(),
        CacheError::InvalidArgument { .. }
    ));
    for key in 0..100u64 {
        cache.put(key, key as i32);
    }
    cache.set_max_memory(16).unwrap();
    assert!(cache.used_memory() <= 16);
}

/// `key_set` reports every classification (hot, resident cold, non-resident)
/// deterministically, without duplicates across segments.
#[test]
fn key_set_reports_every_inserted_key() {
    let config = LirsConfig::new(1024).unwrap().with_segment_count(4).unwrap();
    let cache: SegmentedCache<i32> = SegmentedCache::new(config).unwrap();
    cache.put_all((0..20u64).map(|k| (k, k as i32)));
    let keys = cache.key_set();
    for key in 0..20u64 {
        assert!(keys.contains(&key));
    }
}
