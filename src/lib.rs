//! Two cache cores sharing one error taxonomy, one metrics vocabulary, and
//! one arena-backed handle style for intrusive lists.
//!
//! # Core A: the page cache family ([`page`])
//!
//! A single-threaded, write-back cache keyed by a 32-bit page position.
//! Five interchangeable eviction policies share one bucket-chained index and
//! doubly linked list: [`page::lru::LruCache`], [`page::fifo::FifoCache`],
//! [`page::mru::MruCache`], [`page::clock::ClockCache`], and
//! [`page::random::RandomCache`]. All five implement the same
//! [`page::Cache`] trait, and [`page::factory::cache_factory`] selects one by
//! name (an optional `"SOFT_"` prefix wraps the choice in
//! [`page::second_level::CacheSecondLevel`], a bounded backing tier that
//! gives evicted records a second chance).
//!
//! ```
//! use pagecache_rs::page::config::PageCacheConfig;
//! use pagecache_rs::page::lru::LruCache;
//! use pagecache_rs::page::record::Record;
//! use pagecache_rs::page::writer::{CacheWriter, NullTrace, Trace};
//! use pagecache_rs::page::Cache;
//! use pagecache_rs::error::Result;
//!
//! #[derive(Clone)]
//! struct Page { pos: i32, memory: i32, dirty: bool }
//!
//! impl Record for Page {
//!     fn pos(&self) -> i32 { self.pos }
//!     fn memory(&self) -> i32 { self.memory }
//!     fn is_changed(&self) -> bool { self.dirty }
//!     fn can_remove(&self) -> bool { true }
//! }
//!
//! struct NullWriter(NullTrace);
//! impl CacheWriter<Page> for NullWriter {
//!     fn flush_log(&mut self) -> Result<()> { Ok(()) }
//!     fn write_back(&mut self, _record: &Page) -> Result<()> { Ok(()) }
//!     fn trace(&self) -> &dyn Trace { &self.0 }
//! }
//!
//! let mut cache = LruCache::new(PageCacheConfig::new(16), NullWriter(NullTrace)).unwrap();
//! cache.put(Page { pos: 1, memory: 4, dirty: false }).unwrap();
//! assert!(cache.find(1).is_some());
//! ```
//!
//! # Core B: the segmented LIRS cache ([`lirs`], requires the `concurrent` feature)
//!
//! A concurrent cache keyed by `u64`, sharded across
//! [`lirs::LirsConfig::segment_count`] independent segments, each
//! approximating the LIRS (Low Inter-reference Recency Set) replacement
//! policy. Unlike a plain LRU, a one-time scan over cold keys cannot evict
//! the hot working set: promotion to hot requires a *second* reference while
//! the key is still within the recency stack's history.
//!
//! ```
//! # #[cfg(feature = "concurrent")]
//! # {
//! use pagecache_rs::lirs::{LirsConfig, SegmentedCache};
//!
//! let config = LirsConfig::new(1024).unwrap();
//! let cache: SegmentedCache<&str> = SegmentedCache::new(config).unwrap();
//! cache.put(1, "value");
//! assert_eq!(*cache.get(1).unwrap(), "value");
//! # }
//! ```
//!
//! # Ambient stack
//!
//! - [`error`]: the single [`error::CacheError`] taxonomy both cores report
//!   failures through.
//! - [`metrics`]: the [`metrics::CacheMetrics`] trait and [`metrics::CoreCounters`]
//!   helper every policy and the segmented cache expose snapshots through.
//! - `arena`: the shared slab allocator (`Handle`/`NIL`) both cores use for
//!   intrusive lists instead of raw pointers.

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

#[cfg(test)]
extern crate scoped_threadpool;

/// Slab arena with stable handles, shared by both cache cores.
pub(crate) mod arena;

/// Error taxonomy shared by both cache cores.
pub mod error;

/// Metrics vocabulary shared by both cache cores.
pub mod metrics;

/// Core A: the single-threaded, write-back page cache family.
pub mod page;

/// Core B: the segmented LIRS cache.
///
/// Requires the `concurrent` feature, since it is built on
/// `parking_lot::Mutex` per segment.
#[cfg(feature = "concurrent")]
pub mod lirs;
