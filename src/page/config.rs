//! Configuration for Core A page caches.

/// Minimum record count below which eviction never runs, regardless of
/// memory pressure. Matches `CACHE_MIN_RECORDS` from the design notes.
pub(crate) const CACHE_MIN_RECORDS: usize = 16;

/// Per-bucket overhead, in 4-byte words, charged against `max_memory` even
/// when the cache is empty. Matches `MEMORY_POINTER` from the design notes.
pub(crate) const MEMORY_POINTER: u64 = 2;

/// Configuration for a single Core A policy instance.
///
/// Mirrors the existing crate's single-required-field config structs (see
/// `LruCacheConfig`): one knob is mandatory at construction, everything else
/// is a named default that can be overridden with a builder method.
#[derive(Debug, Clone, Copy)]
pub struct PageCacheConfig {
    max_memory_kb: u64,
}

impl PageCacheConfig {
    /// Creates a configuration with the given maximum memory budget, in
    /// kilobytes.
    #[must_use]
    pub fn new(max_memory_kb: u64) -> Self {
        PageCacheConfig { max_memory_kb }
    }

    /// Maximum memory budget, in kilobytes.
    #[inline]
    pub fn max_memory_kb(&self) -> u64 {
        self.max_memory_kb
    }
}
