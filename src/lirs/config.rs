//! Configuration for the segmented LIRS cache.

use crate::error::{CacheError, Result};

/// Default segment count: a power of two, matching the existing crate's
/// `ConcurrentLruCache` default sharding width.
pub const DEFAULT_SEGMENT_COUNT: usize = 16;

/// Default stack move distance (hysteresis on hot-entry restacking).
pub const DEFAULT_STACK_MOVE_DISTANCE: u64 = 32;

/// Default non-resident queue size factor.
pub const DEFAULT_NON_RESIDENT_QUEUE_SIZE: u64 = 3;

/// Default non-resident queue high-watermark factor.
pub const DEFAULT_NON_RESIDENT_QUEUE_SIZE_HIGH: u64 = 12;

/// Parameters for a [`crate::lirs::SegmentedCache`].
///
/// Mirrors the existing crate's public-field config style (see
/// `LruCacheConfig`), with one required field (`max_memory`) and the rest
/// defaulted and overridable through builder methods.
#[derive(Debug, Clone, Copy)]
pub struct LirsConfig {
    max_memory: u64,
    segment_count: usize,
    stack_move_distance: u64,
    non_resident_queue_size: u64,
    non_resident_queue_size_high: u64,
}

impl LirsConfig {
    /// Creates a configuration with `max_memory` bytes and every other
    /// parameter at its documented default.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidArgument`] if `max_memory` is zero.
    pub fn new(max_memory: u64) -> Result<Self> {
        if max_memory == 0 {
            return Err(CacheError::invalid_argument(
                "maxMemory",
                alloc::string::String::from("must be at least 1"),
            ));
        }
        Ok(LirsConfig {
            max_memory,
            segment_count: DEFAULT_SEGMENT_COUNT,
            stack_move_distance: DEFAULT_STACK_MOVE_DISTANCE,
            non_resident_queue_size: DEFAULT_NON_RESIDENT_QUEUE_SIZE,
            non_resident_queue_size_high: DEFAULT_NON_RESIDENT_QUEUE_SIZE_HIGH,
        })
    }

    /// Overrides the segment count.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidArgument`] if `count` is not a power of two.
    pub fn with_segment_count(mut self, count: usize) -> Result<Self> {
        if count == 0 || !count.is_power_of_two() {
            return Err(CacheError::invalid_argument(
                "segmentCount",
                alloc::format!("{count} is not a power of two"),
            ));
        }
        self.segment_count = count;
        Ok(self)
    }

    /// Overrides the stack move distance.
    #[must_use]
    pub fn with_stack_move_distance(mut self, distance: u64) -> Self {
        self.stack_move_distance = distance;
        self
    }

    /// Overrides the non-resident queue size factor.
    #[must_use]
    pub fn with_non_resident_queue_size(mut self, factor: u64) -> Self {
        self.non_resident_queue_size = factor;
        self
    }

    /// Overrides the non-resident queue high-watermark factor.
    #[must_use]
    pub fn with_non_resident_queue_size_high(mut self, factor: u64) -> Self {
        self.non_resident_queue_size_high = factor;
        self
    }

    /// Total memory budget across all segments, in bytes.
    pub fn max_memory(&self) -> u64 {
        self.max_memory
    }

    /// Configured segment count (always a power of two).
    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    /// Stack move distance.
    pub fn stack_move_distance(&self) -> u64 {
        self.stack_move_distance
    }

    /// Non-resident queue size factor.
    pub fn non_resident_queue_size(&self) -> u64 {
        self.non_resident_queue_size
    }

    /// Non-resident queue high-watermark factor.
    pub fn non_resident_queue_size_high(&self) -> u64 {
        self.non_resident_queue_size_high
    }

    /// Per-segment memory budget: `max(1, max_memory / segment_count)`.
    pub(crate) fn per_segment_max_memory(&self) -> u64 {
        (self.max_memory / self.segment_count as u64).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_applied() {
        let config = LirsConfig::new(1024).unwrap();
        assert_eq!(config.segment_count(), DEFAULT_SEGMENT_COUNT);
        assert_eq!(config.stack_move_distance(), DEFAULT_STACK_MOVE_DISTANCE);
    }

    #[test]
    fn zero_max_memory_is_rejected() {
        assert!(LirsConfig::new(0).is_err());
    }

    #[test]
    fn non_power_of_two_segment_count_is_rejected() {
        let err = LirsConfig::new(1024).unwrap().with_segment_count(10);
        assert!(err.is_err());
    }

    #[test]
    fn per_segment_memory_is_at_least_one() {
        let config = LirsConfig::new(4).unwrap().with_segment_count(16).unwrap();
        assert_eq!(config.per_segment_max_memory(), 1);
    }
}
