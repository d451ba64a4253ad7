//! Selects a Core A policy by name.
//!
//! `"LRU"`, `"FIFO"`, `"MRU"`, `"Clock"`, `"Random"` return the matching
//! concrete policy; a `"SOFT_"` prefix (e.g. `"SOFT_LRU"`) wraps the chosen
//! policy in [`CacheSecondLevel`]. Any other selector is an
//! [`CacheError::InvalidArgument`] naming parameter `"CACHE_TYPE"`.

use crate::error::{CacheError, Result};
use crate::page::clock::ClockCache;
use crate::page::config::PageCacheConfig;
use crate::page::fifo::FifoCache;
use crate::page::lru::LruCache;
use crate::page::mru::MruCache;
use crate::page::random::RandomCache;
use crate::page::record::Record;
use crate::page::second_level::CacheSecondLevel;
use crate::page::writer::CacheWriter;
use crate::page::Cache;
use alloc::boxed::Box;

/// Builds the policy instance named by `cache_type`, wiring it to `writer`.
///
/// # Errors
/// Returns [`CacheError::InvalidArgument`] if `cache_type` (after stripping
/// an optional `"SOFT_"` prefix) does not name one of the five policies, or
/// whatever error the underlying policy's construction returns (e.g. a
/// `max_memory_kb` too large to represent as a bucket count).
pub fn cache_factory<R, W>(
    cache_type: &str,
    config: PageCacheConfig,
    writer: W,
) -> Result<Box<dyn Cache<R>>>
where
    R: Record + Clone + 'static,
    W: CacheWriter<R> + 'static,
{
    let (base_type, soft) = match cache_type.strip_prefix("SOFT_") {
        Some(rest) => (rest, true),
        None => (cache_type, false),
    };

    macro_rules! boxed_policy {
        ($policy:expr) => {
            if soft {
                Box::new(CacheSecondLevel::new($policy)) as Box<dyn Cache<R>>
            } else {
                Box::new($policy) as Box<dyn Cache<R>>
            }
        };
    }

    let cache: Box<dyn Cache<R>> = match base_type {
        "LRU" => boxed_policy!(LruCache::new(config, writer)?),
        "FIFO" => boxed_policy!(FifoCache::new(config, writer)?),
        "MRU" => boxed_policy!(MruCache::new(config, writer)?),
        "Clock" => boxed_policy!(ClockCache::new(config, writer)?),
        "Random" => boxed_policy!(RandomCache::new(config, writer)?),
        other => {
            return Err(CacheError::invalid_argument(
                "CACHE_TYPE",
                alloc::format!("unknown cache type selector `{other}`"),
            ))
        }
    };
    Ok(cache)
}
