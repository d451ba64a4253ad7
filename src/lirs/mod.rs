//! Core B: the segmented LIRS (Low Inter-reference Recency Set) cache.
//!
//! A concurrent, `u64`-keyed cache approximating the LIRS replacement
//! policy per segment, giving scan-resistant behavior that a plain LRU
//! cannot: a long one-time scan of cold keys cannot evict the hot working
//! set, because promotion to hot requires a *second* reference while the key
//! is still within the recency stack's history, not just one touch.
//!
//! Each key is classified into exactly one of three states, tracked by list
//! membership rather than an explicit tag (see [`entry::Entry`]):
//!
//! - **Hot**: resident, on the recency stack only.
//! - **Resident cold**: resident, on the resident-cold queue (and possibly
//!   also on the stack, if referenced recently enough to still be in its
//!   history).
//! - **Non-resident cold**: evicted, but its key is still remembered on the
//!   non-resident-cold queue2 via a [`alloc::sync::Weak`] reference — the
//!   Rust substitution named in the design decisions below for what the
//!   original design expressed as a soft reference (Rust has no
//!   GC-observable soft reference to mirror).
//!
//! The cache is split into [`config::LirsConfig::segment_count`] independent
//! [`segment::Segment`]s, each behind its own `parking_lot::Mutex`, selected
//! by the high bits of a dedicated key mixer ([`segmented`]). Hence this
//! module is gated behind the `concurrent` feature, the only part of the
//! crate that needs `parking_lot`.

pub mod config;
pub(crate) mod entry;
pub(crate) mod segment;
mod segmented;

pub use config::LirsConfig;
pub use segmented::SegmentedCache;
