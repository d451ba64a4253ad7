//! The per-key node stored in a [`crate::lirs::segment::Segment`]'s arena.
//!
//! Classification (hot / resident-cold / non-resident-cold) is never stored
//! directly; it is derived from `on_stack`/`on_queue`/`value` so the three
//! states can never drift out of sync with list membership:
//!
//! - **Hot**: `on_stack && !on_queue`.
//! - **Resident cold**: `on_queue && value.is_some()`.
//! - **Non-resident cold**: `on_queue && value.is_none()` (a live or dead
//!   [`Weak`] sits in `reference`).
//!
//! `queue_prev`/`queue_next` are shared between the resident-cold queue and
//! the non-resident-cold queue2, since an entry is a member of at most one of
//! the two at any time — the same trick the arena uses to avoid a second
//! pair of link fields for a mutually exclusive list.

use crate::arena::{Handle, NIL};
use alloc::sync::{Arc, Weak};

pub(crate) struct Entry<V> {
    pub(crate) key: u64,
    pub(crate) hash: u32,
    pub(crate) memory: u64,
    pub(crate) value: Option<Arc<V>>,
    pub(crate) reference: Option<Weak<V>>,
    pub(crate) top_move: u64,

    pub(crate) stack_prev: Handle,
    pub(crate) stack_next: Handle,
    pub(crate) on_stack: bool,

    pub(crate) queue_prev: Handle,
    pub(crate) queue_next: Handle,
    pub(crate) on_queue: bool,

    pub(crate) map_next: Handle,
}

impl<V> Entry<V> {
    pub(crate) fn new_resident(key: u64, hash: u32, value: Arc<V>, memory: u64) -> Self {
        Entry {
            key,
            hash,
            memory,
            value: Some(value),
            reference: None,
            top_move: 0,
            stack_prev: NIL,
            stack_next: NIL,
            on_stack: false,
            queue_prev: NIL,
            queue_next: NIL,
            on_queue: false,
            map_next: NIL,
        }
    }

    pub(crate) fn is_hot(&self) -> bool {
        self.on_stack && !self.on_queue
    }

    pub(crate) fn is_resident(&self) -> bool {
        self.value.is_some()
    }

    /// The value if resident, or upgraded through `reference` if the weak
    /// reference is still alive. Does not mutate the entry.
    pub(crate) fn live_value(&self) -> Option<Arc<V>> {
        self.value
            .clone()
            .or_else(|| self.reference.as_ref().and_then(Weak::upgrade))
    }
}
