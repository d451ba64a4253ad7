//! A single shard of the segmented LIRS cache: its own bucket array, arena,
//! recency stack, resident-cold queue and non-resident-cold queue2.
//!
//! Grounded on the LIRS algorithm description in the specification (put /
//! access / remove / eviction / trimNonResidentQueue / pruneStack) and on
//! this crate's existing `Skeleton<R>` (`crate::page::skeleton`) for the
//! arena-backed bucket-chained hash index and sentinel-free doubly linked
//! list style — the same `Handle`/`NIL` vocabulary is reused here instead of
//! the teacher's raw intrusive pointers.

use crate::arena::{Arena, Handle, NIL};
use crate::lirs::entry::Entry;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

/// A single segment of the sharded LIRS cache.
pub(crate) struct Segment<V> {
    arena: Arena<Entry<V>>,
    buckets: Vec<Handle>,
    mask: usize,

    stack_top: Handle,
    stack_bottom: Handle,
    queue_front: Handle,
    queue_back: Handle,
    queue2_front: Handle,
    queue2_back: Handle,

    map_size: usize,
    queue_size: usize,
    queue2_size: usize,
    used_memory: u64,
    max_memory: u64,

    hits: u64,
    misses: u64,

    stack_move_counter: u64,
    stack_move_distance: u64,
    non_resident_queue_size: u64,
    non_resident_queue_size_high: u64,
}

impl<V> Segment<V> {
    pub(crate) fn new(
        max_memory: u64,
        stack_move_distance: u64,
        non_resident_queue_size: u64,
        non_resident_queue_size_high: u64,
    ) -> Self {
        Segment {
            arena: Arena::new(),
            buckets: vec![NIL; 16],
            mask: 15,
            stack_top: NIL,
            stack_bottom: NIL,
            queue_front: NIL,
            queue_back: NIL,
            queue2_front: NIL,
            queue2_back: NIL,
            map_size: 0,
            queue_size: 0,
            queue2_size: 0,
            used_memory: 0,
            max_memory: max_memory.max(1),
            hits: 0,
            misses: 0,
            stack_move_counter: 0,
            stack_move_distance,
            non_resident_queue_size,
            non_resident_queue_size_high,
        }
    }

    // ---- basic accessors -------------------------------------------------

    pub(crate) fn len(&self) -> usize {
        self.map_size
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.map_size == 0
    }

    pub(crate) fn hot_len(&self) -> usize {
        self.map_size - self.queue_size - self.queue2_size
    }

    pub(crate) fn non_resident_len(&self) -> usize {
        self.queue2_size
    }

    pub(crate) fn bucket_array_len(&self) -> usize {
        self.buckets.len()
    }

    pub(crate) fn used_memory(&self) -> u64 {
        self.used_memory
    }

    pub(crate) fn max_memory(&self) -> u64 {
        self.max_memory
    }

    pub(crate) fn hits(&self) -> u64 {
        self.hits
    }

    pub(crate) fn misses(&self) -> u64 {
        self.misses
    }

    pub(crate) fn set_max_memory(&mut self, max_memory: u64) {
        self.max_memory = max_memory.max(1);
        if self.used_memory > self.max_memory {
            self.evict();
        }
    }

    pub(crate) fn clear(&mut self) {
        *self = Segment::new(
            self.max_memory,
            self.stack_move_distance,
            self.non_resident_queue_size,
            self.non_resident_queue_size_high,
        );
    }

    // ---- bucket chain ------------------------------------------------------

    fn bucket_index(&self, hash: u32) -> usize {
        hash as usize & self.mask
    }

    fn find_handle(&self, key: u64, hash: u32) -> Option<Handle> {
        let mut cursor = self.buckets[self.bucket_index(hash)];
        while cursor != NIL {
            let entry = self.arena.get(cursor);
            if entry.key == key {
                return Some(cursor);
            }
            cursor = entry.map_next;
        }
        None
    }

    fn bucket_insert(&mut self, handle: Handle, hash: u32) {
        let idx = self.bucket_index(hash);
        self.arena.get_mut(handle).map_next = self.buckets[idx];
        self.buckets[idx] = handle;
    }

    fn bucket_detach(&mut self, handle: Handle, hash: u32) {
        let idx = self.bucket_index(hash);
        let mut cursor = self.buckets[idx];
        if cursor == handle {
            self.buckets[idx] = self.arena.get(handle).map_next;
            return;
        }
        while cursor != NIL {
            let next = self.arena.get(cursor).map_next;
            if next == handle {
                let after = self.arena.get(handle).map_next;
                self.arena.get_mut(cursor).map_next = after;
                return;
            }
            cursor = next;
        }
    }

    fn maybe_resize(&mut self) {
        let current = self.buckets.len();
        let new_len = if current * 3 < self.map_size * 4 && current < (1 << 28) {
            Some((current * 2).max(16))
        } else if current > 32 && current / 8 > self.map_size {
            Some(current / 2)
        } else {
            None
        };
        if let Some(len) = new_len {
            self.rebuild_buckets(len.next_power_of_two());
        }
    }

    fn rebuild_buckets(&mut self, len: usize) {
        let mut new_buckets = vec![NIL; len];
        let mask = len - 1;
        for handle in self.arena.handles() {
            let hash = self.arena.get(handle).hash;
            let idx = hash as usize & mask;
            self.arena.get_mut(handle).map_next = new_buckets[idx];
            new_buckets[idx] = handle;
        }
        self.buckets = new_buckets;
        self.mask = mask;
    }

    // ---- stack (recency history) ------------------------------------------

    fn stack_push_top(&mut self, handle: Handle) {
        let old_top = self.stack_top;
        {
            let e = self.arena.get_mut(handle);
            e.stack_prev = old_top;
            e.stack_next = NIL;
            e.on_stack = true;
            e.top_move = self.stack_move_counter;
        }
        if old_top != NIL {
            self.arena.get_mut(old_top).stack_next = handle;
        } else {
            self.stack_bottom = handle;
        }
        self.stack_top = handle;
        self.stack_move_counter += 1;
    }

    fn stack_push_bottom(&mut self, handle: Handle) {
        let old_bottom = self.stack_bottom;
        {
            let e = self.arena.get_mut(handle);
            e.stack_next = old_bottom;
            e.stack_prev = NIL;
            e.on_stack = true;
            e.top_move = self.stack_move_counter;
        }
        if old_bottom != NIL {
            self.arena.get_mut(old_bottom).stack_prev = handle;
        } else {
            self.stack_top = handle;
        }
        self.stack_bottom = handle;
    }

    fn stack_detach(&mut self, handle: Handle) {
        let (prev, next) = {
            let e = self.arena.get(handle);
            (e.stack_prev, e.stack_next)
        };
        if prev != NIL {
            self.arena.get_mut(prev).stack_next = next;
        } else {
            self.stack_top = next;
        }
        if next != NIL {
            self.arena.get_mut(next).stack_prev = prev;
        } else {
            self.stack_bottom = prev;
        }
        let e = self.arena.get_mut(handle);
        e.on_stack = false;
        e.stack_prev = NIL;
        e.stack_next = NIL;
    }

    /// Strips cold entries off the stack tail until the tail is hot or the
    /// stack is empty. Cold entries stay on their queue; only their stack
    /// membership is removed, since the stack need only track enough history
    /// to classify hits, not every resident record.
    fn prune_stack(&mut self) {
        while self.stack_bottom != NIL {
            if !self.arena.get(self.stack_bottom).on_queue {
                break;
            }
            let bottom = self.stack_bottom;
            self.stack_detach(bottom);
        }
    }

    // ---- resident-cold queue / non-resident-cold queue2 --------------------

    fn queue_push_back(&mut self, handle: Handle) {
        let old_back = self.queue_back;
        {
            let e = self.arena.get_mut(handle);
            e.queue_prev = old_back;
            e.queue_next = NIL;
            e.on_queue = true;
        }
        if old_back != NIL {
            self.arena.get_mut(old_back).queue_next = handle;
        } else {
            self.queue_front = handle;
        }
        self.queue_back = handle;
        self.queue_size += 1;
    }

    fn queue2_push_back(&mut self, handle: Handle) {
        let old_back = self.queue2_back;
        {
            let e = self.arena.get_mut(handle);
            e.queue_prev = old_back;
            e.queue_next = NIL;
            e.on_queue = true;
        }
        if old_back != NIL {
            self.arena.get_mut(old_back).queue_next = handle;
        } else {
            self.queue2_front = handle;
        }
        self.queue2_back = handle;
        self.queue2_size += 1;
    }

    /// Detaches `handle` from whichever of queue/queue2 it is currently on.
    /// `is_queue2` must reflect the entry's membership *before* any value
    /// mutation this call is part of (queue2 iff non-resident).
    fn cold_list_detach(&mut self, handle: Handle, is_queue2: bool) {
        let (prev, next) = {
            let e = self.arena.get(handle);
            (e.queue_prev, e.queue_next)
        };
        if is_queue2 {
            if prev != NIL {
                self.arena.get_mut(prev).queue_next = next;
            } else {
                self.queue2_front = next;
            }
            if next != NIL {
                self.arena.get_mut(next).queue_prev = prev;
            } else {
                self.queue2_back = prev;
            }
            self.queue2_size -= 1;
        } else {
            if prev != NIL {
                self.arena.get_mut(prev).queue_next = next;
            } else {
                self.queue_front = next;
            }
            if next != NIL {
                self.arena.get_mut(next).queue_prev = prev;
            } else {
                self.queue_back = prev;
            }
            self.queue_size -= 1;
        }
        let e = self.arena.get_mut(handle);
        e.on_queue = false;
        e.queue_prev = NIL;
        e.queue_next = NIL;
    }

    // ---- classification iteration ------------------------------------------

    pub(crate) fn hot_keys(&self) -> Vec<u64> {
        self.arena
            .handles()
            .filter(|&h| self.arena.get(h).is_hot())
            .map(|h| self.arena.get(h).key)
            .collect()
    }

    pub(crate) fn resident_cold_keys(&self) -> Vec<u64> {
        self.arena
            .handles()
            .filter(|&h| {
                let e = self.arena.get(h);
                e.on_queue && e.is_resident()
            })
            .map(|h| self.arena.get(h).key)
            .collect()
    }

    pub(crate) fn non_resident_keys(&self) -> Vec<u64> {
        self.arena
            .handles()
            .filter(|&h| {
                let e = self.arena.get(h);
                e.on_queue && !e.is_resident()
            })
            .map(|h| self.arena.get(h).key)
            .collect()
    }

    pub(crate) fn resident_entries(&self) -> Vec<(u64, Arc<V>)> {
        self.arena
            .handles()
            .filter_map(|h| {
                let e = self.arena.get(h);
                e.value.clone().map(|v| (e.key, v))
            })
            .collect()
    }

    // ---- core LIRS operations -----------------------------------------------

    fn demote_oldest_hot(&mut self) {
        if self.stack_bottom == NIL {
            return;
        }
        let handle = self.stack_bottom;
        self.stack_detach(handle);
        self.queue_push_back(handle);
        self.prune_stack();
    }

    fn access(&mut self, handle: Handle) {
        let is_hot = self.arena.get(handle).is_hot();
        if is_hot {
            if self.stack_top != handle {
                let top_move = self.arena.get(handle).top_move;
                if self.stack_move_counter.saturating_sub(top_move) > self.stack_move_distance {
                    let was_bottom = self.stack_bottom == handle;
                    self.stack_detach(handle);
                    if was_bottom {
                        self.prune_stack();
                    }
                    self.stack_push_top(handle);
                }
            }
            self.hits += 1;
            return;
        }

        let live = self.arena.get(handle).live_value();
        let Some(value) = live else {
            self.misses += 1;
            return;
        };
        self.hits += 1;

        let was_non_resident = self.arena.get(handle).value.is_none();
        let was_on_stack = self.arena.get(handle).on_stack;
        self.cold_list_detach(handle, was_non_resident);

        if was_non_resident {
            let memory = self.arena.get(handle).memory;
            let e = self.arena.get_mut(handle);
            e.value = Some(value);
            e.reference = None;
            self.used_memory += memory;
        }

        if was_on_stack {
            self.stack_detach(handle);
            self.prune_stack();
            self.demote_oldest_hot();
        } else {
            self.queue_push_back(handle);
        }
        self.stack_push_top(handle);
        self.prune_stack();
    }

    pub(crate) fn get(&mut self, key: u64, hash: u32) -> Option<Arc<V>> {
        self.maybe_resize();
        match self.find_handle(key, hash) {
            Some(handle) => {
                self.access(handle);
                self.arena.get(handle).live_value()
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Reads without side effects: no restacking, no promotion, no hit/miss
    /// accounting. Only resident values are returned.
    pub(crate) fn peek(&self, key: u64, hash: u32) -> Option<Arc<V>> {
        self.find_handle(key, hash)
            .and_then(|h| self.arena.get(h).value.clone())
    }

    pub(crate) fn contains_key(&self, key: u64, hash: u32) -> bool {
        self.find_handle(key, hash).is_some()
    }

    pub(crate) fn get_memory(&self, key: u64, hash: u32) -> Option<u64> {
        self.find_handle(key, hash).map(|h| self.arena.get(h).memory)
    }

    fn remove_handle(&mut self, handle: Handle, hash: u32) {
        let was_hot = self.arena.get(handle).is_hot();
        let was_on_stack = self.arena.get(handle).on_stack;
        let was_on_queue = self.arena.get(handle).on_queue;
        let was_non_resident = self.arena.get(handle).value.is_none();
        let memory = self.arena.get(handle).memory;
        let is_resident = self.arena.get(handle).is_resident();

        self.bucket_detach(handle, hash);
        if was_on_stack {
            self.stack_detach(handle);
        }
        if was_on_queue {
            self.cold_list_detach(handle, was_non_resident);
        }
        self.arena.remove(handle);
        self.map_size -= 1;
        if is_resident {
            self.used_memory -= memory;
        }

        if was_hot && self.queue_front != NIL {
            let promote = self.queue_front;
            self.cold_list_detach(promote, false);
            self.stack_push_bottom(promote);
        }
        self.prune_stack();
    }

    pub(crate) fn remove(&mut self, key: u64, hash: u32) -> Option<Arc<V>> {
        self.maybe_resize();
        let handle = self.find_handle(key, hash)?;
        let value = self.arena.get(handle).value.clone();
        self.remove_handle(handle, hash);
        value
    }

    pub(crate) fn put(&mut self, key: u64, hash: u32, value: V, memory: u64) -> Option<Arc<V>> {
        self.maybe_resize();
        let mut existed = false;
        let mut old = None;
        if let Some(h) = self.find_handle(key, hash) {
            existed = true;
            old = self.arena.get(h).live_value();
            self.remove_handle(h, hash);
        }
        if memory > self.max_memory {
            return old;
        }

        let handle = self.arena.insert(Entry::new_resident(key, hash, Arc::new(value), memory));
        self.bucket_insert(handle, hash);
        self.used_memory += memory;
        self.map_size += 1;
        self.stack_push_top(handle);

        if self.used_memory > self.max_memory {
            self.evict();
            if self.stack_top != NIL {
                self.queue_push_back(handle);
            }
        }

        if existed {
            self.access(handle);
        }
        old
    }

    // ---- eviction -----------------------------------------------------------

    /// Converts the oldest hot entries (stack tail) to resident cold while
    /// the cold fraction of the resident set is below roughly 1/32.
    fn balance_hot_cold(&mut self) {
        loop {
            let resident = self.map_size - self.queue2_size;
            if resident == 0 || (self.queue_size as u64) > (resident as u64) >> 5 {
                break;
            }
            if self.stack_bottom == NIL {
                break;
            }
            self.demote_oldest_hot();
        }
    }

    fn evict(&mut self) {
        self.balance_hot_cold();
        while self.used_memory > self.max_memory && self.queue_size > 0 {
            let front = self.queue_front;
            if front == NIL {
                break;
            }
            let memory = self.arena.get(front).memory;
            self.used_memory -= memory;
            self.cold_list_detach(front, false);
            let taken = self.arena.get_mut(front).value.take();
            if let Some(v) = taken {
                self.arena.get_mut(front).reference = Some(Arc::downgrade(&v));
            }
            self.queue2_push_back(front);
            self.trim_non_resident_queue();
        }
    }

    pub(crate) fn trim_non_resident_queue(&mut self) {
        loop {
            let resident = self.map_size - self.queue2_size;
            if (self.queue2_size as u64) <= self.non_resident_queue_size * resident as u64 {
                break;
            }
            let tail = self.queue2_front;
            if tail == NIL {
                break;
            }
            let under_high_watermark =
                (self.queue2_size as u64) <= self.non_resident_queue_size_high * resident as u64;
            if under_high_watermark {
                let still_live = self
                    .arena
                    .get(tail)
                    .reference
                    .as_ref()
                    .is_some_and(|w| w.upgrade().is_some());
                if still_live {
                    break;
                }
            }
            let hash = self.arena.get(tail).hash;
            let was_on_stack = self.arena.get(tail).on_stack;
            self.cold_list_detach(tail, true);
            self.bucket_detach(tail, hash);
            if was_on_stack {
                self.stack_detach(tail);
            }
            self.arena.remove(tail);
            self.map_size -= 1;
        }
    }
}
