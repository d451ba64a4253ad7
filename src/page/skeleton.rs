//! The shared skeleton underlying every Core A replacement policy: a
//! bucket-chained hash index, a doubly linked policy list, memory
//! accounting, and the grouped write-back eviction loop.
//!
//! Concrete policies (`lru`, `fifo`, `mru`, `clock`, `random`) each own a
//! [`Skeleton<R>`] and differ only in how they pick eviction candidates and
//! how `get`/`put` reorder the list — the ~3% of logic the design notes call
//! "per-policy". Everything else lives here.

use crate::arena::{Arena, Handle, NIL};
use crate::error::{CacheError, Result};
use crate::page::config::{CACHE_MIN_RECORDS, MEMORY_POINTER};
use crate::page::record::Record;
use crate::page::writer::CacheWriter;
use alloc::collections::BTreeSet;
use alloc::vec::Vec;

/// A cache-owned wrapper around one resident record.
///
/// The four link fields named in the design live here, not on `R` itself, so
/// a `Record` implementation cannot observe or corrupt them.
pub(crate) struct Node<R> {
    pub(crate) record: R,
    prev: Handle,
    next: Handle,
    bucket_next: Handle,
}

fn bucket_hash(pos: i32) -> usize {
    (pos as u32 as usize).wrapping_mul(0x9E37_79B1)
}

fn next_power_of_two(value: u64) -> usize {
    value.max(1).next_power_of_two() as usize
}

/// The shared hash-bucket + doubly-linked-list + memory-watermark skeleton.
pub(crate) struct Skeleton<R> {
    buckets: Vec<Handle>,
    mask: usize,
    arena: Arena<Node<R>>,
    /// Handle of the oldest (first-to-evict) resident node, or [`NIL`] if empty.
    oldest: Handle,
    /// Handle of the newest (most-recently-touched) resident node, or [`NIL`] if empty.
    newest: Handle,
    record_count: usize,
    /// Current memory usage, in 4-byte words, including bucket-array overhead.
    memory: u64,
    max_memory: u64,
}

impl<R: Record> Skeleton<R> {
    /// Builds an empty skeleton sized for `max_memory_kb` kilobytes.
    pub(crate) fn new(max_memory_kb: u64) -> Result<Self> {
        let max_memory = (max_memory_kb.saturating_mul(1024)) / 4;
        let bucket_target = max_memory / 64;
        if bucket_target > i32::MAX as u64 {
            return Err(CacheError::invalid_state(alloc::format!(
                "requested cache of {max_memory_kb} KiB needs {bucket_target} buckets, \
                 which overflows a 32-bit bucket count"
            )));
        }
        let len = next_power_of_two(bucket_target);
        Ok(Skeleton {
            buckets: alloc::vec![NIL; len],
            mask: len - 1,
            arena: Arena::with_capacity(len),
            oldest: NIL,
            newest: NIL,
            record_count: 0,
            memory: len as u64 * MEMORY_POINTER,
            max_memory,
        })
    }

    pub(crate) fn record_count(&self) -> usize {
        self.record_count
    }

    pub(crate) fn memory(&self) -> u64 {
        self.memory
    }

    pub(crate) fn max_memory(&self) -> u64 {
        self.max_memory
    }

    pub(crate) fn set_max_memory(&mut self, words: u64) {
        self.max_memory = words;
    }

    fn bucket_of(&self, pos: i32) -> usize {
        bucket_hash(pos) & self.mask
    }

    fn find_handle(&self, pos: i32) -> Option<Handle> {
        let mut cursor = self.buckets[self.bucket_of(pos)];
        while cursor != NIL {
            let node = self.arena.get(cursor);
            if node.record.pos() == pos {
                return Some(cursor);
            }
            cursor = node.bucket_next;
        }
        None
    }

    /// Looks up a record without any list side effects.
    pub(crate) fn find(&self, pos: i32) -> Option<&R> {
        self.find_handle(pos).map(|h| &self.arena.get(h).record)
    }

    pub(crate) fn handle_of(&self, pos: i32) -> Option<Handle> {
        self.find_handle(pos)
    }

    pub(crate) fn record_at(&self, handle: Handle) -> &R {
        &self.arena.get(handle).record
    }

    /// Inserts a brand-new record into the bucket index and arena (but not
    /// the policy list — callers attach it at whichever end their policy
    /// uses for newly-touched entries) and accounts its memory.
    ///
    /// # Errors
    /// Returns [`CacheError::InternalInvariant`] if `record.pos()` is already
    /// present.
    pub(crate) fn insert_new(&mut self, record: R) -> Result<Handle> {
        let pos = record.pos();
        if self.find_handle(pos).is_some() {
            return Err(CacheError::internal_invariant(alloc::format!(
                "duplicate put at position {pos}"
            )));
        }
        let bucket = self.bucket_of(pos);
        let memory_words = record.memory().max(0) as u64;
        let handle = self.arena.insert(Node {
            record,
            prev: NIL,
            next: NIL,
            bucket_next: self.buckets[bucket],
        });
        self.buckets[bucket] = handle;
        self.record_count += 1;
        self.memory += memory_words;
        Ok(handle)
    }

    /// Removes a node by handle from the bucket index, the policy list, and
    /// the arena, returning the owned record. Memory/record-count accounting
    /// is updated; the node (and with it every link field) ceases to exist.
    pub(crate) fn remove_handle(&mut self, handle: Handle) -> R {
        self.detach(handle);
        let pos = self.arena.get(handle).record.pos();
        let bucket = self.bucket_of(pos);
        let mut cursor = self.buckets[bucket];
        if cursor == handle {
            self.buckets[bucket] = self.arena.get(handle).bucket_next;
        } else {
            while cursor != NIL {
                let next = self.arena.get(cursor).bucket_next;
                if next == handle {
                    let after = self.arena.get(handle).bucket_next;
                    self.arena.get_mut(cursor).bucket_next = after;
                    break;
                }
                cursor = next;
            }
        }
        let node = self.arena.remove(handle);
        self.record_count -= 1;
        self.memory -= node.record.memory().max(0) as u64;
        node.record
    }

    /// Swaps in `new_record` at an existing handle, adjusting memory
    /// accounting for any change in size, and returns the prior record.
    pub(crate) fn replace_record(&mut self, handle: Handle, new_record: R) -> R {
        let old_memory = self.arena.get(handle).record.memory().max(0) as u64;
        let new_memory = new_record.memory().max(0) as u64;
        let old = core::mem::replace(&mut self.arena.get_mut(handle).record, new_record);
        self.memory = self.memory - old_memory + new_memory;
        old
    }

    pub(crate) fn remove_by_pos(&mut self, pos: i32) -> Option<R> {
        let handle = self.find_handle(pos)?;
        Some(self.remove_handle(handle))
    }

    /// Drops every resident record and resets counters, keeping the bucket
    /// array's length (and its fixed memory overhead).
    pub(crate) fn clear(&mut self) {
        for bucket in &mut self.buckets {
            *bucket = NIL;
        }
        self.arena.clear();
        self.oldest = NIL;
        self.newest = NIL;
        let overhead = self.buckets.len() as u64 * MEMORY_POINTER;
        self.memory = overhead;
        self.record_count = 0;
    }

    // ---- policy list operations -------------------------------------------------

    pub(crate) fn oldest(&self) -> Handle {
        self.oldest
    }

    pub(crate) fn newest(&self) -> Handle {
        self.newest
    }

    pub(crate) fn next_of(&self, handle: Handle) -> Handle {
        self.arena.get(handle).next
    }

    pub(crate) fn prev_of(&self, handle: Handle) -> Handle {
        self.arena.get(handle).prev
    }

    fn detach(&mut self, handle: Handle) {
        let (prev, next) = {
            let node = self.arena.get(handle);
            (node.prev, node.next)
        };
        if prev != NIL {
            self.arena.get_mut(prev).next = next;
        } else {
            self.oldest = next;
        }
        if next != NIL {
            self.arena.get_mut(next).prev = prev;
        } else {
            self.newest = prev;
        }
        let node = self.arena.get_mut(handle);
        node.prev = NIL;
        node.next = NIL;
    }

    /// Attaches `handle` as the most-recently-touched entry.
    pub(crate) fn attach_as_newest(&mut self, handle: Handle) {
        let old_newest = self.newest;
        {
            let node = self.arena.get_mut(handle);
            node.prev = old_newest;
            node.next = NIL;
        }
        if old_newest != NIL {
            self.arena.get_mut(old_newest).next = handle;
        } else {
            self.oldest = handle;
        }
        self.newest = handle;
    }

    /// Attaches `handle` as the oldest (first-to-evict) entry.
    pub(crate) fn attach_as_oldest(&mut self, handle: Handle) {
        let old_oldest = self.oldest;
        {
            let node = self.arena.get_mut(handle);
            node.next = old_oldest;
            node.prev = NIL;
        }
        if old_oldest != NIL {
            self.arena.get_mut(old_oldest).prev = handle;
        } else {
            self.newest = handle;
        }
        self.oldest = handle;
    }

    pub(crate) fn move_to_newest(&mut self, handle: Handle) {
        if self.newest == handle {
            return;
        }
        self.detach(handle);
        self.attach_as_newest(handle);
    }

    pub(crate) fn move_to_oldest(&mut self, handle: Handle) {
        if self.oldest == handle {
            return;
        }
        self.detach(handle);
        self.attach_as_oldest(handle);
    }

    /// Snapshot of every currently-dirty record, in oldest-to-newest list order.
    pub(crate) fn all_changed(&self) -> Vec<&R>
    where
        R: Record,
    {
        let mut out = Vec::new();
        let mut cursor = self.oldest;
        while cursor != NIL {
            let node = self.arena.get(cursor);
            if node.record.is_changed() {
                out.push(&node.record);
            }
            cursor = node.next;
        }
        out
    }

    // ---- eviction -----------------------------------------------------------

    /// A candidate selected for buffered, grouped write-back has already
    /// been removed from the bucket index and policy list (its memory and
    /// record-count accounting are already up to date); only the deferred
    /// I/O (`writeBack`) remains to be performed.
    fn should_stop(&self, any_buffered: bool) -> bool {
        if self.record_count <= CACHE_MIN_RECORDS {
            return true;
        }
        if !any_buffered {
            return self.memory <= self.max_memory;
        }
        self.memory.saturating_mul(4) <= self.max_memory.saturating_mul(3)
    }

    /// Runs one eviction pass, using `next_candidate` to pick the next
    /// handle to examine (the closure is responsible for applying any
    /// policy-specific skip reordering and for persisting traversal state
    /// such as a Clock hand across calls). The closure increments `examined`
    /// for every node it inspects (hit or skip) and returns `None` only if
    /// it finds no eligible candidate after visiting every resident node.
    ///
    /// A clean (non-dirty) candidate is dropped immediately. A dirty
    /// candidate is removed from the live structures right away too (so
    /// `recordCount`/`memory` already reflect its departure for the purpose
    /// of the termination checks above) but its value is held in a buffer
    /// for grouped, sorted write-back once the pass completes.
    pub(crate) fn run_eviction<W, F>(
        &mut self,
        writer: &mut W,
        mut next_candidate: F,
    ) -> Result<(u64, u64)>
    where
        R: Clone,
        W: CacheWriter<R>,
        F: FnMut(&mut Self, &BTreeSet<i32>, &mut usize) -> Option<Handle>,
    {
        if self.memory < self.max_memory {
            return Ok((0, 0));
        }
        let mut buffered: Vec<R> = Vec::new();
        let mut buffered_positions: BTreeSet<i32> = BTreeSet::new();
        let mut examined = 0usize;
        let mut flush_attempts = 0u8;
        let mut flushed_for_writeback = false;
        let mut evicted_count = 0u64;

        loop {
            if self.should_stop(!buffered.is_empty()) {
                break;
            }
            if examined >= self.record_count.max(1) {
                if flush_attempts >= 2 {
                    writer.trace().warn(format_args!(
                        "eviction could not free enough memory after {flush_attempts} \
                         flush attempts; aborting this pass"
                    ));
                    break;
                }
                writer.flush_log()?;
                flushed_for_writeback = true;
                flush_attempts += 1;
                examined = 0;
                continue;
            }
            match next_candidate(self, &buffered_positions, &mut examined) {
                Some(handle) => {
                    let is_dirty = self.arena.get(handle).record.is_changed();
                    let record = self.remove_handle(handle);
                    evicted_count += 1;
                    if is_dirty {
                        buffered_positions.insert(record.pos());
                        buffered.push(record);
                    }
                }
                None => {
                    writer.trace().warn(format_args!(
                        "eviction traversal exhausted without finding a removable candidate"
                    ));
                    break;
                }
            }
        }

        if buffered.is_empty() {
            return Ok((evicted_count, 0));
        }

        if !flushed_for_writeback {
            writer.flush_log()?;
        }

        // Sort by ascending pos for I/O locality and reproducible ordering.
        buffered.sort_by_key(|r| r.pos());
        let writeback_count = buffered.len() as u64;

        let saved_max_memory = self.max_memory;
        self.max_memory = u64::MAX;
        let result = (|| -> Result<()> {
            for record in &buffered {
                writer.write_back(record)?;
            }
            Ok(())
        })();
        self.max_memory = saved_max_memory;
        result.map(|()| (evicted_count, writeback_count))
    }
}
