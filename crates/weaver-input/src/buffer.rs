//! Change buffer: groups typing into undo steps.
//!
//! Consecutive typed characters share one [`BatchId`] so they undo together.
//! A new batch starts once the step holds `limit` characters, when the
//! selection moves, or when someone else changes the document. While locked,
//! only the size limit can start a new batch.

use crate::types::BatchId;

/// Undo-step grouping as seen by the input handler.
pub trait ChangeBuffer {
    /// The batch the next change belongs to.
    fn batch(&mut self) -> BatchId;

    /// Account for `chars` typed characters in the current batch.
    fn input(&mut self, chars: usize);

    /// Keep the current batch open until the matching [`ChangeBuffer::unlock`].
    /// Calls nest.
    fn lock(&mut self);

    fn unlock(&mut self);

    fn is_locked(&self) -> bool;

    /// The selection moved without a typing change. Closes the current
    /// batch unless locked.
    fn selection_changed(&mut self);

    /// A change was made to the document under `batch`. Changes from any
    /// batch other than the current one close it unless locked.
    fn document_changed(&mut self, batch: BatchId);
}

/// The default [`ChangeBuffer`].
#[derive(Debug, Clone)]
pub struct TypingBuffer {
    limit: usize,
    size: usize,
    current: Option<BatchId>,
    next_id: u64,
    lock_depth: usize,
}

impl TypingBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            size: 0,
            current: None,
            next_id: 0,
            lock_depth: 0,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Characters typed into the current batch so far.
    pub fn size(&self) -> usize {
        self.size
    }

    fn reset(&mut self, ignore_lock: bool) {
        if self.is_locked() && !ignore_lock {
            tracing::trace!(depth = self.lock_depth, "buffer locked, keeping batch");
            return;
        }
        if let Some(batch) = self.current.take() {
            tracing::trace!(batch = batch.0, size = self.size, "closing batch");
        }
        self.size = 0;
    }
}

impl Default for TypingBuffer {
    fn default() -> Self {
        Self::new(20)
    }
}

impl ChangeBuffer for TypingBuffer {
    fn batch(&mut self) -> BatchId {
        if let Some(batch) = self.current {
            return batch;
        }
        let batch = BatchId(self.next_id);
        self.next_id += 1;
        self.current = Some(batch);
        batch
    }

    fn input(&mut self, chars: usize) {
        self.size += chars;
        if self.size >= self.limit {
            self.reset(true);
        }
    }

    fn lock(&mut self) {
        self.lock_depth += 1;
    }

    fn unlock(&mut self) {
        if self.lock_depth == 0 {
            tracing::warn!("unlock without matching lock");
            return;
        }
        self.lock_depth -= 1;
    }

    fn is_locked(&self) -> bool {
        self.lock_depth > 0
    }

    fn selection_changed(&mut self) {
        self.reset(false);
    }

    fn document_changed(&mut self, batch: BatchId) {
        if self.current != Some(batch) {
            self.reset(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_is_stable_until_reset() {
        let mut buffer = TypingBuffer::new(20);
        let first = buffer.batch();
        assert_eq!(buffer.batch(), first);
        buffer.input(3);
        assert_eq!(buffer.batch(), first);
        buffer.selection_changed();
        assert_ne!(buffer.batch(), first);
    }

    #[test]
    fn test_limit_starts_new_batch() {
        let mut buffer = TypingBuffer::new(5);
        let first = buffer.batch();
        buffer.input(4);
        assert_eq!(buffer.size(), 4);
        buffer.input(1);
        assert_eq!(buffer.size(), 0);
        assert_ne!(buffer.batch(), first);
    }

    #[test]
    fn test_limit_applies_even_when_locked() {
        let mut buffer = TypingBuffer::new(2);
        let first = buffer.batch();
        buffer.lock();
        buffer.input(2);
        assert_ne!(buffer.batch(), first);
    }

    #[test]
    fn test_lock_keeps_batch_open() {
        let mut buffer = TypingBuffer::new(20);
        let first = buffer.batch();
        buffer.lock();
        buffer.selection_changed();
        buffer.document_changed(BatchId(99));
        assert_eq!(buffer.batch(), first);
        buffer.unlock();
        buffer.selection_changed();
        assert_ne!(buffer.batch(), first);
    }

    #[test]
    fn test_lock_is_reentrant() {
        let mut buffer = TypingBuffer::default();
        buffer.lock();
        buffer.lock();
        buffer.unlock();
        assert!(buffer.is_locked());
        buffer.unlock();
        assert!(!buffer.is_locked());
        buffer.unlock();
        assert!(!buffer.is_locked());
    }

    #[test]
    fn test_own_changes_keep_batch() {
        let mut buffer = TypingBuffer::default();
        let batch = buffer.batch();
        buffer.document_changed(batch);
        assert_eq!(buffer.batch(), batch);
    }
}
