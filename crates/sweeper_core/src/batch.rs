use crate::MessageId;

/// Default cap on identifiers submitted in one bulk-delete call.
pub const DEFAULT_BATCH_CAPACITY: usize = 100;

/// Ordered, bounded buffer of message identifiers awaiting one bulk-delete
/// call. Created empty; drained whole by `take` for a flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionBatch {
    ids: Vec<MessageId>,
    capacity: usize,
}

impl DeletionBatch {
    /// A capacity of zero is clamped to one: a batch that can never fill
    /// would never flush.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ids: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, id: MessageId) {
        self.ids.push(id);
    }

    pub fn is_full(&self) -> bool {
        self.ids.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drain the buffered identifiers for a flush, leaving the batch empty
    /// with the same capacity.
    pub fn take(&mut self) -> Vec<MessageId> {
        std::mem::take(&mut self.ids)
    }
}

impl Default for DeletionBatch {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_CAPACITY)
    }
}
