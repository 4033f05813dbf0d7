//! Offline queue for updates received while disconnected.
//!
//! Unlike a client-side outbox this queue is lossless: a disconnected peer
//! must accumulate everything broadcast to it and replay it on reconnect,
//! so there is no capacity limit. Arrival order is preserved.

/// Raw update buffers in arrival order.
#[derive(Debug, Clone, Default)]
pub struct OfflineQueue {
    updates: Vec<Vec<u8>>,
}

impl OfflineQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an update.
    pub fn enqueue(&mut self, update: Vec<u8>) {
        self.updates.push(update);
    }

    /// Queued updates, oldest first.
    pub fn updates(&self) -> &[Vec<u8>] {
        &self.updates
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Total bytes queued.
    pub fn total_bytes(&self) -> usize {
        self.updates.iter().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        self.updates.clear();
    }
}
