// Guild Queue Domain Model

use super::media::MediaItem;
use std::collections::VecDeque;
use std::num::NonZeroUsize;

/// Default per-guild queue capacity
pub const MAX_QUEUE_SIZE: usize = 10;

/// Bounded FIFO of pending media for one guild
#[derive(Debug)]
pub struct GuildQueue {
    items: VecDeque<MediaItem>,
    capacity: NonZeroUsize,
}

impl GuildQueue {
    /// Create a queue holding its first item (a fresh queue always has room)
    pub fn with_first(item: MediaItem, capacity: NonZeroUsize) -> Self {
        let mut items = VecDeque::with_capacity(capacity.get());
        items.push_back(item);
        Self { items, capacity }
    }

    /// Append an item, returning its 1-based position
    ///
    /// Hands the item back when the queue is full.
    pub fn push(&mut self, item: MediaItem) -> Result<usize, MediaItem> {
        if self.is_full() {
            return Err(item);
        }
        self.items.push_back(item);
        Ok(self.items.len())
    }

    pub fn pop(&mut self) -> Option<MediaItem> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity.get()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Titles in play order
    pub fn titles(&self) -> Vec<String> {
        self.items.iter().map(|i| i.title().to_string()).collect()
    }
}
