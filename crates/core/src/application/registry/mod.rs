// Queue Registry - per-guild bounded queues and worker ownership
//
// An entry for a guild exists iff its queue is non-empty or a worker is
// running for it. Every structural change goes through the write lock; the
// worker's "pop or leave" decision is a single critical section so an
// enqueue can never land between an empty pop and the entry's removal.


use crate::domain::{DomainError, GuildId, GuildQueue, MediaItem, QueueFull, MAX_QUEUE_SIZE};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tracing::debug;

/// Result of a successful enqueue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enqueued {
    /// 1-based position of the item in the guild's queue
    pub position: usize,
    /// The caller must start exactly one worker for this guild
    pub spawn_worker: bool,
}

/// Enqueue refused; the item is handed back so its asset can be disposed
#[derive(Error, Debug)]
#[error("{error}")]
pub struct Rejected {
    pub error: QueueFull,
    pub item: MediaItem,
}

/// Outcome of the worker's atomic drain step
#[derive(Debug)]
pub enum Drain {
    /// Next item to play; the entry stays registered
    Item(MediaItem),
    /// Queue was empty and the entry has been removed; the worker must exit
    Vacated,
}

/// Process-wide map of guild id to pending media
pub struct QueueRegistry {
    queues: RwLock<HashMap<GuildId, GuildQueue>>,
    capacity: NonZeroUsize,
}

impl Default for QueueRegistry {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(MAX_QUEUE_SIZE).unwrap_or(NonZeroUsize::MIN))
    }
}

impl QueueRegistry {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// # Errors
    /// - DomainError::InvalidCapacity if `capacity` is 0
    pub fn with_capacity(capacity: usize) -> Result<Self, DomainError> {
        NonZeroUsize::new(capacity)
            .map(Self::new)
            .ok_or(DomainError::InvalidCapacity(capacity))
    }

    // A panic while holding the lock cannot leave a queue half-mutated
    // (every mutation is a single VecDeque/HashMap call), so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<GuildId, GuildQueue>> {
        self.queues.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<GuildId, GuildQueue>> {
        self.queues.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an item to a guild's queue
    ///
    /// Creates the queue when the guild has none, in which case the caller
    /// is told to spawn a worker. Existence and capacity are decided under
    /// one write lock.
    ///
    /// # Errors
    /// - Rejected (QueueFull, item handed back) if the queue is at capacity;
    ///   the registry is left untouched
    pub fn enqueue(&self, guild_id: &GuildId, item: MediaItem) -> Result<Enqueued, Rejected> {
        let mut queues = self.write();

        if let Some(queue) = queues.get_mut(guild_id) {
            return match queue.push(item) {
                Ok(position) => Ok(Enqueued {
                    position,
                    spawn_worker: false,
                }),
                Err(item) => Err(Rejected {
                    error: QueueFull {
                        guild_id: guild_id.clone(),
                        capacity: queue.capacity(),
                    },
                    item,
                }),
            };
        }

        queues.insert(guild_id.clone(), GuildQueue::with_first(item, self.capacity));
        debug!(guild_id = %guild_id, "Created guild queue");
        Ok(Enqueued {
            position: 1,
            spawn_worker: true,
        })
    }

    /// Non-blocking pop; never removes the entry
    pub fn try_drain(&self, guild_id: &GuildId) -> Option<MediaItem> {
        self.write().get_mut(guild_id).and_then(GuildQueue::pop)
    }

    /// Remove the guild's entry only if its queue is empty
    ///
    /// Returns false when the entry is absent or still holds items; a worker
    /// seeing false after an empty `try_drain` must drain again.
    pub fn remove_if_empty(&self, guild_id: &GuildId) -> bool {
        let mut queues = self.write();
        match queues.get(guild_id) {
            Some(queue) if queue.is_empty() => {
                queues.remove(guild_id);
                debug!(guild_id = %guild_id, "Removed empty guild queue");
                true
            }
            _ => false,
        }
    }

    /// Pop the next item, or remove the entry if there is none, atomically
    pub fn pop_or_vacate(&self, guild_id: &GuildId) -> Drain {
        let mut queues = self.write();
        match queues.get_mut(guild_id).map(|queue| queue.pop()) {
            Some(Some(item)) => Drain::Item(item),
            Some(None) => {
                queues.remove(guild_id);
                debug!(guild_id = %guild_id, "Guild queue vacated");
                Drain::Vacated
            }
            None => Drain::Vacated,
        }
    }

    /// Number of items waiting for a guild (0 if it has no entry)
    pub fn len(&self, guild_id: &GuildId) -> usize {
        self.read().get(guild_id).map_or(0, GuildQueue::len)
    }

    /// Whether a worker is assigned to this guild
    pub fn contains(&self, guild_id: &GuildId) -> bool {
        self.read().contains_key(guild_id)
    }

    /// Titles waiting for a guild, in play order
    pub fn titles(&self, guild_id: &GuildId) -> Vec<String> {
        self.read()
            .get(guild_id)
            .map(GuildQueue::titles)
            .unwrap_or_default()
    }

    /// Number of guilds with a registered queue
    pub fn active_guilds(&self) -> usize {
        self.read().len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }
}
