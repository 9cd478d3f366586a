// Domain Error Types

use super::media::GuildId;
use thiserror::Error;

/// The guild's queue is at capacity
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Queue for guild {guild_id} is full ({capacity} items)")]
pub struct QueueFull {
    pub guild_id: GuildId,
    pub capacity: usize,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid queue capacity: {0} (must be at least 1)")]
    InvalidCapacity(usize),
}
