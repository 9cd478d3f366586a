// Domain Layer - Pure business logic and entities

pub mod error;
pub mod media;
pub mod queue;

// Re-exports
pub use error::{DomainError, QueueFull};
pub use media::{
    ChannelId, DestinationId, Disposal, GuildId, MediaItem, RawAsset, SearchHit, UserId,
};
pub use queue::{GuildQueue, MAX_QUEUE_SIZE};
