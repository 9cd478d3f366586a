// Playback Service - request handling in front of the queue registry

pub mod play;

#[cfg(test)]
mod play_test;

pub use play::{PlayOutcome, PlayRequest};

use crate::application::registry::QueueRegistry;
use crate::application::worker::WorkerPorts;
use crate::domain::GuildId;
use crate::error::Result;
use crate::port::{
    AssetStore, AudioConverter, DestinationLocator, IdProvider, MediaResolver, Notifier,
    VoiceGateway,
};
use std::sync::Arc;

/// External collaborators used while handling a play request
#[derive(Clone)]
pub struct PlaybackPorts {
    pub resolver: Arc<dyn MediaResolver>,
    pub converter: Arc<dyn AudioConverter>,
    pub assets: Arc<dyn AssetStore>,
    pub locator: Arc<dyn DestinationLocator>,
    pub gateway: Arc<dyn VoiceGateway>,
    pub notifier: Arc<dyn Notifier>,
}

impl PlaybackPorts {
    /// The subset a group worker needs
    pub fn worker_ports(&self, registry: &Arc<QueueRegistry>) -> WorkerPorts {
        WorkerPorts {
            registry: Arc::clone(registry),
            gateway: Arc::clone(&self.gateway),
            assets: Arc::clone(&self.assets),
            notifier: Arc::clone(&self.notifier),
        }
    }
}

/// Registry-wide numbers for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackStats {
    pub active_guilds: usize,
    pub max_queue_size: usize,
}

/// Playback Service
pub struct PlaybackService {
    registry: Arc<QueueRegistry>,
    ports: PlaybackPorts,
    id_provider: Arc<dyn IdProvider>,
}

impl PlaybackService {
    pub fn new(
        registry: Arc<QueueRegistry>,
        ports: PlaybackPorts,
        id_provider: Arc<dyn IdProvider>,
    ) -> Self {
        Self {
            registry,
            ports,
            id_provider,
        }
    }

    /// Resolve a query and queue it for the requester's guild
    pub async fn play(&self, req: PlayRequest) -> Result<PlayOutcome> {
        play::execute(
            &self.registry,
            &self.ports,
            self.id_provider.as_ref(),
            req,
        )
        .await
    }

    /// Items waiting in a guild's queue
    pub fn queue_length(&self, guild_id: &GuildId) -> usize {
        self.registry.len(guild_id)
    }

    /// Titles waiting in a guild's queue, in play order
    pub fn queued_titles(&self, guild_id: &GuildId) -> Vec<String> {
        self.registry.titles(guild_id)
    }

    pub fn stats(&self) -> PlaybackStats {
        PlaybackStats {
            active_guilds: self.registry.active_guilds(),
            max_queue_size: self.registry.capacity(),
        }
    }
}
