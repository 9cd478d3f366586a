// Play Use Case

use super::PlaybackPorts;
use crate::application::registry::QueueRegistry;
use crate::application::worker::{GroupWorker, WorkerReport};
use crate::domain::{ChannelId, Disposal, GuildId, MediaItem, QueueFull, UserId};
use crate::error::{AppError, Result};
use crate::port::IdProvider;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, info_span, warn, Instrument};

/// Play request as received from the chat transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayRequest {
    pub guild_id: GuildId,
    /// Text channel the request came from; replies go here
    pub channel_id: ChannelId,
    pub user_id: UserId,
    pub query: String,
}

/// Accepted play request
#[derive(Debug)]
pub struct PlayOutcome {
    pub request_id: String,
    pub title: String,
    pub position: usize,
    /// Present when this request started the guild's worker
    pub worker: Option<JoinHandle<WorkerReport>>,
}

/// Execute the play use case
///
/// Every rejection is posted to the request's channel before being returned.
///
/// # Arguments
///
/// * `registry` - Queue registry shared with the workers
/// * `ports` - External collaborators
/// * `id_provider` - Request id generator (injected for determinism)
/// * `req` - Play request
pub async fn execute(
    registry: &Arc<QueueRegistry>,
    ports: &PlaybackPorts,
    id_provider: &dyn IdProvider,
    req: PlayRequest,
) -> Result<PlayOutcome> {
    let request_id = id_provider.generate_id();
    let span = info_span!("play", request_id = %request_id, guild_id = %req.guild_id);

    let result = handle(registry, ports, request_id, &req)
        .instrument(span)
        .await;

    if let Err(e) = &result {
        warn!(guild_id = %req.guild_id, error = %e, "Play request rejected");
        ports
            .notifier
            .notify(&req.channel_id, &e.user_message())
            .await;
    }
    result
}

async fn handle(
    registry: &Arc<QueueRegistry>,
    ports: &PlaybackPorts,
    request_id: String,
    req: &PlayRequest,
) -> Result<PlayOutcome> {
    let query = req.query.trim();
    if query.is_empty() {
        return Err(AppError::Validation(
            "Tell me what to play, e.g. !yt never gonna give you up".to_string(),
        ));
    }

    // Advisory check before any network work; enqueue re-checks under the lock
    if registry.len(&req.guild_id) >= registry.capacity() {
        return Err(QueueFull {
            guild_id: req.guild_id.clone(),
            capacity: registry.capacity(),
        }
        .into());
    }

    let destination = ports.locator.locate(&req.guild_id, &req.user_id).await?;
    info!(user_id = %req.user_id, destination = %destination, "Found user in voice channel");

    let item = resolve_media(ports, query).await?;
    let title = item.title().to_string();

    let enqueued = match registry.enqueue(&req.guild_id, item) {
        Ok(enqueued) => enqueued,
        Err(rejected) => {
            if let Err(e) = ports.assets.dispose(&rejected.item).await {
                warn!(error = %e, "Failed to dispose rejected asset");
            }
            return Err(rejected.error.into());
        }
    };

    info!(title = %title, position = enqueued.position, "Added media to queue");
    ports
        .notifier
        .notify(
            &req.channel_id,
            &format!(
                ":musical_note: Added media with title \"{}\" to queue at position {}",
                title, enqueued.position
            ),
        )
        .await;

    let worker = enqueued.spawn_worker.then(|| {
        info!("Starting worker");
        GroupWorker::new(
            req.guild_id.clone(),
            destination,
            req.channel_id.clone(),
            ports.worker_ports(registry),
        )
        .spawn()
    });

    Ok(PlayOutcome {
        request_id,
        title,
        position: enqueued.position,
        worker,
    })
}

/// Search, then reuse a cached asset or download and convert
async fn resolve_media(ports: &PlaybackPorts, query: &str) -> Result<MediaItem> {
    info!(query = %query, "Searching");
    let hit = ports.resolver.search(query).await?;
    info!(title = %hit.title, video_id = %hit.video_id, "Found video");

    if let Some(path) = ports.assets.lookup(&hit.video_id).await {
        info!(path = %path.display(), "Skipping download, media already present");
        return Ok(MediaItem::new(hit.title, path, Disposal::Keep));
    }

    let raw = ports.resolver.download(&hit).await?;
    info!(path = %raw.path.display(), "Downloaded video");

    let converted = match ports.converter.convert(&raw).await {
        Ok(item) => item,
        Err(e) => {
            if let Err(discard_err) = ports.assets.discard(&raw.path).await {
                warn!(error = %discard_err, "Failed to discard raw download");
            }
            return Err(e.into());
        }
    };

    let staged = converted.asset().to_path_buf();
    match ports.assets.admit(&hit.video_id, converted).await {
        Ok(item) => {
            info!(path = %item.asset().display(), "Extracted audio from video");
            Ok(item)
        }
        Err(e) => {
            if let Err(discard_err) = ports.assets.discard(&staged).await {
                warn!(error = %discard_err, "Failed to discard converted audio");
            }
            Err(e.into())
        }
    }
}

