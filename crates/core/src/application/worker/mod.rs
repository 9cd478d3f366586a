// Group Worker - drains one guild's queue into its voice destination


use crate::application::registry::{Drain, QueueRegistry};
use crate::domain::{ChannelId, DestinationId, GuildId, MediaItem};
use crate::port::{AssetStore, Notifier, PlaybackError, SetupError, VoiceGateway, VoiceSession};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Shared collaborators of every group worker
#[derive(Clone)]
pub struct WorkerPorts {
    pub registry: Arc<QueueRegistry>,
    pub gateway: Arc<dyn VoiceGateway>,
    pub assets: Arc<dyn AssetStore>,
    pub notifier: Arc<dyn Notifier>,
}

/// What a worker did before it terminated
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub played: usize,
    pub failed: usize,
    /// Items disposed without playback because no session could be set up
    pub discarded: usize,
    pub setup_failed: bool,
}

/// Worker bound to a single guild
///
/// Exactly one exists per registered guild. It is spawned by whoever got
/// `spawn_worker = true` from `QueueRegistry::enqueue` and terminates once
/// `pop_or_vacate` removes the guild's entry.
pub struct GroupWorker {
    guild_id: GuildId,
    destination: DestinationId,
    reply_channel: ChannelId,
    ports: WorkerPorts,
}

impl GroupWorker {
    pub fn new(
        guild_id: impl Into<GuildId>,
        destination: impl Into<DestinationId>,
        reply_channel: impl Into<ChannelId>,
        ports: WorkerPorts,
    ) -> Self {
        Self {
            guild_id: guild_id.into(),
            destination: destination.into(),
            reply_channel: reply_channel.into(),
            ports,
        }
    }

    /// Run the worker on the tokio runtime
    pub fn spawn(self) -> JoinHandle<WorkerReport> {
        tokio::spawn(self.run())
    }

    /// Connect, then drain until the registry entry is vacated
    pub async fn run(self) -> WorkerReport {
        info!(
            guild_id = %self.guild_id,
            destination = %self.destination,
            "Worker started"
        );

        let mut report = WorkerReport::default();
        let mut session = match self.connect().await {
            Ok(session) => session,
            Err(e) => {
                self.abandon(e, &mut report).await;
                return report;
            }
        };

        loop {
            let item = match self.ports.registry.pop_or_vacate(&self.guild_id) {
                Drain::Item(item) => Arc::new(item),
                Drain::Vacated => break,
            };

            let (returned, result) = Self::play_isolated(session, Arc::clone(&item)).await;
            match result {
                Ok(()) => {
                    report.played += 1;
                    info!(guild_id = %self.guild_id, title = %item.title(), "Finished playing");
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        guild_id = %self.guild_id,
                        title = %item.title(),
                        error = %e,
                        "Playback failed, skipping"
                    );
                    self.ports
                        .notifier
                        .notify(
                            &self.reply_channel,
                            &format!("Unable to play \"{}\": {}", item.title(), e),
                        )
                        .await;
                }
            }
            self.dispose(&item).await;

            session = match returned {
                Some(session) => session,
                // Session went down with a panicking player
                None => match self.connect().await {
                    Ok(session) => session,
                    Err(e) => {
                        self.abandon(e, &mut report).await;
                        return report;
                    }
                },
            };
        }

        session.disconnect().await;
        info!(
            guild_id = %self.guild_id,
            played = report.played,
            failed = report.failed,
            "Worker stopped (queue empty)"
        );
        report
    }

    async fn connect(&self) -> Result<Box<dyn VoiceSession>, SetupError> {
        self.ports
            .gateway
            .connect(&self.guild_id, &self.destination)
            .await
    }

    /// Play one item in its own task so a panicking player cannot take the
    /// worker (and with it the guild's registry entry) down
    async fn play_isolated(
        mut session: Box<dyn VoiceSession>,
        item: Arc<MediaItem>,
    ) -> (Option<Box<dyn VoiceSession>>, Result<(), PlaybackError>) {
        let handle = tokio::spawn(async move {
            let result = session.play(&item).await;
            (session, result)
        });

        match handle.await {
            Ok((session, result)) => (Some(session), result),
            Err(join_err) => {
                let reason = if join_err.is_panic() {
                    "player panicked".to_string()
                } else {
                    "player task cancelled".to_string()
                };
                error!(error = ?join_err, "Playback task did not complete");
                (None, Err(PlaybackError::Panicked(reason)))
            }
        }
    }

    /// No session: report, then dispose of everything queued until the entry
    /// is vacated so the next enqueue starts a fresh worker
    async fn abandon(&self, cause: SetupError, report: &mut WorkerReport) {
        report.setup_failed = true;
        error!(guild_id = %self.guild_id, error = %cause, "Failed to start worker");
        self.ports
            .notifier
            .notify(
                &self.reply_channel,
                &format!("Unable to start voice worker: {}", cause),
            )
            .await;

        while let Drain::Item(item) = self.ports.registry.pop_or_vacate(&self.guild_id) {
            report.discarded += 1;
            self.ports
                .notifier
                .notify(
                    &self.reply_channel,
                    &format!("Dropped \"{}\" from the queue", item.title()),
                )
                .await;
            self.dispose(&item).await;
        }
        warn!(
            guild_id = %self.guild_id,
            discarded = report.discarded,
            "Worker gave up, queue cleared"
        );
    }

    async fn dispose(&self, item: &MediaItem) {
        if let Err(e) = self.ports.assets.dispose(item).await {
            warn!(guild_id = %self.guild_id, error = %e, "Failed to dispose asset");
        }
    }
}
