// ffmpeg Stream Player
// Voice gateway that streams each item as Opus/Ogg to a per-destination sink

use crate::process::{ProcessError, ProcessRunner};
use async_trait::async_trait;
use guildtune_core::domain::{DestinationId, GuildId, MediaItem};
use guildtune_core::port::{PlaybackError, SetupError, VoiceGateway, VoiceSession};
use std::time::Duration;
use tracing::{debug, info};

/// Default sink; `{destination}` and `{guild}` are substituted per session
pub const DEFAULT_SINK_TEMPLATE: &str = "udp://127.0.0.1:5004?destination={destination}";

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct FfmpegStreamPlayer {
    runner: ProcessRunner,
    binary: String,
    sink_template: String,
}

impl FfmpegStreamPlayer {
    pub fn new(runner: ProcessRunner, binary: impl Into<String>, sink_template: impl Into<String>) -> Self {
        Self {
            runner,
            binary: binary.into(),
            sink_template: sink_template.into(),
        }
    }
}

fn render_sink(template: &str, guild_id: &str, destination: &str) -> String {
    template
        .replace("{destination}", destination)
        .replace("{guild}", guild_id)
}

fn stream_args(asset: &str, sink: &str) -> Vec<String> {
    [
        "-re", "-loglevel", "error", "-i", asset, "-vn", "-c:a", "libopus", "-f", "ogg", sink,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[async_trait]
impl VoiceGateway for FfmpegStreamPlayer {
    async fn connect(
        &self,
        guild_id: &GuildId,
        destination: &DestinationId,
    ) -> Result<Box<dyn VoiceSession>, SetupError> {
        if destination.trim().is_empty() {
            return Err(SetupError::Join {
                destination: destination.clone(),
                reason: "empty destination".to_string(),
            });
        }

        self.runner
            .run(&self.binary, ["-version"], Some(PROBE_TIMEOUT))
            .await
            .map_err(|e| SetupError::Unavailable(e.to_string()))?;

        let sink = render_sink(&self.sink_template, guild_id, destination);
        info!(guild_id = %guild_id, destination = %destination, sink = %sink, "Joined voice destination");

        Ok(Box::new(FfmpegSession {
            runner: self.runner.clone(),
            binary: self.binary.clone(),
            guild_id: guild_id.clone(),
            sink,
        }))
    }
}

/// One joined destination; each play is a separate ffmpeg child
pub struct FfmpegSession {
    runner: ProcessRunner,
    binary: String,
    guild_id: GuildId,
    sink: String,
}

#[async_trait]
impl VoiceSession for FfmpegSession {
    async fn play(&mut self, item: &MediaItem) -> Result<(), PlaybackError> {
        let asset = item.asset();
        if !tokio::fs::try_exists(asset).await.unwrap_or(false) {
            return Err(PlaybackError::AssetUnreadable(asset.display().to_string()));
        }

        debug!(guild_id = %self.guild_id, title = %item.title(), "Streaming");
        let args = stream_args(&asset.to_string_lossy(), &self.sink);

        match self.runner.run(&self.binary, args, None).await {
            Ok(_) => Ok(()),
            Err(ProcessError::SpawnFailed { reason, .. }) => {
                Err(PlaybackError::DestinationUnreachable(reason))
            }
            Err(e) => Err(PlaybackError::PlayerFailed(e.to_string())),
        }
    }

    async fn disconnect(&mut self) {
        info!(guild_id = %self.guild_id, sink = %self.sink, "Left voice destination");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guildtune_core::domain::Disposal;
    use guildtune_core::port::time_provider::SystemTimeProvider;
    use std::sync::Arc;

    fn runner() -> ProcessRunner {
        ProcessRunner::with_default_env(Arc::new(SystemTimeProvider))
    }

    fn session(binary: &str) -> FfmpegSession {
        FfmpegSession {
            runner: runner(),
            binary: binary.to_string(),
            guild_id: "g1".to_string(),
            sink: "udp://127.0.0.1:5004".to_string(),
        }
    }

    fn existing_asset() -> MediaItem {
        let path = std::env::temp_dir().join(format!("guildtune-play-{}.mp3", uuid::Uuid::new_v4()));
        std::fs::write(&path, b"mp3").unwrap();
        MediaItem::new("song", path, Disposal::Delete)
    }

    #[test]
    fn test_render_sink() {
        assert_eq!(
            render_sink("rtp://host/{guild}/{destination}", "g1", "v9"),
            "rtp://host/g1/v9"
        );
        assert_eq!(
            render_sink(DEFAULT_SINK_TEMPLATE, "g1", "v9"),
            "udp://127.0.0.1:5004?destination=v9"
        );
    }

    #[test]
    fn test_stream_args_end_with_sink() {
        let args = stream_args("/c/a.mp3", "udp://x");
        assert_eq!(args[0], "-re");
        assert!(args.windows(2).any(|w| w[0] == "-c:a" && w[1] == "libopus"));
        assert_eq!(args.last().unwrap(), "udp://x");
    }

    #[tokio::test]
    async fn test_connect_requires_working_binary() {
        let player = FfmpegStreamPlayer::new(runner(), "false", DEFAULT_SINK_TEMPLATE);
        let err = player
            .connect(&"g1".to_string(), &"v1".to_string())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, SetupError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_connect_rejects_empty_destination() {
        let player = FfmpegStreamPlayer::new(runner(), "true", DEFAULT_SINK_TEMPLATE);
        let err = player
            .connect(&"g1".to_string(), &" ".to_string())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, SetupError::Join { .. }));
    }

    #[tokio::test]
    async fn test_connect_and_play() {
        let player = FfmpegStreamPlayer::new(runner(), "true", DEFAULT_SINK_TEMPLATE);
        let mut session = player
            .connect(&"g1".to_string(), &"v1".to_string())
            .await
            .unwrap();
        let item = existing_asset();

        session.play(&item).await.unwrap();
        session.disconnect().await;

        std::fs::remove_file(item.asset()).ok();
    }

    #[tokio::test]
    async fn test_missing_asset_is_unreadable() {
        let item = MediaItem::new("gone", "/nonexistent/guildtune.mp3", Disposal::Delete);
        let err = session("true").play(&item).await.unwrap_err();
        assert!(matches!(err, PlaybackError::AssetUnreadable(_)));
    }

    #[tokio::test]
    async fn test_player_exit_failure() {
        let item = existing_asset();
        let err = session("false").play(&item).await.unwrap_err();
        assert!(matches!(err, PlaybackError::PlayerFailed(_)));
        std::fs::remove_file(item.asset()).ok();
    }
}
