// ffmpeg Audio Converter
// Extracts an mp3 audio track from a raw download

use crate::process::{ProcessError, ProcessRunner};
use async_trait::async_trait;
use guildtune_core::domain::{Disposal, MediaItem, RawAsset};
use guildtune_core::port::{AudioConverter, ConvertError};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

const CONVERT_TIMEOUT: Duration = Duration::from_secs(300);

pub struct FfmpegConverter {
    runner: ProcessRunner,
    binary: String,
    cache_dir: PathBuf,
}

impl FfmpegConverter {
    pub fn new(runner: ProcessRunner, binary: impl Into<String>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            binary: binary.into(),
            cache_dir: cache_dir.into(),
        }
    }

    /// Private output file for one conversion
    ///
    /// Never the cache slot itself; the asset store moves it into place on
    /// admit, so a concurrent conversion never writes over a playing file.
    pub fn staging_path(&self, video_id: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}.{}.part.mp3", video_id, uuid::Uuid::new_v4().simple()))
    }
}

fn convert_args(input: &Path, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        input.to_string_lossy().into_owned(),
        "-vn".to_string(),
        "-acodec".to_string(),
        "libmp3lame".to_string(),
        output.to_string_lossy().into_owned(),
    ]
}

#[async_trait]
impl AudioConverter for FfmpegConverter {
    async fn convert(&self, raw: &RawAsset) -> Result<MediaItem, ConvertError> {
        let output = self.staging_path(&raw.video_id);
        let failed = |reason: String| ConvertError::Failed {
            video_id: raw.video_id.clone(),
            reason,
        };

        self.runner
            .run(
                &self.binary,
                convert_args(&raw.path, &output),
                Some(CONVERT_TIMEOUT),
            )
            .await
            .map_err(|e| match e {
                ProcessError::SpawnFailed { reason, .. } => ConvertError::SpawnFailed(reason),
                other => failed(other.to_string()),
            })?;

        if !tokio::fs::try_exists(&output).await.unwrap_or(false) {
            return Err(failed(format!("{} was not written", output.display())));
        }

        // The mp3 replaces the raw download
        if raw.path != output {
            if let Err(e) = tokio::fs::remove_file(&raw.path).await {
                warn!(path = %raw.path.display(), error = %e, "Failed to remove raw download");
            }
        }

        Ok(MediaItem::new(raw.title.clone(), output, Disposal::Delete))
    }
}
