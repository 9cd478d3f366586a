// Audio Converter Port
// Turns a downloaded video into a playable audio asset

use crate::domain::{MediaItem, RawAsset};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ConvertError {
    #[error("Converter could not be started: {0}")]
    SpawnFailed(String),

    #[error("Conversion of {video_id} failed: {reason}")]
    Failed { video_id: String, reason: String },
}

/// Audio Converter trait
///
/// On success the returned item owns the converted asset (`Disposal::Delete`)
/// at a private path; the caller admits it into the `AssetStore`. The raw
/// asset is left in place on failure; the caller discards it.
#[async_trait]
pub trait AudioConverter: Send + Sync {
    async fn convert(&self, raw: &RawAsset) -> Result<MediaItem, ConvertError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::Disposal;

    pub struct MockAudioConverter {
        fail: bool,
    }

    impl MockAudioConverter {
        pub fn new_success() -> Self {
            Self { fail: false }
        }
        pub fn new_fail() -> Self {
            Self { fail: true }
        }
    }

    #[async_trait]
    impl AudioConverter for MockAudioConverter {
        async fn convert(&self, raw: &RawAsset) -> Result<MediaItem, ConvertError> {
            if self.fail {
                return Err(ConvertError::Failed {
                    video_id: raw.video_id.clone(),
                    reason: "mock conversion failure".to_string(),
                });
            }
            Ok(MediaItem::new(
                raw.title.clone(),
                raw.path.with_extension("mp3"),
                Disposal::Delete,
            ))
        }
    }
}
