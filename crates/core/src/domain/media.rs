// Media Domain Model

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Guild identifier (one independent request stream per guild)
pub type GuildId = String;

/// User identifier
pub type UserId = String;

/// Text channel identifier (where replies are posted)
pub type ChannelId = String;

/// Voice channel identifier (where audio is streamed)
pub type DestinationId = String;

/// What happens to the backing asset once the item leaves the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Disposal {
    /// Freshly downloaded and converted, owned by this item
    Delete,
    /// Served from the local cache, shared with future requests
    Keep,
}

impl std::fmt::Display for Disposal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Disposal::Delete => write!(f, "DELETE"),
            Disposal::Keep => write!(f, "KEEP"),
        }
    }
}

/// A resolved, locally playable audio asset plus display metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    title: String,
    asset: PathBuf,
    disposal: Disposal,
}

impl MediaItem {
    pub fn new(title: impl Into<String>, asset: impl Into<PathBuf>, disposal: Disposal) -> Self {
        Self {
            title: title.into(),
            asset: asset.into(),
            disposal,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn asset(&self) -> &Path {
        &self.asset
    }

    pub fn disposal(&self) -> Disposal {
        self.disposal
    }
}

/// First search result for a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub video_id: String,
    pub title: String,
}

/// Downloaded but not yet playable asset (video container)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAsset {
    pub video_id: String,
    pub title: String,
    pub path: PathBuf,
}
