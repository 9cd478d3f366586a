// Asset Store Port
// Local cache of playable assets and their disposal

use crate::domain::MediaItem;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move {from} into the cache: {source}")]
    Admit {
        from: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Asset Store trait
///
/// Every item handed out by `lookup` or `admit` holds a reference on its
/// asset until `dispose`. A `Delete` asset is removed only once no live item
/// refers to it.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Path of an already playable asset for this video, if cached
    async fn lookup(&self, video_id: &str) -> Option<PathBuf>;

    /// Move a freshly converted item into the cache slot for `video_id`
    ///
    /// Returns the item re-pointed at its cached path.
    async fn admit(&self, video_id: &str, item: MediaItem) -> Result<MediaItem, AssetError>;

    /// Release an item's asset according to its disposal policy
    async fn dispose(&self, item: &MediaItem) -> Result<(), AssetError>;

    /// Remove an intermediate file (raw download) unconditionally
    async fn discard(&self, path: &Path) -> Result<(), AssetError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::Disposal;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory asset store that records every disposal
    #[derive(Default)]
    pub struct MockAssetStore {
        cached: Mutex<HashMap<String, PathBuf>>,
        admitted: Mutex<Vec<String>>,
        deleted: Mutex<Vec<PathBuf>>,
        kept: Mutex<Vec<PathBuf>>,
    }

    impl MockAssetStore {
        pub fn new() -> Self {
            Self::default()
        }
        pub fn with_cached(self, video_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
            self.cached
                .lock()
                .unwrap()
                .insert(video_id.into(), path.into());
            self
        }
        /// Paths removed via dispose (Delete policy) or discard
        pub fn deleted(&self) -> Vec<PathBuf> {
            self.deleted.lock().unwrap().clone()
        }
        /// Paths released but kept on disk (Keep policy)
        pub fn kept(&self) -> Vec<PathBuf> {
            self.kept.lock().unwrap().clone()
        }
        /// Video ids moved into the cache via admit
        pub fn admitted(&self) -> Vec<String> {
            self.admitted.lock().unwrap().clone()
        }
        pub fn released_count(&self) -> usize {
            self.deleted.lock().unwrap().len() + self.kept.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AssetStore for MockAssetStore {
        async fn lookup(&self, video_id: &str) -> Option<PathBuf> {
            self.cached.lock().unwrap().get(video_id).cloned()
        }
        async fn admit(&self, video_id: &str, item: MediaItem) -> Result<MediaItem, AssetError> {
            self.admitted.lock().unwrap().push(video_id.to_string());
            Ok(item)
        }
        async fn dispose(&self, item: &MediaItem) -> Result<(), AssetError> {
            match item.disposal() {
                Disposal::Delete => self.deleted.lock().unwrap().push(item.asset().to_path_buf()),
                Disposal::Keep => self.kept.lock().unwrap().push(item.asset().to_path_buf()),
            }
            Ok(())
        }
        async fn discard(&self, path: &Path) -> Result<(), AssetError> {
            self.deleted.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }
}
