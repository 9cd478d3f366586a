// Local Asset Store
// Converted audio cached on disk as <cache_dir>/<video_id>.mp3

use async_trait::async_trait;
use guildtune_core::domain::{Disposal, MediaItem};
use guildtune_core::port::{AssetError, AssetStore};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// Live items pointing at one cached file
#[derive(Debug, Default)]
struct Lease {
    holders: usize,
    /// Some holder owns the file; remove it when the last holder is done
    doomed: bool,
}

pub struct LocalAssetStore {
    cache_dir: PathBuf,
    // Held across the filesystem calls so a lookup never hands out a path
    // that a concurrent dispose is about to remove
    leases: Mutex<HashMap<PathBuf, Lease>>,
}

impl LocalAssetStore {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            leases: Mutex::new(HashMap::new()),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Create the cache directory if missing
    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.cache_dir).await
    }

    /// Number of live items holding a cached file
    pub async fn holders(&self, path: &Path) -> usize {
        self.leases
            .lock()
            .await
            .get(path)
            .map_or(0, |lease| lease.holders)
    }

    fn slot(&self, video_id: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.mp3", video_id))
    }

    async fn remove(path: &Path) -> Result<(), AssetError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Removed asset");
                Ok(())
            }
            // Already gone
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(AssetError::Remove {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn lookup(&self, video_id: &str) -> Option<PathBuf> {
        let path = self.slot(video_id);
        let mut leases = self.leases.lock().await;
        if let Some(lease) = leases.get_mut(&path) {
            lease.holders += 1;
            return Some(path);
        }
        match tokio::fs::try_exists(&path).await {
            Ok(true) => {
                leases.insert(
                    path.clone(),
                    Lease {
                        holders: 1,
                        doomed: false,
                    },
                );
                Some(path)
            }
            _ => None,
        }
    }

    async fn admit(&self, video_id: &str, item: MediaItem) -> Result<MediaItem, AssetError> {
        let path = self.slot(video_id);
        let mut leases = self.leases.lock().await;

        // Replaces any earlier copy atomically; open readers keep the old file
        tokio::fs::rename(item.asset(), &path)
            .await
            .map_err(|source| AssetError::Admit {
                from: item.asset().to_path_buf(),
                source,
            })?;

        let lease = leases.entry(path.clone()).or_default();
        lease.holders += 1;
        lease.doomed |= item.disposal() == Disposal::Delete;
        debug!(path = %path.display(), holders = lease.holders, "Admitted asset");

        Ok(MediaItem::new(item.title(), path, item.disposal()))
    }

    async fn dispose(&self, item: &MediaItem) -> Result<(), AssetError> {
        let mut leases = self.leases.lock().await;
        let Some(lease) = leases.get_mut(item.asset()) else {
            return match item.disposal() {
                Disposal::Delete => Self::remove(item.asset()).await,
                Disposal::Keep => Ok(()),
            };
        };

        lease.holders = lease.holders.saturating_sub(1);
        lease.doomed |= item.disposal() == Disposal::Delete;
        if lease.holders > 0 {
            debug!(
                path = %item.asset().display(),
                holders = lease.holders,
                "Asset still queued elsewhere"
            );
            return Ok(());
        }

        let doomed = lease.doomed;
        leases.remove(item.asset());
        if doomed {
            Self::remove(item.asset()).await
        } else {
            Ok(())
        }
    }

    async fn discard(&self, path: &Path) -> Result<(), AssetError> {
        Self::remove(path).await
    }
}
