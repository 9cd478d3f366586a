// Media Resolver Port
// Abstraction for searching and downloading media (network bound)

use crate::domain::{RawAsset, SearchHit};
use async_trait::async_trait;
use thiserror::Error;

/// Resolution errors
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    #[error("No results for query \"{0}\"")]
    NoResults(String),

    #[error("Search failed: {0}")]
    SearchFailed(String),

    #[error("Download of {video_id} failed: {reason}")]
    DownloadFailed { video_id: String, reason: String },
}

/// Media Resolver trait
///
/// Implementations:
/// - YtDlpResolver: drives the `yt-dlp` binary
#[async_trait]
pub trait MediaResolver: Send + Sync {
    /// Find the best match for a human-readable query
    ///
    /// # Errors
    /// - ResolveError::NoResults if nothing matched
    /// - ResolveError::SearchFailed if the search backend is unreachable
    async fn search(&self, query: &str) -> Result<SearchHit, ResolveError>;

    /// Download the media behind a search hit
    ///
    /// # Errors
    /// - ResolveError::DownloadFailed if the download did not complete
    async fn download(&self, hit: &SearchHit) -> Result<RawAsset, ResolveError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock resolver: every query resolves to a video id derived from the query
    pub struct MockMediaResolver {
        fail_search: Option<ResolveError>,
        fail_download: bool,
        downloads: AtomicUsize,
    }

    impl MockMediaResolver {
        pub fn new() -> Self {
            Self {
                fail_search: None,
                fail_download: false,
                downloads: AtomicUsize::new(0),
            }
        }
        pub fn new_search_failure(error: ResolveError) -> Self {
            Self {
                fail_search: Some(error),
                ..Self::new()
            }
        }
        pub fn new_download_failure() -> Self {
            Self {
                fail_download: true,
                ..Self::new()
            }
        }
        pub fn download_count(&self) -> usize {
            self.downloads.load(Ordering::SeqCst)
        }
    }

    impl Default for MockMediaResolver {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl MediaResolver for MockMediaResolver {
        async fn search(&self, query: &str) -> Result<SearchHit, ResolveError> {
            if let Some(err) = &self.fail_search {
                return Err(err.clone());
            }
            Ok(SearchHit {
                video_id: query.replace(' ', "_"),
                title: query.to_string(),
            })
        }
        async fn download(&self, hit: &SearchHit) -> Result<RawAsset, ResolveError> {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            if self.fail_download {
                return Err(ResolveError::DownloadFailed {
                    video_id: hit.video_id.clone(),
                    reason: "mock download failure".to_string(),
                });
            }
            Ok(RawAsset {
                video_id: hit.video_id.clone(),
                title: hit.title.clone(),
                path: PathBuf::from(format!("/mock/{}.webm", hit.video_id)),
            })
        }
    }
}
