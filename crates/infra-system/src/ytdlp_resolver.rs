// yt-dlp Media Resolver
// Searches and downloads through the yt-dlp binary

use crate::process::{ProcessError, ProcessRunner};
use async_trait::async_trait;
use guildtune_core::domain::{RawAsset, SearchHit};
use guildtune_core::port::{MediaResolver, ResolveError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Subset of yt-dlp's `--dump-json` output we rely on
#[derive(Debug, Deserialize)]
struct VideoInfo {
    id: String,
    title: String,
}

pub struct YtDlpResolver {
    runner: ProcessRunner,
    binary: String,
    cache_dir: PathBuf,
}

impl YtDlpResolver {
    /// # Arguments
    /// * `runner` - Shared child process runner
    /// * `binary` - yt-dlp executable name or path
    /// * `cache_dir` - Directory raw downloads are written to
    pub fn new(runner: ProcessRunner, binary: impl Into<String>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            binary: binary.into(),
            cache_dir: cache_dir.into(),
        }
    }
}

fn search_args(query: &str) -> Vec<String> {
    vec![
        "--skip-download".to_string(),
        "--no-warnings".to_string(),
        "--dump-json".to_string(),
        format!("ytsearch1:{}", query),
    ]
}

fn download_args(cache_dir: &Path, video_id: &str) -> Vec<String> {
    vec![
        "--no-playlist".to_string(),
        "--no-warnings".to_string(),
        "-f".to_string(),
        "bestaudio".to_string(),
        "-o".to_string(),
        cache_dir
            .join(format!("{}.%(ext)s", video_id))
            .to_string_lossy()
            .into_owned(),
        "--print".to_string(),
        "after_move:filepath".to_string(),
        format!("https://www.youtube.com/watch?v={}", video_id),
    ]
}

/// First JSON line of a search; None if yt-dlp printed nothing
fn parse_search_output(stdout: &str) -> Result<Option<SearchHit>, serde_json::Error> {
    let Some(line) = stdout.lines().find(|l| !l.trim().is_empty()) else {
        return Ok(None);
    };
    let info: VideoInfo = serde_json::from_str(line)?;
    Ok(Some(SearchHit {
        video_id: info.id,
        title: info.title,
    }))
}

/// yt-dlp prints the final path last
fn parse_download_output(stdout: &str) -> Option<PathBuf> {
    stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(PathBuf::from)
}

#[async_trait]
impl MediaResolver for YtDlpResolver {
    async fn search(&self, query: &str) -> Result<SearchHit, ResolveError> {
        let output = self
            .runner
            .run(&self.binary, search_args(query), Some(SEARCH_TIMEOUT))
            .await
            .map_err(|e| ResolveError::SearchFailed(e.to_string()))?;

        match parse_search_output(&output.stdout) {
            Ok(Some(hit)) => {
                debug!(video_id = %hit.video_id, duration_ms = output.duration_ms, "yt-dlp search done");
                Ok(hit)
            }
            Ok(None) => Err(ResolveError::NoResults(query.to_string())),
            Err(e) => Err(ResolveError::SearchFailed(format!(
                "unreadable yt-dlp output: {}",
                e
            ))),
        }
    }

    async fn download(&self, hit: &SearchHit) -> Result<RawAsset, ResolveError> {
        let failed = |reason: String| ResolveError::DownloadFailed {
            video_id: hit.video_id.clone(),
            reason,
        };

        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| failed(e.to_string()))?;

        let output = self
            .runner
            .run(
                &self.binary,
                download_args(&self.cache_dir, &hit.video_id),
                Some(DOWNLOAD_TIMEOUT),
            )
            .await
            .map_err(|e| match e {
                ProcessError::Failed { stderr, .. } if !stderr.is_empty() => failed(stderr),
                other => failed(other.to_string()),
            })?;

        let path = parse_download_output(&output.stdout)
            .ok_or_else(|| failed("yt-dlp did not report a file".to_string()))?;

        Ok(RawAsset {
            video_id: hit.video_id.clone(),
            title: hit.title.clone(),
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guildtune_core::port::time_provider::SystemTimeProvider;
    use std::sync::Arc;

    fn resolver(binary: &str) -> YtDlpResolver {
        YtDlpResolver::new(
            ProcessRunner::with_default_env(Arc::new(SystemTimeProvider)),
            binary,
            std::env::temp_dir().join("guildtune-ytdlp-test"),
        )
    }

    #[test]
    fn test_parse_search_output() {
        let stdout = "{\"id\":\"dQw4w9WgXcQ\",\"title\":\"Never Gonna Give You Up\",\"duration\":213}\n";
        let hit = parse_search_output(stdout).unwrap().unwrap();
        assert_eq!(hit.video_id, "dQw4w9WgXcQ");
        assert_eq!(hit.title, "Never Gonna Give You Up");
    }

    #[test]
    fn test_parse_empty_search_output() {
        assert!(parse_search_output("\n  \n").unwrap().is_none());
        assert!(parse_search_output("not json").is_err());
    }

    #[test]
    fn test_parse_download_output_takes_last_line() {
        let stdout = "[download] 100%\n/cache/abc.webm\n\n";
        assert_eq!(
            parse_download_output(stdout),
            Some(PathBuf::from("/cache/abc.webm"))
        );
        assert_eq!(parse_download_output(""), None);
    }

    #[test]
    fn test_download_args_target_cache_dir() {
        let args = download_args(Path::new("/cache"), "abc");
        assert!(args.contains(&"/cache/abc.%(ext)s".to_string()));
        assert_eq!(args.last().unwrap(), "https://www.youtube.com/watch?v=abc");
    }

    #[test]
    fn test_search_args_limit_to_one_result() {
        assert_eq!(search_args("lofi beats").last().unwrap(), "ytsearch1:lofi beats");
    }

    #[tokio::test]
    async fn test_search_failure_maps_to_search_failed() {
        let err = resolver("false").search("anything").await.unwrap_err();
        assert!(matches!(err, ResolveError::SearchFailed(_)));
    }

    #[tokio::test]
    async fn test_search_without_output_is_no_results() {
        // `true` exits 0 and prints nothing
        let err = resolver("true").search("anything").await.unwrap_err();
        assert!(matches!(err, ResolveError::NoResults(q) if q == "anything"));
    }

    #[tokio::test]
    async fn test_download_failure_maps_to_download_failed() {
        let hit = SearchHit {
            video_id: "abc".to_string(),
            title: "t".to_string(),
        };
        let err = resolver("false").download(&hit).await.unwrap_err();
        assert!(matches!(err, ResolveError::DownloadFailed { video_id, .. } if video_id == "abc"));
    }
}
