//! Unit tests for the play use case

use super::*;
use crate::domain::{Disposal, MediaItem};
use crate::error::AppError;
use crate::port::asset_store::mocks::MockAssetStore;
use crate::port::audio_converter::mocks::MockAudioConverter;
use crate::port::destination_locator::mocks::MockDestinationLocator;
use crate::port::id_provider::mocks::SequentialIdProvider;
use crate::port::media_resolver::mocks::MockMediaResolver;
use crate::port::media_resolver::ResolveError;
use crate::port::notifier::mocks::MockNotifier;
use crate::port::voice_gateway::mocks::MockVoiceGateway;
use crate::port::LocateError;
use std::path::PathBuf;

const GUILD: &str = "guild-1";
const CHANNEL: &str = "text-1";

struct Fixture {
    service: PlaybackService,
    registry: Arc<QueueRegistry>,
    gateway: MockVoiceGateway,
    assets: Arc<MockAssetStore>,
    notifier: Arc<MockNotifier>,
    resolver: Arc<MockMediaResolver>,
}

struct Overrides {
    resolver: MockMediaResolver,
    converter: MockAudioConverter,
    assets: MockAssetStore,
    locator: MockDestinationLocator,
    gateway: MockVoiceGateway,
}

impl Default for Overrides {
    fn default() -> Self {
        Self {
            resolver: MockMediaResolver::new(),
            converter: MockAudioConverter::new_success(),
            assets: MockAssetStore::new(),
            locator: MockDestinationLocator::new("voice-1"),
            gateway: MockVoiceGateway::new(),
        }
    }
}

impl Fixture {
    fn new(o: Overrides) -> Self {
        let registry = Arc::new(QueueRegistry::default());
        let assets = Arc::new(o.assets);
        let notifier = Arc::new(MockNotifier::new());
        let resolver = Arc::new(o.resolver);
        let ports = PlaybackPorts {
            resolver: resolver.clone(),
            converter: Arc::new(o.converter),
            assets: assets.clone(),
            locator: Arc::new(o.locator),
            gateway: Arc::new(o.gateway.clone()),
            notifier: notifier.clone(),
        };
        Self {
            service: PlaybackService::new(
                Arc::clone(&registry),
                ports,
                Arc::new(SequentialIdProvider::default()),
            ),
            registry,
            gateway: o.gateway,
            assets,
            notifier,
            resolver,
        }
    }
}

fn request(query: &str) -> PlayRequest {
    PlayRequest {
        guild_id: GUILD.to_string(),
        channel_id: CHANNEL.to_string(),
        user_id: "user-1".to_string(),
        query: query.to_string(),
    }
}

#[tokio::test]
async fn test_play_queues_and_spawns_worker() {
    let fx = Fixture::new(Overrides::default());

    let outcome = fx.service.play(request("song a")).await.unwrap();
    assert_eq!(outcome.request_id, "req-1");
    assert_eq!(outcome.title, "song a");
    assert_eq!(outcome.position, 1);

    let report = outcome.worker.expect("first request spawns").await.unwrap();
    assert_eq!(report.played, 1);
    assert_eq!(fx.gateway.played(GUILD), vec!["song a"]);
    assert!(fx.notifier.contains(
        CHANNEL,
        ":musical_note: Added media with title \"song a\" to queue at position 1"
    ));
    assert_eq!(fx.assets.admitted(), vec!["song_a"]);
    // Converted asset is deleted after playback
    assert_eq!(
        fx.assets.deleted(),
        vec![PathBuf::from("/mock/song_a.mp3")]
    );
}

#[tokio::test]
async fn test_second_request_joins_running_worker() {
    let fx = Fixture::new(Overrides {
        gateway: MockVoiceGateway::new_with_duration(std::time::Duration::from_millis(50)),
        ..Default::default()
    });

    let first = fx.service.play(request("a")).await.unwrap();
    let second = fx.service.play(request("b")).await.unwrap();
    assert!(second.worker.is_none(), "only one worker per guild");

    first.worker.unwrap().await.unwrap();
    assert_eq!(fx.gateway.played(GUILD), vec!["a", "b"]);
    assert!(!fx.registry.contains(&GUILD.to_string()));
}

#[tokio::test]
async fn test_not_found_rejects_before_queueing() {
    let fx = Fixture::new(Overrides {
        locator: MockDestinationLocator::new_not_found(),
        ..Default::default()
    });

    let err = fx.service.play(request("a")).await.unwrap_err();
    assert!(matches!(err, AppError::Locate(LocateError::NotFound)));
    assert!(!fx.registry.contains(&GUILD.to_string()));
    assert_eq!(fx.resolver.download_count(), 0);
    assert!(fx
        .notifier
        .contains(CHANNEL, "couldn't find voice channel with user in it"));
}

#[tokio::test]
async fn test_full_queue_is_rejected_and_reported() {
    let fx = Fixture::new(Overrides::default());
    let g = GUILD.to_string();
    // Fill the queue directly; no worker is spawned, so nothing drains
    for i in 0..fx.registry.capacity() {
        fx.registry
            .enqueue(&g, MediaItem::new(format!("t{}", i), "/tmp/x.mp3", Disposal::Keep))
            .unwrap();
    }

    let err = fx.service.play(request("overflow")).await.unwrap_err();
    assert!(matches!(err, AppError::QueueFull(_)));
    assert_eq!(fx.registry.len(&g), fx.registry.capacity());
    assert_eq!(fx.resolver.download_count(), 0, "rejected before downloading");
    assert!(fx.notifier.contains(CHANNEL, "The queue is full!"));
}

#[tokio::test]
async fn test_cached_asset_skips_download_and_is_kept() {
    let fx = Fixture::new(Overrides {
        assets: MockAssetStore::new().with_cached("cached_song", "/cache/cached_song.mp3"),
        ..Default::default()
    });

    let outcome = fx.service.play(request("cached song")).await.unwrap();
    outcome.worker.unwrap().await.unwrap();

    assert_eq!(fx.resolver.download_count(), 0);
    assert!(fx.assets.admitted().is_empty());
    assert!(fx.assets.deleted().is_empty());
    assert_eq!(fx.assets.kept(), vec![PathBuf::from("/cache/cached_song.mp3")]);
}

#[tokio::test]
async fn test_conversion_failure_discards_raw_download() {
    let fx = Fixture::new(Overrides {
        converter: MockAudioConverter::new_fail(),
        ..Default::default()
    });

    let err = fx.service.play(request("a")).await.unwrap_err();
    assert!(matches!(err, AppError::Convert(_)));
    assert_eq!(fx.assets.deleted(), vec![PathBuf::from("/mock/a.webm")]);
    assert!(fx.assets.admitted().is_empty());
    assert!(fx.notifier.contains(CHANNEL, "Unable to convert video to audio"));
    assert!(!fx.registry.contains(&GUILD.to_string()));
}

#[tokio::test]
async fn test_search_failure_is_reported() {
    let fx = Fixture::new(Overrides {
        resolver: MockMediaResolver::new_search_failure(ResolveError::NoResults(
            "zzz".to_string(),
        )),
        ..Default::default()
    });

    let err = fx.service.play(request("zzz")).await.unwrap_err();
    assert!(matches!(err, AppError::Resolve(ResolveError::NoResults(_))));
    assert!(fx.notifier.contains(CHANNEL, "Unable to search for video"));
}

#[tokio::test]
async fn test_download_failure_is_reported() {
    let fx = Fixture::new(Overrides {
        resolver: MockMediaResolver::new_download_failure(),
        ..Default::default()
    });

    let err = fx.service.play(request("a")).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Resolve(ResolveError::DownloadFailed { .. })
    ));
    assert!(fx.notifier.contains(CHANNEL, "Unable to download video"));
}

#[tokio::test]
async fn test_empty_query_is_rejected() {
    let fx = Fixture::new(Overrides::default());
    let err = fx.service.play(request("   ")).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(!fx.registry.contains(&GUILD.to_string()));
}

#[tokio::test]
async fn test_setup_failure_leaves_guild_ready_for_next_request() {
    let fx = Fixture::new(Overrides {
        gateway: MockVoiceGateway::new_setup_failure(),
        ..Default::default()
    });

    let outcome = fx.service.play(request("a")).await.unwrap();
    let report = outcome.worker.unwrap().await.unwrap();
    assert!(report.setup_failed);
    assert_eq!(report.discarded, 1);
    assert!(!fx.registry.contains(&GUILD.to_string()));
    assert!(fx.notifier.contains(CHANNEL, "Unable to start voice worker"));

    fx.gateway.set_setup_failure(false);
    let retry = fx.service.play(request("b")).await.unwrap();
    assert!(retry.worker.is_some(), "fresh worker after failed setup");
    retry.worker.unwrap().await.unwrap();
    assert_eq!(fx.gateway.played(GUILD), vec!["b"]);
}

#[tokio::test]
async fn test_stats_and_queue_inspection() {
    let fx = Fixture::new(Overrides::default());
    let g = GUILD.to_string();
    fx.registry
        .enqueue(&g, MediaItem::new("x", "/tmp/x.mp3", Disposal::Keep))
        .unwrap();

    assert_eq!(fx.service.queue_length(&g), 1);
    assert_eq!(fx.service.queued_titles(&g), vec!["x"]);
    let stats = fx.service.stats();
    assert_eq!(stats.active_guilds, 1);
    assert_eq!(stats.max_queue_size, crate::domain::MAX_QUEUE_SIZE);
}
