//! Concurrency stress tests
//!
//! Many concurrent requests across many guilds on a multi-threaded runtime.
//! A guild must never have two live voice sessions, and every accepted item
//! must be played by some worker.

use std::sync::Arc;
use std::time::Duration;

use guildtune_core::application::{
    Drain, GroupWorker, PlayRequest, PlaybackPorts, PlaybackService, QueueRegistry, WorkerPorts,
};
use guildtune_core::domain::{Disposal, MediaItem};
use guildtune_core::port::asset_store::mocks::MockAssetStore;
use guildtune_core::port::audio_converter::mocks::MockAudioConverter;
use guildtune_core::port::destination_locator::mocks::MockDestinationLocator;
use guildtune_core::port::id_provider::UuidProvider;
use guildtune_core::port::media_resolver::mocks::MockMediaResolver;
use guildtune_core::port::notifier::mocks::MockNotifier;
use guildtune_core::port::voice_gateway::mocks::MockVoiceGateway;
use guildtune_core::AppError;

const GUILDS: usize = 8;
const REQUESTS_PER_GUILD: usize = 25;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_many_guilds_single_worker_each() {
    let registry = Arc::new(QueueRegistry::default());
    let gateway = MockVoiceGateway::new_with_duration(Duration::from_millis(2));
    let ports = PlaybackPorts {
        resolver: Arc::new(MockMediaResolver::new()),
        converter: Arc::new(MockAudioConverter::new_success()),
        assets: Arc::new(MockAssetStore::new()),
        locator: Arc::new(MockDestinationLocator::new("voice")),
        gateway: Arc::new(gateway.clone()),
        notifier: Arc::new(MockNotifier::new()),
    };
    let service = Arc::new(PlaybackService::new(
        Arc::clone(&registry),
        ports,
        Arc::new(UuidProvider),
    ));

    let mut tasks = Vec::new();
    for g in 0..GUILDS {
        for r in 0..REQUESTS_PER_GUILD {
            let service = Arc::clone(&service);
            tasks.push(tokio::spawn(async move {
                // Stagger so workers both drain and get re-spawned
                tokio::time::sleep(Duration::from_millis((r % 5) as u64 * 3)).await;
                service
                    .play(PlayRequest {
                        guild_id: format!("guild-{}", g),
                        channel_id: format!("text-{}", g),
                        user_id: "user".to_string(),
                        query: format!("g{} song {}", g, r),
                    })
                    .await
            }));
        }
    }

    let mut accepted = 0;
    let mut workers = Vec::new();
    for task in tasks {
        match task.await.unwrap() {
            Ok(outcome) => {
                accepted += 1;
                workers.extend(outcome.worker);
            }
            Err(AppError::QueueFull(_)) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    let mut played = 0;
    for worker in workers {
        played += worker.await.unwrap().played;
    }

    assert!(accepted >= GUILDS, "every guild gets at least one item in");
    assert_eq!(played, accepted, "every accepted item is played");
    assert_eq!(gateway.played_total(), accepted);
    assert_eq!(gateway.max_live_per_guild(), 1);
    assert_eq!(registry.active_guilds(), 0);
    assert_eq!(gateway.connect_count(), gateway.disconnect_count());
}

/// Raw registry + worker interplay: producers enqueue directly and spawn a
/// worker exactly when told to, racing workers that are vacating.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_enqueue_racing_vacate_never_strands_items() {
    let registry = Arc::new(QueueRegistry::with_capacity(1_000).unwrap());
    let gateway = MockVoiceGateway::new();
    let ports = WorkerPorts {
        registry: Arc::clone(&registry),
        gateway: Arc::new(gateway.clone()),
        assets: Arc::new(MockAssetStore::new()),
        notifier: Arc::new(MockNotifier::new()),
    };
    let guild = "guild-race".to_string();

    let mut workers = Vec::new();
    for i in 0..300 {
        let enqueued = registry
            .enqueue(&guild, MediaItem::new(format!("t{}", i), "/tmp/t.mp3", Disposal::Keep))
            .unwrap();
        if enqueued.spawn_worker {
            workers.push(GroupWorker::new(guild.clone(), "voice", "text", ports.clone()).spawn());
        }
        if i % 7 == 0 {
            tokio::task::yield_now().await;
        }
    }

    for worker in workers {
        worker.await.unwrap();
    }

    assert_eq!(gateway.played(&guild).len(), 300);
    assert_eq!(gateway.max_live_per_guild(), 1);
    assert!(matches!(registry.pop_or_vacate(&guild), Drain::Vacated));
    assert!(!registry.contains(&guild));
}
