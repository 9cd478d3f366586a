// Voice Gateway Port
// Streams playable audio into a real-time voice channel

use crate::domain::{DestinationId, GuildId, MediaItem};
use async_trait::async_trait;
use thiserror::Error;

/// Worker could not acquire its destination
#[derive(Error, Debug, Clone)]
pub enum SetupError {
    #[error("Voice backend unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to join voice channel {destination}: {reason}")]
    Join {
        destination: DestinationId,
        reason: String,
    },
}

/// Playback of a single item failed (never fatal to the worker)
#[derive(Error, Debug, Clone)]
pub enum PlaybackError {
    #[error("Asset unreadable: {0}")]
    AssetUnreadable(String),

    #[error("Destination unreachable: {0}")]
    DestinationUnreachable(String),

    #[error("Player failed: {0}")]
    PlayerFailed(String),

    #[error("Playback panicked: {0}")]
    Panicked(String),
}

/// Voice Gateway trait
///
/// Implementations:
/// - FfmpegStreamPlayer: streams each item through an ffmpeg child process
#[async_trait]
pub trait VoiceGateway: Send + Sync {
    /// Join a destination for the lifetime of one group worker
    ///
    /// # Errors
    /// - SetupError::Unavailable if the backend cannot be used at all
    /// - SetupError::Join if this destination cannot be joined
    async fn connect(
        &self,
        guild_id: &GuildId,
        destination: &DestinationId,
    ) -> Result<Box<dyn VoiceSession>, SetupError>;
}

/// A joined destination, owned by exactly one worker
#[async_trait]
pub trait VoiceSession: Send {
    /// Play one item to completion
    async fn play(&mut self, item: &MediaItem) -> Result<(), PlaybackError>;

    /// Leave the destination
    async fn disconnect(&mut self);
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::Semaphore;

    #[derive(Default)]
    struct MockState {
        played: Mutex<Vec<(GuildId, String)>>,
        failing: Mutex<HashSet<String>>,
        panicking: Mutex<HashSet<String>>,
        fail_connect: AtomicBool,
        connects: AtomicUsize,
        disconnects: AtomicUsize,
        live: Mutex<HashMap<GuildId, usize>>,
        max_live_per_guild: AtomicUsize,
        gate: Option<Arc<Semaphore>>,
        play_duration: Option<Duration>,
    }

    /// Mock Voice Gateway for testing
    ///
    /// Tracks how many sessions are live per guild so tests can assert that a
    /// guild never has two workers playing at once.
    #[derive(Clone, Default)]
    pub struct MockVoiceGateway {
        state: Arc<MockState>,
    }

    impl MockVoiceGateway {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every play waits for one permit from `gate` before finishing
        pub fn new_gated(gate: Arc<Semaphore>) -> Self {
            Self {
                state: Arc::new(MockState {
                    gate: Some(gate),
                    ..Default::default()
                }),
            }
        }

        /// Every play takes `duration`
        pub fn new_with_duration(duration: Duration) -> Self {
            Self {
                state: Arc::new(MockState {
                    play_duration: Some(duration),
                    ..Default::default()
                }),
            }
        }

        pub fn new_setup_failure() -> Self {
            let gateway = Self::default();
            gateway.state.fail_connect.store(true, Ordering::SeqCst);
            gateway
        }

        pub fn fail_on(&self, title: impl Into<String>) {
            self.state.failing.lock().unwrap().insert(title.into());
        }

        pub fn panic_on(&self, title: impl Into<String>) {
            self.state.panicking.lock().unwrap().insert(title.into());
        }

        pub fn set_setup_failure(&self, fail: bool) {
            self.state.fail_connect.store(fail, Ordering::SeqCst);
        }

        /// Titles whose playback started, in order
        pub fn played(&self, guild_id: &str) -> Vec<String> {
            self.state
                .played
                .lock()
                .unwrap()
                .iter()
                .filter(|(g, _)| g == guild_id)
                .map(|(_, t)| t.clone())
                .collect()
        }

        pub fn played_total(&self) -> usize {
            self.state.played.lock().unwrap().len()
        }

        pub fn connect_count(&self) -> usize {
            self.state.connects.load(Ordering::SeqCst)
        }

        pub fn disconnect_count(&self) -> usize {
            self.state.disconnects.load(Ordering::SeqCst)
        }

        pub fn live_sessions(&self, guild_id: &str) -> usize {
            self.state
                .live
                .lock()
                .unwrap()
                .get(guild_id)
                .copied()
                .unwrap_or(0)
        }

        /// Highest number of simultaneously live sessions seen for any guild
        pub fn max_live_per_guild(&self) -> usize {
            self.state.max_live_per_guild.load(Ordering::SeqCst)
        }

        /// Poll until `count` plays have started (5s timeout)
        pub async fn wait_for_plays(&self, count: usize) -> bool {
            for _ in 0..1000 {
                if self.played_total() >= count {
                    return true;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            false
        }
    }

    #[async_trait]
    impl VoiceGateway for MockVoiceGateway {
        async fn connect(
            &self,
            guild_id: &GuildId,
            destination: &DestinationId,
        ) -> Result<Box<dyn VoiceSession>, SetupError> {
            self.state.connects.fetch_add(1, Ordering::SeqCst);
            if self.state.fail_connect.load(Ordering::SeqCst) {
                return Err(SetupError::Join {
                    destination: destination.clone(),
                    reason: "mock setup failure".to_string(),
                });
            }

            let live = {
                let mut live = self.state.live.lock().unwrap();
                let count = live.entry(guild_id.clone()).or_insert(0);
                *count += 1;
                *count
            };
            self.state
                .max_live_per_guild
                .fetch_max(live, Ordering::SeqCst);

            Ok(Box::new(MockVoiceSession {
                guild_id: guild_id.clone(),
                state: Arc::clone(&self.state),
                connected: true,
            }))
        }
    }

    struct MockVoiceSession {
        guild_id: GuildId,
        state: Arc<MockState>,
        connected: bool,
    }

    impl MockVoiceSession {
        fn release(&mut self) {
            if self.connected {
                self.connected = false;
                if let Some(count) = self.state.live.lock().unwrap().get_mut(&self.guild_id) {
                    *count -= 1;
                }
            }
        }
    }

    #[async_trait]
    impl VoiceSession for MockVoiceSession {
        async fn play(&mut self, item: &MediaItem) -> Result<(), PlaybackError> {
            let title = item.title().to_string();
            self.state
                .played
                .lock()
                .unwrap()
                .push((self.guild_id.clone(), title.clone()));

            if let Some(gate) = &self.state.gate {
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }
            if let Some(duration) = self.state.play_duration {
                tokio::time::sleep(duration).await;
            }

            if self.state.panicking.lock().unwrap().contains(&title) {
                panic!("mock player panicked on {}", title);
            }
            if self.state.failing.lock().unwrap().contains(&title) {
                return Err(PlaybackError::AssetUnreadable(title));
            }
            Ok(())
        }

        async fn disconnect(&mut self) {
            self.state.disconnects.fetch_add(1, Ordering::SeqCst);
            self.release();
        }
    }

    impl Drop for MockVoiceSession {
        fn drop(&mut self) {
            self.release();
        }
    }
}
