// Channel Feed
// Notifier that keeps the most recent replies per text channel

use async_trait::async_trait;
use guildtune_core::domain::ChannelId;
use guildtune_core::port::{Notifier, Reply, ReplyLog, TimeProvider};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

/// Messages kept per channel
pub const FEED_HISTORY: usize = 100;

pub struct ChannelFeed {
    channels: Mutex<HashMap<ChannelId, VecDeque<Reply>>>,
    history: usize,
    time_provider: Arc<dyn TimeProvider>,
}

impl ChannelFeed {
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self::with_history(time_provider, FEED_HISTORY)
    }

    pub fn with_history(time_provider: Arc<dyn TimeProvider>, history: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            history: history.max(1),
            time_provider,
        }
    }
}

#[async_trait]
impl Notifier for ChannelFeed {
    async fn notify(&self, channel_id: &ChannelId, message: &str) {
        info!(channel_id = %channel_id, message = %message, "Reply");

        let entry = Reply {
            channel_id: channel_id.clone(),
            message: message.to_string(),
            sent_at: self.time_provider.now_millis(),
        };
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        let entries = channels.entry(channel_id.clone()).or_default();
        if entries.len() == self.history {
            entries.pop_front();
        }
        entries.push_back(entry);
    }
}

impl ReplyLog for ChannelFeed {
    fn recent(&self, channel_id: &ChannelId, limit: usize) -> Vec<Reply> {
        let channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels
            .get(channel_id)
            .map(|entries| {
                let skip = entries.len().saturating_sub(limit);
                entries.iter().skip(skip).cloned().collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guildtune_core::port::time_provider::mocks::FixedTimeProvider;

    #[tokio::test]
    async fn test_recent_returns_latest_in_order() {
        let clock = Arc::new(FixedTimeProvider::new(1_000));
        let feed = ChannelFeed::new(clock.clone());
        let ch = "text-1".to_string();

        feed.notify(&ch, "one").await;
        clock.advance(5);
        feed.notify(&ch, "two").await;
        feed.notify(&ch, "three").await;

        let recent = feed.recent(&ch, 2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].message, "two");
        assert_eq!(recent[0].sent_at, 1_005);
        assert_eq!(recent[1].message, "three");
        assert!(feed.recent(&"other".to_string(), 10).is_empty());
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let feed = ChannelFeed::with_history(Arc::new(FixedTimeProvider::new(0)), 3);
        let ch = "text-1".to_string();
        for i in 0..5 {
            feed.notify(&ch, &format!("m{}", i)).await;
        }

        let messages: Vec<_> = feed
            .recent(&ch, 10)
            .into_iter()
            .map(|e| e.message)
            .collect();
        assert_eq!(messages, vec!["m2", "m3", "m4"]);
    }
}
