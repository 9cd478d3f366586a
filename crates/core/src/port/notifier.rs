// Notifier Port
// Reports outcomes back to the requester's text channel

use crate::domain::ChannelId;
use async_trait::async_trait;
use serde::Serialize;

/// Notifier trait
///
/// Delivery is best effort: implementations log failures instead of returning them.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, channel_id: &ChannelId, message: &str);
}

/// A reply as it was posted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub channel_id: ChannelId,
    pub message: String,
    /// Milliseconds since epoch
    pub sent_at: i64,
}

/// Read side of a notifier that keeps its replies
pub trait ReplyLog: Send + Sync {
    /// Up to `limit` most recent replies of a channel, oldest first
    fn recent(&self, channel_id: &ChannelId, limit: usize) -> Vec<Reply>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Records every message per channel
    #[derive(Default)]
    pub struct MockNotifier {
        messages: Mutex<Vec<(ChannelId, String)>>,
    }

    impl MockNotifier {
        pub fn new() -> Self {
            Self::default()
        }
        pub fn messages(&self, channel_id: &str) -> Vec<String> {
            self.messages
                .lock()
                .unwrap()
                .iter()
                .filter(|(c, _)| c == channel_id)
                .map(|(_, m)| m.clone())
                .collect()
        }
        pub fn contains(&self, channel_id: &str, needle: &str) -> bool {
            self.messages(channel_id).iter().any(|m| m.contains(needle))
        }
    }

    #[async_trait]
    impl Notifier for MockNotifier {
        async fn notify(&self, channel_id: &ChannelId, message: &str) {
            self.messages
                .lock()
                .unwrap()
                .push((channel_id.clone(), message.to_string()));
        }
    }
}
