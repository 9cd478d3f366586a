//! RPC Request/Response Types
//!
//! JSON-RPC method parameters and results.

use guildtune_core::application::{PlayOutcome, PlaybackStats};
use guildtune_core::port::Reply;
use serde::{Deserialize, Serialize};

/// music.play.v1 - Queue a query for the requester's guild
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayParams {
    pub guild_id: String,
    pub channel_id: String,
    pub user_id: String,
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayResponse {
    pub request_id: String,
    pub title: String,
    pub position: usize,
    /// True when this request started the guild's worker
    pub worker_started: bool,
}

impl From<PlayOutcome> for PlayResponse {
    fn from(outcome: PlayOutcome) -> Self {
        Self {
            request_id: outcome.request_id,
            title: outcome.title,
            position: outcome.position,
            // Dropping the handle detaches the worker
            worker_started: outcome.worker.is_some(),
        }
    }
}

/// music.queue.v1 - Inspect a guild's queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueParams {
    pub guild_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueResponse {
    pub guild_id: String,
    pub length: usize,
    pub capacity: usize,
    pub titles: Vec<String>,
}

/// chat.message.v1 - Deliver a raw chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageParams {
    pub guild_id: String,
    pub channel_id: String,
    pub author_id: String,
    #[serde(default)]
    pub author_is_bot: bool,
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessageResponse {
    /// False for bot authors, unprefixed messages and unknown commands
    pub handled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub play: Option<PlayResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue: Option<QueueResponse>,
}

/// chat.tail.v1 - Recent replies posted to a channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTailParams {
    pub channel_id: String,
    #[serde(default = "default_lines")]
    pub lines: usize,
}

fn default_lines() -> usize {
    20
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatTailResponse {
    pub channel_id: String,
    pub messages: Vec<ReplyView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplyView {
    pub message: String,
    pub sent_at: i64,
}

impl From<Reply> for ReplyView {
    fn from(reply: Reply) -> Self {
        Self {
            message: reply.message,
            sent_at: reply.sent_at,
        }
    }
}

/// voice.join.v1 / voice.leave.v1 - Voice state updates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceJoinParams {
    pub guild_id: String,
    pub user_id: String,
    pub channel_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceLeaveParams {
    pub guild_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoiceStateResponse {
    pub guild_id: String,
    pub user_id: String,
    /// Voice channel after the update; None once the user left
    pub channel_id: Option<String>,
    /// False when a leave found no recorded state
    pub changed: bool,
}

/// admin.stats.v1 - Runtime statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsParams {
    // No parameters needed
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatsResponse {
    pub active_guilds: usize,
    pub max_queue_size: usize,
    pub uptime_seconds: u64,
    pub version: String,
}

impl StatsResponse {
    pub fn new(stats: PlaybackStats, uptime_seconds: u64) -> Self {
        Self {
            active_guilds: stats.active_guilds,
            max_queue_size: stats.max_queue_size,
            uptime_seconds,
            version: guildtune_core::VERSION.to_string(),
        }
    }
}
