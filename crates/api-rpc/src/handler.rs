//! RPC Method Handlers
//!
//! Implements the business logic for each JSON-RPC method.

use crate::error::{throttled, to_rpc_error};
use crate::rate_limiter::RateLimiter;
use crate::types::{
    ChatMessageParams, ChatMessageResponse, ChatTailParams, ChatTailResponse, PlayParams,
    PlayResponse, QueueParams, QueueResponse, StatsParams, StatsResponse, VoiceJoinParams,
    VoiceLeaveParams, VoiceStateResponse,
};
use guildtune_core::application::{parse_command, Command, PlayRequest, PlaybackService};
use guildtune_core::port::{Notifier, ReplyLog, VoiceRoster};
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Replies kept by chat.tail.v1 are capped here
const MAX_TAIL_LINES: usize = 100;

/// Collaborators of the RPC handler
pub struct HandlerDeps {
    pub playback: Arc<PlaybackService>,
    pub roster: Arc<dyn VoiceRoster>,
    pub replies: Arc<dyn ReplyLog>,
    pub notifier: Arc<dyn Notifier>,
}

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    deps: HandlerDeps,
    command_prefix: String,
    rate_limiter: RateLimiter,
    start_time: Instant,
}

impl RpcHandler {
    pub fn new(deps: HandlerDeps, command_prefix: impl Into<String>, rate_limiter: RateLimiter) -> Self {
        Self {
            deps,
            command_prefix: command_prefix.into(),
            rate_limiter,
            start_time: Instant::now(),
        }
    }

    // Rate limiting check (DoS protection)
    fn throttle(&self) -> Result<(), ErrorObjectOwned> {
        if self.rate_limiter.check() {
            Ok(())
        } else {
            Err(throttled())
        }
    }

    /// music.play.v1
    pub async fn play(&self, params: PlayParams) -> Result<PlayResponse, ErrorObjectOwned> {
        self.throttle()?;
        self.run_play(params).await
    }

    async fn run_play(&self, params: PlayParams) -> Result<PlayResponse, ErrorObjectOwned> {
        let req = PlayRequest {
            guild_id: params.guild_id,
            channel_id: params.channel_id,
            user_id: params.user_id,
            query: params.query,
        };

        self.deps
            .playback
            .play(req)
            .await
            .map(PlayResponse::from)
            .map_err(to_rpc_error)
    }

    /// music.queue.v1
    pub async fn queue(&self, params: QueueParams) -> Result<QueueResponse, ErrorObjectOwned> {
        self.throttle()?;
        Ok(self.queue_snapshot(params.guild_id))
    }

    fn queue_snapshot(&self, guild_id: String) -> QueueResponse {
        let playback = &self.deps.playback;
        QueueResponse {
            length: playback.queue_length(&guild_id),
            capacity: playback.stats().max_queue_size,
            titles: playback.queued_titles(&guild_id),
            guild_id,
        }
    }

    /// chat.message.v1
    ///
    /// Bot authors and anything that is not a known command are ignored.
    pub async fn chat_message(
        &self,
        params: ChatMessageParams,
    ) -> Result<ChatMessageResponse, ErrorObjectOwned> {
        self.throttle()?;

        if params.author_is_bot {
            debug!(author_id = %params.author_id, "Ignoring bot message");
            return Ok(ChatMessageResponse::default());
        }

        match parse_command(&params.content, &self.command_prefix) {
            Some(Command::Play { query }) => {
                let play = self
                    .run_play(PlayParams {
                        guild_id: params.guild_id,
                        channel_id: params.channel_id,
                        user_id: params.author_id,
                        query,
                    })
                    .await?;
                Ok(ChatMessageResponse {
                    handled: true,
                    play: Some(play),
                    queue: None,
                })
            }
            Some(Command::Queue) => {
                let queue = self.queue_snapshot(params.guild_id);
                self.deps
                    .notifier
                    .notify(&params.channel_id, &queue_summary(&queue))
                    .await;
                Ok(ChatMessageResponse {
                    handled: true,
                    play: None,
                    queue: Some(queue),
                })
            }
            None => Ok(ChatMessageResponse::default()),
        }
    }

    /// chat.tail.v1
    pub async fn chat_tail(
        &self,
        params: ChatTailParams,
    ) -> Result<ChatTailResponse, ErrorObjectOwned> {
        self.throttle()?;

        let messages = self
            .deps
            .replies
            .recent(&params.channel_id, params.lines.min(MAX_TAIL_LINES))
            .into_iter()
            .map(Into::into)
            .collect();

        Ok(ChatTailResponse {
            channel_id: params.channel_id,
            messages,
        })
    }

    /// voice.join.v1
    pub async fn voice_join(
        &self,
        params: VoiceJoinParams,
    ) -> Result<VoiceStateResponse, ErrorObjectOwned> {
        self.throttle()?;

        if params.channel_id.trim().is_empty() {
            return Err(to_rpc_error(guildtune_core::AppError::Validation(
                "channel_id must not be empty".to_string(),
            )));
        }

        self.deps
            .roster
            .join(&params.guild_id, &params.user_id, &params.channel_id);

        Ok(VoiceStateResponse {
            guild_id: params.guild_id,
            user_id: params.user_id,
            channel_id: Some(params.channel_id),
            changed: true,
        })
    }

    /// voice.leave.v1
    pub async fn voice_leave(
        &self,
        params: VoiceLeaveParams,
    ) -> Result<VoiceStateResponse, ErrorObjectOwned> {
        self.throttle()?;

        let changed = self.deps.roster.leave(&params.guild_id, &params.user_id);

        Ok(VoiceStateResponse {
            guild_id: params.guild_id,
            user_id: params.user_id,
            channel_id: None,
            changed,
        })
    }

    /// admin.stats.v1
    pub async fn stats(&self, _params: StatsParams) -> Result<StatsResponse, ErrorObjectOwned> {
        self.throttle()?;
        Ok(StatsResponse::new(
            self.deps.playback.stats(),
            self.start_time.elapsed().as_secs(),
        ))
    }
}

/// Reply posted for the queue command
fn queue_summary(queue: &QueueResponse) -> String {
    if queue.titles.is_empty() {
        return "The queue is empty.".to_string();
    }
    let mut summary = format!("Queue ({}/{}):", queue.length, queue.capacity);
    for (i, title) in queue.titles.iter().enumerate() {
        summary.push_str(&format!("\n{}. {}", i + 1, title));
    }
    summary
}
