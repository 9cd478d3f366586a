//! JSON-RPC Server
//!
//! Implements the JSON-RPC 2.0 server over TCP on localhost.

use crate::handler::{HandlerDeps, RpcHandler};
use crate::rate_limiter::RateLimiter;
use crate::types::{
    ChatMessageParams, ChatTailParams, PlayParams, QueueParams, StatsParams, VoiceJoinParams,
    VoiceLeaveParams,
};
use guildtune_core::application::DEFAULT_COMMAND_PREFIX;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

pub const DEFAULT_RPC_HOST: &str = "127.0.0.1";
pub const DEFAULT_RPC_PORT: u16 = 9531;
pub const DEFAULT_RATE_LIMIT_BURST: u32 = 200;
pub const DEFAULT_RATE_LIMIT_RATE: u32 = 100;

#[derive(Error, Debug)]
pub enum RpcServerError {
    #[error("Failed to build server on {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("Failed to register {method}: {reason}")]
    Register { method: &'static str, reason: String },
}

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    /// 0 binds an ephemeral port
    pub port: u16,
    pub command_prefix: String,
    pub rate_limit_burst: u32,
    pub rate_limit_rate: u32,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
            command_prefix: DEFAULT_COMMAND_PREFIX.to_string(),
            rate_limit_burst: DEFAULT_RATE_LIMIT_BURST,
            rate_limit_rate: DEFAULT_RATE_LIMIT_RATE,
        }
    }
}

/// A started server
pub struct RunningServer {
    pub addr: SocketAddr,
    pub handle: ServerHandle,
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

/// Register one method that parses its params into `$params` and calls `$call`
macro_rules! register {
    ($module:expr, $handler:expr, $method:literal, $params:ty, $call:ident) => {{
        let handler = Arc::clone(&$handler);
        $module
            .register_async_method($method, move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: $params = params.parse()?;
                    handler.$call(req).await
                }
            })
            .map_err(|e| RpcServerError::Register {
                method: $method,
                reason: e.to_string(),
            })?;
    }};
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, deps: HandlerDeps) -> Self {
        let rate_limiter = RateLimiter::new(config.rate_limit_burst, config.rate_limit_rate);
        let handler = RpcHandler::new(deps, config.command_prefix.clone(), rate_limiter);
        Self {
            config,
            handler: Arc::new(handler),
        }
    }

    /// Build the method table
    pub fn module(&self) -> Result<RpcModule<()>, RpcServerError> {
        let mut module = RpcModule::new(());

        register!(module, self.handler, "music.play.v1", PlayParams, play);
        register!(module, self.handler, "music.queue.v1", QueueParams, queue);
        register!(module, self.handler, "chat.message.v1", ChatMessageParams, chat_message);
        register!(module, self.handler, "chat.tail.v1", ChatTailParams, chat_tail);
        register!(module, self.handler, "voice.join.v1", VoiceJoinParams, voice_join);
        register!(module, self.handler, "voice.leave.v1", VoiceLeaveParams, voice_leave);

        // Callers usually send no params at all
        let handler = Arc::clone(&self.handler);
        module
            .register_async_method("admin.stats.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: StatsParams = if params.is_object() {
                        params.parse()?
                    } else {
                        StatsParams::default()
                    };
                    handler.stats(req).await
                }
            })
            .map_err(|e| RpcServerError::Register {
                method: "admin.stats.v1",
                reason: e.to_string(),
            })?;

        Ok(module)
    }

    /// Start the JSON-RPC server
    ///
    /// Security: binds to the configured host only (127.0.0.1 by default)
    pub async fn start(self) -> Result<RunningServer, RpcServerError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server"
        );

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| RpcServerError::Bind {
                addr: addr.clone(),
                reason: e.to_string(),
            })?;

        let local_addr = server.local_addr().map_err(|e| RpcServerError::Bind {
            addr: addr.clone(),
            reason: e.to_string(),
        })?;

        let module = self.module()?;
        let handle = server.start(module);

        info!(addr = %local_addr, "JSON-RPC server started successfully");

        Ok(RunningServer {
            addr: local_addr,
            handle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PlayResponse, StatsResponse, VoiceStateResponse};
    use guildtune_core::application::{PlaybackPorts, PlaybackService, QueueRegistry};
    use guildtune_core::port::asset_store::mocks::MockAssetStore;
    use guildtune_core::port::audio_converter::mocks::MockAudioConverter;
    use guildtune_core::port::id_provider::mocks::SequentialIdProvider;
    use guildtune_core::port::media_resolver::mocks::MockMediaResolver;
    use guildtune_core::port::time_provider::mocks::FixedTimeProvider;
    use guildtune_core::port::voice_gateway::mocks::MockVoiceGateway;
    use guildtune_infra_system::{ChannelFeed, VoiceStateDirectory};
    use jsonrpsee::core::params::ObjectParams;
    use jsonrpsee::rpc_params;

    fn object(value: serde_json::Value) -> ObjectParams {
        let mut params = ObjectParams::new();
        for (key, value) in value.as_object().unwrap() {
            params.insert(key, value).unwrap();
        }
        params
    }

    fn server() -> RpcServer {
        let voice = Arc::new(VoiceStateDirectory::new());
        let feed = Arc::new(ChannelFeed::new(Arc::new(FixedTimeProvider::new(0))));
        let ports = PlaybackPorts {
            resolver: Arc::new(MockMediaResolver::new()),
            converter: Arc::new(MockAudioConverter::new_success()),
            assets: Arc::new(MockAssetStore::new()),
            locator: voice.clone(),
            gateway: Arc::new(MockVoiceGateway::new()),
            notifier: feed.clone(),
        };
        let playback = Arc::new(PlaybackService::new(
            Arc::new(QueueRegistry::default()),
            ports,
            Arc::new(SequentialIdProvider::default()),
        ));
        RpcServer::new(
            RpcServerConfig::default(),
            HandlerDeps {
                playback,
                roster: voice,
                replies: feed.clone(),
                notifier: feed,
            },
        )
    }

    #[tokio::test]
    async fn test_stats_without_params() {
        let module = server().module().unwrap();
        let stats: StatsResponse = module.call("admin.stats.v1", rpc_params![]).await.unwrap();
        assert_eq!(stats.max_queue_size, 10);
    }

    #[tokio::test]
    async fn test_join_then_play_through_module() {
        let module = server().module().unwrap();

        let joined: VoiceStateResponse = module
            .call(
                "voice.join.v1",
                object(serde_json::json!({
                    "guild_id": "g1", "user_id": "u1", "channel_id": "voice-1"
                })),
            )
            .await
            .unwrap();
        assert!(joined.changed);

        let played: PlayResponse = module
            .call(
                "music.play.v1",
                object(serde_json::json!({
                    "guild_id": "g1", "channel_id": "text-1", "user_id": "u1", "query": "song"
                })),
            )
            .await
            .unwrap();
        assert_eq!(played.position, 1);
        assert!(played.worker_started);
    }

    #[tokio::test]
    async fn test_start_on_ephemeral_port() {
        let mut config = RpcServerConfig::default();
        config.port = 0;
        let s = server();
        let running = RpcServer {
            config,
            handler: s.handler,
        }
        .start()
        .await
        .unwrap();

        assert_ne!(running.addr.port(), 0);
        running.handle.stop().unwrap();
    }
}
