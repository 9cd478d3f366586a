//! JSON-RPC API Layer
//!
//! Implements the JSON-RPC 2.0 server for Guildtune: the chat transport,
//! voice-state updates and queue inspection all arrive here.

pub mod error;
pub mod handler;
pub mod rate_limiter;
pub mod server;
pub mod types;

pub use handler::{HandlerDeps, RpcHandler};
pub use server::{RpcServer, RpcServerConfig, RpcServerError, RunningServer};
