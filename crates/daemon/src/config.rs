//! Daemon configuration from `GUILDTUNE_*` environment variables

use anyhow::{bail, Context, Result};
use guildtune_api_rpc::server::{
    RpcServerConfig, DEFAULT_RATE_LIMIT_BURST, DEFAULT_RATE_LIMIT_RATE, DEFAULT_RPC_HOST,
    DEFAULT_RPC_PORT,
};
use guildtune_core::application::DEFAULT_COMMAND_PREFIX;
use guildtune_core::domain::MAX_QUEUE_SIZE;
use guildtune_infra_system::DEFAULT_SINK_TEMPLATE;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_CACHE_DIR: &str = "~/.guildtune/cache";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub rpc_host: String,
    pub rpc_port: u16,
    pub max_queue_size: usize,
    pub cache_dir: PathBuf,
    pub ytdlp_bin: String,
    pub ffmpeg_bin: String,
    pub sink_template: String,
    pub command_prefix: String,
    pub rate_limit_burst: u32,
    pub rate_limit_rate: u32,
    pub log_format: LogFormat,
    /// Also write daily-rotated log files here when set
    pub log_dir: Option<PathBuf>,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the environment in production)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let path = |value: String| PathBuf::from(shellexpand::tilde(&value).into_owned());

        let max_queue_size = parse(&lookup, "GUILDTUNE_MAX_QUEUE_SIZE", MAX_QUEUE_SIZE)?;
        if max_queue_size == 0 {
            bail!("GUILDTUNE_MAX_QUEUE_SIZE must be at least 1");
        }

        let log_format = match string("GUILDTUNE_LOG_FORMAT", "pretty").as_str() {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            other => bail!("GUILDTUNE_LOG_FORMAT must be \"pretty\" or \"json\", got {:?}", other),
        };

        Ok(Self {
            rpc_host: string("GUILDTUNE_RPC_HOST", DEFAULT_RPC_HOST),
            rpc_port: parse(&lookup, "GUILDTUNE_RPC_PORT", DEFAULT_RPC_PORT)?,
            max_queue_size,
            cache_dir: path(string("GUILDTUNE_CACHE_DIR", DEFAULT_CACHE_DIR)),
            ytdlp_bin: string("GUILDTUNE_YTDLP_BIN", "yt-dlp"),
            ffmpeg_bin: string("GUILDTUNE_FFMPEG_BIN", "ffmpeg"),
            sink_template: string("GUILDTUNE_SINK_TEMPLATE", DEFAULT_SINK_TEMPLATE),
            command_prefix: string("GUILDTUNE_COMMAND_PREFIX", DEFAULT_COMMAND_PREFIX),
            rate_limit_burst: parse(&lookup, "GUILDTUNE_RATE_LIMIT_BURST", DEFAULT_RATE_LIMIT_BURST)?,
            rate_limit_rate: parse(&lookup, "GUILDTUNE_RATE_LIMIT_RATE", DEFAULT_RATE_LIMIT_RATE)?,
            log_format,
            log_dir: lookup("GUILDTUNE_LOG_DIR").map(path),
        })
    }

    pub fn rpc_config(&self) -> RpcServerConfig {
        RpcServerConfig {
            host: self.rpc_host.clone(),
            port: self.rpc_port,
            command_prefix: self.command_prefix.clone(),
            rate_limit_burst: self.rate_limit_burst,
            rate_limit_rate: self.rate_limit_rate,
        }
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        None => Ok(default),
    }
}
