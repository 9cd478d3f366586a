//! Guildtune - Main Entry Point
//! Composition root: configuration, logging, adapters, JSON-RPC server

mod config;
mod telemetry;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Import workspace crates
use config::{DaemonConfig, LogFormat};
use guildtune_api_rpc::{HandlerDeps, RpcServer};
use guildtune_core::application::{PlaybackPorts, PlaybackService, QueueRegistry};
use guildtune_core::port::id_provider::UuidProvider;
use guildtune_core::port::time_provider::SystemTimeProvider;
use guildtune_infra_system::{
    ChannelFeed, FfmpegConverter, FfmpegStreamPlayer, LocalAssetStore, ProcessRunner,
    VoiceStateDirectory, YtDlpResolver,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the global subscriber; the guard flushes file logs on drop
fn init_logging(config: &DaemonConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("guildtune=info"))
        .context("Failed to create env filter")?;

    let (writer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "guildtune.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stdout), None),
    };

    let (otel_layer, otel_error) = match telemetry::layer() {
        Ok(layer) => (layer, None),
        Err(e) => (None, Some(e)),
    };

    let registry = tracing_subscriber::registry().with(otel_layer).with(env_filter);
    match config.log_format {
        // Production: JSON structured logging
        LogFormat::Json => registry.with(fmt::layer().json().with_writer(writer)).init(),
        // Development: Pretty formatting
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_ansi(config.log_dir.is_none())
                    .with_writer(writer),
            )
            .init(),
    }

    if let Some(e) = otel_error {
        warn!(error = %e, "Failed to initialize OpenTelemetry (continuing without it)");
    }
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration
    let config = DaemonConfig::from_env()?;

    // 2. Initialize logging
    let _log_guard = init_logging(&config)?;
    info!("Guildtune v{} starting...", VERSION);

    // 3. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let runner = ProcessRunner::with_default_env(time_provider.clone());

    let assets = Arc::new(LocalAssetStore::new(&config.cache_dir));
    assets
        .ensure_dir()
        .await
        .with_context(|| format!("Cannot create cache dir {}", config.cache_dir.display()))?;
    info!(cache_dir = %config.cache_dir.display(), "Asset cache ready");

    let voice_states = Arc::new(VoiceStateDirectory::new());
    let feed = Arc::new(ChannelFeed::new(time_provider.clone()));

    let ports = PlaybackPorts {
        resolver: Arc::new(YtDlpResolver::new(
            runner.clone(),
            &config.ytdlp_bin,
            &config.cache_dir,
        )),
        converter: Arc::new(FfmpegConverter::new(
            runner.clone(),
            &config.ffmpeg_bin,
            &config.cache_dir,
        )),
        assets,
        locator: voice_states.clone(),
        gateway: Arc::new(FfmpegStreamPlayer::new(
            runner,
            &config.ffmpeg_bin,
            &config.sink_template,
        )),
        notifier: feed.clone(),
    };

    let registry = Arc::new(QueueRegistry::with_capacity(config.max_queue_size)?);
    let playback = Arc::new(PlaybackService::new(
        registry,
        ports,
        Arc::new(UuidProvider),
    ));

    // 4. Start JSON-RPC server
    info!("Starting JSON-RPC server...");
    let rpc_server = RpcServer::new(
        config.rpc_config(),
        HandlerDeps {
            playback,
            roster: voice_states,
            replies: feed.clone(),
            notifier: feed,
        },
    );
    let running = rpc_server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    info!(addr = %running.addr, max_queue_size = config.max_queue_size, "System ready");
    info!("Press Ctrl+C to shutdown");

    // 5. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 6. Graceful shutdown; in-flight playback is abandoned with the runtime
    running
        .handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    running.handle.stopped().await;
    telemetry::shutdown();

    info!("Shutdown complete.");

    Ok(())
}
