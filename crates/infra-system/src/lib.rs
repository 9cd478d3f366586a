// Guildtune Infrastructure - System Adapters
// Implements: MediaResolver, AudioConverter, VoiceGateway, AssetStore,
// DestinationLocator, Notifier

pub mod channel_feed;
pub mod ffmpeg_converter;
pub mod ffmpeg_player;
pub mod local_asset_store;
pub mod process;
pub mod voice_directory;
pub mod ytdlp_resolver;

pub use channel_feed::{ChannelFeed, FEED_HISTORY};
pub use ffmpeg_converter::FfmpegConverter;
pub use ffmpeg_player::{FfmpegStreamPlayer, DEFAULT_SINK_TEMPLATE};
pub use local_asset_store::LocalAssetStore;
pub use process::{ProcessError, ProcessRunner};
pub use voice_directory::VoiceStateDirectory;
pub use ytdlp_resolver::YtDlpResolver;
