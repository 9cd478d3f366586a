// Port Layer - Interfaces for external collaborators

pub mod asset_store;
pub mod audio_converter;
pub mod destination_locator;
pub mod id_provider; // For deterministic testing
pub mod media_resolver;
pub mod notifier;
pub mod time_provider;
pub mod voice_gateway;

// Re-exports
pub use asset_store::{AssetError, AssetStore};
pub use audio_converter::{AudioConverter, ConvertError};
pub use destination_locator::{DestinationLocator, LocateError, VoiceRoster};
pub use id_provider::IdProvider;
pub use media_resolver::{MediaResolver, ResolveError};
pub use notifier::{Notifier, Reply, ReplyLog};
pub use time_provider::TimeProvider;
pub use voice_gateway::{PlaybackError, SetupError, VoiceGateway, VoiceSession};
