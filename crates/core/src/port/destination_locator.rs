// Destination Locator Port
// Finds the voice channel a requesting user currently occupies

use crate::domain::{DestinationId, GuildId, UserId};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocateError {
    #[error("couldn't find voice channel with user in it")]
    NotFound,

    #[error("unable to find voice channel user is in: {0}")]
    Lookup(String),
}

#[async_trait]
pub trait DestinationLocator: Send + Sync {
    /// # Errors
    /// - LocateError::NotFound if the user is in no voice channel of the guild
    async fn locate(&self, guild_id: &GuildId, user_id: &UserId)
        -> Result<DestinationId, LocateError>;
}

/// Write side of the voice state the locator reads from
pub trait VoiceRoster: Send + Sync {
    /// Record that a user sits in `destination`, replacing any previous channel
    fn join(&self, guild_id: &GuildId, user_id: &UserId, destination: &DestinationId);

    /// Returns false if the user was not in a voice channel
    fn leave(&self, guild_id: &GuildId, user_id: &UserId) -> bool;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;

    /// Places every user in the same voice channel, or nowhere
    pub struct MockDestinationLocator {
        destination: Option<DestinationId>,
    }

    impl MockDestinationLocator {
        pub fn new(destination: impl Into<DestinationId>) -> Self {
            Self {
                destination: Some(destination.into()),
            }
        }
        pub fn new_not_found() -> Self {
            Self { destination: None }
        }
    }

    #[async_trait]
    impl DestinationLocator for MockDestinationLocator {
        async fn locate(
            &self,
            _guild_id: &GuildId,
            _user_id: &UserId,
        ) -> Result<DestinationId, LocateError> {
            self.destination.clone().ok_or(LocateError::NotFound)
        }
    }
}
