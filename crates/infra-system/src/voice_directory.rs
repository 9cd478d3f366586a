// Voice State Directory
// In-memory record of which voice channel each user sits in, per guild

use async_trait::async_trait;
use guildtune_core::domain::{DestinationId, GuildId, UserId};
use guildtune_core::port::{DestinationLocator, LocateError, VoiceRoster};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

#[derive(Default)]
pub struct VoiceStateDirectory {
    states: RwLock<HashMap<GuildId, HashMap<UserId, DestinationId>>>,
}

impl VoiceStateDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Users currently in voice in a guild
    pub fn occupants(&self, guild_id: &GuildId) -> usize {
        self.states
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(guild_id)
            .map_or(0, HashMap::len)
    }
}

impl VoiceRoster for VoiceStateDirectory {
    fn join(&self, guild_id: &GuildId, user_id: &UserId, destination: &DestinationId) {
        self.states
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(guild_id.clone())
            .or_default()
            .insert(user_id.clone(), destination.clone());
        debug!(guild_id = %guild_id, user_id = %user_id, destination = %destination, "Voice state joined");
    }

    fn leave(&self, guild_id: &GuildId, user_id: &UserId) -> bool {
        let mut states = self.states.write().unwrap_or_else(PoisonError::into_inner);
        let Some(users) = states.get_mut(guild_id) else {
            return false;
        };
        let removed = users.remove(user_id).is_some();
        if users.is_empty() {
            states.remove(guild_id);
        }
        removed
    }
}

#[async_trait]
impl DestinationLocator for VoiceStateDirectory {
    async fn locate(
        &self,
        guild_id: &GuildId,
        user_id: &UserId,
    ) -> Result<DestinationId, LocateError> {
        self.states
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(guild_id)
            .and_then(|users| users.get(user_id))
            .cloned()
            .ok_or(LocateError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> String {
        v.to_string()
    }

    #[tokio::test]
    async fn test_locate_joined_user() {
        let dir = VoiceStateDirectory::new();
        dir.join(&s("g1"), &s("u1"), &s("v1"));

        assert_eq!(dir.locate(&s("g1"), &s("u1")).await.unwrap(), "v1");
        assert_eq!(
            dir.locate(&s("g2"), &s("u1")).await.unwrap_err(),
            LocateError::NotFound
        );
    }

    #[tokio::test]
    async fn test_join_moves_user() {
        let dir = VoiceStateDirectory::new();
        dir.join(&s("g1"), &s("u1"), &s("v1"));
        dir.join(&s("g1"), &s("u1"), &s("v2"));

        assert_eq!(dir.locate(&s("g1"), &s("u1")).await.unwrap(), "v2");
        assert_eq!(dir.occupants(&s("g1")), 1);
    }

    #[tokio::test]
    async fn test_leave() {
        let dir = VoiceStateDirectory::new();
        dir.join(&s("g1"), &s("u1"), &s("v1"));

        assert!(dir.leave(&s("g1"), &s("u1")));
        assert!(!dir.leave(&s("g1"), &s("u1")));
        assert_eq!(dir.occupants(&s("g1")), 0);
        assert!(dir.locate(&s("g1"), &s("u1")).await.is_err());
    }
}
