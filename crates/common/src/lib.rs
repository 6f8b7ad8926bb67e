//! Shared plain types: snowflake id newtypes, guild profiles, time helpers.
//!
//! Everything here is dependency-light so every other crate can use it.

pub mod ids;

pub use ids::{ChannelId, GuildId, RemoteCommandId, UserId};

use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Snapshot of a guild the bot is (or was) a member of, as persisted by the
/// guild tracking handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildProfile {
    pub guild_id: GuildId,
    pub name: String,
    pub owner_id: UserId,
    pub member_count: i64,
    pub is_active: bool,
    /// Unix millis when the bot joined.
    pub joined_at: i64,
    /// Unix millis when the bot left, if it has.
    pub left_at: Option<i64>,
    /// Unix millis of the last write.
    pub last_updated: i64,
}

impl GuildProfile {
    /// A freshly-joined, active guild.
    pub fn joined(guild_id: GuildId, name: impl Into<String>, owner_id: UserId, members: i64) -> Self {
        let now = now_ms();
        Self {
            guild_id,
            name: name.into(),
            owner_id,
            member_count: members,
            is_active: true,
            joined_at: now,
            left_at: None,
            last_updated: now,
        }
    }
}
