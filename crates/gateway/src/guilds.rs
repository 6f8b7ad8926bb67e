//! Leader-side guild tracking handlers. Store failures are logged and
//! never fatal — losing a row is better than dropping the gateway.

use {
    herald_common::{GuildId, GuildProfile, now_ms},
    std::sync::Arc,
    tracing::{error, info},
};

use crate::ports::GuildStore;

pub struct GuildTracker {
    store: Arc<dyn GuildStore>,
}

impl GuildTracker {
    pub fn new(store: Arc<dyn GuildStore>) -> Self {
        Self { store }
    }

    pub async fn guild_joined(&self, profile: GuildProfile) {
        info!(guild = %profile.guild_id, name = %profile.name, "joined guild");
        if let Err(e) = self.store.upsert_guild(&profile).await {
            error!(guild = %profile.guild_id, error = %e, "failed to upsert guild");
        }
    }

    pub async fn guild_left(&self, guild_id: GuildId) {
        info!(guild = %guild_id, "left guild");
        if let Err(e) = self.store.mark_guild_left(guild_id, now_ms()).await {
            error!(guild = %guild_id, error = %e, "failed to mark guild left");
        }
    }

    pub async fn member_added(&self, guild_id: GuildId) {
        if let Err(e) = self.store.adjust_member_count(guild_id, 1).await {
            error!(guild = %guild_id, error = %e, "failed to adjust member count");
        }
    }

    pub async fn member_removed(&self, guild_id: GuildId) {
        if let Err(e) = self.store.adjust_member_count(guild_id, -1).await {
            error!(guild = %guild_id, error = %e, "failed to adjust member count");
        }
    }
}
