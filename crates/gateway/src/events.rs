//! Event router: the single entry point the gateway adapter feeds.
//!
//! Each event is handled in its own task so a slow handler can never
//! stall the adapter's gateway read loop.

use {
    herald_common::{GuildId, GuildProfile},
    std::sync::Arc,
    tracing::info,
};

use crate::{
    dispatch::{AutocompleteEvent, Dispatcher, InvocationEvent},
    guilds::GuildTracker,
};

/// Everything the core cares about from the gateway.
pub enum GatewayEvent {
    Ready {
        shard: u32,
        username: String,
        guild_count: usize,
    },
    GuildCreate(GuildProfile),
    GuildDelete {
        guild_id: GuildId,
    },
    MemberAdd {
        guild_id: GuildId,
    },
    MemberRemove {
        guild_id: GuildId,
    },
    Invocation(InvocationEvent),
    Autocomplete(AutocompleteEvent),
}

pub struct EventRouter {
    dispatcher: Arc<Dispatcher>,
    guilds: Arc<GuildTracker>,
}

impl EventRouter {
    pub fn new(dispatcher: Arc<Dispatcher>, guilds: Arc<GuildTracker>) -> Self {
        Self { dispatcher, guilds }
    }

    pub fn handle(&self, event: GatewayEvent) {
        match event {
            GatewayEvent::Ready {
                shard,
                username,
                guild_count,
            } => {
                info!(shard, %username, guild_count, "gateway session ready");
            },
            GatewayEvent::GuildCreate(profile) => {
                let guilds = self.guilds.clone();
                tokio::spawn(async move { guilds.guild_joined(profile).await });
            },
            GatewayEvent::GuildDelete { guild_id } => {
                let guilds = self.guilds.clone();
                tokio::spawn(async move { guilds.guild_left(guild_id).await });
            },
            GatewayEvent::MemberAdd { guild_id } => {
                let guilds = self.guilds.clone();
                tokio::spawn(async move { guilds.member_added(guild_id).await });
            },
            GatewayEvent::MemberRemove { guild_id } => {
                let guilds = self.guilds.clone();
                tokio::spawn(async move { guilds.member_removed(guild_id).await });
            },
            GatewayEvent::Invocation(invocation) => {
                self.dispatcher.spawn_invocation(invocation);
            },
            GatewayEvent::Autocomplete(autocomplete) => {
                self.dispatcher.spawn_autocomplete(autocomplete);
            },
        }
    }
}
