//! Port traits for every network-bound collaborator. The core is written
//! against these; `herald-discord` and `herald-store` provide the
//! production adapters, tests provide fakes.

use {
    async_trait::async_trait,
    herald_commands::CommandSpec,
    herald_common::{GuildId, GuildProfile, RemoteCommandId},
    std::sync::Arc,
};

/// One gateway connection. Lifecycle: created → opened → closed; never
/// reused after close.
#[async_trait]
pub trait GatewaySession: Send + Sync {
    async fn open(&self) -> anyhow::Result<()>;
    async fn close(&self) -> anyhow::Result<()>;
    async fn update_presence(&self, status: &str) -> anyhow::Result<()>;
}

/// Creates gateway sessions. Event wiring happens here: the adapter routes
/// everything a session receives into the `EventRouter` it was built with.
#[async_trait]
pub trait GatewayConnector: Send + Sync {
    async fn connect(
        &self,
        shard: u32,
        total_shards: u32,
    ) -> anyhow::Result<Arc<dyn GatewaySession>>;
}

/// A command as known to the remote catalog.
#[derive(Debug, Clone)]
pub struct RemoteCommand {
    pub id: RemoteCommandId,
    pub name: String,
}

/// The remote application-command catalog.
#[async_trait]
pub trait CommandCatalog: Send + Sync {
    async fn list(&self) -> anyhow::Result<Vec<RemoteCommand>>;
    async fn create(&self, spec: &CommandSpec) -> anyhow::Result<RemoteCommandId>;
    async fn delete(&self, id: &RemoteCommandId) -> anyhow::Result<()>;
}

/// Persistent guild store, used only by leader-side auxiliary handlers.
#[async_trait]
pub trait GuildStore: Send + Sync {
    async fn upsert_guild(&self, profile: &GuildProfile) -> anyhow::Result<()>;
    async fn mark_guild_left(&self, guild_id: GuildId, left_at_ms: i64) -> anyhow::Result<()>;
    async fn adjust_member_count(&self, guild_id: GuildId, delta: i64) -> anyhow::Result<()>;
    async fn close(&self) -> anyhow::Result<()>;
}
