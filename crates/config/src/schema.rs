//! Config schema types (discord, dispatch tuning, store).

use {
    serde::{Deserialize, Serialize},
    std::time::Duration,
    thiserror::Error,
};

/// A config problem that is fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("discord.token is required (set it or use ${{DISCORD_TOKEN}} substitution)")]
    MissingToken,
    #[error("discord.application_id is required")]
    MissingApplicationId,
    #[error("failed to load config: {0}")]
    Load(String),
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeraldConfig {
    pub discord: DiscordConfig,
    pub dispatch: DispatchConfig,
    pub store: StoreConfig,
    pub debug: bool,
}

impl HeraldConfig {
    /// Check the invariants the rest of the process relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.discord.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        if self.discord.application_id == 0 {
            return Err(ConfigError::MissingApplicationId);
        }
        Ok(())
    }
}

/// Gateway credential, identity and sharding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token. Usually `${DISCORD_TOKEN}` in the file.
    pub token: String,

    /// Application id the command catalog is registered under.
    pub application_id: u64,

    /// When set, commands are registered to this guild only instead of
    /// globally (guild commands propagate instantly, useful in dev).
    pub guild_id: Option<u64>,

    /// Presence status text pushed after the leader shard opens.
    pub status: String,

    /// User ids allowed to run `dev_only` commands.
    pub developers: Vec<u64>,

    pub sharding: ShardingConfig,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            application_id: 0,
            guild_id: None,
            status: "Listening for commands".to_string(),
            developers: Vec::new(),
            sharding: ShardingConfig::default(),
        }
    }
}

impl DiscordConfig {
    pub fn is_developer(&self, user_id: u64) -> bool {
        self.developers.contains(&user_id)
    }
}

/// Sharded gateway bring-up.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShardingConfig {
    pub enabled: bool,
    pub total_shards: u32,
}

/// Dispatch tuning knobs. Per-command values on the descriptor win.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Default per-user cooldown, seconds.
    pub default_cooldown_secs: u64,

    /// Default per-invocation run deadline, seconds.
    pub run_timeout_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_cooldown_secs: 5,
            run_timeout_secs: 15,
        }
    }
}

impl DispatchConfig {
    pub fn default_cooldown(&self) -> Duration {
        Duration::from_secs(self.default_cooldown_secs)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }
}

/// Persistent store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database path.
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "herald.db".to_string(),
        }
    }
}
