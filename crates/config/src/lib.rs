//! Configuration: schema, discovery, `${ENV_VAR}` substitution, validation.
//!
//! Config files are discovered as `herald.{toml,yaml,yml,json}`, first
//! project-local and then under `~/.config/herald/`. Raw file text goes
//! through env substitution (`${VAR}`, or `${VAR:-default}` for a fallback)
//! before parsing, so secrets stay out of the file.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{discover_and_load, load_config},
    schema::{ConfigError, DiscordConfig, DispatchConfig, HeraldConfig, ShardingConfig},
};
