//! Session and command lifecycle manager — the concurrent core of the bot.
//!
//! Lifecycle:
//! 1. Orchestrator brings up one or many gateway shards (bounded fan-out)
//! 2. The leader shard reconciles command registrations with the remote
//!    catalog before opening
//! 3. The dispatcher routes invocation/autocomplete events under cooldown
//!    and timeout control
//! 4. On signal, the shutdown coordinator tears everything down in bounded
//!    time, aggregating errors instead of short-circuiting
//!
//! Everything network-bound is behind the port traits in `ports`; the
//! production adapters live in `herald-discord` and `herald-store`.

pub mod cooldown;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod guilds;
pub mod orchestrator;
pub mod ports;
pub mod registration;
pub mod shutdown;

#[cfg(test)]
pub(crate) mod testutil;

pub use {
    dispatch::{AutocompleteEvent, DispatchOutcome, Dispatcher, InvocationEvent},
    error::{RegistrationError, ShardFailure, ShutdownError, StartupError, StepFailure},
    events::{EventRouter, GatewayEvent},
    guilds::GuildTracker,
    orchestrator::Orchestrator,
    ports::{CommandCatalog, GatewayConnector, GatewaySession, GuildStore, RemoteCommand},
    registration::RegistrationManager,
};
