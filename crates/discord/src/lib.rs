//! Discord adapters for the gateway core: serenity-backed implementations
//! of the session, connector, catalog, and responder ports. Nothing in
//! here makes dispatch decisions; events are decoded and handed to the
//! core's `EventRouter`.

mod bridge;
mod catalog;
mod responder;
mod session;

pub use {
    catalog::RestCatalog,
    session::{SerenityConnector, SerenitySession},
};

use serenity::prelude::GatewayIntents;

/// Intents the bot subscribes to. `GUILD_MEMBERS` is privileged and must
/// be enabled in the developer portal for member add/remove tracking.
pub fn gateway_intents() -> GatewayIntents {
    GatewayIntents::non_privileged() | GatewayIntents::GUILD_MEMBERS
}
