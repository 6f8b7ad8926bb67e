use {async_trait::async_trait, herald_config::HeraldConfig};

use crate::{
    context::{AutocompleteRequest, Invocation},
    spec::{CommandSpec, OptionChoice},
};

/// One invocable command: descriptor plus run/autocomplete capabilities.
#[async_trait]
pub trait Command: Send + Sync {
    /// Immutable descriptor. `spec().name` is the registry identity.
    fn spec(&self) -> &CommandSpec;

    /// Execute one invocation. Errors are reported to the user by the
    /// dispatcher as a generic failure; never panic.
    async fn run(&self, invocation: &Invocation, config: &HeraldConfig) -> anyhow::Result<()>;

    /// Whether `autocomplete` produces anything. Commands without it are
    /// skipped silently by the dispatcher.
    fn supports_autocomplete(&self) -> bool {
        false
    }

    /// Produce choices for a partially-typed option. Capped at 25 by the
    /// dispatcher.
    async fn autocomplete(
        &self,
        request: &AutocompleteRequest,
    ) -> anyhow::Result<Vec<OptionChoice>> {
        let _ = request;
        Ok(Vec::new())
    }
}
