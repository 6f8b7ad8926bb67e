use {async_trait::async_trait, herald_config::HeraldConfig, std::time::Instant};

use crate::{
    command::Command,
    context::{Invocation, Reply},
    spec::CommandSpec,
};

/// `/ping` — REST round-trip latency and shard index.
pub struct PingCommand {
    spec: CommandSpec,
}

impl PingCommand {
    pub fn new() -> Self {
        Self {
            spec: CommandSpec::new("ping", "Check bot latency and shard", "utility"),
        }
    }
}

impl Default for PingCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Command for PingCommand {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    async fn run(&self, invocation: &Invocation, _config: &HeraldConfig) -> anyhow::Result<()> {
        // The defer itself is a REST call, so its duration is the
        // round-trip latency we report.
        let start = Instant::now();
        invocation.responder.defer(false).await?;
        let rest_ms = start.elapsed().as_millis();

        invocation
            .responder
            .edit(Reply::text(format!(
                "Pong! REST round-trip: {rest_ms}ms (shard {})",
                invocation.shard
            )))
            .await
    }
}
