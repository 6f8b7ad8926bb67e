use {async_trait::async_trait, herald_config::HeraldConfig, std::time::Instant};

use crate::{
    command::Command,
    context::{Invocation, Reply},
    spec::CommandSpec,
};

/// `/uptime` — process uptime since startup.
pub struct UptimeCommand {
    spec: CommandSpec,
    started_at: Instant,
}

impl UptimeCommand {
    pub fn new(started_at: Instant) -> Self {
        Self {
            spec: CommandSpec::new("uptime", "Show how long the bot has been online", "utility"),
            started_at,
        }
    }
}

fn format_uptime(total_secs: u64) -> String {
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;
    format!("{days}d {hours}h {minutes}m {seconds}s")
}

#[async_trait]
impl Command for UptimeCommand {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    async fn run(&self, invocation: &Invocation, _config: &HeraldConfig) -> anyhow::Result<()> {
        let uptime = format_uptime(self.started_at.elapsed().as_secs());
        invocation
            .responder
            .respond(Reply::text(format!("Online for {uptime}")))
            .await
    }
}
