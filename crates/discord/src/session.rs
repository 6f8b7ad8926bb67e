//! Gateway session adapter. One serenity `Client` per shard; the client
//! is consumed on open and the shard manager handles teardown.

use {
    anyhow::{Context as _, bail},
    async_trait::async_trait,
    herald_gateway::{EventRouter, GatewayConnector, GatewaySession},
    serenity::{Client, gateway::ActivityData, gateway::ShardManager},
    std::sync::Arc,
    tokio::sync::Mutex,
    tracing::error,
};

use crate::{bridge::BridgeHandler, gateway_intents};

pub struct SerenityConnector {
    token: String,
    status: String,
    router: Arc<EventRouter>,
}

impl SerenityConnector {
    pub fn new(token: impl Into<String>, status: impl Into<String>, router: Arc<EventRouter>) -> Self {
        Self {
            token: token.into(),
            status: status.into(),
            router,
        }
    }
}

#[async_trait]
impl GatewayConnector for SerenityConnector {
    async fn connect(&self, shard: u32, total_shards: u32) -> anyhow::Result<Arc<dyn GatewaySession>> {
        let handler = BridgeHandler::new(self.router.clone(), self.status.clone());
        let client = Client::builder(&self.token, gateway_intents())
            .event_handler(handler)
            .await
            .with_context(|| format!("build client for shard {shard}"))?;
        Ok(Arc::new(SerenitySession {
            shard,
            total_shards,
            shard_manager: client.shard_manager.clone(),
            client: Mutex::new(Some(client)),
        }))
    }
}

pub struct SerenitySession {
    shard: u32,
    total_shards: u32,
    shard_manager: Arc<ShardManager>,
    client: Mutex<Option<Client>>,
}

#[async_trait]
impl GatewaySession for SerenitySession {
    async fn open(&self) -> anyhow::Result<()> {
        let Some(mut client) = self.client.lock().await.take() else {
            bail!("shard {} session already opened", self.shard);
        };
        let (shard, total) = (self.shard, self.total_shards);
        // start_shard runs the read loop until shutdown; it gets its own
        // task and reports failures through the log only.
        tokio::spawn(async move {
            if let Err(err) = client.start_shard(shard, total).await {
                error!(shard, error = %err, "shard runner exited with error");
            }
        });
        Ok(())
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.shard_manager.shutdown_all().await;
        Ok(())
    }

    async fn update_presence(&self, status: &str) -> anyhow::Result<()> {
        let runners = self.shard_manager.runners.lock().await;
        for runner in runners.values() {
            runner
                .runner_tx
                .set_activity(Some(ActivityData::playing(status)));
        }
        Ok(())
    }
}
