//! Session orchestrator: brings up one or many gateway shards, runs
//! leader setup, and coordinates bounded-time shutdown.
//!
//! Bring-up is bounded-concurrency and never fail-fast: every shard task
//! runs to completion and failures are aggregated, so one bad shard
//! cannot abandon its siblings.

use {
    anyhow::Context as _,
    herald_commands::CommandRegistry,
    herald_config::HeraldConfig,
    std::{
        sync::{Arc, Mutex},
        time::Duration,
    },
    tokio::sync::Semaphore,
    tracing::{info, warn},
};

use crate::{
    dispatch::Dispatcher,
    error::{ShardFailure, ShutdownError, StartupError},
    ports::{GatewayConnector, GatewaySession, GuildStore},
    registration::RegistrationManager,
    shutdown,
};

/// Concurrent shard bring-up width; keeps the connection rate under the
/// remote limit.
const BRING_UP_WIDTH: usize = 5;

/// Per-phase deadlines.
#[derive(Debug, Clone)]
pub struct StartupTimeouts {
    /// Whole of `start()`.
    pub startup: Duration,
    /// One session open.
    pub session_open: Duration,
    /// Whole teardown sequence.
    pub shutdown: Duration,
}

impl Default for StartupTimeouts {
    fn default() -> Self {
        Self {
            startup: Duration::from_secs(180),
            session_open: Duration::from_secs(30),
            shutdown: shutdown::SHUTDOWN_DEADLINE,
        }
    }
}

/// One gateway connection owned by the orchestrator.
/// Created → opened → closed; never reused.
#[derive(Clone)]
pub struct ShardSession {
    pub shard: u32,
    pub total: u32,
    /// True iff shard 0. The leader owns command registration and the
    /// leader-side event handlers.
    pub leader: bool,
    pub handle: Arc<dyn GatewaySession>,
}

pub struct Orchestrator {
    connector: Arc<dyn GatewayConnector>,
    registration: RegistrationManager,
    registry: Arc<CommandRegistry>,
    dispatcher: Arc<Dispatcher>,
    store: Arc<dyn GuildStore>,
    config: Arc<HeraldConfig>,
    /// Coarse lock: each bring-up task writes a disjoint index, the lock
    /// guards structural mutation of the list itself.
    sessions: Mutex<Vec<Option<ShardSession>>>,
    timeouts: StartupTimeouts,
}

impl Orchestrator {
    pub fn new(
        connector: Arc<dyn GatewayConnector>,
        registration: RegistrationManager,
        registry: Arc<CommandRegistry>,
        dispatcher: Arc<Dispatcher>,
        store: Arc<dyn GuildStore>,
        config: Arc<HeraldConfig>,
    ) -> Self {
        Self {
            connector,
            registration,
            registry,
            dispatcher,
            store,
            config,
            sessions: Mutex::new(Vec::new()),
            timeouts: StartupTimeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: StartupTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Bring the bot up in the configured mode, bounded by the global
    /// startup deadline.
    pub async fn start(self: &Arc<Self>) -> Result<(), StartupError> {
        let sharding = &self.config.discord.sharding;
        let bring_up = async {
            if sharding.enabled {
                self.start_sharded(sharding.total_shards).await
            } else {
                self.start_single().await
            }
        };
        match tokio::time::timeout(self.timeouts.startup, bring_up).await {
            Err(_elapsed) => Err(StartupError::Timeout(self.timeouts.startup)),
            Ok(result) => result,
        }
    }

    /// One connection, shard 0 of 1. Any failure aborts startup.
    pub async fn start_single(self: &Arc<Self>) -> Result<(), StartupError> {
        *self.sessions.lock().unwrap_or_else(|p| p.into_inner()) = vec![None];
        match self.bring_up_shard(0, 1).await {
            Ok(()) => {
                self.push_presence().await;
                info!("started in single-session mode");
                Ok(())
            },
            Err(source) => Err(StartupError::Shards {
                failures: vec![ShardFailure {
                    shard: 0,
                    leader: true,
                    source,
                }],
            }),
        }
    }

    /// `total_shards` connections with bounded-concurrency bring-up. All
    /// tasks run to completion; failures are aggregated, never fail-fast.
    pub async fn start_sharded(self: &Arc<Self>, total_shards: u32) -> Result<(), StartupError> {
        if total_shards == 0 {
            return Err(StartupError::InvalidShardCount(total_shards));
        }

        *self.sessions.lock().unwrap_or_else(|p| p.into_inner()) =
            (0..total_shards).map(|_| None).collect();

        let semaphore = Arc::new(Semaphore::new(BRING_UP_WIDTH));
        let mut handles = Vec::with_capacity(total_shards as usize);
        for shard in 0..total_shards {
            let orchestrator = self.clone();
            let semaphore = semaphore.clone();
            handles.push((
                shard,
                tokio::spawn(async move {
                    // The semaphore is never closed while bring-up runs, so
                    // acquisition only fails if that invariant breaks.
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|e| anyhow::Error::from(e).context("bring-up gate closed"))?;
                    orchestrator.bring_up_shard(shard, total_shards).await
                }),
            ));
        }

        let mut failures = Vec::new();
        for (shard, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(join_err) => Err(anyhow::Error::from(join_err).context("shard task panicked")),
            };
            if let Err(source) = result {
                warn!(shard, error = %source, "shard failed to start");
                failures.push(ShardFailure {
                    shard,
                    leader: shard == 0,
                    source,
                });
            }
        }

        if failures.is_empty() {
            self.push_presence().await;
            info!(shards = total_shards, "started in sharded mode");
            Ok(())
        } else {
            // Presence is still pushed when the leader survived; a subset
            // of dead shards leaves the bot degraded, not down.
            if !failures.iter().any(|f| f.leader) {
                self.push_presence().await;
            }
            Err(StartupError::Shards { failures })
        }
    }

    /// Connect one shard, record it, run leader setup on shard 0, open.
    async fn bring_up_shard(&self, shard: u32, total: u32) -> anyhow::Result<()> {
        let handle = self
            .connector
            .connect(shard, total)
            .await
            .with_context(|| format!("failed to connect shard {shard}"))?;

        {
            let mut sessions = self.sessions.lock().unwrap_or_else(|p| p.into_inner());
            sessions[shard as usize] = Some(ShardSession {
                shard,
                total,
                leader: shard == 0,
                handle: handle.clone(),
            });
        }

        // Leader setup runs before open so dispatch is never live without
        // a reconciled table.
        if shard == 0 {
            self.leader_setup().await;
        }

        match tokio::time::timeout(self.timeouts.session_open, handle.open()).await {
            Err(_elapsed) => anyhow::bail!(
                "shard {shard} open timed out after {:?}",
                self.timeouts.session_open
            ),
            Ok(Err(e)) => Err(e).with_context(|| format!("failed to open shard {shard}")),
            Ok(Ok(())) => Ok(()),
        }
    }

    /// Reconcile command registrations. Registration trouble is logged and
    /// non-fatal: commands that failed stay out of the live table.
    async fn leader_setup(&self) {
        match self
            .registration
            .reconcile(&self.registry, &self.dispatcher)
            .await
        {
            Ok(()) => info!(commands = self.registry.len(), "command registrations reconciled"),
            Err(e) => warn!(error = %e, "command registration incomplete"),
        }
    }

    /// Push the configured presence through the leader session.
    /// Best-effort: a failure is logged, never fatal.
    async fn push_presence(&self) {
        let leader = {
            let sessions = self.sessions.lock().unwrap_or_else(|p| p.into_inner());
            sessions
                .iter()
                .flatten()
                .find(|s| s.leader)
                .map(|s| s.handle.clone())
        };
        if let Some(handle) = leader
            && let Err(e) = handle.update_presence(&self.config.discord.status).await
        {
            warn!(error = %e, "presence update failed");
        }
    }

    /// Tear everything down in bounded time. Always returns to the caller
    /// within the shutdown deadline.
    pub async fn stop(&self) -> Result<(), ShutdownError> {
        let sessions: Vec<ShardSession> = self
            .sessions
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .drain(..)
            .flatten()
            .collect();
        shutdown::coordinate(
            &self.dispatcher,
            &self.registration,
            sessions,
            &self.store,
            self.timeouts.shutdown,
        )
        .await
    }

    /// Snapshot of the current session list.
    pub fn sessions(&self) -> Vec<ShardSession> {
        self.sessions
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .flatten()
            .cloned()
            .collect()
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }
}
