//! Hand-rolled async fakes for the port traits, shared across the core's
//! test modules.

use {
    async_trait::async_trait,
    herald_commands::{
        Command, CommandSpec, Invocation, OptionChoice, Reply, Responder,
        context::AutocompleteRequest,
    },
    herald_common::{GuildId, GuildProfile, RemoteCommandId},
    herald_config::HeraldConfig,
    std::{
        collections::{HashMap, HashSet},
        sync::{
            Arc, Mutex,
            atomic::{AtomicBool, AtomicUsize, Ordering},
        },
        time::Duration,
    },
};

use crate::ports::{CommandCatalog, GatewayConnector, GatewaySession, GuildStore, RemoteCommand};

/// Config with a known developer (user 99) and default dispatch tuning.
pub fn test_config() -> HeraldConfig {
    let mut cfg = HeraldConfig::default();
    cfg.discord.token = "test-token".into();
    cfg.discord.application_id = 1;
    cfg.discord.developers = vec![99];
    cfg
}

// ── commands ────────────────────────────────────────────────────────

pub struct FakeCommand {
    spec: CommandSpec,
    runs: AtomicUsize,
    fail: bool,
    defer: bool,
    sleep: Option<Duration>,
    choices: usize,
    autocomplete_sleep: Option<Duration>,
    autocomplete_fail: bool,
}

impl FakeCommand {
    pub fn new(name: &str) -> Self {
        Self {
            spec: CommandSpec::new(name, "fake", "test"),
            runs: AtomicUsize::new(0),
            fail: false,
            defer: false,
            sleep: None,
            choices: 0,
            autocomplete_sleep: None,
            autocomplete_fail: false,
        }
    }

    pub fn dev_only(mut self) -> Self {
        self.spec = self.spec.dev_only();
        self
    }

    pub fn admin_only(mut self) -> Self {
        self.spec = self.spec.admin_only();
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Defer before doing anything else, like long-running builtins do.
    pub fn deferring(mut self) -> Self {
        self.defer = true;
        self
    }

    pub fn sleeping(mut self, duration: Duration) -> Self {
        self.sleep = Some(duration);
        self
    }

    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.spec = self.spec.run_timeout(timeout);
        self
    }

    pub fn with_choices(mut self, count: usize) -> Self {
        self.choices = count;
        self
    }

    pub fn with_slow_autocomplete(mut self, duration: Duration) -> Self {
        self.autocomplete_sleep = Some(duration);
        self
    }

    pub fn with_failing_autocomplete(mut self) -> Self {
        self.autocomplete_fail = true;
        self
    }

    pub fn run_count(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Command for FakeCommand {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    async fn run(&self, invocation: &Invocation, _config: &HeraldConfig) -> anyhow::Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if self.defer {
            invocation.responder.defer(false).await?;
        }
        if let Some(duration) = self.sleep {
            tokio::time::sleep(duration).await;
        }
        if self.fail {
            anyhow::bail!("fake failure");
        }
        Ok(())
    }

    fn supports_autocomplete(&self) -> bool {
        self.choices > 0 || self.autocomplete_sleep.is_some() || self.autocomplete_fail
    }

    async fn autocomplete(
        &self,
        _request: &AutocompleteRequest,
    ) -> anyhow::Result<Vec<OptionChoice>> {
        if let Some(duration) = self.autocomplete_sleep {
            tokio::time::sleep(duration).await;
        }
        if self.autocomplete_fail {
            anyhow::bail!("fake autocomplete failure");
        }
        Ok((0..self.choices)
            .map(|i| OptionChoice::new(format!("choice{i}"), format!("choice{i}")))
            .collect())
    }
}

// ── responder ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingResponder {
    replies: Mutex<Vec<Reply>>,
    defers: AtomicUsize,
    suggestions: Mutex<Vec<Vec<OptionChoice>>>,
}

impl RecordingResponder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replies(&self) -> Vec<Reply> {
        self.replies.lock().unwrap().clone()
    }

    pub fn defer_count(&self) -> usize {
        self.defers.load(Ordering::SeqCst)
    }

    pub fn suggestions(&self) -> Vec<Vec<OptionChoice>> {
        self.suggestions.lock().unwrap().clone()
    }
}

#[async_trait]
impl Responder for RecordingResponder {
    async fn respond(&self, reply: Reply) -> anyhow::Result<()> {
        // A real interaction rejects an initial response once it has been
        // acknowledged with a defer; edits are the only follow-up then.
        if self.defers.load(Ordering::SeqCst) > 0 {
            anyhow::bail!("interaction already acknowledged");
        }
        self.replies.lock().unwrap().push(reply);
        Ok(())
    }

    async fn defer(&self, _ephemeral: bool) -> anyhow::Result<()> {
        self.defers.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn edit(&self, reply: Reply) -> anyhow::Result<()> {
        self.replies.lock().unwrap().push(reply);
        Ok(())
    }

    async fn suggest(&self, choices: Vec<OptionChoice>) -> anyhow::Result<()> {
        self.suggestions.lock().unwrap().push(choices);
        Ok(())
    }
}

// ── gateway sessions ────────────────────────────────────────────────

pub struct FakeSession {
    pub shard: u32,
    pub opened: AtomicBool,
    pub closed: AtomicBool,
    fail_open: bool,
    fail_close: bool,
    presence: Mutex<Option<String>>,
}

impl FakeSession {
    pub fn presence(&self) -> Option<String> {
        self.presence.lock().unwrap().clone()
    }
}

#[async_trait]
impl GatewaySession for FakeSession {
    async fn open(&self) -> anyhow::Result<()> {
        if self.fail_open {
            anyhow::bail!("open failed for shard {}", self.shard);
        }
        self.opened.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> anyhow::Result<()> {
        if self.fail_close {
            anyhow::bail!("close failed for shard {}", self.shard);
        }
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn update_presence(&self, status: &str) -> anyhow::Result<()> {
        *self.presence.lock().unwrap() = Some(status.to_string());
        Ok(())
    }
}

/// Connector whose failure modes are scripted per shard index. Tracks peak
/// connect concurrency so the bring-up semaphore is observable.
#[derive(Default)]
pub struct FakeConnector {
    pub fail_connect: HashSet<u32>,
    pub fail_open: HashSet<u32>,
    pub fail_close: HashSet<u32>,
    pub connect_delay: Option<Duration>,
    pub sessions: Mutex<Vec<Arc<FakeSession>>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn session(&self, shard: u32) -> Option<Arc<FakeSession>> {
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.shard == shard)
            .cloned()
    }
}

#[async_trait]
impl GatewayConnector for FakeConnector {
    async fn connect(
        &self,
        shard: u32,
        _total_shards: u32,
    ) -> anyhow::Result<Arc<dyn GatewaySession>> {
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(in_flight, Ordering::SeqCst);
        if let Some(delay) = self.connect_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_connect.contains(&shard) {
            anyhow::bail!("connect failed for shard {shard}");
        }

        let session = Arc::new(FakeSession {
            shard,
            opened: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            fail_open: self.fail_open.contains(&shard),
            fail_close: self.fail_close.contains(&shard),
            presence: Mutex::new(None),
        });
        self.sessions.lock().unwrap().push(session.clone());
        Ok(session)
    }
}

// ── command catalog ─────────────────────────────────────────────────

/// In-memory catalog. `fail_create` names fail every attempt;
/// `flaky_create` names fail that many times, then succeed.
#[derive(Default)]
pub struct FakeCatalog {
    pub fail_create: HashSet<String>,
    pub fail_delete: HashSet<String>,
    flaky_create: Mutex<HashMap<String, u32>>,
    remote: Mutex<Vec<RemoteCommand>>,
    deleted: Mutex<Vec<RemoteCommandId>>,
    next_id: AtomicUsize,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_existing(self, names: &[&str]) -> Self {
        {
            let mut remote = self.remote.lock().unwrap();
            for name in names {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                remote.push(RemoteCommand {
                    id: RemoteCommandId(format!("pre-{id}")),
                    name: name.to_string(),
                });
            }
        }
        self
    }

    pub fn flaky(self, name: &str, failures: u32) -> Self {
        self.flaky_create
            .lock()
            .unwrap()
            .insert(name.to_string(), failures);
        self
    }

    pub fn created_names(&self) -> Vec<String> {
        self.remote
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn deleted_ids(&self) -> Vec<RemoteCommandId> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandCatalog for FakeCatalog {
    async fn list(&self) -> anyhow::Result<Vec<RemoteCommand>> {
        Ok(self.remote.lock().unwrap().clone())
    }

    async fn create(&self, spec: &CommandSpec) -> anyhow::Result<RemoteCommandId> {
        if self.fail_create.contains(&spec.name) {
            anyhow::bail!("create rejected: {}", spec.name);
        }
        if let Some(remaining) = self.flaky_create.lock().unwrap().get_mut(&spec.name)
            && *remaining > 0
        {
            *remaining -= 1;
            anyhow::bail!("transient create failure: {}", spec.name);
        }
        let id = RemoteCommandId(format!("id-{}", self.next_id.fetch_add(1, Ordering::SeqCst)));
        self.remote.lock().unwrap().push(RemoteCommand {
            id: id.clone(),
            name: spec.name.clone(),
        });
        Ok(id)
    }

    async fn delete(&self, id: &RemoteCommandId) -> anyhow::Result<()> {
        let name = self
            .remote
            .lock()
            .unwrap()
            .iter()
            .find(|c| &c.id == id)
            .map(|c| c.name.clone());
        if let Some(name) = name
            && self.fail_delete.contains(&name)
        {
            anyhow::bail!("delete rejected: {name}");
        }
        self.remote.lock().unwrap().retain(|c| &c.id != id);
        self.deleted.lock().unwrap().push(id.clone());
        Ok(())
    }
}

// ── guild store ─────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeStore {
    pub fail_close: bool,
    guilds: Mutex<HashMap<GuildId, GuildProfile>>,
    closed: AtomicBool,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn guild(&self, id: GuildId) -> Option<GuildProfile> {
        self.guilds.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl GuildStore for FakeStore {
    async fn upsert_guild(&self, profile: &GuildProfile) -> anyhow::Result<()> {
        self.guilds
            .lock()
            .unwrap()
            .insert(profile.guild_id, profile.clone());
        Ok(())
    }

    async fn mark_guild_left(&self, guild_id: GuildId, left_at_ms: i64) -> anyhow::Result<()> {
        if let Some(g) = self.guilds.lock().unwrap().get_mut(&guild_id) {
            g.is_active = false;
            g.left_at = Some(left_at_ms);
            g.last_updated = left_at_ms;
        }
        Ok(())
    }

    async fn adjust_member_count(&self, guild_id: GuildId, delta: i64) -> anyhow::Result<()> {
        if let Some(g) = self.guilds.lock().unwrap().get_mut(&guild_id) {
            g.member_count += delta;
        }
        Ok(())
    }

    async fn close(&self) -> anyhow::Result<()> {
        if self.fail_close {
            anyhow::bail!("store close failed");
        }
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
