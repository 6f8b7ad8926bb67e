//! Dispatch handler: routes invocation and autocomplete events to
//! commands under access, cooldown and timeout control.
//!
//! Every invocation yields exactly one terminal response — success,
//! cooldown notice, not-allowed notice, timeout notice, or generic
//! failure. Unknown command names and autocomplete degrade silently.

use {
    herald_commands::{
        Command, Invocation, Reply, Responder,
        context::{AttachmentRef, AutocompleteRequest, OptionValue},
    },
    herald_common::{ChannelId, GuildId, UserId},
    herald_config::HeraldConfig,
    std::{
        collections::HashMap,
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
        },
        time::{Duration, Instant},
    },
    tokio::sync::RwLock,
    tracing::{debug, error, warn},
};

use crate::cooldown::{CooldownDecision, CooldownTable};

/// Deadline for autocomplete capabilities. The client shows an empty list
/// on silence, so this stays short.
const AUTOCOMPLETE_DEADLINE: Duration = Duration::from_secs(3);

/// Remote cap on autocomplete choice lists.
const MAX_CHOICES: usize = 25;

/// Raw invocation event as decoded by the gateway adapter.
pub struct InvocationEvent {
    pub command: String,
    /// User id from the guild member payload, when guild-scoped.
    pub member_user: Option<UserId>,
    /// User id from the direct payload (DM invocations).
    pub user: Option<UserId>,
    pub guild_id: Option<GuildId>,
    pub channel_id: Option<ChannelId>,
    pub member_permissions: Option<u64>,
    pub shard: u32,
    pub options: Vec<(String, OptionValue)>,
    pub attachments: Vec<AttachmentRef>,
    pub responder: Arc<dyn Responder>,
}

/// Raw autocomplete event as decoded by the gateway adapter.
pub struct AutocompleteEvent {
    pub command: String,
    pub user: Option<UserId>,
    pub focused_option: String,
    pub partial: String,
    pub responder: Arc<dyn Responder>,
}

/// Terminal state of one invocation. No retries at this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Completed,
    RejectedCooldown,
    RejectedAccess,
    TimedOut,
    Errored,
    /// Name not in the lookup table — silent, avoids responding during a
    /// registration race.
    UnknownCommand,
    /// Neither member-user nor direct-user id present — logged, silent.
    MissingUser,
    /// Intake is draining for shutdown — silent.
    Draining,
}

/// Outcome of one autocomplete event. All failure modes are silent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutocompleteOutcome {
    Suggested,
    Skipped,
    TimedOut,
    Errored,
    Draining,
}

pub struct Dispatcher {
    /// Live lookup table. Populated only after remote confirmation, so a
    /// resolvable name is always one the remote recognizes.
    table: RwLock<HashMap<String, Arc<dyn Command>>>,
    cooldowns: CooldownTable,
    config: Arc<HeraldConfig>,
    draining: AtomicBool,
}

impl Dispatcher {
    pub fn new(config: Arc<HeraldConfig>) -> Self {
        Self {
            table: RwLock::new(HashMap::new()),
            cooldowns: CooldownTable::new(),
            config,
            draining: AtomicBool::new(false),
        }
    }

    /// Insert a command into the live table. Called by the registration
    /// manager after the remote confirms creation, never before.
    pub async fn install(&self, command: Arc<dyn Command>) {
        let name = command.spec().name.clone();
        self.table.write().await.insert(name, command);
    }

    /// Names currently resolvable.
    pub async fn installed(&self) -> Vec<String> {
        let mut names: Vec<String> = self.table.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Stop admitting new events. In-flight dispatch may finish.
    pub fn begin_drain(&self) {
        self.draining.store(true, Ordering::SeqCst);
    }

    /// Handle one invocation in its own task so a slow command cannot
    /// delay an unrelated invocation's latency.
    pub fn spawn_invocation(self: &Arc<Self>, event: InvocationEvent) {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            dispatcher.handle_invocation(event).await;
        });
    }

    pub fn spawn_autocomplete(self: &Arc<Self>, event: AutocompleteEvent) {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            dispatcher.handle_autocomplete(event).await;
        });
    }

    pub async fn handle_invocation(&self, event: InvocationEvent) -> DispatchOutcome {
        if self.draining.load(Ordering::SeqCst) {
            return DispatchOutcome::Draining;
        }

        // Member-scoped user id wins over the direct one.
        let Some(user_id) = event.member_user.or(event.user) else {
            error!(command = %event.command, "invocation carried no resolvable user id");
            return DispatchOutcome::MissingUser;
        };

        let command = self.table.read().await.get(&event.command).cloned();
        let Some(command) = command else {
            return DispatchOutcome::UnknownCommand;
        };
        let spec = command.spec();

        let invocation = Invocation {
            user_id,
            guild_id: event.guild_id,
            channel_id: event.channel_id,
            member_permissions: event.member_permissions,
            shard: event.shard,
            options: event.options,
            attachments: event.attachments,
            responder: event.responder,
        };

        // Access gate runs before the cooldown gate so a denied user does
        // not consume cooldown.
        let denied = (spec.dev_only && !self.config.discord.is_developer(user_id.0))
            || (spec.admin_only && !invocation.is_admin());
        if denied {
            debug!(command = %spec.name, user = %user_id, "access denied");
            self.notify(&invocation.responder, "You are not allowed to use this command.")
                .await;
            return DispatchOutcome::RejectedAccess;
        }

        let window = spec
            .cooldown
            .unwrap_or_else(|| self.config.dispatch.default_cooldown());
        match self
            .cooldowns
            .check_and_set(user_id, &spec.name, window, Instant::now())
        {
            CooldownDecision::Ready => {},
            CooldownDecision::Wait(remaining) => {
                let secs = remaining.as_secs().max(1);
                self.notify(
                    &invocation.responder,
                    &format!("Please wait {secs}s before using this command again."),
                )
                .await;
                return DispatchOutcome::RejectedCooldown;
            },
        }

        self.run_with_deadline(command, invocation).await
    }

    /// Race the run capability against its deadline. The run is spawned on
    /// its own task and deliberately not aborted on timeout: a late
    /// completion may attempt a response that fails once the response
    /// token's validity window has elapsed, and that failure stays silent.
    async fn run_with_deadline(
        &self,
        command: Arc<dyn Command>,
        invocation: Invocation,
    ) -> DispatchOutcome {
        let deadline = command
            .spec()
            .run_timeout
            .unwrap_or_else(|| self.config.dispatch.run_timeout());
        let name = command.spec().name.clone();

        let run_invocation = invocation.clone();
        let run_config = self.config.clone();
        let mut task =
            tokio::spawn(async move { command.run(&run_invocation, &run_config).await });

        match tokio::time::timeout(deadline, &mut task).await {
            Err(_elapsed) => {
                warn!(command = %name, ?deadline, "invocation exceeded its deadline");
                self.notify(
                    &invocation.responder,
                    "This command timed out. Try again later.",
                )
                .await;
                DispatchOutcome::TimedOut
            },
            Ok(Ok(Ok(()))) => DispatchOutcome::Completed,
            Ok(Ok(Err(e))) => {
                error!(command = %name, error = %e, "command execution failed");
                self.notify(&invocation.responder, "Something went wrong running this command.")
                    .await;
                DispatchOutcome::Errored
            },
            Ok(Err(join_err)) => {
                error!(command = %name, error = %join_err, "command task aborted");
                self.notify(&invocation.responder, "Something went wrong running this command.")
                    .await;
                DispatchOutcome::Errored
            },
        }
    }

    pub async fn handle_autocomplete(&self, event: AutocompleteEvent) -> AutocompleteOutcome {
        if self.draining.load(Ordering::SeqCst) {
            return AutocompleteOutcome::Draining;
        }

        let command = self.table.read().await.get(&event.command).cloned();
        let Some(command) = command else {
            return AutocompleteOutcome::Skipped;
        };
        if !command.supports_autocomplete() {
            return AutocompleteOutcome::Skipped;
        }
        let Some(user_id) = event.user else {
            return AutocompleteOutcome::Skipped;
        };

        let request = AutocompleteRequest {
            user_id,
            focused_option: event.focused_option,
            partial: event.partial,
            responder: event.responder.clone(),
        };

        match tokio::time::timeout(AUTOCOMPLETE_DEADLINE, command.autocomplete(&request)).await {
            Err(_elapsed) => {
                debug!(command = %event.command, "autocomplete exceeded its deadline");
                AutocompleteOutcome::TimedOut
            },
            Ok(Err(e)) => {
                debug!(command = %event.command, error = %e, "autocomplete failed");
                AutocompleteOutcome::Errored
            },
            Ok(Ok(mut choices)) => {
                choices.truncate(MAX_CHOICES);
                if let Err(e) = event.responder.suggest(choices).await {
                    debug!(command = %event.command, error = %e, "autocomplete response dropped");
                }
                AutocompleteOutcome::Suggested
            },
        }
    }

    /// Send an ephemeral notice. When the command already acknowledged the
    /// interaction (deferred, then failed), the initial response slot is
    /// spent and the notice goes out as an edit of the deferred response
    /// instead. A failure after that usually means the response token's
    /// validity window has elapsed; that stays a debug entry.
    async fn notify(&self, responder: &Arc<dyn Responder>, text: &str) {
        if let Err(respond_err) = responder.respond(Reply::ephemeral(text)).await
            && let Err(edit_err) = responder.edit(Reply::ephemeral(text)).await
        {
            debug!(error = %respond_err, edit_error = %edit_err, "notice response dropped");
        }
    }
}
