//! Registration manager: reconciles the command registry against the
//! remote catalog (delete-then-create, bounded concurrency, retry with
//! linear backoff).

use {
    futures::StreamExt,
    herald_commands::{Command, CommandRegistry},
    std::{
        sync::{Arc, Mutex},
        time::Duration,
    },
    tracing::{info, warn},
};

use crate::{
    dispatch::Dispatcher,
    error::RegistrationError,
    ports::{CommandCatalog, RemoteCommand},
};

/// Retry and pacing knobs. Defaults respect the remote rate limits; tests
/// shrink them.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    /// Linear backoff unit for deletions (unit × attempt).
    pub delete_backoff: Duration,
    /// Linear backoff unit for creations (unit × attempt).
    pub create_backoff: Duration,
    /// Inter-call delay per creation worker.
    pub worker_delay: Duration,
    /// Ceiling for one whole reconcile pass.
    pub deadline: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delete_backoff: Duration::from_millis(200),
            create_backoff: Duration::from_millis(500),
            worker_delay: Duration::from_millis(150),
            deadline: Duration::from_secs(120),
        }
    }
}

/// Width of the creation worker pool.
const MAX_WORKERS: usize = 5;

pub struct RegistrationManager {
    catalog: Arc<dyn CommandCatalog>,
    policy: RetryPolicy,
}

impl RegistrationManager {
    pub fn new(catalog: Arc<dyn CommandCatalog>) -> Self {
        Self {
            catalog,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(catalog: Arc<dyn CommandCatalog>, policy: RetryPolicy) -> Self {
        Self { catalog, policy }
    }

    /// Synchronize the registry with the remote catalog, installing each
    /// command into `dispatcher`'s live table only after the remote
    /// confirms its creation.
    ///
    /// Failures are per-command and aggregated; a failed command stays out
    /// of the live table but never aborts the pass.
    pub async fn reconcile(
        &self,
        registry: &CommandRegistry,
        dispatcher: &Dispatcher,
    ) -> Result<(), RegistrationError> {
        let deadline = self.policy.deadline;
        match tokio::time::timeout(deadline, self.reconcile_inner(registry, dispatcher)).await {
            Err(_elapsed) => Err(RegistrationError::Timeout(deadline)),
            Ok(result) => result,
        }
    }

    async fn reconcile_inner(
        &self,
        registry: &CommandRegistry,
        dispatcher: &Dispatcher,
    ) -> Result<(), RegistrationError> {
        self.delete_existing().await;

        let count = registry.len();
        if count == 0 {
            return Ok(());
        }
        let workers = MAX_WORKERS.min(count);
        info!(commands = count, workers, "registering commands");

        let failed: Mutex<Vec<String>> = Mutex::new(Vec::new());
        futures::stream::iter(registry.iter().cloned())
            .for_each_concurrent(workers, |command| async {
                if self.create_with_retry(&command).await {
                    dispatcher.install(command).await;
                } else {
                    let name = command.spec().name.clone();
                    failed.lock().unwrap_or_else(|p| p.into_inner()).push(name);
                }
                // Pace each worker so the pool stays under the remote
                // rate limit.
                tokio::time::sleep(self.policy.worker_delay).await;
            })
            .await;

        let failed = failed.into_inner().unwrap_or_else(|p| p.into_inner());
        if failed.is_empty() {
            Ok(())
        } else {
            Err(RegistrationError::Failed { failed })
        }
    }

    /// Phase 1: fetch and delete every existing remote command. All
    /// failures here are collected as warnings; stale remote entries are
    /// untidy, not fatal.
    async fn delete_existing(&self) {
        let existing = match self.catalog.list().await {
            Ok(existing) => existing,
            Err(e) => {
                warn!(error = %e, "failed to list remote commands, skipping deletion pass");
                return;
            },
        };

        for remote in existing {
            if !self.delete_with_retry(&remote).await {
                warn!(command = %remote.name, "failed to delete remote command");
            }
        }
    }

    async fn delete_with_retry(&self, remote: &RemoteCommand) -> bool {
        for attempt in 1..=self.policy.attempts {
            match self.catalog.delete(&remote.id).await {
                Ok(()) => return true,
                Err(e) => {
                    warn!(command = %remote.name, attempt, error = %e, "delete attempt failed");
                    tokio::time::sleep(self.policy.delete_backoff * attempt).await;
                },
            }
        }
        false
    }

    async fn create_with_retry(&self, command: &Arc<dyn Command>) -> bool {
        let spec = command.spec();
        for attempt in 1..=self.policy.attempts {
            match self.catalog.create(spec).await {
                Ok(id) => {
                    info!(command = %spec.name, remote_id = %id, "command registered");
                    return true;
                },
                Err(e) => {
                    warn!(command = %spec.name, attempt, error = %e, "create attempt failed");
                    tokio::time::sleep(self.policy.create_backoff * attempt).await;
                },
            }
        }
        false
    }

    /// Best-effort removal of every remote command, used at shutdown.
    /// Returns how many were deleted.
    pub async fn deregister_all(&self) -> anyhow::Result<usize> {
        let existing = self.catalog.list().await?;
        let total = existing.len();
        let mut deleted = 0usize;
        for remote in existing {
            if self.delete_with_retry(&remote).await {
                deleted += 1;
            }
        }
        if deleted < total {
            anyhow::bail!("deregistered {deleted} of {total} remote commands");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::testutil::{FakeCatalog, FakeCommand, test_config},
    };

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            attempts: 3,
            delete_backoff: Duration::from_millis(1),
            create_backoff: Duration::from_millis(1),
            worker_delay: Duration::from_millis(1),
            deadline: Duration::from_secs(5),
        }
    }

    fn registry_of(names: &[&str]) -> CommandRegistry {
        CommandRegistry::from_commands(
            names
                .iter()
                .map(|n| Arc::new(FakeCommand::new(n)) as Arc<dyn Command>)
                .collect(),
        )
        .unwrap()
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(test_config()))
    }

    #[tokio::test]
    async fn reconcile_deletes_then_creates() {
        let catalog = Arc::new(FakeCatalog::new().with_existing(&["stale-a", "stale-b"]));
        let manager = RegistrationManager::with_policy(catalog.clone(), fast_policy());
        let dispatcher = dispatcher();

        manager
            .reconcile(&registry_of(&["ping", "help"]), &dispatcher)
            .await
            .unwrap();

        assert_eq!(catalog.deleted_ids().len(), 2);
        let mut created = catalog.created_names();
        created.sort();
        assert_eq!(created, vec!["help", "ping"]);
        assert_eq!(dispatcher.installed().await, vec!["help", "ping"]);
    }

    #[tokio::test]
    async fn table_contains_only_confirmed_commands() {
        let mut catalog = FakeCatalog::new();
        catalog.fail_create.insert("broken".to_string());
        let manager = RegistrationManager::with_policy(Arc::new(catalog), fast_policy());
        let dispatcher = dispatcher();

        let err = manager
            .reconcile(&registry_of(&["ping", "broken"]), &dispatcher)
            .await
            .unwrap_err();

        assert!(matches!(
            &err,
            RegistrationError::Failed { failed } if failed == &vec!["broken".to_string()]
        ));
        assert_eq!(dispatcher.installed().await, vec!["ping"]);
    }

    #[tokio::test]
    async fn transient_create_failures_are_retried() {
        let catalog = Arc::new(FakeCatalog::new().flaky("ping", 2));
        let manager = RegistrationManager::with_policy(catalog.clone(), fast_policy());
        let dispatcher = dispatcher();

        manager
            .reconcile(&registry_of(&["ping"]), &dispatcher)
            .await
            .unwrap();
        assert_eq!(dispatcher.installed().await, vec!["ping"]);
    }

    #[tokio::test]
    async fn deletion_failures_do_not_abort_the_pass() {
        let mut catalog = FakeCatalog::new().with_existing(&["stuck"]);
        catalog.fail_delete.insert("stuck".to_string());
        let manager = RegistrationManager::with_policy(Arc::new(catalog), fast_policy());
        let dispatcher = dispatcher();

        manager
            .reconcile(&registry_of(&["ping"]), &dispatcher)
            .await
            .unwrap();
        assert_eq!(dispatcher.installed().await, vec!["ping"]);
    }

    #[tokio::test]
    async fn reconcile_respects_overall_deadline() {
        let mut policy = fast_policy();
        policy.deadline = Duration::from_millis(20);
        policy.worker_delay = Duration::from_millis(200);
        let manager = RegistrationManager::with_policy(Arc::new(FakeCatalog::new()), policy);
        let dispatcher = dispatcher();

        let err = manager
            .reconcile(&registry_of(&["ping"]), &dispatcher)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::Timeout(_)));
    }

    #[tokio::test]
    async fn deregister_all_removes_everything() {
        let catalog = Arc::new(FakeCatalog::new().with_existing(&["a", "b", "c"]));
        let manager = RegistrationManager::with_policy(catalog.clone(), fast_policy());
        assert_eq!(manager.deregister_all().await.unwrap(), 3);
        assert!(catalog.created_names().is_empty());
    }

    #[tokio::test]
    async fn empty_registry_reconciles_cleanly() {
        let manager =
            RegistrationManager::with_policy(Arc::new(FakeCatalog::new()), fast_policy());
        let registry = CommandRegistry::from_commands(Vec::new()).unwrap();
        manager.reconcile(&registry, &dispatcher()).await.unwrap();
    }
}
