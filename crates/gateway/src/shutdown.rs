//! Shutdown coordinator: ordered, best-effort teardown in bounded time.
//!
//! Steps never short-circuit each other; every step's errors are
//! collected so the aggregate names everything that failed.

use {
    std::{sync::Arc, time::Duration},
    tokio::task::JoinSet,
    tracing::{info, warn},
};

use crate::{
    dispatch::Dispatcher,
    error::{ShutdownError, StepFailure},
    orchestrator::ShardSession,
    ports::GuildStore,
    registration::RegistrationManager,
};

/// Ceiling for the whole teardown sequence.
pub const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(25);

/// Run the full teardown: drain dispatch, deregister remote commands,
/// close every session concurrently, close the store.
///
/// Always returns within `deadline`; on expiry the remaining steps are
/// abandoned and a timeout reported, but control goes back to the caller.
pub async fn coordinate(
    dispatcher: &Dispatcher,
    registration: &RegistrationManager,
    sessions: Vec<ShardSession>,
    store: &Arc<dyn GuildStore>,
    deadline: Duration,
) -> Result<(), ShutdownError> {
    match tokio::time::timeout(
        deadline,
        run_steps(dispatcher, registration, sessions, store),
    )
    .await
    {
        Err(_elapsed) => Err(ShutdownError::Timeout(deadline)),
        Ok(result) => result,
    }
}

async fn run_steps(
    dispatcher: &Dispatcher,
    registration: &RegistrationManager,
    sessions: Vec<ShardSession>,
    store: &Arc<dyn GuildStore>,
) -> Result<(), ShutdownError> {
    let mut failures: Vec<StepFailure> = Vec::new();

    // (a) stop admitting new dispatch; in-flight invocations may finish.
    dispatcher.begin_drain();

    // (b) best-effort deregistration of remote commands.
    match registration.deregister_all().await {
        Ok(count) => info!(count, "deregistered remote commands"),
        Err(e) => {
            warn!(error = %e, "command deregistration failed");
            failures.push(StepFailure {
                step: "deregister commands".to_string(),
                source: e,
            });
        },
    }

    // (c) close every session concurrently.
    let mut closers = JoinSet::new();
    for session in sessions {
        closers.spawn(async move { (session.shard, session.handle.close().await) });
    }
    while let Some(joined) = closers.join_next().await {
        match joined {
            Ok((_, Ok(()))) => {},
            Ok((shard, Err(e))) => {
                warn!(shard, error = %e, "session close failed");
                failures.push(StepFailure {
                    step: format!("close shard {shard}"),
                    source: e,
                });
            },
            Err(join_err) => failures.push(StepFailure {
                step: "close session task".to_string(),
                source: join_err.into(),
            }),
        }
    }

    // (d) close the persistent store last.
    if let Err(e) = store.close().await {
        warn!(error = %e, "store close failed");
        failures.push(StepFailure {
            step: "close store".to_string(),
            source: e,
        });
    }

    if failures.is_empty() {
        info!("shutdown completed cleanly");
        Ok(())
    } else {
        Err(ShutdownError::Steps { failures })
    }
}
