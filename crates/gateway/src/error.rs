//! Error taxonomy for startup, registration and shutdown.
//!
//! Per-invocation failures never surface here — the dispatcher converts
//! them into user-facing responses (see `dispatch::DispatchOutcome`).

use {std::time::Duration, thiserror::Error};

/// One shard that failed to come up.
#[derive(Debug)]
pub struct ShardFailure {
    pub shard: u32,
    /// Whether this was the leader shard (index 0). A leader failure means
    /// no usable dispatch.
    pub leader: bool,
    pub source: anyhow::Error,
}

/// Startup failure, aggregated across shards rather than fail-fast.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid shard count: {0}")]
    InvalidShardCount(u32),

    #[error("startup timed out after {0:?}")]
    Timeout(Duration),

    #[error("{} shard(s) failed to start: [{}]", failures.len(), shard_list(failures))]
    Shards { failures: Vec<ShardFailure> },
}

impl StartupError {
    /// Whether the leader shard is among the failures. The process entry
    /// point aborts on leader failure and continues degraded otherwise.
    pub fn leader_failed(&self) -> bool {
        match self {
            Self::Shards { failures } => failures.iter().any(|f| f.leader),
            Self::InvalidShardCount(_) | Self::Timeout(_) => true,
        }
    }
}

fn shard_list(failures: &[ShardFailure]) -> String {
    failures
        .iter()
        .map(|f| f.shard.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Registration reconcile failure. Logged and non-fatal to the process;
/// affected commands simply stay out of the live lookup table.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("command registration timed out after {0:?}")]
    Timeout(Duration),

    #[error("registration exhausted retries for: [{}]", failed.join(", "))]
    Failed { failed: Vec<String> },
}

/// One shutdown step that failed. Later steps still ran.
#[derive(Debug)]
pub struct StepFailure {
    pub step: String,
    pub source: anyhow::Error,
}

/// Aggregate shutdown failure. `stop()` always returns; the process exits
/// either way.
#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error("shutdown timed out after {0:?}")]
    Timeout(Duration),

    #[error("{} shutdown step(s) failed: [{}]", failures.len(), step_list(failures))]
    Steps { failures: Vec<StepFailure> },
}

fn step_list(failures: &[StepFailure]) -> String {
    failures
        .iter()
        .map(|f| f.step.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
