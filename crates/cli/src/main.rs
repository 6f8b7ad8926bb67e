use {
    anyhow::Context as _,
    clap::{Parser, Subcommand},
    herald_commands::CommandRegistry,
    herald_config::{HeraldConfig, discover_and_load, load_config},
    herald_discord::{RestCatalog, SerenityConnector},
    herald_gateway::{
        Dispatcher, EventRouter, GuildStore, GuildTracker, Orchestrator, RegistrationManager,
    },
    herald_store::SqliteGuildStore,
    serenity::{http::HttpBuilder, model::id::ApplicationId},
    std::{
        path::{Path, PathBuf},
        sync::Arc,
        time::{Duration, Instant},
    },
    tracing::{error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

/// Bound on the initial store open; a wedged database file should fail
/// startup, not hang it.
const STORE_OPEN_DEADLINE: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "herald", about = "Herald — Discord bot lifecycle manager")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Explicit config file; skips the discovery search.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the gateway and serve until SIGINT/SIGTERM.
    Run,
    /// Load and validate the configuration, then print it redacted.
    CheckConfig,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    match cli.command {
        Commands::Run => run(cli.config).await,
        Commands::CheckConfig => check_config(cli.config),
    }
}

fn load(path: Option<PathBuf>) -> anyhow::Result<(HeraldConfig, PathBuf)> {
    let (config, path) = match path {
        Some(path) => (load_config(&path)?, path),
        None => discover_and_load()?,
    };
    config.validate()?;
    Ok((config, path))
}

fn check_config(path: Option<PathBuf>) -> anyhow::Result<()> {
    let (config, path) = load(path)?;
    println!("config ok: {}", path.display());
    println!("{}", redacted_summary(&config));
    Ok(())
}

async fn run(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let (config, path) = load(config_path)?;
    let config = Arc::new(config);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %path.display(),
        "herald starting"
    );

    let store = tokio::time::timeout(
        STORE_OPEN_DEADLINE,
        SqliteGuildStore::open(Path::new(&config.store.path)),
    )
    .await
    .context("guild store open timed out")??;
    let store: Arc<dyn GuildStore> = Arc::new(store);

    let registry = Arc::new(CommandRegistry::builtin(Instant::now())?);
    let dispatcher = Arc::new(Dispatcher::new(config.clone()));
    let guilds = Arc::new(GuildTracker::new(store.clone()));
    let router = Arc::new(EventRouter::new(dispatcher.clone(), guilds));

    let http = Arc::new(
        HttpBuilder::new(&config.discord.token)
            .application_id(ApplicationId::new(config.discord.application_id))
            .build(),
    );
    let catalog = Arc::new(RestCatalog::new(http, config.discord.guild_id));
    let registration = RegistrationManager::new(catalog);
    let connector = Arc::new(SerenityConnector::new(
        &config.discord.token,
        &config.discord.status,
        router,
    ));

    let orchestrator = Arc::new(Orchestrator::new(
        connector,
        registration,
        registry,
        dispatcher,
        store,
        config.clone(),
    ));

    match orchestrator.start().await {
        Ok(()) => info!("startup complete"),
        Err(err) if err.leader_failed() => {
            error!(error = %err, "fatal startup failure");
            return Err(err.into());
        },
        Err(err) => warn!(error = %err, "started degraded, some shards are down"),
    }

    wait_for_signal().await?;
    info!("shutdown signal received");

    if let Err(err) = orchestrator.stop().await {
        // Degraded teardown still exits 0: everything that could be
        // released was, and the failures are on record.
        error!(error = %err, "shutdown finished with errors");
    } else {
        info!("shutdown complete");
    }
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() -> anyhow::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut term = signal(SignalKind::terminate()).context("install SIGTERM handler")?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.context("install SIGINT handler")?,
        _ = term.recv() => {},
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_signal() -> anyhow::Result<()> {
    tokio::signal::ctrl_c().await.context("install ctrl-c handler")
}

fn redacted_summary(config: &HeraldConfig) -> String {
    let scope = match config.discord.guild_id {
        Some(guild) => format!("guild {guild}"),
        None => "global".to_string(),
    };
    let sharding = if config.discord.sharding.enabled {
        format!("{} shards", config.discord.sharding.total_shards)
    } else {
        "single session".to_string()
    };
    format!(
        "application_id: {}\ntoken: <redacted>\ncommand scope: {scope}\nsharding: {sharding}\n\
         developers: {}\nstatus: {}\ncooldown: {}s, run timeout: {}s\nstore: {}",
        config.discord.application_id,
        config.discord.developers.len(),
        config.discord.status,
        config.dispatch.default_cooldown_secs,
        config.dispatch.run_timeout_secs,
        config.store.path,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_never_contains_the_token() {
        let mut config = HeraldConfig::default();
        config.discord.token = "very-secret-token".into();
        config.discord.application_id = 99;
        config.discord.guild_id = Some(1234);

        let summary = redacted_summary(&config);
        assert!(!summary.contains("very-secret-token"));
        assert!(summary.contains("guild 1234"));
        assert!(summary.contains("application_id: 99"));
    }

    #[test]
    fn cli_parses_run_with_overrides() {
        let cli = Cli::parse_from(["herald", "run", "--log-level", "debug", "--json-logs"]);
        assert!(matches!(cli.command, Commands::Run));
        assert_eq!(cli.log_level, "debug");
        assert!(cli.json_logs);
    }
}
