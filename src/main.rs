use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cache_coordinator::{Coordinator, RefreshPurpose};
use mailnav_cli::{build_fixture_site, AppConfig, Fixture};
use mailnav_core_types::{PracticeId, SettingTab};
use message_router::MessageRouter;
use practice_cache::{FileCacheStore, PracticeCache};

#[derive(Parser, Debug)]
#[command(name = "mailnav", version, about = "Practice cache and navigation service")]
struct Cli {
    /// Path to a configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON fixture describing the admin site
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Shortcut for --log-level debug
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Force a full listing scrape and persist the result
    Refresh,
    /// Resolve free text or an identifier to a practice identifier
    Resolve(ResolveArgs),
    /// Show the cached record for one practice
    Status(StatusArgs),
    /// Fetch (or read back) a practice's secondary code
    Secondary(StatusArgs),
    /// Find the practice carrying a secondary code
    Search(SearchArgs),
    /// Dump the practice cache as JSON
    Cache,
    /// Open a practice's settings page on a chosen tab
    Open(OpenArgs),
    /// Serve line-delimited JSON requests over stdio
    Serve,
}

#[derive(Args, Debug)]
struct ResolveArgs {
    /// Identifier, display name, cache key or a name fragment
    query: String,
}

#[derive(Args, Debug)]
struct StatusArgs {
    /// Practice identifier, e.g. A12345
    identifier: String,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Exact secondary code
    code: String,
}

#[derive(Args, Debug)]
struct OpenArgs {
    /// Identifier, display name, cache key or a name fragment
    input: String,
    /// Settings tab to land on
    #[arg(long, default_value = "general")]
    tab: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.debug)?;
    info!("Starting mailnav v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load(cli.config.as_deref())?;
    let fixture = match &cli.fixture {
        Some(path) => Fixture::from_path(path)?,
        None => Fixture::default(),
    };
    let coordinator = build_coordinator(&config, &fixture)?;

    let result = match cli.command {
        Commands::Refresh => cmd_refresh(&coordinator).await,
        Commands::Resolve(args) => cmd_resolve(args, &coordinator).await,
        Commands::Status(args) => cmd_status(args, &coordinator).await,
        Commands::Secondary(args) => cmd_secondary(args, &coordinator).await,
        Commands::Search(args) => cmd_search(args, &coordinator).await,
        Commands::Cache => cmd_cache(&coordinator).await,
        Commands::Open(args) => cmd_open(args, &coordinator).await,
        Commands::Serve => cmd_serve(&coordinator).await,
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Command failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_logging(level: &str, debug: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}

fn build_coordinator(config: &AppConfig, fixture: &Fixture) -> Result<Arc<Coordinator>> {
    let cache_path = config.cache_file_or_default()?;
    if let Some(parent) = cache_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let site = build_fixture_site(fixture);
    Ok(Coordinator::new(
        Arc::new(PracticeCache::new(config.cache_policy())),
        Arc::new(FileCacheStore::new(cache_path)),
        site.clone(),
        site,
        config.coordinator_policy(),
    ))
}

async fn cmd_refresh(coordinator: &Arc<Coordinator>) -> Result<()> {
    let count = coordinator.refresh(RefreshPurpose::Manual).await?;
    println!("{count} practices cached");
    Ok(())
}

async fn cmd_resolve(args: ResolveArgs, coordinator: &Arc<Coordinator>) -> Result<()> {
    let identifier = coordinator
        .resolve_identifier(&args.query)
        .await
        .map_err(|err| anyhow!(err.user_message()))?;
    println!("{identifier}");
    Ok(())
}

async fn cmd_status(args: StatusArgs, coordinator: &Arc<Coordinator>) -> Result<()> {
    let identifier = parse_identifier(&args.identifier)?;
    let record = coordinator
        .status(&identifier)
        .await
        .map_err(|err| anyhow!(err.user_message()))?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

async fn cmd_secondary(args: StatusArgs, coordinator: &Arc<Coordinator>) -> Result<()> {
    let identifier = parse_identifier(&args.identifier)?;
    let code = coordinator
        .resolve_secondary_code(&identifier)
        .await
        .map_err(|err| anyhow!(err.user_message()))?;
    println!("{}", code.wire());
    Ok(())
}

async fn cmd_search(args: SearchArgs, coordinator: &Arc<Coordinator>) -> Result<()> {
    let record = coordinator
        .search_by_secondary_code(&args.code)
        .await
        .map_err(|err| anyhow!(err.user_message()))?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

async fn cmd_cache(coordinator: &Arc<Coordinator>) -> Result<()> {
    let snapshot = coordinator.practice_cache_snapshot().await;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

async fn cmd_open(args: OpenArgs, coordinator: &Arc<Coordinator>) -> Result<()> {
    let tab = parse_tab(&args.tab)?;
    coordinator
        .open_practice(&args.input, tab)
        .await
        .map_err(|err| anyhow!(err.user_message()))?;
    println!("opened {} on the {} tab", args.input, args.tab);
    Ok(())
}

/// One JSON request per line on stdin, one JSON response per line on
/// stdout. The periodic refresh task runs for the lifetime of the loop.
async fn cmd_serve(coordinator: &Arc<Coordinator>) -> Result<()> {
    let router = MessageRouter::new(Arc::clone(coordinator));
    let refresh_task = coordinator.spawn_periodic_refresh();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let request = serde_json::from_str(&line)
            .unwrap_or_else(|_| serde_json::Value::String(line.clone()));
        let response = router.handle(request).await;
        println!("{response}");
    }

    refresh_task.abort();
    Ok(())
}

fn parse_identifier(raw: &str) -> Result<PracticeId> {
    PracticeId::parse(raw)
        .ok_or_else(|| anyhow!("{raw} is not a practice identifier (expected e.g. A12345)"))
}

fn parse_tab(raw: &str) -> Result<SettingTab> {
    match raw.to_ascii_lowercase().as_str() {
        "general" => Ok(SettingTab::General),
        "users" => Ok(SettingTab::Users),
        "documents" => Ok(SettingTab::Documents),
        "integrations" => Ok(SettingTab::Integrations),
        "billing" => Ok(SettingTab::Billing),
        other => Err(anyhow!(
            "unknown tab {other}; expected general, users, documents, integrations or billing"
        )),
    }
}
