//! mcs-strategy command-line entry point
//!
//! Runs one pipeline operation against the configured database and prints
//! the result as JSON on stdout. Logs go to stderr (or `[logging] file`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mcs_common::config::{resolve_database_path, TomlConfig};
use mcs_common::db::init_database;
use mcs_strategy::StrategyContext;
use serde::Serialize;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(name = "mcs-strategy")]
#[clap(about = "Onboarding data integration and content strategy pipeline")]
#[clap(version)]
struct Args {
    /// Configuration file (overrides MCS_CONFIG)
    #[clap(long, value_name = "FILE")]
    config: Option<String>,

    /// Database file (overrides MCS_DATABASE_PATH and the config file)
    #[clap(long, value_name = "FILE")]
    database: Option<String>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Integrate and score a user's onboarding data
    Process { user_id: i64 },

    /// Map a user's onboarding data onto strategy fields
    Transform { user_id: i64 },

    /// Create a content strategy for a user
    CreateStrategy {
        user_id: i64,

        /// Strategy name
        #[clap(long)]
        name: Option<String>,
    },

    /// Show cache statistics
    CacheStats,
}

fn init_logging(config: &TomlConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    match &config.logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (config, config_source) = TomlConfig::load_with_source(args.config.as_deref());
    init_logging(&config)?;
    config_source.log();

    let db_path = resolve_database_path(args.database.as_deref(), &config);
    info!("Database: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let ctx = StrategyContext::connect(pool, &config).await?;
    info!("Cache backend: {}", ctx.cache.backend_name());

    match args.command {
        Command::Process { user_id } => {
            let result = ctx.integration.process(user_id).await;
            print_json(&result)?;
        }
        Command::Transform { user_id } => {
            let result = ctx.orchestrator.transform_for_user(user_id).await;
            print_json(&result)?;
        }
        Command::CreateStrategy { user_id, name } => {
            let strategy = ctx.orchestrator.create_strategy(user_id, name.as_deref()).await?;
            print_json(&strategy)?;
        }
        Command::CacheStats => {
            print_json(&ctx.cache.stats(None).await)?;
        }
    }

    Ok(())
}
