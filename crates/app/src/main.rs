//! `quiz` command-line front end.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use quiz_core::QuestionBank;
use services::{AppServices, ExplanationConfig, SyncReport};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod repl;

use commands::Action;

const DEFAULT_LOG_FILTER: &str = "quiz=info,services=info";

#[derive(Parser)]
#[command(name = "quiz", version, about = "Question-bank practice with a mistake book")]
struct Cli {
    /// `SQLite` database URL or file path
    #[arg(long = "db", env = "QUIZ_DB_URL", default_value = "sqlite://quiz.db", global = true)]
    db_url: String,

    /// Question bank JSON file
    #[arg(long, env = "QUIZ_BANK_PATH", default_value = "questions.json", global = true)]
    bank: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(flatten)]
    Action(Action),

    /// Interactive session over stdin
    Review,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("sqlite::memory:")
        || trimmed.starts_with("sqlite://")
        || trimmed.contains("mode=memory")
    {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Make sure the database file exists; the pool does not create it.
fn prepare_sqlite_file(db_url: &str) -> anyhow::Result<()> {
    if db_url.starts_with("sqlite::memory:") || db_url.contains("mode=memory") {
        return Ok(());
    }

    let Some(path) = db_url.strip_prefix("sqlite://") else {
        bail!("invalid --db value: {db_url}");
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("invalid --db value: {db_url}");
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("creating {}", path.display()))?;
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let bank = QuestionBank::from_path(&cli.bank)
        .with_context(|| format!("loading question bank {}", cli.bank.display()))?;

    let db_url = normalize_sqlite_url(&cli.db_url);
    prepare_sqlite_file(&db_url)?;

    let config = ExplanationConfig::from_env();
    if config.is_none() {
        info!("QUIZ_AI_API_KEY not set, AI explanations are disabled");
    }
    let services = AppServices::new_sqlite(&db_url, &bank, config)
        .await
        .context("starting quiz services")?;

    match services.sync_report() {
        SyncReport::Loaded { inserted } => info!(inserted, "question store initialized"),
        SyncReport::Reconciled { updated, missing } => {
            if missing > 0 {
                warn!(missing, "bank has questions that are not in the store");
            }
            info!(updated, "question store reconciled");
        }
    }

    match cli.command {
        Command::Action(action) => {
            let output = commands::execute(&services, action).await?;
            println!("{output}");
            Ok(())
        }
        Command::Review => repl::run(&services).await,
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        process::exit(2);
    }
}
