use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use forge_indexer::publish::JsonLinesPublisher;
use forge_indexer::runner::shutdown_on_ctrl_c;
use forge_indexer::{Config, CursorAdvancer, GitLabClient, RunOptions, Runner, StateDb};

#[derive(Parser)]
#[command(name = "forge-indexer")]
#[command(about = "Incrementally discover public GitLab repositories for indexing")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl continuously, printing accepted repositories as JSON lines
    Run {
        /// Stop after this many accepted repositories
        #[arg(long)]
        limit: Option<u64>,
    },

    /// Fetch the single next accepted repository after a cursor
    Next {
        /// Last accepted repository id (omit to start from the beginning)
        #[arg(long)]
        after: Option<String>,
    },

    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_with_env(cli.config.as_deref())?;

    init_logging(cli.verbose, &config.logging.level)?;
    info!("Starting forge-indexer v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Run { limit } => cmd_run(limit, &config).await,
        Commands::Next { after } => cmd_next(after, &config).await,
        Commands::Config => cmd_config(&config),
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: bool, level: &str) -> Result<()> {
    let default_level = if verbose { "debug" } else { level };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Logs go to stderr so stdout carries only crawl results
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

fn build_crawler(config: &Config) -> Result<CursorAdvancer<GitLabClient>> {
    config.validate()?;
    let client = GitLabClient::new(&config.gitlab)?;
    info!("Crawling {}", client.base_url());
    Ok(CursorAdvancer::new(client, config.filters.clone()))
}

/// Run the host loop until Ctrl+C or the limit
async fn cmd_run(limit: Option<u64>, config: &Config) -> Result<()> {
    let crawler = build_crawler(config)?;
    let store = StateDb::open_at(Path::new(&config.runner.state_db), &config.runner.indexer_name)
        .context("Failed to open state database")?;
    let options = RunOptions::from_config(&config.runner, limit);

    let shutdown = shutdown_on_ctrl_c();
    let mut runner = Runner::new(crawler, store, JsonLinesPublisher::stdout(), options);
    let summary = runner.run(shutdown.subscribe()).await?;

    eprintln!(
        "Accepted {} repositories (last id: {})",
        summary.accepted,
        summary.last_cursor.as_deref().unwrap_or("none")
    );
    Ok(())
}

/// Perform a single crawl call
async fn cmd_next(after: Option<String>, config: &Config) -> Result<()> {
    let crawler = build_crawler(config)?;

    match crawler.advance(after.as_deref(), crawler.filters()).await? {
        Some(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        None => {
            eprintln!("No more repositories after {}", after.as_deref().unwrap_or("the start"));
        }
    }

    Ok(())
}

/// Print the configuration with secrets removed
fn cmd_config(config: &Config) -> Result<()> {
    let yaml = serde_yaml::to_string(&config.redacted()).context("Failed to serialize configuration")?;
    print!("{}", yaml);
    Ok(())
}
