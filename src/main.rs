//! Forge-Scout main entry point
//!
//! This is the command-line interface for the Forge-Scout domain classifier.

use anyhow::{Context, Result};
use clap::Parser;
use forge_scout::config::{load_config_with_hash, validate, Config};
use forge_scout::crawler::run_scout;
use forge_scout::detect::{Detector, Vocabulary};
use forge_scout::storage::{open_storage, RunCounters, RunStatus, Storage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Forge-Scout: manufacturing capability detection for domain backlogs
///
/// Forge-Scout pulls pending domains from its result database, samples each
/// domain's homepage and a bounded set of internal pages, and records which
/// manufacturing capabilities, equipment brands and materials it found.
#[derive(Parser, Debug)]
#[command(name = "forge-scout")]
#[command(version = "1.0.0")]
#[command(about = "Manufacturing capability detection for domain backlogs", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and vocabulary and print the effective settings
    #[arg(long, conflicts_with_all = ["stats", "import"])]
    dry_run: bool,

    /// Show backlog statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "import"])]
    stats: bool,

    /// Seed the backlog from a newline-delimited domain list and exit
    #[arg(long, value_name = "FILE", conflicts_with_all = ["dry_run", "stats"])]
    import: Option<PathBuf>,

    /// Override [scheduler] batch-size
    #[arg(long)]
    batch_size: Option<usize>,

    /// Override [scheduler] concurrency
    #[arg(long)]
    concurrency: Option<usize>,

    /// Keep polling for new pending domains instead of exiting
    #[arg(long)]
    continuous: bool,

    /// Override [scheduler] check-interval-secs
    #[arg(long)]
    check_interval_secs: Option<u64>,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(batch_size) = self.batch_size {
            config.scheduler.batch_size = batch_size;
        }
        if let Some(concurrency) = self.concurrency {
            config.scheduler.concurrency = concurrency;
        }
        if self.continuous {
            config.scheduler.continuous = true;
        }
        if let Some(secs) = self.check_interval_secs {
            config.scheduler.check_interval_secs = secs;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    cli.apply_overrides(&mut config);
    validate(&config).context("Invalid command-line override")?;

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else if let Some(path) = &cli.import {
        handle_import(&config, path)
    } else {
        handle_run(&config, &config_hash).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("forge_scout=info,warn"),
            1 => EnvFilter::new("forge_scout=debug,info"),
            2 => EnvFilter::new("forge_scout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn load_detector(config: &Config) -> Result<(Vocabulary, Detector)> {
    let path = config.vocabulary.path.as_deref().map(Path::new);
    let vocabulary = Vocabulary::load(path).context("Failed to load vocabulary")?;
    let detector = Detector::new(&vocabulary).context("Failed to compile vocabulary")?;
    Ok((vocabulary, detector))
}

/// Handles the --dry-run mode: validates config and vocabulary
fn handle_dry_run(config: &Config) -> Result<()> {
    let (vocabulary, _) = load_detector(config)?;

    println!("=== Forge-Scout Dry Run ===\n");

    println!("Scheduler:");
    println!("  Batch size: {}", config.scheduler.batch_size);
    println!("  Concurrency: {}", config.scheduler.concurrency);
    println!("  Batch cooldown: {}ms", config.scheduler.batch_cooldown_ms);
    if config.scheduler.continuous {
        println!(
            "  Continuous, re-polling every {}s",
            config.scheduler.check_interval_secs
        );
    }

    println!("\nDomain Crawl:");
    println!("  Max pages per domain: {}", config.crawl.max_pages_per_domain);
    println!("  Time budget: {}ms", config.crawl.domain_time_budget_ms);
    println!(
        "  Max consecutive failures: {}",
        config.crawl.max_consecutive_failures
    );
    println!("  Track e-mails: {}", config.crawl.track_emails);

    println!("\nFetch:");
    println!(
        "  Timeouts: connect {}ms, request {}ms, retry {}ms",
        config.fetch.connect_timeout_ms,
        config.fetch.request_timeout_ms,
        config.fetch.retry_timeout_ms
    );
    println!("  User agents: {}", config.fetch.user_agents.len());

    println!("\nVocabulary:");
    match &config.vocabulary.path {
        Some(path) => println!("  Source: {}", path),
        None => println!("  Source: embedded"),
    }
    println!("  Capability terms: {}", vocabulary.terms.len());
    println!("  Brands: {}", vocabulary.brands.len());
    println!("  Plastics: {}", vocabulary.plastics.len());
    println!("  Metals: {}", vocabulary.metals.len());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<()> {
    use forge_scout::output::{load_statistics, print_statistics};

    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --import mode: seeds the backlog
fn handle_import(config: &Config, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read domain list {}", path.display()))?;
    let domains: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();

    let mut storage = open_storage(Path::new(&config.output.database_path))?;
    let inserted = storage.import_domains(&domains)?;

    println!(
        "✓ Imported {} new domains ({} lines, {} already present)",
        inserted,
        domains.len(),
        domains.len() - inserted
    );

    Ok(())
}

/// Handles the main scouting run
async fn handle_run(config: &Config, config_hash: &str) -> Result<()> {
    let (vocabulary, detector) = load_detector(config)?;
    tracing::info!(
        "Vocabulary: {} terms, {} brands, {} plastics, {} metals",
        vocabulary.terms.len(),
        vocabulary.brands.len(),
        vocabulary.plastics.len(),
        vocabulary.metals.len()
    );

    tokio::select! {
        result = run_scout(config, Arc::new(detector), config_hash) => {
            match result {
                Ok(_) => {
                    tracing::info!("Run completed successfully");
                    Ok(())
                }
                Err(e) => {
                    tracing::error!("Run failed: {}", e);
                    Err(e.into())
                }
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted; pending domains will be picked up by the next run");
            mark_interrupted(config);
            Ok(())
        }
    }
}

/// Closes the run left open by an interrupt
fn mark_interrupted(config: &Config) {
    let result = open_storage(Path::new(&config.output.database_path))
        .map_err(anyhow::Error::from)
        .and_then(|mut storage| {
            if let Some(run) = storage.get_latest_run()? {
                if run.status == RunStatus::Running {
                    storage.finish_run(run.id, RunStatus::Interrupted, &RunCounters::default())?;
                }
            }
            Ok(())
        });

    if let Err(e) = result {
        tracing::warn!("Failed to mark run as interrupted: {}", e);
    }
}
