//! Site-Harvest main entry point
//!
//! This is the command-line interface for the Site-Harvest profile harvester.

use anyhow::Context;
use clap::Parser;
use site_harvest::config::{load_config_with_hash, Config};
use site_harvest::harvest::{run_harvest, HarvestPlan};
use site_harvest::input::load_identifiers;
use site_harvest::output::{print_statistics, print_summary, StoreStatistics};
use site_harvest::storage::{open_store, CsvRecordStore, RecordStore};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Site-Harvest: a resumable, quota-aware profile harvester
///
/// Site-Harvest fetches one profile page per identifier, extracts the
/// company website from it, and keeps an append-only record store so an
/// interrupted run picks up where it stopped.
#[derive(Parser, Debug)]
#[command(name = "site-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A resumable, quota-aware profile harvester", long_about = None)]
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

    /// Validate config and show what would be fetched without fetching
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics of the record store and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_harvest(&config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_harvest=info,warn"),
            1 => EnvFilter::new("site_harvest=debug,info"),
            2 => EnvFilter::new("site_harvest=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows the pending work
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Site-Harvest Dry Run ===\n");

    println!("Source:");
    println!("  URL template: {}", config.source.url_template);
    println!("  Lowercase identifier: {}", config.source.lowercase_identifier);
    println!("  Timeout: {}s", config.source.timeout_secs);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nRate Limits:");
    println!("  Per minute: {}", config.rate_limit.per_minute);
    println!("  Per hour: {}", config.rate_limit.per_hour);
    println!("  Per day: {}", config.rate_limit.per_day);
    println!(
        "  Pause between identifiers: {}ms + up to {}ms jitter",
        config.run.min_request_interval_ms, config.run.request_jitter_ms
    );

    println!("\nRetry:");
    println!("  Max attempts: {}", config.retry.max_attempts);
    println!(
        "  Backoff: {}ms doubling up to {}ms",
        config.retry.initial_backoff_ms, config.retry.max_backoff_ms
    );

    println!("\nOutput:");
    println!("  Records: {}", config.output.records_path);
    println!("  Domains: {}", config.output.domains_path);

    let identifiers = load_identifiers(Path::new(&config.run.input_path))
        .with_context(|| format!("Failed to read identifiers from {}", config.run.input_path))?;
    let mut store = open_store(&config.output);
    let checkpoint = store.load().context("Failed to load record store")?;
    let plan = HarvestPlan::new(identifiers, &checkpoint);

    println!("\nInput ({}):", config.run.input_path);
    println!("  Identifiers read: {}", plan.total_input);
    println!("  Duplicates removed: {}", plan.duplicates_removed);
    println!("  Already complete: {}", plan.skipped);
    println!("  Pending: {}", plan.pending.len());

    let estimate = plan.estimated_duration(&config.rate_limit, &config.run);
    println!(
        "  Estimated duration: {:.1}h",
        estimate.as_secs_f64() / 3600.0
    );

    println!("\n✓ Configuration is valid");
    println!("✓ Would fetch {} profile pages", plan.pending.len());

    Ok(())
}

/// Handles the --stats mode: shows statistics of the record store
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Record store: {}\n", config.output.records_path);

    let records = CsvRecordStore::read_records(Path::new(&config.output.records_path))
        .context("Failed to read record store")?;
    print_statistics(&StoreStatistics::from_records(&records));

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: &Config) -> anyhow::Result<()> {
    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::warn!("Ctrl-C received, flushing and exiting"),
            Err(e) => {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    let summary = run_harvest(config, shutdown)
        .await
        .context("Harvest failed")?;

    print_summary(&summary);
    Ok(())
}
