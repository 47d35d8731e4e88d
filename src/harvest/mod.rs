//! Harvest module for rate-limited, resumable page fetching
//!
//! This module contains the core harvesting logic, including:
//! - Multi-window rate limiting
//! - Fetching with classified outcomes and bounded retries
//! - The page source collaborator and its HTTP implementation
//! - Overall run coordination and checkpointing

mod coordinator;
mod fetcher;
mod limiter;
mod source;

pub use coordinator::{record_for, request_pause, Coordinator, HarvestPlan};
pub use fetcher::{classify_response, classify_transport, FetchOutcome, Fetcher};
pub use limiter::RateLimiter;
pub use source::{
    build_http_client, HttpPageSource, PageResponse, PageSource, TransportError,
    TransportErrorKind,
};

use crate::config::Config;
use crate::input::load_identifiers;
use crate::output::RunSummary;
use crate::storage::open_store;
use crate::HarvestError;
use std::future::Future;
use std::path::Path;

/// Runs a complete harvest
///
/// This is the main entry point for a run. It will:
/// 1. Read the identifier source (failing before any fetch if it is unusable)
/// 2. Load the record store and subtract completed identifiers
/// 3. Process the pending identifiers until done or `shutdown` resolves
/// 4. Flush the store and return the run summary
///
/// # Example
///
/// ```no_run
/// use site_harvest::config::load_config;
/// use site_harvest::harvest::run_harvest;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let summary = run_harvest(&config, async {
///     let _ = tokio::signal::ctrl_c().await;
/// })
/// .await?;
/// println!("{} records written", summary.counts.total());
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest<F>(config: &Config, shutdown: F) -> Result<RunSummary, HarvestError>
where
    F: Future<Output = ()>,
{
    let identifiers = load_identifiers(Path::new(&config.run.input_path))?;

    let source = HttpPageSource::from_config(&config.source, &config.user_agent)?;
    let store = open_store(&config.output);
    let mut coordinator = Coordinator::from_config(config, source, store);

    let plan = coordinator.plan(identifiers)?;
    coordinator.run_until(&plan, shutdown).await
}
