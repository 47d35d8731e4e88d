//! Harvest coordinator - main run orchestration logic
//!
//! This module contains the run loop that drives every pending identifier
//! through rate limiter, fetcher and extractor, one identifier at a time:
//! - Subtracting already-completed identifiers (the checkpoint set)
//! - Appending one record per finished identifier, in processing order
//! - Periodic flushes and progress reporting
//! - 429 handling: deferral or recording, cooldown, early stop
//! - A paced pause between identifiers
//! - Interruption followed by a final flush

use crate::config::{Config, RateLimitConfig, RateLimitedPolicy, RunConfig};
use crate::extract::{ExtractionOutcome, Extractor};
use crate::harvest::fetcher::{FetchOutcome, Fetcher};
use crate::harvest::limiter::RateLimiter;
use crate::harvest::source::PageSource;
use crate::input::dedupe_identifiers;
use crate::output::{RunSummary, StatusCounts, StopReason};
use crate::state::{Identifier, Record, RecordStatus, UNRESOLVED};
use crate::storage::{distinct_domains, CheckpointSet, RecordStore};
use crate::HarvestError;
use chrono::Utc;
use std::future::Future;
use std::time::{Duration, Instant};

/// Attempts made by the final flush before the run gives up
const FINAL_FLUSH_ATTEMPTS: u32 = 3;

/// Pause between final flush attempts
const FINAL_FLUSH_RETRY_DELAY: Duration = Duration::from_secs(1);

/// The work list for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestPlan {
    /// Identifiers still to process, in first-seen input order
    pub pending: Vec<Identifier>,

    /// Identifiers read from the source, duplicates included
    pub total_input: usize,

    pub duplicates_removed: usize,

    /// Identifiers dropped because a trusted record already exists
    pub skipped: usize,
}

impl HarvestPlan {
    /// Deduplicates the input and subtracts the checkpoint set
    pub fn new(identifiers: Vec<Identifier>, checkpoint: &CheckpointSet) -> Self {
        let total_input = identifiers.len();
        let (unique, duplicates_removed) = dedupe_identifiers(identifiers);

        let before = unique.len();
        let pending: Vec<Identifier> = unique
            .into_iter()
            .filter(|id| !checkpoint.contains(id))
            .collect();
        let skipped = before - pending.len();

        Self {
            pending,
            total_input,
            duplicates_removed,
            skipped,
        }
    }

    /// Rough wall-clock time needed for the pending identifiers
    ///
    /// The slowest of three bounds: the hourly ceiling, the daily ceiling and
    /// the pause between identifiers (at its average jitter). Retries are not
    /// counted.
    pub fn estimated_duration(&self, rate: &RateLimitConfig, run: &RunConfig) -> Duration {
        if self.pending.is_empty() {
            return Duration::ZERO;
        }

        let pending = self.pending.len() as f64;
        let hourly = pending / f64::from(rate.per_hour.max(1)) * 3600.0;
        let daily = pending / f64::from(rate.per_day.max(1)) * 86_400.0;
        let pause_ms = run.min_request_interval_ms as f64 + run.request_jitter_ms as f64 / 2.0;
        let paced = (pending - 1.0) * pause_ms / 1000.0;

        Duration::from_secs_f64(hourly.max(daily).max(paced))
    }
}

/// Turns a fetch outcome into the record to persist
///
/// Returns None when a 429 is deferred, so the identifier stays pending for
/// the next run.
pub fn record_for(
    id: &Identifier,
    source_url: String,
    outcome: FetchOutcome,
    extractor: &Extractor,
    policy: RateLimitedPolicy,
) -> Option<Record> {
    let record = match outcome {
        FetchOutcome::Success { content } => {
            let extraction = extractor.extract(&content);
            let status = match &extraction.outcome {
                ExtractionOutcome::Matched(_) if extraction.normalized_value != UNRESOLVED => {
                    RecordStatus::Found
                }
                ExtractionOutcome::Matched(_) | ExtractionOutcome::NoMatch => {
                    RecordStatus::NotFound
                }
                ExtractionOutcome::Malformed(reason) => {
                    tracing::warn!("Unusable page for {}: {}", id, reason);
                    RecordStatus::Error
                }
            };

            Record {
                identifier: id.clone(),
                raw_value: extraction.raw_value,
                normalized_value: extraction.normalized_value,
                source_url,
                status,
            }
        }
        FetchOutcome::NotFound => Record::unresolved(id.clone(), source_url, RecordStatus::NotFound),
        FetchOutcome::TransientError { cause } | FetchOutcome::FatalError { cause } => {
            tracing::warn!("Fetching {} failed: {}", id, cause);
            Record::unresolved(id.clone(), source_url, RecordStatus::Error)
        }
        FetchOutcome::RateLimited => match policy {
            RateLimitedPolicy::Defer => return None,
            RateLimitedPolicy::Record => {
                Record::unresolved(id.clone(), source_url, RecordStatus::RateLimited)
            }
        },
    };

    Some(record)
}

/// Pause taken after `id` before the next identifier is fetched
///
/// The interval plus a jitter in `0..request_jitter_ms`, derived from the
/// identifier so a rerun paces the same way.
pub fn request_pause(run: &RunConfig, id: &Identifier) -> Duration {
    let jitter = match run.request_jitter_ms {
        0 => 0,
        bound => {
            let seed = id
                .as_str()
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(b)));
            seed % bound
        }
    };

    Duration::from_millis(run.min_request_interval_ms + jitter)
}

/// Main harvest coordinator structure
pub struct Coordinator<S, R> {
    run: RunConfig,
    fetcher: Fetcher<S>,
    limiter: RateLimiter,
    extractor: Extractor,
    store: R,
}

impl<S: PageSource, R: RecordStore> Coordinator<S, R> {
    pub fn new(
        run: RunConfig,
        fetcher: Fetcher<S>,
        limiter: RateLimiter,
        extractor: Extractor,
        store: R,
    ) -> Self {
        Self {
            run,
            fetcher,
            limiter,
            extractor,
            store,
        }
    }

    /// Wires a coordinator from configuration around a page source and store
    pub fn from_config(config: &Config, source: S, store: R) -> Self {
        Self::new(
            config.run.clone(),
            Fetcher::new(source, config.retry.clone()),
            RateLimiter::from_config(&config.rate_limit),
            Extractor::from_config(&config.extractor, &config.source),
            store,
        )
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Loads the record store and plans the run
    pub fn plan(&mut self, identifiers: Vec<Identifier>) -> Result<HarvestPlan, HarvestError> {
        let checkpoint = self.store.load()?;
        let plan = HarvestPlan::new(identifiers, &checkpoint);

        tracing::info!(
            "{} identifiers read, {} duplicates removed, {} already complete, {} pending",
            plan.total_input,
            plan.duplicates_removed,
            plan.skipped,
            plan.pending.len()
        );

        Ok(plan)
    }

    /// Runs the plan until it is exhausted, the run stops early, or
    /// `shutdown` resolves
    ///
    /// The final flush always happens. Only a final flush that keeps failing
    /// is returned as an error.
    pub async fn run_until<F>(
        &mut self,
        plan: &HarvestPlan,
        shutdown: F,
    ) -> Result<RunSummary, HarvestError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let started_at = Utc::now();
        let start_time = Instant::now();
        let total = plan.pending.len();

        let mut counts = StatusCounts::default();
        let mut processed = 0usize;
        let mut deferred = 0usize;
        let mut consecutive_rate_limits = 0u32;
        let mut stop_reason = StopReason::Completed;

        tracing::info!("Starting harvest of {} identifiers", total);

        for id in &plan.pending {
            let source_url = self.fetcher.source().page_url(id);

            let outcome = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::warn!("Interrupted before {}, stopping", id);
                    stop_reason = StopReason::Interrupted;
                    break;
                }
                outcome = self.fetcher.fetch(id, &mut self.limiter) => outcome,
            };

            let record = record_for(
                id,
                source_url,
                outcome,
                &self.extractor,
                self.run.rate_limited_policy,
            );

            let rate_limited = match record {
                Some(record) => {
                    tracing::info!(
                        "[{}/{}] {} -> {} ({})",
                        processed + 1,
                        total,
                        id,
                        record.normalized_value,
                        record.status
                    );
                    let rate_limited = record.status == RecordStatus::RateLimited;
                    counts.add(record.status);
                    self.store.append(record);
                    rate_limited
                }
                None => {
                    tracing::warn!(
                        "[{}/{}] {} rate limited by provider, deferred to next run",
                        processed + 1,
                        total,
                        id
                    );
                    deferred += 1;
                    true
                }
            };
            processed += 1;

            if processed % self.run.flush_every.max(1) == 0 && self.store.unflushed() > 0 {
                self.flush_periodic();
            }

            if processed % self.run.progress_every.max(1) == 0 {
                let minutes = start_time.elapsed().as_secs_f64() / 60.0;
                tracing::info!(
                    "Progress: {}/{} processed, {}, {:.1}/min, rate windows: {}",
                    processed,
                    total,
                    counts,
                    processed as f64 / minutes.max(f64::EPSILON),
                    self.limiter.status()
                );
            }

            let mut pause = request_pause(&self.run, id);

            if rate_limited {
                consecutive_rate_limits += 1;
                let limit = self.run.max_consecutive_rate_limits;
                if limit > 0 && consecutive_rate_limits >= limit {
                    tracing::warn!(
                        "{} consecutive rate-limited answers, stopping early",
                        consecutive_rate_limits
                    );
                    stop_reason = StopReason::RateLimited;
                    break;
                }

                if self.run.rate_limited_cooldown_secs > 0 {
                    let cooldown = Duration::from_secs(self.run.rate_limited_cooldown_secs);
                    tracing::warn!("Cooling down for {:?} after rate limiting", cooldown);
                    pause = pause.max(cooldown);
                }
            } else {
                consecutive_rate_limits = 0;
            }

            if processed < total && !pause.is_zero() {
                tracing::trace!("Pausing {:?} before the next identifier", pause);
                tokio::select! {
                    biased;
                    _ = &mut shutdown => {
                        tracing::warn!("Interrupted while pausing, stopping");
                        stop_reason = StopReason::Interrupted;
                        break;
                    }
                    _ = tokio::time::sleep(pause) => {}
                }
            }
        }

        self.flush_final().await?;

        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            counts,
            total_input: plan.total_input,
            duplicates_removed: plan.duplicates_removed,
            skipped: plan.skipped,
            deferred,
            unprocessed: total - processed,
            stop_reason,
            distinct_domains: distinct_domains(self.store.records()).len(),
        };

        tracing::info!(
            "Harvest {}: {} processed in {:?} ({}), {} deferred",
            summary.stop_reason,
            processed,
            start_time.elapsed(),
            summary.counts,
            summary.deferred
        );

        Ok(summary)
    }

    /// Periodic flush: a failure is logged and the run continues
    fn flush_periodic(&mut self) {
        match self.store.flush() {
            Ok(()) => tracing::debug!("Checkpoint flushed"),
            Err(e) => tracing::warn!(
                "Checkpoint flush failed, {} records held in memory: {}",
                self.store.unflushed(),
                e
            ),
        }
    }

    /// Final flush, retried a few times before the error is surfaced
    async fn flush_final(&mut self) -> Result<(), HarvestError> {
        let mut attempt = 1;
        loop {
            match self.store.flush() {
                Ok(()) => return Ok(()),
                Err(e) if attempt < FINAL_FLUSH_ATTEMPTS => {
                    tracing::warn!(
                        "Final flush attempt {}/{} failed: {}",
                        attempt,
                        FINAL_FLUSH_ATTEMPTS,
                        e
                    );
                    tokio::time::sleep(FINAL_FLUSH_RETRY_DELAY).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(
                        "Final flush failed, {} records were not persisted",
                        self.store.unflushed()
                    );
                    return Err(e.into());
                }
            }
        }
    }
}
