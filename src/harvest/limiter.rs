//! Multi-window rate limiter
//!
//! The limiter owns one [`RateWindowState`] per quota window (minute, hour,
//! day). `acquire()` waits until every window has headroom and then records
//! the request against all of them at the same instant, so no window can be
//! over-admitted by a caller that skipped the wait.

use crate::config::RateLimitConfig;
use crate::state::RateWindowState;
use std::time::Duration;
use tokio::time::Instant;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(60 * 60);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Paces outbound requests against per-window ceilings
#[derive(Debug, Clone)]
pub struct RateLimiter {
    windows: Vec<RateWindowState>,

    /// Added to every computed wait so the oldest entry has surely expired
    safety_margin: Duration,

    /// Total time spent waiting in `acquire`
    waited: Duration,
}

impl RateLimiter {
    /// Creates a limiter from explicit windows
    pub fn new(windows: Vec<RateWindowState>, safety_margin: Duration) -> Self {
        Self {
            windows,
            safety_margin,
            waited: Duration::ZERO,
        }
    }

    /// Creates the minute/hour/day limiter described by the configuration
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            vec![
                RateWindowState::new("minute", MINUTE, config.per_minute),
                RateWindowState::new("hour", HOUR, config.per_hour),
                RateWindowState::new("day", DAY, config.per_day),
            ],
            Duration::from_millis(config.safety_margin_ms),
        )
    }

    /// Waits until one more request fits under every ceiling, then records it
    ///
    /// The binding window is whichever needs the longest wait. After sleeping
    /// the windows are re-derived from scratch, because a different window may
    /// have filled or freed up in the meantime.
    pub async fn acquire(&mut self) {
        loop {
            let now = Instant::now();

            let binding = self
                .windows
                .iter_mut()
                .filter_map(|window| {
                    window.expire(now);
                    window
                        .time_until_headroom(now)
                        .map(|wait| (window.name, wait))
                })
                .max_by_key(|(_, wait)| *wait);

            let Some((name, wait)) = binding else {
                for window in &mut self.windows {
                    window.record(now);
                }
                tracing::trace!("Request admitted ({})", self.status());
                return;
            };

            let wait = wait + self.safety_margin;
            tracing::debug!(
                "Rate window '{}' is full, waiting {:?} ({})",
                name,
                wait,
                self.status()
            );
            tokio::time::sleep(wait).await;
            self.waited += wait;
        }
    }

    /// Returns true if a request would be admitted right now without waiting
    pub fn has_headroom(&mut self) -> bool {
        let now = Instant::now();
        self.windows.iter_mut().all(|window| {
            window.expire(now);
            window.has_headroom()
        })
    }

    /// Snapshot of every window as `name count/ceiling`
    pub fn status(&self) -> String {
        self.windows
            .iter()
            .map(|window| format!("{} {}", window.name, window.status()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The tracked windows
    pub fn windows(&self) -> &[RateWindowState] {
        &self.windows
    }

    /// Total time spent waiting for headroom
    pub fn total_wait(&self) -> Duration {
        self.waited
    }
}
