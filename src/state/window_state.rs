use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Request accounting for one rate window (minute, hour, day)
///
/// The window is a sliding log: it keeps the admission time of every request
/// younger than `length`. `count()` is the number of such requests and
/// `window_start()` the oldest of them. An entry expires once `length` has
/// elapsed since its admission, which is what "resetting" means here.
#[derive(Debug, Clone)]
pub struct RateWindowState {
    /// Label used in logs and status snapshots
    pub name: &'static str,

    /// Window length
    pub length: Duration,

    /// Maximum admitted requests within any span of `length`
    pub ceiling: u32,

    admitted: VecDeque<Instant>,
}

impl RateWindowState {
    /// Creates an empty window
    pub fn new(name: &'static str, length: Duration, ceiling: u32) -> Self {
        Self {
            name,
            length,
            ceiling,
            admitted: VecDeque::new(),
        }
    }

    /// Drops admissions that are at least `length` old
    pub fn expire(&mut self, now: Instant) {
        while let Some(&oldest) = self.admitted.front() {
            if now.saturating_duration_since(oldest) >= self.length {
                self.admitted.pop_front();
            } else {
                break;
            }
        }
    }

    /// Number of admitted requests still inside the window
    pub fn count(&self) -> u32 {
        self.admitted.len() as u32
    }

    /// Admission time of the oldest request still inside the window
    pub fn window_start(&self) -> Option<Instant> {
        self.admitted.front().copied()
    }

    /// Returns true if one more request fits under the ceiling
    pub fn has_headroom(&self) -> bool {
        self.count() < self.ceiling
    }

    /// Time until one more request fits, or None if it fits now
    ///
    /// Callers must `expire` first so the front entry is live. A window with a
    /// zero ceiling never has headroom; it asks to be checked again after a
    /// full `length`.
    pub fn time_until_headroom(&self, now: Instant) -> Option<Duration> {
        if self.has_headroom() {
            return None;
        }

        match self.admitted.front() {
            Some(&oldest) => Some((oldest + self.length).saturating_duration_since(now)),
            None => Some(self.length),
        }
    }

    /// Records one admitted request
    pub fn record(&mut self, now: Instant) {
        self.admitted.push_back(now);
    }

    /// Formats `count/ceiling` for status output
    pub fn status(&self) -> String {
        format!("{}/{}", self.count(), self.ceiling)
    }
}
