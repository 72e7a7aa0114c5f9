use std::time::Duration;

use chrono::NaiveTime;
use serde::Serialize;

pub mod scheduler;
pub mod wake;

/// An absolute point in time, in whole milliseconds since the Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize)]
pub struct Instant(pub u64);

impl Instant {
    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Delay from this instant to the next one aligned with `interval`.
    ///
    /// Always in `(0, interval]`: on an exact boundary the full interval is
    /// returned, so two refreshes never land on the same instant.
    pub fn delay_to_next_aligned(self, interval: Interval) -> Duration {
        Duration::from_millis(interval.0 - self.0 % interval.0)
    }

    /// The smallest instant aligned with `interval` that is strictly after
    /// this one.
    pub fn next_aligned(self, interval: Interval) -> Instant {
        Instant(self.0 + self.delay_to_next_aligned(interval).as_millis() as u64)
    }
}

impl std::fmt::Display for Instant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// A positive duration between refreshes, in milliseconds.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct Interval(u64);

impl Interval {
    /// Panics when `millis` is zero; alignment is undefined for an empty
    /// interval.
    pub const fn from_millis(millis: u64) -> Self {
        assert!(millis > 0, "refresh interval must be positive");
        Interval(millis)
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self::from_millis(secs * 1000)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    pub fn as_secs(&self) -> u64 {
        self.0 / 1000
    }
}

/// Power state of the panel, as reported by the host.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum DisplayMode {
    Active,
    Ambient { burn_in_protection: bool },
}

impl DisplayMode {
    pub fn is_ambient(&self) -> bool {
        matches!(self, DisplayMode::Ambient { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            DisplayMode::Active => "Active",
            DisplayMode::Ambient { .. } => "Ambient",
        }
    }
}

/// Snapshot consumed by the display. Advanced only by the scheduler on each
/// refresh tick, never persisted.
#[derive(Clone, Debug, Serialize)]
pub struct RefreshState {
    pub instant: Instant,
    pub time_of_day: NaiveTime,
    pub draw_count: u32,
    pub mode: DisplayMode,
}
