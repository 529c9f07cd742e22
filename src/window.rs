//! Time windows for rate limiting.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Time window for rate limiting.
///
/// The lowercase serde names match the units accepted in rules files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    /// Per-second rate limiting
    Second,
    /// Per-minute rate limiting
    Minute,
    /// Per-hour rate limiting
    Hour,
    /// Per-day rate limiting
    Day,
}

impl TimeWindow {
    /// Get the duration of this time window.
    pub fn duration(&self) -> Duration {
        match self {
            TimeWindow::Second => Duration::from_secs(1),
            TimeWindow::Minute => Duration::from_secs(60),
            TimeWindow::Hour => Duration::from_secs(3600),
            TimeWindow::Day => Duration::from_secs(86400),
        }
    }

    /// Window length in whole seconds.
    pub fn as_secs(&self) -> u64 {
        self.duration().as_secs()
    }

    /// Window length in milliseconds, the unit hit timestamps are kept in.
    pub fn as_millis(&self) -> i64 {
        (self.as_secs() * 1000) as i64
    }
}
