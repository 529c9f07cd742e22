//! Millisecond wall-clock helpers.

use chrono::Utc;

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// Decisions and hit timestamps are always derived from this local clock,
/// never from anything the client supplies.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
