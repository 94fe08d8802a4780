//! Fetch latency metrics.

use std::fmt;
use std::time::Duration;

/// Latency of the most recent namespace lookups.
///
/// Each lookup overwrites only the entry matching its outcome; the other entry
/// keeps the value from an earlier call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchMetrics {
    /// Time from fetch start until a namespace config was returned.
    pub fetch_time_api_success: Option<Duration>,
    /// Time from fetch start until the namespace was found missing.
    pub fetch_time_api_fail: Option<Duration>,
}

impl FetchMetrics {
    pub(crate) fn record_success(&mut self, elapsed: Duration) {
        self.fetch_time_api_success = Some(elapsed);
    }

    pub(crate) fn record_failure(&mut self, elapsed: Duration) {
        self.fetch_time_api_fail = Some(elapsed);
    }
}

impl fmt::Display for FetchMetrics {
    /// Formats the metrics in milliseconds for logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = |value: Option<Duration>| {
            value.map_or_else(|| "none".to_string(), |d| d.as_millis().to_string())
        };
        write!(
            f,
            "fetch_time_api_success={}, fetch_time_api_fail={}",
            millis(self.fetch_time_api_success),
            millis(self.fetch_time_api_fail)
        )
    }
}
