//! Update rate control for snapshot subscriptions

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cadence at which a consumer wants to see snapshots.
///
/// Independent of the producer's poll interval: an overlay redrawing at 10 Hz
/// does not need every 20 Hz sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum UpdateRate {
    /// Every published snapshot
    Native,

    /// At most this many snapshots per second, latest wins.
    /// If the requested rate meets or exceeds the poll rate, Native is used
    Max(u32),
}

impl UpdateRate {
    /// Normalize rate against the producer's poll interval
    pub fn normalize(self, poll_interval: Duration) -> Self {
        let source_hz = 1.0 / poll_interval.as_secs_f64();
        match self {
            UpdateRate::Native => UpdateRate::Native,
            UpdateRate::Max(0) => UpdateRate::Native,
            UpdateRate::Max(hz) if hz as f64 >= source_hz => UpdateRate::Native,
            UpdateRate::Max(hz) => UpdateRate::Max(hz),
        }
    }

    /// Get throttle interval if needed
    pub fn throttle_interval(self, poll_interval: Duration) -> Option<Duration> {
        match self.normalize(poll_interval) {
            UpdateRate::Native => None,
            UpdateRate::Max(hz) => Some(Duration::from_secs_f64(1.0 / hz as f64)),
        }
    }
}
