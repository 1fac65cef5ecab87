//! Store configuration
//!
//! Defaults match what the overlays were tuned for: a 50 ms poll (~20 Hz) and a
//! one second bound on connect attempts. Configuration can also be loaded from
//! YAML, with durations written in milliseconds:
//!
//! ```yaml
//! poll_interval_ms: 50
//! connect_timeout_ms: 1000
//! clear_on_disconnect: false
//! thread_name: telemetry-producer
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{Result, TelemetryError};

/// Default producer poll interval (~20 Hz)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Default bound on a single connect attempt
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Configuration for a [`TelemetryStore`](crate::TelemetryStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Sleep between poll cycles
    #[serde(rename = "poll_interval_ms", with = "duration_ms")]
    pub poll_interval: Duration,
    /// Longest a connect attempt may hold up a poll cycle
    #[serde(rename = "connect_timeout_ms", with = "duration_ms")]
    pub connect_timeout: Duration,
    /// Publish the empty snapshot when the simulator goes away
    pub clear_on_disconnect: bool,
    /// Name of the producer thread
    pub thread_name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            clear_on_disconnect: false,
            thread_name: "telemetry-producer".to_string(),
        }
    }
}

impl StoreConfig {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn with_clear_on_disconnect(mut self, clear: bool) -> Self {
        self.clear_on_disconnect = clear;
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Check the configuration for values the producer cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(TelemetryError::config("poll interval must be greater than zero"));
        }
        if self.connect_timeout.is_zero() {
            return Err(TelemetryError::config("connect timeout must be greater than zero"));
        }
        if self.thread_name.trim().is_empty() {
            return Err(TelemetryError::config("thread name must not be empty"));
        }
        Ok(())
    }

    /// Parse and validate a YAML configuration document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: StoreConfig =
            serde_yaml_ng::from_str(yaml).map_err(|e| TelemetryError::Parse {
                context: "StoreConfig deserialization".to_string(),
                details: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| TelemetryError::file_error(path.to_path_buf(), e))?;
        Self::from_yaml_str(&content)
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
