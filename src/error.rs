//! Error types for telemetry acquisition.
//!
//! Nothing in this module ever reaches an overlay: the producer loop absorbs
//! every error and turns it into "keep the last snapshot". The error type still
//! matters because it decides how a skipped pass is logged.
//!
//! ## Error Categories
//!
//! - **Transient**: simulator not running, feed momentarily unreadable, a field
//!   the current feed version does not publish, a connect attempt that timed out
//! - **Unexpected**: a field of the wrong type, an unparseable session document,
//!   a source that panicked, invalid configuration
//!
//! ```rust
//! use pitwall_overlay::TelemetryError;
//!
//! let error = TelemetryError::connection_failed("iRacing not running");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for telemetry operations.
pub type Result<T, E = TelemetryError> = std::result::Result<T, E>;

/// Main error type for telemetry operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TelemetryError {
    #[error("Failed to connect to iRacing: {reason}")]
    Connection {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Telemetry feed unavailable: {reason}")]
    SourceUnavailable { reason: String },

    #[error("Field '{field}' not found in telemetry data")]
    FieldNotFound { field: String },

    #[error("Type conversion error for '{field}': {details}")]
    TypeConversion { field: String, details: String },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("File error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start telemetry producer")]
    Spawn {
        #[source]
        source: std::io::Error,
    },

    #[error("Telemetry source panicked: {details}")]
    SourcePanicked { details: String },
}

impl TelemetryError {
    /// Returns whether this error is expected to clear up on a later poll cycle.
    pub fn is_retryable(&self) -> bool {
        match self {
            TelemetryError::Connection { .. } => true,
            TelemetryError::SourceUnavailable { .. } => true,
            TelemetryError::FieldNotFound { .. } => true,
            TelemetryError::Timeout { .. } => true,
            TelemetryError::TypeConversion { .. } => false,
            TelemetryError::Parse { .. } => false,
            TelemetryError::Config { .. } => false,
            TelemetryError::File { .. } => false,
            TelemetryError::Spawn { .. } => false,
            TelemetryError::SourcePanicked { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            TelemetryError::Connection { .. } => vec![
                "Ensure iRacing is running",
                "Load into a session so telemetry is published",
                "Check Windows permissions for shared memory access",
            ],
            TelemetryError::SourceUnavailable { .. } => vec![
                "Wait for the next poll cycle",
                "Check that iRacing has not been paused or minimised to the menu",
            ],
            TelemetryError::FieldNotFound { .. } => vec![
                "Check field name spelling",
                "Verify field exists in current iRacing version",
                "Treat the field as optional if the car does not publish it",
            ],
            TelemetryError::TypeConversion { .. } => vec![
                "Check data type compatibility",
                "Verify expected vs actual data types for the field",
            ],
            TelemetryError::Parse { .. } => vec![
                "Check session document format",
                "Verify source data integrity",
                "Update YAML preprocessing if iRacing changed its output",
            ],
            TelemetryError::Timeout { .. } => vec![
                "Increase the connect timeout",
                "Check system performance",
                "Verify iRacing is responding",
            ],
            TelemetryError::Config { .. } => vec![
                "Use non-zero poll and connect intervals",
                "Check the configuration file against the documented keys",
            ],
            TelemetryError::File { .. } => vec![
                "Check file exists and is readable",
                "Check file permissions",
            ],
            TelemetryError::Spawn { .. } => vec![
                "Check process thread limits",
                "Verify system resources availability",
            ],
            TelemetryError::SourcePanicked { .. } => vec![
                "Report the panic message to the source implementation",
                "Check the source for unchecked indexing or unwraps",
            ],
        }
    }

    /// Helper constructor for connection errors.
    pub fn connection_failed(reason: impl Into<String>) -> Self {
        TelemetryError::Connection { reason: reason.into(), source: None }
    }

    /// Helper constructor for connection errors with source.
    pub fn connection_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        TelemetryError::Connection { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for a feed that cannot be read right now.
    pub fn source_unavailable(reason: impl Into<String>) -> Self {
        TelemetryError::SourceUnavailable { reason: reason.into() }
    }

    /// Helper constructor for missing fields.
    pub fn field_not_found(field: impl Into<String>) -> Self {
        TelemetryError::FieldNotFound { field: field.into() }
    }

    /// Helper constructor for type conversion errors.
    pub fn type_conversion(field: impl Into<String>, details: impl Into<String>) -> Self {
        TelemetryError::TypeConversion { field: field.into(), details: details.into() }
    }

    /// Helper constructor for invalid configuration.
    pub fn config(reason: impl Into<String>) -> Self {
        TelemetryError::Config { reason: reason.into() }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        TelemetryError::File { path, source }
    }
}

impl From<std::io::Error> for TelemetryError {
    fn from(err: std::io::Error) -> Self {
        TelemetryError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}
