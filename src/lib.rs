//! Background telemetry acquisition for iRacing overlays.
//!
//! Overlays redraw at their own pace and must never wait on the simulator. A
//! [`TelemetryStore`] owns one producer thread that polls a
//! [`SimulatorSource`], samples a complete [`TelemetrySnapshot`] each cycle and
//! publishes it atomically. Any number of overlays read the latest snapshot
//! through cloned [`TelemetryHandle`]s.
//!
//! # Features
//!
//! - **Consistent reads**: vehicle and session data in one snapshot always come
//!   from the same sampling pass
//! - **Resilient polling**: a missing simulator, a failed read or a panicking
//!   source never stops the producer; the last good snapshot stays visible
//! - **Bounded shutdown**: `stop()` returns within about one poll interval,
//!   even while a connect attempt is hung
//! - **Streams**: [`TelemetryHandle::updates`] for async consumers, optionally
//!   rate limited
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pitwall_overlay::{DisplayTelemetry, RecordingSource, StoreConfig, TelemetryStore};
//! use std::time::Duration;
//!
//! fn main() -> pitwall_overlay::Result<()> {
//!     let source = RecordingSource::open("recordings/okayama.yaml")?.with_looping(true);
//!     let config = StoreConfig::default().with_poll_interval(Duration::from_millis(50));
//!     let store = TelemetryStore::with_config(source, config)?;
//!
//!     let overlay = store.handle();
//!     std::thread::spawn(move || {
//!         let display = DisplayTelemetry::from(&overlay.telemetry());
//!         println!("{} {}", display.speed_kph, display.gear);
//!     });
//!
//!     std::thread::sleep(Duration::from_secs(1));
//!     store.stop();
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod config;
mod error;
pub mod snapshot;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
mod yaml_utils;

// Acquisition
pub mod sampler;
pub mod session;
pub mod source;
pub mod sources;
pub mod store;
pub mod stream;

// Consumer helpers
pub mod display;
pub mod history;

pub use config::StoreConfig;
pub use display::DisplayTelemetry;
pub use error::*;
pub use history::InputHistory;
pub use session::{SessionDocument, SessionDocumentCache};
pub use snapshot::{SessionSummary, TelemetrySnapshot, TireTemperatures, VehicleTelemetry};
pub use source::SimulatorSource;
pub use sources::RecordingSource;
pub use store::{StoreStats, TelemetryHandle, TelemetryStore};
pub use types::*;
