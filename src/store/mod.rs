//! The telemetry store: one producer thread, any number of readers
//!
//! ```text
//!  SimulatorSource ──► producer thread ──► watch<Arc<TelemetrySnapshot>>
//!                      (poll, sample,           │        │        │
//!                       publish, sleep)       handle   handle   handle
//!                                             (text)  (graph)  (dash)
//! ```
//!
//! The producer is the only writer. A publish swaps one `Arc` inside the watch
//! channel; a read clones that `Arc` under the channel's read lock and
//! releases it. Readers therefore see either the previous snapshot or the new
//! one, never a mix, and never wait on a sampling pass.

mod producer;
#[cfg(test)]
mod tests;

use futures::StreamExt;
use futures::stream::BoxStream;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::StoreConfig;
use crate::snapshot::{SessionSummary, TelemetrySnapshot, VehicleTelemetry};
use crate::source::SimulatorSource;
use crate::stream::ThrottleExt;
use crate::types::UpdateRate;
use crate::Result;

use producer::Producer;

/// Counters shared between the producer and readers
#[derive(Debug, Default)]
struct SharedState {
    connected: AtomicBool,
    published: AtomicU64,
    skipped: AtomicU64,
    connect_attempts: AtomicU64,
}

/// Point-in-time view of the producer's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Snapshots published, including cleared ones
    pub published: u64,
    /// Passes that failed and kept the previous snapshot
    pub skipped: u64,
    /// Calls made to `SimulatorSource::connect`
    pub connect_attempts: u64,
    pub connected: bool,
}

/// Cloneable read access to a [`TelemetryStore`].
///
/// This is what overlays hold. Every method is non-blocking in practice and
/// callable from any thread. A handle stays valid after the store is stopped
/// or dropped and keeps returning the last published snapshot.
#[derive(Debug, Clone)]
pub struct TelemetryHandle {
    snapshots: watch::Receiver<Arc<TelemetrySnapshot>>,
    shared: Arc<SharedState>,
    poll_interval: Duration,
}

impl TelemetryHandle {
    /// The most recently published snapshot.
    pub fn snapshot(&self) -> Arc<TelemetrySnapshot> {
        Arc::clone(&self.snapshots.borrow())
    }

    /// Vehicle telemetry from the current snapshot.
    pub fn telemetry(&self) -> VehicleTelemetry {
        self.snapshot().vehicle
    }

    /// Session metadata from the current snapshot.
    ///
    /// Fetched separately from [`TelemetryHandle::telemetry`], so the two may
    /// come from different poll cycles. Use [`TelemetryHandle::snapshot`] when
    /// both must match.
    pub fn session_info(&self) -> SessionSummary {
        self.snapshot().session.clone()
    }

    /// Whether the producer was attached to the simulator on its last cycle.
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            published: self.shared.published.load(Ordering::Relaxed),
            skipped: self.shared.skipped.load(Ordering::Relaxed),
            connect_attempts: self.shared.connect_attempts.load(Ordering::Relaxed),
            connected: self.is_connected(),
        }
    }

    /// Snapshots as a stream.
    ///
    /// Yields the current snapshot immediately (the empty one if nothing has
    /// been published yet), then each new one. With `UpdateRate::Max` the
    /// stream emits at most that often and skips to the latest snapshot.
    /// Ends once the producer has stopped. Throttled streams must be created
    /// inside a Tokio runtime.
    pub fn updates(&self, rate: UpdateRate) -> BoxStream<'static, Arc<TelemetrySnapshot>> {
        let snapshots = WatchStream::new(self.snapshots.clone());
        match rate.throttle_interval(self.poll_interval) {
            None => snapshots.boxed(),
            Some(interval) => snapshots.throttle(interval).boxed(),
        }
    }
}

/// Background telemetry acquisition with a thread-safe snapshot cache.
///
/// Construction starts the producer thread and returns immediately; reads
/// return the empty snapshot until the first successful pass.
///
/// ```rust,no_run
/// use pitwall_overlay::{RecordingSource, TelemetryStore};
///
/// # fn main() -> pitwall_overlay::Result<()> {
/// let store = TelemetryStore::start(RecordingSource::open("session.yaml")?)?;
/// let overlay_handle = store.handle();
///
/// let telemetry = overlay_handle.telemetry();
/// println!("{:.1} m/s in gear {}", telemetry.speed, telemetry.gear);
///
/// store.stop();
/// # Ok(())
/// # }
/// ```
pub struct TelemetryStore {
    handle: TelemetryHandle,
    cancel: CancellationToken,
    producer: Mutex<Option<JoinHandle<()>>>,
}

impl TelemetryStore {
    /// Start a store with the default configuration.
    pub fn start<S: SimulatorSource>(source: S) -> Result<Self> {
        Self::with_config(source, StoreConfig::default())
    }

    /// Start a store with `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the producer thread
    /// cannot be started. Simulator availability is never an error here.
    pub fn with_config<S: SimulatorSource>(source: S, config: StoreConfig) -> Result<Self> {
        config.validate()?;

        let (publisher, snapshots) = watch::channel(Arc::new(TelemetrySnapshot::empty()));
        let shared = Arc::new(SharedState::default());
        let cancel = CancellationToken::new();
        let poll_interval = config.poll_interval;

        let thread = Producer::new(source, publisher, Arc::clone(&shared), cancel.clone(), config)
            .spawn()?;

        Ok(Self {
            handle: TelemetryHandle { snapshots, shared, poll_interval },
            cancel,
            producer: Mutex::new(Some(thread)),
        })
    }

    /// A reader handle to give to a consumer.
    pub fn handle(&self) -> TelemetryHandle {
        self.handle.clone()
    }

    pub fn snapshot(&self) -> Arc<TelemetrySnapshot> {
        self.handle.snapshot()
    }

    pub fn telemetry(&self) -> VehicleTelemetry {
        self.handle.telemetry()
    }

    pub fn session_info(&self) -> SessionSummary {
        self.handle.session_info()
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_connected()
    }

    pub fn stats(&self) -> StoreStats {
        self.handle.stats()
    }

    pub fn updates(&self, rate: UpdateRate) -> BoxStream<'static, Arc<TelemetrySnapshot>> {
        self.handle.updates(rate)
    }

    /// Whether the producer thread is still alive.
    pub fn is_running(&self) -> bool {
        self.producer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|thread| !thread.is_finished())
    }

    /// Stop the producer and wait for its thread to exit.
    ///
    /// Returns within about one poll interval. Safe to call more than once;
    /// later calls return immediately.
    pub fn stop(&self) {
        self.cancel.cancel();
        let thread = self.producer.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(thread) = thread {
            if thread.join().is_err() {
                error!("Telemetry producer thread panicked");
            }
            info!("Telemetry store stopped");
        }
    }
}

impl Drop for TelemetryStore {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for TelemetryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryStore")
            .field("running", &self.is_running())
            .field("stats", &self.stats())
            .finish()
    }
}
