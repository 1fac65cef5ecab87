//! Producer loop: connect, sample, publish, sleep

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::SharedState;
use crate::config::StoreConfig;
use crate::sampler::{self, PassOutcome};
use crate::session::SessionDocumentCache;
use crate::snapshot::TelemetrySnapshot;
use crate::source::SimulatorSource;
use crate::{Result, TelemetryError};

/// Repeated waits and failures are logged on the first cycle and then every Nth
const LOG_EVERY: u64 = 20;

/// Owns the source and the publishing side of the snapshot channel.
pub(super) struct Producer<S: SimulatorSource> {
    source: Arc<Mutex<S>>,
    publisher: watch::Sender<Arc<TelemetrySnapshot>>,
    shared: Arc<SharedState>,
    cancel: CancellationToken,
    config: StoreConfig,
    session_cache: SessionDocumentCache,
    /// A connect call that outlived its timeout and has not returned yet
    pending_connect: Option<JoinHandle<bool>>,
    sequence: u64,
    was_connected: bool,
    waiting_cycles: u64,
    consecutive_skips: u64,
    status_panics: u64,
}

fn lock<S>(source: &Mutex<S>) -> MutexGuard<'_, S> {
    source.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S: SimulatorSource> Producer<S> {
    pub(super) fn new(
        source: S,
        publisher: watch::Sender<Arc<TelemetrySnapshot>>,
        shared: Arc<SharedState>,
        cancel: CancellationToken,
        config: StoreConfig,
    ) -> Self {
        Self {
            source: Arc::new(Mutex::new(source)),
            publisher,
            shared,
            cancel,
            config,
            session_cache: SessionDocumentCache::new(),
            pending_connect: None,
            sequence: 0,
            was_connected: false,
            waiting_cycles: 0,
            consecutive_skips: 0,
            status_panics: 0,
        }
    }

    /// Start the producer on its own named thread.
    ///
    /// The thread drives a current-thread runtime so the poll sleep and the
    /// connect timeout can both be interrupted by cancellation.
    pub(super) fn spawn(self) -> Result<std::thread::JoinHandle<()>> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .max_blocking_threads(1)
            .build()
            .map_err(|source| TelemetryError::Spawn { source })?;

        std::thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || {
                runtime.block_on(self.run());
                // A connect call stuck in the source must not hold up stop()
                runtime.shutdown_background();
            })
            .map_err(|source| TelemetryError::Spawn { source })
    }

    async fn run(mut self) {
        info!(
            poll_interval = ?self.config.poll_interval,
            connect_timeout = ?self.config.connect_timeout,
            "Telemetry producer started"
        );

        while !self.cancel.is_cancelled() {
            let outcome = self.poll_cycle().await;
            self.record(outcome);

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        self.shared.connected.store(false, Ordering::Release);
        info!(published = self.sequence, "Telemetry producer stopped");
    }

    async fn poll_cycle(&mut self) -> PassOutcome {
        let connected = self.ensure_connected().await;
        self.track_connection(connected);
        if !connected {
            return PassOutcome::Disconnected;
        }

        let result = {
            let mut source = lock(&self.source);
            sampler::sample_guarded(&mut *source, &mut self.session_cache)
        };

        match result {
            Ok(sample) => PassOutcome::Published(
                self.publish(|sequence| {
                    TelemetrySnapshot::new(sequence, sample.vehicle, sample.session)
                }),
            ),
            Err(error) => PassOutcome::Skipped(error),
        }
    }

    /// Make sure the source is attached, attempting a bounded connect if not.
    async fn ensure_connected(&mut self) -> bool {
        if let Some(attempt) = self.pending_connect.take() {
            if !attempt.is_finished() {
                trace!("Previous connect attempt still running");
                self.pending_connect = Some(attempt);
                return false;
            }
            return connect_result(attempt.await);
        }

        if self.source_reports_connected() {
            return true;
        }

        let attempt_number = self.shared.connect_attempts.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(attempt = attempt_number, "Attempting to connect to iRacing");

        let source = Arc::clone(&self.source);
        let mut attempt = tokio::task::spawn_blocking(move || lock(&source).connect());

        let finished = tokio::select! {
            _ = self.cancel.cancelled() => None,
            result = tokio::time::timeout(self.config.connect_timeout, &mut attempt) => Some(result),
        };

        match finished {
            Some(Ok(result)) => connect_result(result),
            Some(Err(_elapsed)) => {
                let error = TelemetryError::Timeout { duration: self.config.connect_timeout };
                warn!(%error, "Connect attempt still running; polling continues without it");
                self.pending_connect = Some(attempt);
                false
            }
            None => {
                self.pending_connect = Some(attempt);
                false
            }
        }
    }

    /// `is_connected` on the source; a panic there counts as not connected.
    fn source_reports_connected(&mut self) -> bool {
        let source = &self.source;
        match catch_unwind(AssertUnwindSafe(|| lock(source).is_connected())) {
            Ok(connected) => {
                self.status_panics = 0;
                connected
            }
            Err(_) => {
                self.status_panics += 1;
                if self.status_panics == 1 || self.status_panics % LOG_EVERY == 0 {
                    error!(
                        consecutive = self.status_panics,
                        "Connection check panicked; treating the source as disconnected"
                    );
                }
                false
            }
        }
    }

    fn track_connection(&mut self, connected: bool) {
        self.shared.connected.store(connected, Ordering::Release);
        if connected == self.was_connected {
            return;
        }
        self.was_connected = connected;

        if connected {
            info!(waited_cycles = self.waiting_cycles, "iRacing session detected");
            self.waiting_cycles = 0;
            return;
        }

        info!("iRacing disconnected");
        if self.config.clear_on_disconnect {
            self.session_cache.clear();
            let sequence = self.publish(TelemetrySnapshot::cleared);
            debug!(sequence, "Published empty snapshot after disconnect");
        }
    }

    fn publish(&mut self, build: impl FnOnce(u64) -> TelemetrySnapshot) -> u64 {
        self.sequence += 1;
        self.publisher.send_replace(Arc::new(build(self.sequence)));
        self.shared.published.fetch_add(1, Ordering::Relaxed);
        self.sequence
    }

    fn record(&mut self, outcome: PassOutcome) {
        match outcome {
            PassOutcome::Published(sequence) => {
                if self.consecutive_skips > 0 {
                    info!(skipped = self.consecutive_skips, "Telemetry sampling recovered");
                    self.consecutive_skips = 0;
                }
                trace!(sequence, "Published snapshot");
            }
            PassOutcome::Disconnected => {
                self.consecutive_skips = 0;
                self.waiting_cycles += 1;
                if self.waiting_cycles == 1 {
                    info!("Waiting for iRacing to start a session...");
                } else if self.waiting_cycles % LOG_EVERY == 0 {
                    debug!(cycles = self.waiting_cycles, "Still waiting for iRacing session");
                }
            }
            PassOutcome::Skipped(error) => {
                self.shared.skipped.fetch_add(1, Ordering::Relaxed);
                self.consecutive_skips += 1;
                let consecutive = self.consecutive_skips;
                if consecutive != 1 && consecutive % LOG_EVERY != 0 {
                    return;
                }

                match &error {
                    TelemetryError::SourcePanicked { .. } => {
                        error!(consecutive, %error, "Telemetry source panicked; keeping last snapshot")
                    }
                    error if error.is_retryable() => {
                        debug!(consecutive, %error, "Sampling pass skipped; keeping last snapshot")
                    }
                    error => {
                        warn!(consecutive, %error, "Unexpected sampling failure; keeping last snapshot")
                    }
                }
            }
        }
    }
}

fn connect_result(result: std::result::Result<bool, JoinError>) -> bool {
    match result {
        Ok(connected) => connected,
        Err(err) if err.is_panic() => {
            error!("Connect attempt panicked");
            false
        }
        Err(_) => false,
    }
}
