//! Test utilities: a scriptable [`SimulatorSource`]
//!
//! [`ScriptedSource`] is cheap to clone and every clone shares the same state,
//! so a test can hand one clone to a store and keep another to flip
//! availability, change field values or inject failures while the producer is
//! running.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::snapshot::VehicleTelemetry;
use crate::source::SimulatorSource;
use crate::types::{FieldValue, TelemetryField};
use crate::{Result, TelemetryError};

/// How an injected field failure behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailMode {
    /// `read_field` returns `SourceUnavailable`
    Error,
    /// `read_field` panics
    Panic,
}

#[derive(Debug, Default)]
struct ScriptState {
    available: bool,
    connected: bool,
    pending: HashMap<String, FieldValue>,
    latched: HashMap<String, FieldValue>,
    session_info: Option<String>,
    fail_on: Option<(String, FailMode)>,
    fail_begin_pass: bool,
    panic_on_status: bool,
    ticking: bool,
    tick: u64,
    connect_delay: Duration,
    connect_attempts: u64,
    passes: u64,
    field_reads: u64,
}

/// In-memory simulator feed driven by the test.
///
/// Field writes go to a pending frame; `begin_pass` latches it, so one pass
/// always reads one frame even if the test writes concurrently.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    state: Arc<Mutex<ScriptState>>,
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedSource {
    /// A source whose simulator is running, with no fields published yet.
    pub fn new() -> Self {
        Self { state: Arc::new(Mutex::new(ScriptState { available: true, ..Default::default() })) }
    }

    /// A source whose simulator is not running.
    pub fn unavailable() -> Self {
        let source = Self::new();
        source.set_available(false);
        source
    }

    /// A running source where every pass sees a new frame: all vehicle fields
    /// equal to the pass number.
    pub fn ticking() -> Self {
        let source = Self::new();
        source.state().ticking = true;
        source
    }

    fn state(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start or stop the simulator. Stopping also drops the connection.
    pub fn set_available(&self, available: bool) {
        let mut state = self.state();
        state.available = available;
        if !available {
            state.connected = false;
        }
    }

    pub fn set_field(&self, name: &str, value: impl Into<FieldValue>) {
        self.state().pending.insert(name.to_string(), value.into());
    }

    pub fn remove_field(&self, name: &str) {
        self.state().pending.remove(name);
    }

    /// Set every vehicle field to `value` (gear to `value` truncated).
    pub fn populate_vehicle(&self, value: f64) {
        populate(&mut self.state().pending, value);
    }

    pub fn set_session_info(&self, document: Option<&str>) {
        self.state().session_info = document.map(str::to_string);
    }

    /// Make reads of `name` fail until cleared with [`ScriptedSource::clear_failure`].
    pub fn fail_on_field(&self, name: &str, mode: FailMode) {
        self.state().fail_on = Some((name.to_string(), mode));
    }

    pub fn clear_failure(&self) {
        let mut state = self.state();
        state.fail_on = None;
        state.fail_begin_pass = false;
        state.panic_on_status = false;
    }

    pub fn fail_begin_pass(&self, fail: bool) {
        self.state().fail_begin_pass = fail;
    }

    /// Make `is_connected` panic until cleared with [`ScriptedSource::clear_failure`].
    pub fn panic_on_connection_check(&self, panic: bool) {
        self.state().panic_on_status = panic;
    }

    /// Make `connect` block for `delay` before answering.
    pub fn set_connect_delay(&self, delay: Duration) {
        self.state().connect_delay = delay;
    }

    pub fn connect_attempts(&self) -> u64 {
        self.state().connect_attempts
    }

    /// Number of `begin_pass` calls
    pub fn passes(&self) -> u64 {
        self.state().passes
    }

    pub fn field_reads(&self) -> u64 {
        self.state().field_reads
    }
}

fn populate(frame: &mut HashMap<String, FieldValue>, value: f64) {
    for field in TelemetryField::VEHICLE {
        let field_value = match field {
            TelemetryField::Gear => FieldValue::Int(value as i64),
            _ => FieldValue::Float(value),
        };
        frame.insert(field.sdk_name().to_string(), field_value);
    }
}

impl SimulatorSource for ScriptedSource {
    fn connect(&mut self) -> bool {
        let delay = {
            let mut state = self.state();
            state.connect_attempts += 1;
            state.connect_delay
        };
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        let mut state = self.state();
        state.connected = state.available;
        state.connected
    }

    fn is_connected(&self) -> bool {
        let state = self.state();
        if state.panic_on_status {
            drop(state);
            panic!("scripted panic checking the connection");
        }
        state.connected && state.available
    }

    fn begin_pass(&mut self) -> Result<()> {
        let mut state = self.state();
        state.passes += 1;
        if state.fail_begin_pass {
            return Err(TelemetryError::source_unavailable("scripted latch failure"));
        }
        if state.ticking {
            state.tick += 1;
            let tick = state.tick as f64;
            populate(&mut state.pending, tick);
        }
        state.latched = state.pending.clone();
        Ok(())
    }

    fn read_field(&self, name: &str) -> Result<Option<FieldValue>> {
        let mut state = self.state();
        state.field_reads += 1;
        let failure = match &state.fail_on {
            Some((failing, mode)) if failing == name => Some(*mode),
            _ => None,
        };
        match failure {
            Some(FailMode::Error) => {
                Err(TelemetryError::source_unavailable(format!("scripted failure reading {name}")))
            }
            Some(FailMode::Panic) => {
                drop(state);
                panic!("scripted panic reading {name}");
            }
            None => Ok(state.latched.get(name).cloned()),
        }
    }

    fn read_session_info(&self) -> Result<Option<String>> {
        Ok(self.state().session_info.clone())
    }
}

/// Whether every vehicle field carries the same value, as [`ScriptedSource`]
/// frames do. A snapshot mixing two frames fails this check.
pub fn is_uniform(vehicle: &VehicleTelemetry) -> bool {
    let value = vehicle.speed;
    vehicle.to_map().iter().all(|(key, v)| match *key {
        "gear" => *v == (value as i64) as f64,
        _ => *v == value,
    })
}

/// Poll `condition` every few milliseconds until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
}
