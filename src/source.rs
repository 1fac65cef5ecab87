//! Source trait for the simulator's live feed

use crate::Result;
use crate::types::FieldValue;

/// Trait for simulator telemetry feeds
///
/// A source is owned by the store's producer thread and is only ever called
/// from there, one call at a time. Implementations may block; `connect` is run
/// on a worker and bounded by the store's connect timeout, the remaining calls
/// are made inline during a sampling pass.
pub trait SimulatorSource: Send + 'static {
    /// Try to attach to the simulator.
    ///
    /// Returns whether the source is connected afterwards. Failure is a normal
    /// state, not an error: the store simply tries again next cycle.
    fn connect(&mut self) -> bool;

    /// Whether the simulator is currently attached and publishing.
    fn is_connected(&self) -> bool;

    /// Called once at the start of every sampling pass.
    ///
    /// Sources that double-buffer their data latch the latest frame here so
    /// every field read in the pass comes from the same simulator tick.
    fn begin_pass(&mut self) -> Result<()> {
        Ok(())
    }

    /// Read one variable by feed name.
    ///
    /// Returns:
    /// - `Ok(Some(value))` - The variable is published
    /// - `Ok(None)` - The current feed version does not know this name
    /// - `Err(e)` - The feed could not be read right now
    fn read_field(&self, name: &str) -> Result<Option<FieldValue>>;

    /// Read the raw session info document.
    ///
    /// Returns `Ok(None)` when the simulator has not published one.
    fn read_session_info(&self) -> Result<Option<String>>;
}

impl<S: SimulatorSource + ?Sized> SimulatorSource for Box<S> {
    fn connect(&mut self) -> bool {
        (**self).connect()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn begin_pass(&mut self) -> Result<()> {
        (**self).begin_pass()
    }

    fn read_field(&self, name: &str) -> Result<Option<FieldValue>> {
        (**self).read_field(name)
    }

    fn read_session_info(&self) -> Result<Option<String>> {
        (**self).read_session_info()
    }
}
