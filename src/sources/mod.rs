//! Bundled [`SimulatorSource`](crate::SimulatorSource) implementations

pub mod recording;

pub use recording::{RecordedFrame, Recording, RecordingSource};
