//! Rolling pedal input history for scrolling graphs

use std::collections::VecDeque;

use crate::snapshot::TelemetrySnapshot;

/// About five seconds of samples at a 20 Hz redraw
pub const DEFAULT_CAPACITY: usize = 100;

/// Throttle and brake positions at one instant
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputSample {
    pub throttle: f64,
    pub brake: f64,
}

/// Bounded ring of [`InputSample`]s, oldest first.
///
/// Feed it snapshots with [`InputHistory::record`]; a snapshot already seen
/// (same sequence) is ignored, so redrawing faster than the store publishes
/// does not stretch the graph.
#[derive(Debug, Clone)]
pub struct InputHistory {
    samples: VecDeque<InputSample>,
    capacity: usize,
    last_sequence: Option<u64>,
}

impl Default for InputHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl InputHistory {
    /// A ring holding at most `capacity` samples (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { samples: VecDeque::with_capacity(capacity), capacity, last_sequence: None }
    }

    /// Append the snapshot's pedal positions. Returns whether it was new.
    pub fn record(&mut self, snapshot: &TelemetrySnapshot) -> bool {
        if self.last_sequence == Some(snapshot.sequence) {
            return false;
        }
        self.last_sequence = Some(snapshot.sequence);
        self.push(InputSample { throttle: snapshot.vehicle.throttle, brake: snapshot.vehicle.brake });
        true
    }

    pub fn push(&mut self, sample: InputSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn samples(&self) -> impl ExactSizeIterator<Item = &InputSample> + '_ {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// A graph needs two points to draw a line
    pub fn is_drawable(&self) -> bool {
        self.samples.len() >= 2
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.last_sequence = None;
    }
}
