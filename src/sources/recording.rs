//! Playback of recorded telemetry

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use crate::source::SimulatorSource;
use crate::types::FieldValue;
use crate::{Result, TelemetryError};

/// One recorded frame: SDK field name to value
pub type RecordedFrame = HashMap<String, FieldValue>;

/// A recording as stored on disk.
///
/// Each frame must carry every vehicle field (`TelemetryField::VEHICLE`);
/// a frame missing one is skipped by the store like any incomplete pass.
/// Session fields are optional.
///
/// ```yaml
/// looping: true
/// session_info: |
///   WeekendInfo:
///     TrackName: okayama full
/// frames:
///   - { Speed: 41.2, RPM: 6100.0, Gear: 3, LapCurrentLapTime: 12.4,
///       FuelLevel: 31.5, SteeringWheelAngle: 0.05, Throttle: 1.0, Brake: 0.0,
///       Clutch: 0.0, LFtempCL: 78.0, RFtempCL: 79.5, LRtempCL: 76.0,
///       RRtempCL: 77.2, SessionNum: 0 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recording {
    /// Raw session information document, served as-is
    pub session_info: Option<String>,
    pub frames: Vec<RecordedFrame>,
    /// Restart from the first frame instead of ending
    pub looping: bool,
}

/// [`SimulatorSource`] that replays a [`Recording`] one frame per pass.
///
/// The source counts as connected while frames remain. A non-looping recording
/// that has played its last frame disconnects, and the store keeps that last
/// frame as its snapshot.
#[derive(Debug, Clone)]
pub struct RecordingSource {
    recording: Recording,
    /// Index of the frame the current pass reads
    current: Option<usize>,
    next: usize,
    connected: bool,
    frames_played: u64,
}

impl RecordingSource {
    pub fn new(recording: Recording) -> Self {
        Self { recording, current: None, next: 0, connected: false, frames_played: 0 }
    }

    /// Load a recording file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| TelemetryError::file_error(path.to_path_buf(), e))?;
        let source = Self::from_yaml_str(&text)?;
        info!(
            path = %path.display(),
            frames = source.recording.frames.len(),
            looping = source.recording.looping,
            "Opened telemetry recording"
        );
        Ok(source)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let recording: Recording = serde_yaml_ng::from_str(yaml).map_err(|e| {
            TelemetryError::Parse { context: "telemetry recording".to_string(), details: e.to_string() }
        })?;
        Ok(Self::new(recording))
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.recording.looping = looping;
        self
    }

    pub fn recording(&self) -> &Recording {
        &self.recording
    }

    /// Frames latched so far, counting repeats when looping
    pub fn frames_played(&self) -> u64 {
        self.frames_played
    }

    /// Whether a non-looping recording has nothing left to play.
    pub fn is_exhausted(&self) -> bool {
        let frames = self.recording.frames.len();
        if self.recording.looping { frames == 0 } else { self.next >= frames }
    }
}

impl SimulatorSource for RecordingSource {
    fn connect(&mut self) -> bool {
        self.connected = !self.is_exhausted();
        self.connected
    }

    fn is_connected(&self) -> bool {
        self.connected && !self.is_exhausted()
    }

    fn begin_pass(&mut self) -> Result<()> {
        if self.next >= self.recording.frames.len() {
            if !self.recording.looping || self.recording.frames.is_empty() {
                self.connected = false;
                return Err(TelemetryError::source_unavailable("recording has ended"));
            }
            debug!(frames_played = self.frames_played, "Recording looped");
            self.next = 0;
        }

        self.current = Some(self.next);
        self.next += 1;
        self.frames_played += 1;
        Ok(())
    }

    fn read_field(&self, name: &str) -> Result<Option<FieldValue>> {
        Ok(self
            .current
            .and_then(|index| self.recording.frames.get(index))
            .and_then(|frame| frame.get(name))
            .cloned())
    }

    fn read_session_info(&self) -> Result<Option<String>> {
        Ok(self.recording.session_info.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORDING: &str = r#"
session_info: |
  WeekendInfo:
    TrackName: okayama full
frames:
  - { Speed: 10.5, Gear: 2 }
  - { Speed: 11.0, Gear: 3 }
"#;

    fn speed(source: &RecordingSource) -> Option<f64> {
        source.read_field("Speed").expect("readable").and_then(|v| v.as_f64())
    }

    #[test]
    fn plays_frames_in_order() {
        let mut source = RecordingSource::from_yaml_str(RECORDING).expect("parses");
        assert!(source.connect());
        assert_eq!(speed(&source), None);

        source.begin_pass().expect("first frame");
        assert_eq!(speed(&source), Some(10.5));
        assert_eq!(source.read_field("Gear").expect("readable"), Some(FieldValue::Int(2)));

        source.begin_pass().expect("second frame");
        assert_eq!(speed(&source), Some(11.0));
        assert_eq!(source.read_field("RPM").expect("readable"), None);
    }

    #[test]
    fn finished_recording_disconnects_and_keeps_last_frame() {
        let mut source = RecordingSource::from_yaml_str(RECORDING).expect("parses");
        assert!(source.connect());
        source.begin_pass().expect("first frame");
        source.begin_pass().expect("second frame");

        assert!(source.is_exhausted());
        assert!(!source.is_connected());
        assert!(!source.connect());
        assert!(source.begin_pass().is_err());
        assert_eq!(speed(&source), Some(11.0));
    }

    #[test]
    fn looping_recording_restarts() {
        let mut source = RecordingSource::from_yaml_str(RECORDING).expect("parses").with_looping(true);
        assert!(source.connect());
        for _ in 0..3 {
            source.begin_pass().expect("frame");
        }
        assert!(source.is_connected());
        assert_eq!(speed(&source), Some(10.5));
        assert_eq!(source.frames_played(), 3);
    }

    #[test]
    fn fully_recorded_frames_sample_and_partial_ones_do_not() {
        use crate::sampler;
        use crate::session::SessionDocumentCache;

        let recording = r#"
looping: true
session_info: |
  WeekendInfo:
    TrackName: okayama full
frames:
  - { Speed: 41.2, RPM: 6100.0, Gear: 3, LapCurrentLapTime: 12.4,
      FuelLevel: 31.5, SteeringWheelAngle: 0.05, Throttle: 1.0, Brake: 0.0,
      Clutch: 0.0, LFtempCL: 78.0, RFtempCL: 79.5, LRtempCL: 76.0,
      RRtempCL: 77.2, SessionNum: 0 }
"#;
        let mut cache = SessionDocumentCache::new();
        let mut source = RecordingSource::from_yaml_str(recording).expect("parses");
        assert!(source.connect());
        let sample = sampler::sample(&mut source, &mut cache).expect("complete frame samples");
        assert_eq!(sample.vehicle.rpm, 6100.0);
        assert_eq!(sample.session.track, "okayama full");

        let mut partial = RecordingSource::from_yaml_str(RECORDING).expect("parses");
        assert!(partial.connect());
        let result = sampler::sample(&mut partial, &mut cache);
        assert!(matches!(result, Err(TelemetryError::FieldNotFound { .. })));
    }

    #[test]
    fn empty_recording_never_connects() {
        let mut source = RecordingSource::new(Recording { looping: true, ..Default::default() });
        assert!(!source.connect());
        assert!(source.begin_pass().is_err());
    }

    #[test]
    fn session_info_is_served_raw() {
        let source = RecordingSource::from_yaml_str(RECORDING).expect("parses");
        let raw = source.read_session_info().expect("readable").expect("present");
        assert!(raw.contains("TrackName: okayama full"));
    }

    #[test]
    fn malformed_recording_is_a_parse_error() {
        let result = RecordingSource::from_yaml_str("frames: [1, 2");
        assert!(matches!(result, Err(TelemetryError::Parse { .. })));
    }

    #[test]
    fn missing_file_is_a_file_error() {
        let result = RecordingSource::open("/nonexistent/recording.yaml");
        assert!(matches!(result, Err(TelemetryError::File { .. })));
    }
}
