//! Immutable telemetry snapshots
//!
//! A [`TelemetrySnapshot`] is built once per successful poll cycle and never
//! modified afterwards. The store hands out `Arc<TelemetrySnapshot>`, so
//! readers can keep one as long as they like without holding anything the
//! producer needs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::SystemTime;

use crate::types::{FieldValue, TelemetryField};

/// Tire surface temperatures (center line), degrees Celsius.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TireTemperatures {
    pub lf: f64,
    pub rf: f64,
    pub lr: f64,
    pub rr: f64,
}

/// Vehicle state at one simulator instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleTelemetry {
    /// Ground speed, m/s
    pub speed: f64,
    /// Engine speed, rev/min
    pub rpm: f64,
    /// -1 reverse, 0 neutral, 1..n forward
    pub gear: i32,
    /// Current lap time, seconds
    pub lap_time: f64,
    /// Fuel remaining, liters
    pub fuel_level: f64,
    /// Steering wheel angle, radians
    pub steering: f64,
    /// 0.0 - 1.0
    pub throttle: f64,
    /// 0.0 - 1.0
    pub brake: f64,
    /// 0.0 - 1.0
    pub clutch: f64,
    pub tire_temps: TireTemperatures,
}

impl VehicleTelemetry {
    /// Mapping view keyed by field name. Gear is widened to `f64`.
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            (TelemetryField::Speed.key(), self.speed),
            (TelemetryField::Rpm.key(), self.rpm),
            (TelemetryField::Gear.key(), self.gear as f64),
            (TelemetryField::LapCurrentLapTime.key(), self.lap_time),
            (TelemetryField::FuelLevel.key(), self.fuel_level),
            (TelemetryField::SteeringWheelAngle.key(), self.steering),
            (TelemetryField::Throttle.key(), self.throttle),
            (TelemetryField::Brake.key(), self.brake),
            (TelemetryField::Clutch.key(), self.clutch),
            (TelemetryField::TireTempLf.key(), self.tire_temps.lf),
            (TelemetryField::TireTempRf.key(), self.tire_temps.rf),
            (TelemetryField::TireTempLr.key(), self.tire_temps.lr),
            (TelemetryField::TireTempRr.key(), self.tire_temps.rr),
        ])
    }
}

/// Session metadata at one simulator instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub track: String,
    /// "Practice", "Lone Qualify", "Race", ...
    pub session_type: String,
    /// Seconds left in the session
    pub session_time_remaining: f64,
    /// Laps left, or [`SessionSummary::UNLIMITED_LAPS`]
    pub laps_remaining: i32,
}

impl SessionSummary {
    /// iRacing's sentinel for sessions without a lap limit
    pub const UNLIMITED_LAPS: i32 = 32767;

    pub fn has_unlimited_laps(&self) -> bool {
        self.laps_remaining == Self::UNLIMITED_LAPS
    }

    /// Mapping view with keys `track`, `session_type`, `session_time`, `session_laps`.
    pub fn to_map(&self) -> BTreeMap<&'static str, FieldValue> {
        BTreeMap::from([
            ("track", FieldValue::Text(self.track.clone())),
            ("session_type", FieldValue::Text(self.session_type.clone())),
            (TelemetryField::SessionTimeRemain.key(), FieldValue::Float(self.session_time_remaining)),
            (TelemetryField::SessionLapsRemain.key(), FieldValue::Int(self.laps_remaining as i64)),
        ])
    }
}

/// One consistent instant of vehicle telemetry and session metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Publication order. 0 is reserved for the empty snapshot a store starts with
    pub sequence: u64,
    /// Wall-clock time the pass that built this snapshot finished
    pub captured_at: Option<SystemTime>,
    pub vehicle: VehicleTelemetry,
    pub session: SessionSummary,
}

impl TelemetrySnapshot {
    /// The canonical empty snapshot: every number zero, every string empty.
    pub fn empty() -> Self {
        Self {
            sequence: 0,
            captured_at: None,
            vehicle: VehicleTelemetry::default(),
            session: SessionSummary::default(),
        }
    }

    pub(crate) fn new(sequence: u64, vehicle: VehicleTelemetry, session: SessionSummary) -> Self {
        Self { sequence, captured_at: Some(SystemTime::now()), vehicle, session }
    }

    /// Empty values published after the canonical empty one.
    pub(crate) fn cleared(sequence: u64) -> Self {
        Self { sequence, ..Self::empty() }
    }

    /// Whether this snapshot carries no data.
    pub fn is_empty(&self) -> bool {
        self.vehicle == VehicleTelemetry::default() && self.session == SessionSummary::default()
    }
}

impl Default for TelemetrySnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_is_all_zero() {
        let snapshot = TelemetrySnapshot::empty();
        assert_eq!(snapshot.sequence, 0);
        assert!(snapshot.is_empty());
        assert!(snapshot.vehicle.to_map().values().all(|v| *v == 0.0));

        let session = snapshot.session.to_map();
        assert_eq!(session["track"], FieldValue::Text(String::new()));
        assert_eq!(session["session_type"], FieldValue::Text(String::new()));
        assert_eq!(session["session_time"], FieldValue::Float(0.0));
        assert_eq!(session["session_laps"], FieldValue::Int(0));
    }

    #[test]
    fn vehicle_map_has_every_field_key() {
        let vehicle = VehicleTelemetry { gear: -1, speed: 12.5, ..Default::default() };
        let map = vehicle.to_map();
        assert_eq!(map.len(), TelemetryField::VEHICLE.len());
        for field in TelemetryField::VEHICLE {
            assert!(map.contains_key(field.key()), "missing {}", field.key());
        }
        assert_eq!(map["gear"], -1.0);
        assert_eq!(map["speed"], 12.5);
    }

    #[test]
    fn cleared_snapshot_keeps_its_sequence() {
        let cleared = TelemetrySnapshot::cleared(7);
        assert_eq!(cleared.sequence, 7);
        assert!(cleared.is_empty());
    }

    #[test]
    fn unlimited_laps_sentinel() {
        let session = SessionSummary { laps_remaining: 32767, ..Default::default() };
        assert!(session.has_unlimited_laps());
        assert!(!SessionSummary { laps_remaining: 12, ..Default::default() }.has_unlimited_laps());
    }
}
