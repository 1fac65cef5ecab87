//! Formatting helpers for overlay text

use crate::snapshot::VehicleTelemetry;

const MS_TO_KPH: f64 = 3.6;
const MS_TO_MPH: f64 = 2.236_936;

/// Vehicle telemetry rendered to display strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayTelemetry {
    pub speed_kph: String,
    pub speed_mph: String,
    pub rpm: String,
    pub gear: String,
    pub lap_time: String,
    pub fuel_level: String,
    pub steering: String,
    pub throttle: String,
    pub brake: String,
    pub clutch: String,
    /// LF, RF, LR, RR
    pub tire_temps: [String; 4],
}

impl From<&VehicleTelemetry> for DisplayTelemetry {
    fn from(vehicle: &VehicleTelemetry) -> Self {
        let temps = vehicle.tire_temps;
        Self {
            speed_kph: format_speed_kph(vehicle.speed),
            speed_mph: format_speed_mph(vehicle.speed),
            rpm: format!("{:.0}", vehicle.rpm),
            gear: format_gear(vehicle.gear),
            lap_time: format_lap_time(vehicle.lap_time),
            fuel_level: format!("{:.1} L", vehicle.fuel_level),
            steering: format_steering(vehicle.steering),
            throttle: format_percentage(vehicle.throttle),
            brake: format_percentage(vehicle.brake),
            clutch: format_percentage(vehicle.clutch),
            tire_temps: [temps.lf, temps.rf, temps.lr, temps.rr].map(format_temperature),
        }
    }
}

/// Speed in m/s as km/h.
pub fn format_speed_kph(speed: f64) -> String {
    format!("{:.1} km/h", speed * MS_TO_KPH)
}

/// Speed in m/s as mph.
pub fn format_speed_mph(speed: f64) -> String {
    format!("{:.1} mph", speed * MS_TO_MPH)
}

/// `R` for reverse, `N` for neutral, otherwise the gear number.
pub fn format_gear(gear: i32) -> String {
    match gear {
        g if g < 0 => "R".to_string(),
        0 => "N".to_string(),
        g => g.to_string(),
    }
}

/// Lap time in seconds as `ss.ss` or `m:ss.ss`. iRacing reports a negative
/// time before the first timed lap.
pub fn format_lap_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "--".to_string();
    }
    let seconds = (seconds * 100.0).round() / 100.0;
    let minutes = (seconds / 60.0).floor();
    if minutes == 0.0 {
        format!("{seconds:.2}")
    } else {
        format!("{minutes:.0}:{:05.2}", seconds - minutes * 60.0)
    }
}

/// Pedal position in 0..=1 as a whole percentage.
pub fn format_percentage(value: f64) -> String {
    format!("{:.0}%", value.clamp(0.0, 1.0) * 100.0)
}

/// Steering wheel angle in radians as degrees.
pub fn format_steering(radians: f64) -> String {
    format!("{:.0}°", radians.to_degrees())
}

pub fn format_temperature(celsius: f64) -> String {
    format!("{celsius:.1}°C")
}
