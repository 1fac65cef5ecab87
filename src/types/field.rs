//! The fixed set of simulator fields the overlays consume

/// A named telemetry quantity published by iRacing.
///
/// Each field has two names: the variable name in the simulator feed and the
/// key consumers see in the mapping view of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TelemetryField {
    Speed,
    Rpm,
    Gear,
    LapCurrentLapTime,
    FuelLevel,
    SteeringWheelAngle,
    Throttle,
    Brake,
    Clutch,
    TireTempLf,
    TireTempRf,
    TireTempLr,
    TireTempRr,
    SessionNum,
    SessionTimeRemain,
    SessionLapsRemain,
}

impl TelemetryField {
    /// Vehicle fields, in the order a sampling pass reads them. All are required.
    pub const VEHICLE: [TelemetryField; 13] = [
        TelemetryField::Speed,
        TelemetryField::Rpm,
        TelemetryField::Gear,
        TelemetryField::LapCurrentLapTime,
        TelemetryField::FuelLevel,
        TelemetryField::SteeringWheelAngle,
        TelemetryField::Throttle,
        TelemetryField::Brake,
        TelemetryField::Clutch,
        TelemetryField::TireTempLf,
        TelemetryField::TireTempRf,
        TelemetryField::TireTempLr,
        TelemetryField::TireTempRr,
    ];

    /// Session fields read from the live feed. Absent values default to zero.
    pub const SESSION: [TelemetryField; 3] = [
        TelemetryField::SessionNum,
        TelemetryField::SessionTimeRemain,
        TelemetryField::SessionLapsRemain,
    ];

    /// Variable name in the iRacing feed.
    pub const fn sdk_name(self) -> &'static str {
        match self {
            TelemetryField::Speed => "Speed",
            TelemetryField::Rpm => "RPM",
            TelemetryField::Gear => "Gear",
            TelemetryField::LapCurrentLapTime => "LapCurrentLapTime",
            TelemetryField::FuelLevel => "FuelLevel",
            TelemetryField::SteeringWheelAngle => "SteeringWheelAngle",
            TelemetryField::Throttle => "Throttle",
            TelemetryField::Brake => "Brake",
            TelemetryField::Clutch => "Clutch",
            TelemetryField::TireTempLf => "LFtempCL",
            TelemetryField::TireTempRf => "RFtempCL",
            TelemetryField::TireTempLr => "LRtempCL",
            TelemetryField::TireTempRr => "RRtempCL",
            TelemetryField::SessionNum => "SessionNum",
            TelemetryField::SessionTimeRemain => "SessionTimeRemain",
            TelemetryField::SessionLapsRemain => "SessionLapsRemain",
        }
    }

    /// Key in the consumer mapping view.
    pub const fn key(self) -> &'static str {
        match self {
            TelemetryField::Speed => "speed",
            TelemetryField::Rpm => "rpm",
            TelemetryField::Gear => "gear",
            TelemetryField::LapCurrentLapTime => "lap_time",
            TelemetryField::FuelLevel => "fuel_level",
            TelemetryField::SteeringWheelAngle => "steering",
            TelemetryField::Throttle => "throttle",
            TelemetryField::Brake => "brake",
            TelemetryField::Clutch => "clutch",
            TelemetryField::TireTempLf => "tire_temp_LF",
            TelemetryField::TireTempRf => "tire_temp_RF",
            TelemetryField::TireTempLr => "tire_temp_LR",
            TelemetryField::TireTempRr => "tire_temp_RR",
            TelemetryField::SessionNum => "session_num",
            TelemetryField::SessionTimeRemain => "session_time",
            TelemetryField::SessionLapsRemain => "session_laps",
        }
    }

    /// Look a field up by its feed variable name.
    pub fn from_sdk_name(name: &str) -> Option<Self> {
        Self::VEHICLE.into_iter().chain(Self::SESSION).find(|field| field.sdk_name() == name)
    }
}

impl std::fmt::Display for TelemetryField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.sdk_name())
    }
}
