//! One sampling pass over a [`SimulatorSource`]
//!
//! A pass either reads every required field and yields a complete [`Sample`],
//! or stops at the first failure and yields the error. There is no partial
//! result to leak.

use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::session::SessionDocumentCache;
use crate::snapshot::{SessionSummary, TireTemperatures, VehicleTelemetry};
use crate::source::SimulatorSource;
use crate::types::{FieldValue, TelemetryField};
use crate::{Result, TelemetryError};

/// Everything one successful pass read
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub vehicle: VehicleTelemetry,
    pub session: SessionSummary,
}

/// What a poll cycle did
#[derive(Debug)]
pub enum PassOutcome {
    /// A new snapshot went out with this sequence number
    Published(u64),
    /// The simulator is not attached; nothing was read
    Disconnected,
    /// The pass failed and the previous snapshot was kept
    Skipped(TelemetryError),
}

/// Run one pass, converting a panic inside the source into an error.
pub fn sample_guarded<S: SimulatorSource + ?Sized>(
    source: &mut S,
    cache: &mut SessionDocumentCache,
) -> Result<Sample> {
    match catch_unwind(AssertUnwindSafe(|| sample(source, cache))) {
        Ok(result) => result,
        Err(payload) => {
            Err(TelemetryError::SourcePanicked { details: panic_message(payload.as_ref()) })
        }
    }
}

/// Run one pass: latch, read vehicle fields, then session metadata.
pub fn sample<S: SimulatorSource + ?Sized>(
    source: &mut S,
    cache: &mut SessionDocumentCache,
) -> Result<Sample> {
    source.begin_pass()?;
    let vehicle = read_vehicle(&*source)?;
    let session = read_session(&*source, cache)?;
    Ok(Sample { vehicle, session })
}

fn read_vehicle<S: SimulatorSource + ?Sized>(source: &S) -> Result<VehicleTelemetry> {
    Ok(VehicleTelemetry {
        speed: required_f64(source, TelemetryField::Speed)?,
        rpm: required_f64(source, TelemetryField::Rpm)?,
        gear: required_i32(source, TelemetryField::Gear)?,
        lap_time: required_f64(source, TelemetryField::LapCurrentLapTime)?,
        fuel_level: required_f64(source, TelemetryField::FuelLevel)?,
        steering: required_f64(source, TelemetryField::SteeringWheelAngle)?,
        throttle: required_f64(source, TelemetryField::Throttle)?,
        brake: required_f64(source, TelemetryField::Brake)?,
        clutch: required_f64(source, TelemetryField::Clutch)?,
        tire_temps: TireTemperatures {
            lf: required_f64(source, TelemetryField::TireTempLf)?,
            rf: required_f64(source, TelemetryField::TireTempRf)?,
            lr: required_f64(source, TelemetryField::TireTempLr)?,
            rr: required_f64(source, TelemetryField::TireTempRr)?,
        },
    })
}

fn read_session<S: SimulatorSource + ?Sized>(
    source: &S,
    cache: &mut SessionDocumentCache,
) -> Result<SessionSummary> {
    let document = match source.read_session_info()? {
        Some(raw) if !raw.trim().is_empty() => Some(cache.parse(&raw)?),
        _ => None,
    };

    let session_num = optional_i32(source, TelemetryField::SessionNum)?
        .or_else(|| document.as_ref().and_then(|d| d.session_info.current_session_num))
        .unwrap_or(0);

    let (track, session_type) = match &document {
        Some(document) => (
            document.weekend_info.track_name.clone(),
            document.session_type(session_num).to_string(),
        ),
        None => (String::new(), String::new()),
    };

    Ok(SessionSummary {
        track,
        session_type,
        session_time_remaining: optional_f64(source, TelemetryField::SessionTimeRemain)?
            .unwrap_or(0.0),
        laps_remaining: optional_i32(source, TelemetryField::SessionLapsRemain)?.unwrap_or(0),
    })
}

fn required<S: SimulatorSource + ?Sized>(source: &S, field: TelemetryField) -> Result<FieldValue> {
    source
        .read_field(field.sdk_name())?
        .ok_or_else(|| TelemetryError::field_not_found(field.sdk_name()))
}

fn required_f64<S: SimulatorSource + ?Sized>(source: &S, field: TelemetryField) -> Result<f64> {
    to_f64(field, &required(source, field)?)
}

fn required_i32<S: SimulatorSource + ?Sized>(source: &S, field: TelemetryField) -> Result<i32> {
    to_i32(field, &required(source, field)?)
}

fn optional_f64<S: SimulatorSource + ?Sized>(
    source: &S,
    field: TelemetryField,
) -> Result<Option<f64>> {
    source.read_field(field.sdk_name())?.map(|value| to_f64(field, &value)).transpose()
}

fn optional_i32<S: SimulatorSource + ?Sized>(
    source: &S,
    field: TelemetryField,
) -> Result<Option<i32>> {
    source.read_field(field.sdk_name())?.map(|value| to_i32(field, &value)).transpose()
}

fn to_f64(field: TelemetryField, value: &FieldValue) -> Result<f64> {
    value.as_f64().ok_or_else(|| {
        TelemetryError::type_conversion(
            field.sdk_name(),
            format!("expected a number, got {}", value.kind()),
        )
    })
}

fn to_i32(field: TelemetryField, value: &FieldValue) -> Result<i32> {
    value.as_i32().ok_or_else(|| {
        TelemetryError::type_conversion(
            field.sdk_name(),
            format!("expected an integer, got {} ({:?})", value.kind(), value),
        )
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
