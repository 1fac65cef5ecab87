//! Text overlay in the terminal
//!
//! Plays a recording through a `TelemetryStore` and prints a dashboard line
//! five times a second, with a pedal history bar underneath.
//!
//! ```text
//! cargo run --example console_overlay -- path/to/recording.yaml
//! RUST_LOG=pitwall_overlay=debug cargo run --example console_overlay
//! ```
//!
//! Without a path a synthetic lap is generated.

use anyhow::Context;
use futures::StreamExt;
use pitwall_overlay::sources::{RecordedFrame, Recording};
use pitwall_overlay::{
    DisplayTelemetry, FieldValue, InputHistory, RecordingSource, StoreConfig, TelemetryField,
    TelemetryStore, UpdateRate,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const RUN_FOR: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let source = match std::env::args().nth(1) {
        Some(path) => RecordingSource::open(&path)
            .with_context(|| format!("loading recording {path}"))?
            .with_looping(true),
        None => RecordingSource::new(synthetic_lap()),
    };

    let store = TelemetryStore::with_config(source, StoreConfig::default())?;
    let overlay = store.handle();
    let mut history = InputHistory::default();
    let mut updates = overlay.updates(UpdateRate::Max(5));

    let deadline = tokio::time::sleep(RUN_FOR);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            update = updates.next() => {
                let Some(snapshot) = update else { break };
                if snapshot.is_empty() {
                    println!("waiting for telemetry...");
                    continue;
                }
                history.record(&snapshot);

                let display = DisplayTelemetry::from(&snapshot.vehicle);
                println!(
                    "{} | {} | {} | gear {} | lap {} | thr {} brk {} | {}",
                    snapshot.session.track,
                    snapshot.session.session_type,
                    display.speed_kph,
                    display.gear,
                    display.lap_time,
                    display.throttle,
                    display.brake,
                    display.tire_temps.join(" "),
                );
                println!("  {}", pedal_bar(&history));
            }
        }
    }

    println!("stats: {:?}", store.stats());
    store.stop();
    Ok(())
}

/// Throttle as `#`, brake as `=`, idle as `.`, newest on the right
fn pedal_bar(history: &InputHistory) -> String {
    history
        .samples()
        .map(|sample| match (sample.throttle > 0.5, sample.brake > 0.5) {
            (_, true) => '=',
            (true, false) => '#',
            (false, false) => '.',
        })
        .collect()
}

fn synthetic_lap() -> Recording {
    let frames = (0..400)
        .map(|i| {
            let t = i as f64 / 20.0;
            let braking = (i / 50) % 2 == 1;
            let mut frame = RecordedFrame::new();
            let mut set = |field: TelemetryField, value: FieldValue| {
                frame.insert(field.sdk_name().to_string(), value);
            };
            set(TelemetryField::Speed, FieldValue::Float(30.0 + 15.0 * (t / 3.0).sin()));
            set(TelemetryField::Rpm, FieldValue::Float(5500.0 + 1500.0 * (t / 3.0).sin()));
            set(TelemetryField::Gear, FieldValue::Int(3 + ((t / 3.0).sin() > 0.0) as i64));
            set(TelemetryField::LapCurrentLapTime, FieldValue::Float(t));
            set(TelemetryField::FuelLevel, FieldValue::Float(40.0 - t * 0.01));
            set(TelemetryField::SteeringWheelAngle, FieldValue::Float(0.4 * (t / 2.0).cos()));
            set(TelemetryField::Throttle, FieldValue::Float(if braking { 0.0 } else { 1.0 }));
            set(TelemetryField::Brake, FieldValue::Float(if braking { 0.8 } else { 0.0 }));
            set(TelemetryField::Clutch, FieldValue::Float(0.0));
            for tire in [
                TelemetryField::TireTempLf,
                TelemetryField::TireTempRf,
                TelemetryField::TireTempLr,
                TelemetryField::TireTempRr,
            ] {
                set(tire, FieldValue::Float(75.0 + t * 0.05));
            }
            set(TelemetryField::SessionNum, FieldValue::Int(0));
            set(TelemetryField::SessionTimeRemain, FieldValue::Float(1800.0 - t));
            set(TelemetryField::SessionLapsRemain, FieldValue::Int(32767));
            frame
        })
        .collect();

    Recording {
        session_info: Some(
            "WeekendInfo:\n  TrackName: okayama full\nSessionInfo:\n  Sessions:\n  - SessionNum: 0\n    SessionType: Offline Testing\n"
                .to_string(),
        ),
        frames,
        looping: true,
    }
}
