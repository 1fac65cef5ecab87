use super::*;
use crate::TelemetryError;
use crate::test_utils::{FailMode, ScriptedSource, is_uniform, wait_until};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const WAIT: Duration = Duration::from_secs(5);

const SESSION_YAML: &str = "\
WeekendInfo:
  TrackName: spa 2024 up
  TrackDisplayName: Circuit de Spa-Francorchamps
SessionInfo:
  CurrentSessionNum: 1
  Sessions:
  - SessionNum: 0
    SessionType: Practice
  - SessionNum: 1
    SessionType: Race
";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

fn fast_config() -> StoreConfig {
    init_tracing();
    StoreConfig::default()
        .with_poll_interval(Duration::from_millis(2))
        .with_connect_timeout(Duration::from_millis(200))
}

fn start(source: &ScriptedSource) -> TelemetryStore {
    TelemetryStore::with_config(source.clone(), fast_config()).expect("store starts")
}

#[test]
fn reads_are_empty_until_the_first_pass() {
    let source = ScriptedSource::unavailable();
    let store = start(&source);

    assert!(wait_until(WAIT, || source.connect_attempts() >= 3));

    let snapshot = store.snapshot();
    assert!(snapshot.is_empty());
    assert_eq!(snapshot.sequence, 0);
    assert_eq!(store.telemetry(), VehicleTelemetry::default());
    assert_eq!(store.session_info(), SessionSummary::default());
    assert!(!store.is_connected());
    assert_eq!(store.stats().published, 0);
}

#[test]
fn publishes_once_the_simulator_appears() {
    let source = ScriptedSource::unavailable();
    source.populate_vehicle(42.0);
    source.set_session_info(Some(SESSION_YAML));
    source.set_field("SessionLapsRemain", 12);
    let store = start(&source);

    assert!(wait_until(WAIT, || source.connect_attempts() >= 2));
    source.set_available(true);
    assert!(wait_until(WAIT, || store.stats().published > 0));

    assert!(store.is_connected());
    assert_eq!(store.telemetry().speed, 42.0);
    assert_eq!(store.telemetry().gear, 42);

    // SessionNum is not published, so CurrentSessionNum picks the race
    let session = store.session_info();
    assert_eq!(session.track, "spa 2024 up");
    assert_eq!(session.session_type, "Race");
    assert_eq!(session.laps_remaining, 12);
    assert_eq!(session.session_time_remaining, 0.0);
}

#[test]
fn disconnect_keeps_the_last_snapshot() {
    let source = ScriptedSource::new();
    source.populate_vehicle(7.0);
    let store = start(&source);
    assert!(wait_until(WAIT, || store.telemetry().speed == 7.0));

    source.set_available(false);
    assert!(wait_until(WAIT, || !store.is_connected()));
    let published = store.stats().published;
    std::thread::sleep(Duration::from_millis(30));

    assert_eq!(store.telemetry().speed, 7.0);
    assert_eq!(store.stats().published, published);

    source.populate_vehicle(8.0);
    source.set_available(true);
    assert!(wait_until(WAIT, || store.telemetry().speed == 8.0));
    assert!(store.is_connected());
}

#[test]
fn clear_on_disconnect_publishes_an_empty_snapshot() {
    let source = ScriptedSource::new();
    source.populate_vehicle(3.0);
    let config = fast_config().with_clear_on_disconnect(true);
    let store = TelemetryStore::with_config(source.clone(), config).expect("store starts");
    assert!(wait_until(WAIT, || store.telemetry().speed == 3.0));

    source.set_available(false);
    assert!(wait_until(WAIT, || store.snapshot().is_empty()));
    assert!(store.snapshot().sequence > 0);
}

#[test]
fn failed_field_read_skips_the_whole_pass() {
    let source = ScriptedSource::new();
    source.populate_vehicle(1.0);
    let store = start(&source);
    assert!(wait_until(WAIT, || store.telemetry().speed == 1.0));

    source.fail_on_field("SteeringWheelAngle", FailMode::Error);
    source.populate_vehicle(2.0);
    let skipped = store.stats().skipped;
    assert!(wait_until(WAIT, || store.stats().skipped >= skipped + 3));

    // Speed, RPM and the rest were readable but nothing from the failed
    // passes may surface
    let vehicle = store.telemetry();
    assert_eq!(vehicle.speed, 1.0);
    assert!(is_uniform(&vehicle));
    assert!(store.is_connected());

    source.clear_failure();
    assert!(wait_until(WAIT, || store.telemetry().speed == 2.0));
}

#[test]
fn missing_field_skips_the_pass() {
    let source = ScriptedSource::new();
    source.populate_vehicle(5.0);
    source.remove_field("Clutch");
    let store = start(&source);

    assert!(wait_until(WAIT, || store.stats().skipped >= 3));
    assert!(store.snapshot().is_empty());

    source.set_field("Clutch", 5.0);
    assert!(wait_until(WAIT, || store.telemetry().clutch == 5.0));
}

#[test]
fn producer_survives_a_panicking_source() {
    let source = ScriptedSource::new();
    source.populate_vehicle(1.0);
    source.fail_on_field("Brake", FailMode::Panic);
    let store = start(&source);

    assert!(wait_until(WAIT, || store.stats().skipped >= 3));
    assert!(store.is_running());
    assert!(store.snapshot().is_empty());

    source.clear_failure();
    assert!(wait_until(WAIT, || store.telemetry().brake == 1.0));
}

#[test]
fn producer_survives_a_panicking_connection_check() {
    let source = ScriptedSource::new();
    source.populate_vehicle(6.0);
    source.panic_on_connection_check(true);
    let store = start(&source);

    // Every cycle falls back to a fresh connect, which succeeds
    assert!(wait_until(WAIT, || source.connect_attempts() >= 3));
    assert!(store.is_running());
    assert!(wait_until(WAIT, || store.telemetry().speed == 6.0));

    source.clear_failure();
    source.populate_vehicle(7.0);
    let attempts = source.connect_attempts();
    assert!(wait_until(WAIT, || store.telemetry().speed == 7.0));
    assert!(store.is_running());
    assert!(store.is_connected());
    assert!(source.connect_attempts() <= attempts + 1);
}

#[test]
fn concurrent_readers_never_see_torn_or_stale_snapshots() {
    let source = ScriptedSource::ticking();
    let store = TelemetryStore::with_config(
        source.clone(),
        fast_config().with_poll_interval(Duration::from_millis(1)),
    )
    .expect("store starts");

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let handle = store.handle();
            std::thread::spawn(move || {
                let deadline = Instant::now() + Duration::from_millis(300);
                let mut last = 0;
                let mut reads = 0u64;
                while Instant::now() < deadline {
                    let snapshot = handle.snapshot();
                    assert!(snapshot.sequence >= last, "sequence went backwards");
                    assert!(is_uniform(&snapshot.vehicle), "torn snapshot: {snapshot:?}");
                    last = snapshot.sequence;
                    reads += 1;
                }
                (last, reads)
            })
        })
        .collect();

    for reader in readers {
        let (last, reads) = reader.join().expect("reader finished");
        assert!(reads > 0);
        assert!(last > 0, "reader never saw a published snapshot");
    }
    assert!(source.passes() > 1);
}

#[test]
fn stop_is_prompt_and_idempotent() {
    let source = ScriptedSource::new();
    source.populate_vehicle(9.0);
    let store = TelemetryStore::with_config(
        source.clone(),
        StoreConfig::default().with_poll_interval(Duration::from_secs(5)),
    )
    .expect("store starts");
    assert!(wait_until(WAIT, || store.stats().published == 1));

    // The producer is now in a five second sleep
    let started = Instant::now();
    store.stop();
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(!store.is_running());

    store.stop();
    assert!(!store.is_connected());
    assert_eq!(store.telemetry().speed, 9.0);
}

#[test]
fn handle_outlives_the_store() {
    let source = ScriptedSource::new();
    source.populate_vehicle(4.0);
    let store = start(&source);
    let handle = store.handle();
    assert!(wait_until(WAIT, || handle.telemetry().speed == 4.0));

    drop(store);
    assert_eq!(handle.telemetry().speed, 4.0);
    assert!(!handle.is_connected());
}

#[test]
fn hung_connect_does_not_stall_the_store() {
    let source = ScriptedSource::new();
    source.set_connect_delay(Duration::from_secs(3));
    let store = TelemetryStore::with_config(
        source.clone(),
        fast_config().with_connect_timeout(Duration::from_millis(50)),
    )
    .expect("store starts");

    std::thread::sleep(Duration::from_millis(300));

    // Still stuck in the first attempt, and no second one was started
    assert_eq!(source.connect_attempts(), 1);
    assert_eq!(store.stats().connect_attempts, 1);
    let started = Instant::now();
    assert!(store.snapshot().is_empty());
    assert!(!store.is_connected());
    assert!(started.elapsed() < Duration::from_millis(50));

    let started = Instant::now();
    store.stop();
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn invalid_config_is_rejected() {
    let result = TelemetryStore::with_config(
        ScriptedSource::new(),
        StoreConfig::default().with_poll_interval(Duration::ZERO),
    );
    assert!(matches!(result, Err(TelemetryError::Config { .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn update_stream_follows_the_producer() {
    use futures::StreamExt;

    let source = ScriptedSource::ticking();
    let store = start(&source);
    let mut updates = store.updates(UpdateRate::Native);

    let mut last = None;
    for _ in 0..3 {
        let snapshot = tokio::time::timeout(WAIT, updates.next())
            .await
            .expect("update arrives")
            .expect("stream is open");
        if let Some(last) = last {
            assert!(snapshot.sequence > last);
        }
        last = Some(snapshot.sequence);
    }

    store.stop();
    let ended = tokio::time::timeout(WAIT, async {
        while updates.next().await.is_some() {}
    })
    .await;
    assert!(ended.is_ok(), "stream should end after stop");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn throttled_stream_skips_to_the_latest() {
    use futures::StreamExt;

    let source = ScriptedSource::ticking();
    let store = start(&source);
    let mut updates = store.updates(UpdateRate::Max(10));

    let first = updates.next().await.expect("first update");
    let second = tokio::time::timeout(WAIT, updates.next())
        .await
        .expect("update arrives")
        .expect("stream is open");

    // At 2 ms polling a 100 ms window spans many publishes
    assert!(second.sequence > first.sequence + 1);
}
