// tests/engine_lifecycle.rs
// Start/Stop contract: state machine, cancellation, bounded shutdown.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::*;
use depmon_collector::config::{IterationConfig, NotificationConfig, Settings};
use depmon_collector::ingest::csv::Base64CsvParser;
use depmon_collector::store::SqliteStore;
use depmon_collector::{Collaborators, Engine, EngineError, EngineState};

fn settings(source_codes: &[&str]) -> Settings {
    Settings {
        sources: source_codes.iter().map(|c| source(c, 3600)).collect(),
        iteration: IterationConfig { stagger_ms: 0 },
        notification: NotificationConfig {
            every_day_time: "23:59:59".into(),
            old_report_threshold_hours: 24.0,
        },
    }
}

fn engine_with_empty_fetcher() -> Engine {
    let deps = Collaborators {
        fetcher: Arc::new(ScriptedFetcher::empty()),
        parser: Arc::new(Base64CsvParser),
        store: Arc::new(SqliteStore::in_memory().unwrap()),
        notifier: Arc::new(RecordingNotifier::new()),
    };
    Engine::new(deps)
}

#[tokio::test]
async fn start_then_stop_joins_all_pollers() {
    let mut engine = engine_with_empty_fetcher();
    assert_eq!(engine.state(), EngineState::Created);

    engine.start(&settings(&["ACME", "BETA", "GAMMA"])).await.unwrap();
    assert_eq!(engine.state(), EngineState::Started);

    // Let every poller reach its wait point (delay is 1h).
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Stop must interrupt the waits immediately, not ride them out.
    let begun = Instant::now();
    tokio::time::timeout(Duration::from_secs(5), engine.stop())
        .await
        .expect("stop did not return in time")
        .unwrap();
    assert!(begun.elapsed() < Duration::from_secs(2));
    assert_eq!(engine.state(), EngineState::Stopped);
}

#[tokio::test]
async fn stop_before_start_is_an_error() {
    let mut engine = engine_with_empty_fetcher();
    assert_eq!(engine.stop().await, Err(EngineError::NotRunning));
    assert_eq!(engine.state(), EngineState::Created);
}

#[tokio::test]
async fn double_start_is_an_error() {
    let mut engine = engine_with_empty_fetcher();
    let cfg = settings(&["ACME"]);
    engine.start(&cfg).await.unwrap();
    assert_eq!(engine.start(&cfg).await, Err(EngineError::AlreadyStarted));
    engine.stop().await.unwrap();
}

#[tokio::test]
async fn double_stop_is_an_error() {
    let mut engine = engine_with_empty_fetcher();
    engine.start(&settings(&["ACME"])).await.unwrap();
    engine.stop().await.unwrap();
    assert_eq!(engine.stop().await, Err(EngineError::NotRunning));
    assert_eq!(engine.state(), EngineState::Stopped);
}

#[tokio::test]
async fn start_after_stop_is_an_error() {
    let mut engine = engine_with_empty_fetcher();
    let cfg = settings(&["ACME"]);
    engine.start(&cfg).await.unwrap();
    engine.stop().await.unwrap();
    assert_eq!(engine.start(&cfg).await, Err(EngineError::AlreadyStarted));
}

#[tokio::test]
async fn bad_time_of_day_fails_start() {
    let mut engine = engine_with_empty_fetcher();
    let mut cfg = settings(&["ACME"]);
    cfg.notification.every_day_time = "not-a-time".into();
    let err = engine.start(&cfg).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidConfig(_)));
    assert_eq!(engine.state(), EngineState::Created);
}

#[tokio::test]
async fn failing_source_does_not_stop_the_engine() {
    // One source whose transport is permanently down: the engine still
    // starts, keeps running, and stops cleanly.
    let deps = Collaborators {
        fetcher: Arc::new(FailingFetcher),
        parser: Arc::new(Base64CsvParser),
        store: Arc::new(SqliteStore::in_memory().unwrap()),
        notifier: Arc::new(RecordingNotifier::new()),
    };
    let mut engine = Engine::new(deps);
    engine.start(&settings(&["ACME"])).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(engine.state(), EngineState::Started);
    engine.stop().await.unwrap();
}
