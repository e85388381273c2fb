// tests/store_sqlite.rs
// Report store invariants: atomic save, is_last demotion, previous lookup.

use chrono::Utc;
use depmon_collector::model::{Fact, FactLevel};
use depmon_collector::store::{ReportStore, SqliteStore};

fn fact(source: &str, indicator: &str, level: FactLevel) -> Fact {
    Fact {
        checked_at: Utc::now(),
        source_code: source.to_string(),
        group_code: "web".into(),
        resource_code: "app01".into(),
        indicator_code: indicator.to_string(),
        indicator_value: "1".into(),
        indicator_description: String::new(),
        level,
        report_id: 0,
    }
}

#[test]
fn empty_batch_is_rejected() {
    let store = SqliteStore::in_memory().unwrap();
    assert!(store.save_report(&[]).is_err());
}

#[test]
fn first_report_has_no_previous_facts() {
    let store = SqliteStore::in_memory().unwrap();
    let report = store
        .save_report(&[fact("ACME", "cpu", FactLevel::Normal)])
        .unwrap();
    assert!(report.is_last);
    assert!(report.id > 0);
    assert!(store.previous_facts("ACME").unwrap().is_empty());
}

#[test]
fn saving_demotes_the_previous_report() {
    let store = SqliteStore::in_memory().unwrap();
    store
        .save_report(&[
            fact("ACME", "cpu", FactLevel::Normal),
            fact("ACME", "mem", FactLevel::Warning),
        ])
        .unwrap();
    let second = store
        .save_report(&[fact("ACME", "cpu", FactLevel::Error)])
        .unwrap();

    // Previous snapshot is the demoted first batch, fully materialized.
    let previous = store.previous_facts("ACME").unwrap();
    assert_eq!(previous.len(), 2);
    assert!(previous.iter().any(|f| f.indicator_code == "cpu"));
    assert!(previous.iter().any(|f| f.level == FactLevel::Warning));
    assert!(previous.iter().all(|f| f.report_id != second.id));

    // Exactly one current report for the source.
    let current = store.current_reports().unwrap();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].id, second.id);
    assert_eq!(current[0].source_code, "ACME");
}

#[test]
fn previous_facts_track_the_most_recent_demotion() {
    let store = SqliteStore::in_memory().unwrap();
    for indicator in ["gen1", "gen2", "gen3"] {
        store
            .save_report(&[fact("ACME", indicator, FactLevel::Normal)])
            .unwrap();
    }
    let previous = store.previous_facts("ACME").unwrap();
    assert_eq!(previous.len(), 1);
    assert_eq!(previous[0].indicator_code, "gen2");
}

#[test]
fn sources_are_isolated() {
    let store = SqliteStore::in_memory().unwrap();
    store
        .save_report(&[fact("ACME", "cpu", FactLevel::Normal)])
        .unwrap();
    store
        .save_report(&[fact("BETA", "cpu", FactLevel::Critical)])
        .unwrap();
    store
        .save_report(&[fact("ACME", "cpu", FactLevel::Error)])
        .unwrap();

    // BETA still has its single, current report; ACME's previous is intact.
    assert!(store.previous_facts("BETA").unwrap().is_empty());
    let previous = store.previous_facts("ACME").unwrap();
    assert_eq!(previous.len(), 1);
    assert_eq!(previous[0].level, FactLevel::Normal);

    let mut current = store.current_reports().unwrap();
    current.sort_by(|a, b| a.source_code.cmp(&b.source_code));
    assert_eq!(current.len(), 2);
    assert_eq!(current[0].source_code, "ACME");
    assert_eq!(current[1].source_code, "BETA");
}

#[test]
fn timestamps_and_levels_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("depmon.db");
    {
        let store = SqliteStore::open(&path).unwrap();
        store
            .save_report(&[fact("ACME", "cpu", FactLevel::Warning)])
            .unwrap();
        store
            .save_report(&[fact("ACME", "cpu", FactLevel::Critical)])
            .unwrap();
    }
    // Reopen and read back.
    let store = SqliteStore::open(&path).unwrap();
    let previous = store.previous_facts("ACME").unwrap();
    assert_eq!(previous.len(), 1);
    assert_eq!(previous[0].level, FactLevel::Warning);
    assert!(previous[0].checked_at <= Utc::now());
    assert_eq!(store.current_reports().unwrap().len(), 1);
}
