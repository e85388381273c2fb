// tests/common/mod.rs
// Shared test doubles and payload builders.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use depmon_collector::config::SourceConfig;
use depmon_collector::ingest::types::{Fetcher, Payload};
use depmon_collector::model::{Fact, FactLevel, Report};
use depmon_collector::notify::Notifier;

pub const CSV_HEADER: &str =
    "checked_at;source_code;group_code;resource_code;indicator_code;indicator_value;indicator_description;level";

pub fn source(code: &str, delay_secs: u64) -> SourceConfig {
    SourceConfig {
        code: code.to_string(),
        delay_secs,
        transport: format!("spool/{}", code.to_lowercase()),
    }
}

/// Build a base64-encoded CSV payload with one row per (indicator, level).
pub fn csv_payload(id: &str, source_code: &str, rows: &[(&str, FactLevel)]) -> Payload {
    let mut text = format!("{CSV_HEADER}\n");
    for (indicator, level) in rows {
        text.push_str(&format!(
            "2026-08-25T10:00:00Z;{source_code};web;app01;{indicator};1;;{}\n",
            level.as_str()
        ));
    }
    Payload {
        id: id.to_string(),
        body: BASE64.encode(text),
    }
}

/// Header-only payload: parses to zero facts.
pub fn empty_payload(id: &str) -> Payload {
    Payload {
        id: id.to_string(),
        body: BASE64.encode(format!("{CSV_HEADER}\n")),
    }
}

/// Payload that fails base64 decoding.
pub fn broken_payload(id: &str) -> Payload {
    Payload {
        id: id.to_string(),
        body: "@@not-base64@@".to_string(),
    }
}

/// Fetcher that hands out pre-scripted payload batches, one per fetch call,
/// then empty batches forever. Records every released payload id.
pub struct ScriptedFetcher {
    batches: Mutex<VecDeque<Vec<Payload>>>,
    pub released: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new(batches: Vec<Vec<Payload>>) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
            released: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn released_ids(&self) -> Vec<String> {
        self.released.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, _source: &SourceConfig) -> Result<Vec<Payload>> {
        Ok(self.batches.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn release(&self, _source: &SourceConfig, payload: &Payload) -> Result<()> {
        self.released.lock().unwrap().push(payload.id.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Fetcher whose fetch always fails with a transport error.
pub struct FailingFetcher;

#[async_trait::async_trait]
impl Fetcher for FailingFetcher {
    async fn fetch(&self, source: &SourceConfig) -> Result<Vec<Payload>> {
        Err(anyhow!("transport down for {}", source.code))
    }

    async fn release(&self, _source: &SourceConfig, _payload: &Payload) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Notifier that records calls; optionally fails new-report sends.
pub struct RecordingNotifier {
    pub new_reports: Mutex<Vec<(Report, Vec<Fact>)>>,
    pub digests: Mutex<usize>,
    fail_new_reports: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            new_reports: Mutex::new(Vec::new()),
            digests: Mutex::new(0),
            fail_new_reports: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_new_reports: true,
            ..Self::new()
        }
    }

    pub fn new_report_count(&self) -> usize {
        self.new_reports.lock().unwrap().len()
    }

    pub fn digest_count(&self) -> usize {
        *self.digests.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_new_report(&self, report: &Report, facts: &[Fact]) -> Result<()> {
        if self.fail_new_reports {
            return Err(anyhow!("notifier unavailable"));
        }
        self.new_reports
            .lock()
            .unwrap()
            .push((report.clone(), facts.to_vec()));
        Ok(())
    }

    async fn notify_daily_digest(&self) -> Result<()> {
        *self.digests.lock().unwrap() += 1;
        Ok(())
    }
}
