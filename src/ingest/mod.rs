// src/ingest/mod.rs
pub mod csv;
pub mod dir_fetcher;
pub mod types;

use anyhow::Context;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;

use crate::change_detector;
use crate::config::SourceConfig;
use crate::ingest::types::{Fetcher, ReportParser};
use crate::notify::Notifier;
use crate::store::ReportStore;

/// One-time metrics registration (so series show up on scrape).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("collector_cycles_total", "Ingestion cycles executed.");
        describe_counter!(
            "collector_payloads_total",
            "Payloads fetched across all sources."
        );
        describe_counter!(
            "collector_payload_errors_total",
            "Payloads skipped due to decode/parse/persist/notify errors."
        );
        describe_counter!("collector_reports_total", "Reports persisted.");
        describe_counter!(
            "collector_notifications_total",
            "New-report notifications sent."
        );
        describe_gauge!(
            "collector_last_cycle_ts",
            "Unix ts when any source last completed a cycle."
        );
    });
}

/// Counters for one ingestion cycle, mostly for logging and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleOutcome {
    pub payloads: usize,
    pub payload_errors: usize,
    pub reports: usize,
    pub notifications: usize,
}

/// Execute one fetch -> parse -> persist -> diff -> notify pass for a
/// source. A failure on one payload is logged and does not abort the rest;
/// every fetched payload is released afterwards regardless of outcome.
/// Only the fetch itself can fail the whole cycle.
pub async fn run_cycle(
    source: &SourceConfig,
    fetcher: &dyn Fetcher,
    parser: &dyn ReportParser,
    store: &dyn ReportStore,
    notifier: &dyn Notifier,
) -> anyhow::Result<CycleOutcome> {
    ensure_metrics_described();

    let payloads = fetcher
        .fetch(source)
        .await
        .with_context(|| format!("fetch from {} fetcher failed", fetcher.name()))?;
    let mut outcome = CycleOutcome {
        payloads: payloads.len(),
        ..CycleOutcome::default()
    };

    for payload in &payloads {
        match process_payload(source, payload, parser, store, notifier).await {
            Ok(PayloadResult::Empty) => {}
            Ok(PayloadResult::Saved { notified }) => {
                outcome.reports += 1;
                if notified {
                    outcome.notifications += 1;
                }
            }
            Err(e) => {
                outcome.payload_errors += 1;
                counter!("collector_payload_errors_total").increment(1);
                tracing::warn!(
                    source = %source.code,
                    payload = %payload.id,
                    error = ?e,
                    "payload failed, skipping"
                );
            }
        }
    }

    for payload in &payloads {
        if let Err(e) = fetcher.release(source, payload).await {
            tracing::warn!(
                source = %source.code,
                payload = %payload.id,
                error = ?e,
                "payload release failed"
            );
        }
    }

    let now = chrono::Utc::now().timestamp().max(0) as u64;
    counter!("collector_cycles_total").increment(1);
    counter!("collector_payloads_total").increment(outcome.payloads as u64);
    counter!("collector_reports_total").increment(outcome.reports as u64);
    counter!("collector_notifications_total").increment(outcome.notifications as u64);
    gauge!("collector_last_cycle_ts").set(now as f64);

    Ok(outcome)
}

enum PayloadResult {
    /// Parsed to zero facts; nothing persisted, nothing notified.
    Empty,
    Saved {
        notified: bool,
    },
}

async fn process_payload(
    source: &SourceConfig,
    payload: &types::Payload,
    parser: &dyn ReportParser,
    store: &dyn ReportStore,
    notifier: &dyn Notifier,
) -> anyhow::Result<PayloadResult> {
    let facts = parser.parse(payload)?;
    if facts.is_empty() {
        tracing::debug!(source = %source.code, payload = %payload.id, "empty parse, skipped");
        return Ok(PayloadResult::Empty);
    }

    let report = store.save_report(&facts)?;
    // The previous "last" report was demoted by the save above.
    let previous = store.previous_facts(&source.code)?;

    if !change_detector::needs_notification(&previous, &facts) {
        tracing::debug!(source = %source.code, report = report.id, "no level change");
        return Ok(PayloadResult::Saved { notified: false });
    }

    notifier.notify_new_report(&report, &facts).await?;
    tracing::info!(
        source = %source.code,
        report = report.id,
        facts = facts.len(),
        "level change, notification sent"
    );
    Ok(PayloadResult::Saved { notified: true })
}
