// src/poller.rs
//! One polling loop per source: run an ingestion cycle, then wait out the
//! source's delay or a cancellation, whichever comes first. Cycle failures
//! are contained here; only cancellation ends the loop.

use std::sync::Arc;
use tokio::sync::watch;

use crate::config::SourceConfig;
use crate::ingest::{
    self,
    types::{Fetcher, ReportParser},
};
use crate::notify::Notifier;
use crate::store::ReportStore;

/// Collaborator handles shared by every poller. Cheap to clone; resolved
/// once at engine construction instead of per cycle.
#[derive(Clone)]
pub struct Collaborators {
    pub fetcher: Arc<dyn Fetcher>,
    pub parser: Arc<dyn ReportParser>,
    pub store: Arc<dyn ReportStore>,
    pub notifier: Arc<dyn Notifier>,
}

pub async fn run_poller(
    source: SourceConfig,
    deps: Collaborators,
    mut cancel: watch::Receiver<bool>,
) {
    tracing::info!(source = %source.code, delay_secs = source.delay_secs, "monitoring started");
    let delay = source.poll_delay();

    while !*cancel.borrow() {
        match ingest::run_cycle(
            &source,
            deps.fetcher.as_ref(),
            deps.parser.as_ref(),
            deps.store.as_ref(),
            deps.notifier.as_ref(),
        )
        .await
        {
            Ok(outcome) => {
                tracing::debug!(
                    source = %source.code,
                    payloads = outcome.payloads,
                    reports = outcome.reports,
                    notifications = outcome.notifications,
                    errors = outcome.payload_errors,
                    "cycle finished"
                );
            }
            Err(e) => {
                tracing::warn!(source = %source.code, error = ?e, "iteration failed");
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel.changed() => break,
        }
    }

    tracing::info!(source = %source.code, "monitoring stopped");
}
