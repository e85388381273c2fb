// src/store/mod.rs
pub mod sqlite;

use anyhow::Result;

use crate::model::{Fact, Report};

pub use sqlite::SqliteStore;

/// Persistence seam for reports and their facts.
///
/// Implementations must keep the "exactly one last report per source"
/// invariant: saving a batch atomically demotes the source's current report
/// and promotes the new one. Safe for concurrent use from multiple pollers.
pub trait ReportStore: Send + Sync {
    /// Persist a non-empty fact batch as the source's new last report.
    /// The source code is taken from the facts themselves.
    fn save_report(&self, facts: &[Fact]) -> Result<Report>;

    /// Facts of the report demoted most recently for this source
    /// (i.e. the snapshot preceding the current one). Empty if the source
    /// has at most one report.
    fn previous_facts(&self, source_code: &str) -> Result<Vec<Fact>>;

    /// Every source's current (`is_last`) report. Digest input.
    fn current_reports(&self) -> Result<Vec<Report>>;
}
