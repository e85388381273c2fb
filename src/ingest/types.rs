// src/ingest/types.rs
use anyhow::Result;

use crate::config::SourceConfig;
use crate::model::Fact;

/// One opaque encoded payload pulled from a source's mailbox.
/// `id` identifies the payload to the fetcher for release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub id: String,
    pub body: String,
}

/// Transport seam: pulls pending payloads for a source and releases them
/// once a cycle is done with them (ack/close semantics).
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, source: &SourceConfig) -> Result<Vec<Payload>>;

    /// Best-effort; called for every fetched payload whether or not its
    /// processing succeeded.
    async fn release(&self, source: &SourceConfig, payload: &Payload) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// Decoding seam: turns one payload into fact records.
/// An empty result is valid and means "nothing to persist".
pub trait ReportParser: Send + Sync {
    fn parse(&self, payload: &Payload) -> Result<Vec<Fact>>;
}
