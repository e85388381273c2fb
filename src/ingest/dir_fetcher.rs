// src/ingest/dir_fetcher.rs
//! Spool-directory transport: each pending payload is one file in the
//! source's `transport` directory. Releasing a payload moves its file into
//! a `processed/` subdirectory so it is never fetched twice.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::config::SourceConfig;
use crate::ingest::types::{Fetcher, Payload};

const PROCESSED_DIR: &str = "processed";

pub struct DirFetcher;

impl DirFetcher {
    fn spool_dir(source: &SourceConfig) -> PathBuf {
        PathBuf::from(&source.transport)
    }
}

#[async_trait::async_trait]
impl Fetcher for DirFetcher {
    async fn fetch(&self, source: &SourceConfig) -> Result<Vec<Payload>> {
        let dir = Self::spool_dir(source);
        if !dir.exists() {
            // A missing spool just means nothing has arrived yet.
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&dir)
            .await
            .with_context(|| format!("reading spool {}", dir.display()))?;

        let mut payloads = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = file_name(&path);
            let body = fs::read_to_string(&path)
                .await
                .with_context(|| format!("reading payload {}", path.display()))?;
            payloads.push(Payload { id: name, body });
        }

        // Deterministic order helps tests and log correlation.
        payloads.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(payloads)
    }

    async fn release(&self, source: &SourceConfig, payload: &Payload) -> Result<()> {
        let dir = Self::spool_dir(source);
        let from = dir.join(&payload.id);
        let processed = dir.join(PROCESSED_DIR);
        fs::create_dir_all(&processed)
            .await
            .with_context(|| format!("creating {}", processed.display()))?;
        let to = processed.join(&payload.id);
        fs::rename(&from, &to)
            .await
            .with_context(|| format!("releasing payload {}", from.display()))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "dir"
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
