// src/model.rs
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a single fact. Ordering matters: anything above `Normal`
/// counts as a problem for reporting purposes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum FactLevel {
    Normal,
    Warning,
    Error,
    Critical,
}

impl FactLevel {
    /// Closed, ordered set of known levels. Bucketing code iterates this so
    /// that absent levels always default to a zero count.
    pub const ALL: [FactLevel; 4] = [
        FactLevel::Normal,
        FactLevel::Warning,
        FactLevel::Error,
        FactLevel::Critical,
    ];

    /// Stable integer code used in storage.
    pub fn code(self) -> i64 {
        match self {
            FactLevel::Normal => 0,
            FactLevel::Warning => 1,
            FactLevel::Error => 2,
            FactLevel::Critical => 3,
        }
    }

    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            0 => Ok(FactLevel::Normal),
            1 => Ok(FactLevel::Warning),
            2 => Ok(FactLevel::Error),
            3 => Ok(FactLevel::Critical),
            other => Err(anyhow!("unknown fact level code: {other}")),
        }
    }

    /// Accepts either the level name (case-insensitive) or its numeric code.
    pub fn parse(s: &str) -> Result<Self> {
        let t = s.trim();
        match t.to_ascii_lowercase().as_str() {
            "normal" => return Ok(FactLevel::Normal),
            "warning" => return Ok(FactLevel::Warning),
            "error" => return Ok(FactLevel::Error),
            "critical" => return Ok(FactLevel::Critical),
            _ => {}
        }
        if let Ok(code) = t.parse::<i64>() {
            return Self::from_code(code);
        }
        Err(anyhow!("unknown fact level: {t:?}"))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FactLevel::Normal => "Normal",
            FactLevel::Warning => "Warning",
            FactLevel::Error => "Error",
            FactLevel::Critical => "Critical",
        }
    }
}

/// One monitored indicator observation. Immutable once created;
/// `report_id` is 0 until the owning report has been persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub checked_at: DateTime<Utc>,
    pub source_code: String,
    pub group_code: String,
    pub resource_code: String,
    pub indicator_code: String,
    pub indicator_value: String,
    pub indicator_description: String,
    pub level: FactLevel,
    pub report_id: i64,
}

/// One ingestion snapshot for a source. The store guarantees exactly one
/// `is_last` report per source code at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub source_code: String,
    pub is_last: bool,
}
