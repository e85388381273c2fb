// src/store/sqlite.rs
//! SQLite-backed report store. Timestamps are stored as RFC 3339 text;
//! levels as their stable integer codes.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

use crate::model::{Fact, FactLevel, Report};
use crate::store::ReportStore;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS reports (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at  TEXT NOT NULL,
    source_code TEXT NOT NULL,
    is_last     INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_reports_source_last ON reports (source_code, is_last);

CREATE TABLE IF NOT EXISTS facts (
    id                    INTEGER PRIMARY KEY AUTOINCREMENT,
    checked_at            TEXT NOT NULL,
    source_code           TEXT NOT NULL,
    group_code            TEXT NOT NULL,
    resource_code         TEXT NOT NULL,
    indicator_code        TEXT NOT NULL,
    indicator_value       TEXT NOT NULL,
    indicator_description TEXT NOT NULL,
    level                 INTEGER NOT NULL,
    report_id             INTEGER NOT NULL REFERENCES reports (id)
);
CREATE INDEX IF NOT EXISTS idx_facts_report ON facts (report_id);
";

pub struct SqliteStore {
    // rusqlite connections are not Sync; pollers serialize on this lock.
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("opening database {}", path.display()))?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA).context("applying schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl ReportStore for SqliteStore {
    fn save_report(&self, facts: &[Fact]) -> Result<Report> {
        let first = facts
            .first()
            .ok_or_else(|| anyhow!("refusing to save an empty fact batch"))?;
        let source_code = first.source_code.clone();
        let created_at = Utc::now();

        let mut conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("store lock poisoned"))?;
        let tx = conn.transaction().context("starting transaction")?;

        tx.execute(
            "UPDATE reports SET is_last = 0 WHERE source_code = ?1 AND is_last = 1",
            params![source_code],
        )
        .context("demoting previous report")?;

        tx.execute(
            "INSERT INTO reports (created_at, source_code, is_last) VALUES (?1, ?2, 1)",
            params![created_at.to_rfc3339(), source_code],
        )
        .context("inserting report")?;
        let report_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO facts (checked_at, source_code, group_code, resource_code,
                                    indicator_code, indicator_value, indicator_description,
                                    level, report_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for f in facts {
                stmt.execute(params![
                    f.checked_at.to_rfc3339(),
                    f.source_code,
                    f.group_code,
                    f.resource_code,
                    f.indicator_code,
                    f.indicator_value,
                    f.indicator_description,
                    f.level.code(),
                    report_id,
                ])
                .context("inserting fact")?;
            }
        }

        tx.commit().context("committing report")?;

        Ok(Report {
            id: report_id,
            created_at,
            source_code,
            is_last: true,
        })
    }

    fn previous_facts(&self, source_code: &str) -> Result<Vec<Fact>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("store lock poisoned"))?;
        let mut stmt = conn.prepare(
            "SELECT f.checked_at, f.source_code, f.group_code, f.resource_code,
                    f.indicator_code, f.indicator_value, f.indicator_description,
                    f.level, f.report_id
             FROM facts f
             WHERE f.report_id = (
                 SELECT MAX(id) FROM reports
                 WHERE source_code = ?1 AND is_last = 0
             )",
        )?;
        let rows = stmt.query_map(params![source_code], row_to_fact)?;
        let mut facts = Vec::new();
        for row in rows {
            facts.push(row.context("reading fact row")??);
        }
        Ok(facts)
    }

    fn current_reports(&self) -> Result<Vec<Report>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("store lock poisoned"))?;
        let mut stmt = conn.prepare(
            "SELECT id, created_at, source_code, is_last
             FROM reports WHERE is_last = 1 ORDER BY source_code",
        )?;
        let rows = stmt.query_map([], row_to_report)?;
        let mut reports = Vec::new();
        for row in rows {
            reports.push(row.context("reading report row")??);
        }
        Ok(reports)
    }
}

type SqlResult<T> = std::result::Result<T, rusqlite::Error>;

fn row_to_fact(row: &rusqlite::Row<'_>) -> SqlResult<Result<Fact>> {
    let checked_at: String = row.get(0)?;
    let level: i64 = row.get(7)?;
    Ok(build_fact(
        checked_at,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        level,
        row.get(8)?,
    ))
}

#[allow(clippy::too_many_arguments)]
fn build_fact(
    checked_at: String,
    source_code: String,
    group_code: String,
    resource_code: String,
    indicator_code: String,
    indicator_value: String,
    indicator_description: String,
    level: i64,
    report_id: i64,
) -> Result<Fact> {
    Ok(Fact {
        checked_at: parse_ts(&checked_at)?,
        source_code,
        group_code,
        resource_code,
        indicator_code,
        indicator_value,
        indicator_description,
        level: FactLevel::from_code(level)?,
        report_id,
    })
}

fn row_to_report(row: &rusqlite::Row<'_>) -> SqlResult<Result<Report>> {
    let created_at: String = row.get(1)?;
    let is_last: i64 = row.get(3)?;
    let id: i64 = row.get(0)?;
    let source_code: String = row.get(2)?;
    Ok(parse_ts(&created_at).map(|created_at| Report {
        id,
        created_at,
        source_code,
        is_last: is_last != 0,
    }))
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("invalid stored timestamp: {s:?}"))?
        .with_timezone(&Utc))
}
