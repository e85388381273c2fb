// src/ingest/csv.rs
//! Report payload decoding: base64-wrapped, semicolon-separated CSV.
//!
//! Expected header:
//! `checked_at;source_code;group_code;resource_code;indicator_code;indicator_value;indicator_description;level`

use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};

use crate::ingest::types::{Payload, ReportParser};
use crate::model::{Fact, FactLevel};

const SEPARATOR: char = ';';
const COLUMNS: usize = 8;

pub struct Base64CsvParser;

impl ReportParser for Base64CsvParser {
    fn parse(&self, payload: &Payload) -> Result<Vec<Fact>> {
        let raw = BASE64
            .decode(payload.body.trim())
            .with_context(|| format!("payload {} is not valid base64", payload.id))?;
        let text = String::from_utf8(raw)
            .with_context(|| format!("payload {} is not valid UTF-8", payload.id))?;
        parse_csv(&text)
    }
}

/// Parse decoded CSV text into facts. Header-only or blank input yields an
/// empty batch; a malformed row fails the whole payload (recoverable at the
/// cycle level).
pub fn parse_csv(text: &str) -> Result<Vec<Fact>> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());

    let Some(header) = lines.next() else {
        return Ok(Vec::new());
    };
    check_header(header)?;

    let mut facts = Vec::new();
    for (i, line) in lines.enumerate() {
        facts.push(parse_row(line).with_context(|| format!("row {}", i + 1))?);
    }
    Ok(facts)
}

fn check_header(header: &str) -> Result<()> {
    let cols: Vec<&str> = header.split(SEPARATOR).map(str::trim).collect();
    if cols.len() != COLUMNS || !cols[0].eq_ignore_ascii_case("checked_at") {
        return Err(anyhow!("unexpected CSV header: {header:?}"));
    }
    Ok(())
}

fn parse_row(line: &str) -> Result<Fact> {
    let cols: Vec<&str> = line.split(SEPARATOR).map(str::trim).collect();
    if cols.len() != COLUMNS {
        return Err(anyhow!(
            "expected {COLUMNS} columns, got {}: {line:?}",
            cols.len()
        ));
    }

    let checked_at: DateTime<Utc> = cols[0]
        .parse()
        .with_context(|| format!("invalid checked_at: {:?}", cols[0]))?;
    let level = FactLevel::parse(cols[7])?;

    Ok(Fact {
        checked_at,
        source_code: cols[1].to_string(),
        group_code: cols[2].to_string(),
        resource_code: cols[3].to_string(),
        indicator_code: cols[4].to_string(),
        indicator_value: cols[5].to_string(),
        indicator_description: cols[6].to_string(),
        level,
        report_id: 0,
    })
}
