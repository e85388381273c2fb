// src/config.rs
use anyhow::{anyhow, Context, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PATH: &str = "DEPMON_CONFIG_PATH";

/// One monitored source. `transport` is opaque to the engine; the directory
/// fetcher interprets it as a spool path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceConfig {
    pub code: String,
    pub delay_secs: u64,
    pub transport: String,
}

impl SourceConfig {
    pub fn poll_delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

/// Startup behaviour of the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IterationConfig {
    /// Pause between poller launches, to avoid a fetch storm at startup.
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,
}

fn default_stagger_ms() -> u64 {
    500
}

impl Default for IterationConfig {
    fn default() -> Self {
        Self {
            stagger_ms: default_stagger_ms(),
        }
    }
}

impl IterationConfig {
    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }
}

/// Daily digest settings. The staleness threshold is consumed by the
/// notifier when rendering the digest, not by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationConfig {
    /// Local time of day for the daily digest, "HH:MM:SS".
    pub every_day_time: String,
    #[serde(default = "default_old_report_threshold_hours")]
    pub old_report_threshold_hours: f64,
}

fn default_old_report_threshold_hours() -> f64 {
    24.0
}

impl NotificationConfig {
    pub fn every_day_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.every_day_time, "%H:%M:%S")
            .with_context(|| format!("invalid every_day_time: {:?}", self.every_day_time))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub iteration: IterationConfig,
    pub notification: NotificationConfig,
}

/// Load settings from an explicit path. Supports TOML or JSON formats.
pub fn load_from(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let settings = parse_settings(&content, ext.as_str())?;
    validate(&settings)?;
    Ok(settings)
}

/// Load settings using env var + fallbacks:
/// 1) $DEPMON_CONFIG_PATH
/// 2) config/collector.toml
/// 3) config/collector.json
pub fn load_default() -> Result<Settings> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_from(&pb);
        } else {
            return Err(anyhow!("DEPMON_CONFIG_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/collector.toml");
    if toml_p.exists() {
        return load_from(&toml_p);
    }
    let json_p = PathBuf::from("config/collector.json");
    if json_p.exists() {
        return load_from(&json_p);
    }
    Err(anyhow!(
        "no config found: set DEPMON_CONFIG_PATH or provide config/collector.toml"
    ))
}

fn parse_settings(s: &str, hint_ext: &str) -> Result<Settings> {
    if hint_ext == "json" {
        return serde_json::from_str(s).context("parsing JSON config");
    }
    toml::from_str(s).context("parsing TOML config")
}

fn validate(settings: &Settings) -> Result<()> {
    for src in &settings.sources {
        if src.code.trim().is_empty() {
            return Err(anyhow!("source with empty code"));
        }
        if src.delay_secs == 0 {
            return Err(anyhow!("source {:?} has zero poll delay", src.code));
        }
    }
    // Fail early on an unparsable time instead of at first daily fire.
    settings.notification.every_day_time()?;
    Ok(())
}
