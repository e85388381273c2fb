// src/notify/mod.rs
pub mod email;
pub mod webhook;

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::change_detector::level_counts;
use crate::config::NotificationConfig;
use crate::model::{Fact, FactLevel, Report};
use crate::store::ReportStore;

pub use email::EmailSender;
pub use webhook::WebhookNotifier;

/// Outbound notification seam. Both calls are fire-and-forget from the
/// engine's point of view: failures are logged by the caller, not retried.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_new_report(&self, report: &Report, facts: &[Fact]) -> Result<()>;
    async fn notify_daily_digest(&self) -> Result<()>;
}

/// Fans one notification out to every channel configured via env.
/// A channel failure does not stop delivery to the remaining channels.
pub struct NotifierMux {
    email: Option<EmailSender>,
    webhook: Option<WebhookNotifier>,
    store: Arc<dyn ReportStore>,
    old_report_threshold_hours: f64,
}

impl NotifierMux {
    pub fn from_env(store: Arc<dyn ReportStore>, cfg: &NotificationConfig) -> Self {
        let email = match EmailSender::from_env() {
            Ok(s) => {
                tracing::info!("email notifications enabled");
                Some(s)
            }
            Err(e) => {
                tracing::info!("email notifications disabled: {e:#}");
                None
            }
        };
        let webhook = std::env::var("NOTIFY_WEBHOOK_URL").ok().map(|url| {
            tracing::info!("webhook notifications enabled");
            WebhookNotifier::new(url)
        });
        if email.is_none() && webhook.is_none() {
            tracing::warn!("no notification channel configured, alerts will be logged only");
        }
        Self {
            email,
            webhook,
            store,
            old_report_threshold_hours: cfg.old_report_threshold_hours,
        }
    }

    async fn deliver(&self, subject: &str, body: &str) {
        if let Some(email) = &self.email {
            if let Err(e) = email.send(subject, body).await {
                tracing::warn!(error = ?e, "email delivery failed");
            }
        }
        if let Some(webhook) = &self.webhook {
            if let Err(e) = webhook.send(subject, body).await {
                tracing::warn!(error = ?e, "webhook delivery failed");
            }
        }
    }
}

#[async_trait::async_trait]
impl Notifier for NotifierMux {
    async fn notify_new_report(&self, report: &Report, facts: &[Fact]) -> Result<()> {
        let subject = format!("[depmon] {} health changed", report.source_code);
        let body = render_new_report(report, facts);
        tracing::info!(source = %report.source_code, report = report.id, "sending new-report alert");
        self.deliver(&subject, &body).await;
        Ok(())
    }

    async fn notify_daily_digest(&self) -> Result<()> {
        let reports = self.store.current_reports()?;
        let body = render_digest(Utc::now(), &reports, self.old_report_threshold_hours);
        tracing::info!(sources = reports.len(), "sending daily digest");
        self.deliver("[depmon] daily digest", &body).await;
        Ok(())
    }
}

/// Plain-text summary of a freshly persisted report: per-level fact counts.
pub fn render_new_report(report: &Report, facts: &[Fact]) -> String {
    let counts = level_counts(facts);
    let mut out = format!(
        "Source {} produced a new report at {} ({} facts).\n\nFacts by level:\n",
        report.source_code,
        report.created_at.to_rfc3339(),
        facts.len()
    );
    for level in FactLevel::ALL {
        out.push_str(&format!(
            "  {:<8} {}\n",
            level.as_str(),
            counts.get(&level).copied().unwrap_or(0)
        ));
    }
    out
}

/// Plain-text daily digest: every source's current report age, flagging
/// reports older than the staleness threshold.
pub fn render_digest(now: DateTime<Utc>, reports: &[Report], threshold_hours: f64) -> String {
    if reports.is_empty() {
        return "No reports collected yet.\n".to_string();
    }
    let mut out = String::from("Current report per source:\n");
    for r in reports {
        let age_hours = (now - r.created_at).num_seconds() as f64 / 3600.0;
        let stale = if age_hours > threshold_hours {
            "  [STALE]"
        } else {
            ""
        };
        out.push_str(&format!(
            "  {:<12} last report {} ({:.1}h ago){}\n",
            r.source_code,
            r.created_at.to_rfc3339(),
            age_hours,
            stale
        ));
    }
    out
}
