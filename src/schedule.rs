// src/schedule.rs
//! Daily digest schedule: fire once at a configured local time-of-day,
//! then every 24 hours, anchored to the schedule rather than to "now" so
//! slow digest sends do not drift the firing time.

use chrono::{Local, NaiveDateTime, NaiveTime};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};

use crate::notify::Notifier;

pub const DAILY_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("collector_daily_digests_total", "Daily digests fired.");
    });
}

/// Delay from `now` until the next occurrence of `target`: today if the
/// moment has not passed yet, tomorrow otherwise. Always non-negative.
pub fn delay_until(now: NaiveDateTime, target: NaiveTime) -> Duration {
    let candidate = now.date().and_time(target);
    let delta = if now <= candidate {
        candidate - now
    } else {
        candidate + chrono::Duration::days(1) - now
    };
    delta.to_std().unwrap_or_default()
}

/// Run the digest schedule until cancelled. No firing happens after a
/// cancel; a firing already in progress completes first.
pub async fn run_daily(
    target: NaiveTime,
    notifier: Arc<dyn Notifier>,
    mut cancel: watch::Receiver<bool>,
) {
    ensure_metrics_described();

    let first = delay_until(Local::now().naive_local(), target);
    tracing::info!(in_secs = first.as_secs(), "daily digest armed");
    let mut next = Instant::now() + first;

    loop {
        tokio::select! {
            _ = sleep_until(next) => {
                if let Err(e) = notifier.notify_daily_digest().await {
                    tracing::warn!(error = ?e, "daily digest failed");
                }
                counter!("collector_daily_digests_total").increment(1);
                next += DAILY_PERIOD;
            }
            _ = cancel.changed() => break,
        }
    }
    tracing::info!("daily digest schedule stopped");
}
