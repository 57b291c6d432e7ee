//! Periodic background tasks. Each task is its own spawned loop, so a slow
//! tick delays only that task.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use tokio::time::{self, MissedTickBehavior};

use crate::AppState;

use super::{ai_service, alert_monitor, price_service, rss_service};

pub fn spawn_all(state: &AppState) {
    let s = &state.settings;

    spawn_every("price-refresh", s.price_refresh_interval_secs, state.clone(), refresh_price);
    alert_monitor::spawn_price_alert_monitor(state.clone());
    spawn_every("price-history", s.price_history_interval_secs, state.clone(), |st| async move {
        price_service::save_price_history(&st).await
    });
    spawn_every("rss", s.rss_interval_secs, state.clone(), |st| async move {
        refresh_news(&st).await.map(|_| ())
    });
    spawn_daily_summary(state.clone());

    tracing::info!("[cron] all jobs registered");
}

fn spawn_every<F, Fut>(name: &'static str, secs: u64, state: AppState, job: F)
where
    F: Fn(AppState) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), String>> + Send + 'static,
{
    let every = Duration::from_secs(secs.max(1));

    tokio::spawn(async move {
        let mut interval = time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick fires immediately; boot already did that work
        interval.tick().await;

        loop {
            interval.tick().await;
            if let Err(e) = job(state.clone()).await {
                tracing::error!("[cron] {} failed: {}", name, e);
            }
        }
    });

    tracing::info!("[cron] registered {} (every {}s)", name, secs.max(1));
}

/// Refreshes the price cache and tells SSE listeners when it moved.
pub async fn refresh_price(state: AppState) -> Result<(), String> {
    let before = state.prices.cached().map(|p| p.last_updated);
    let snapshot = state.prices.get_or_fetch().await.map_err(|e| e.to_string())?;

    if before != Some(snapshot.last_updated) {
        let _ = state.events_tx.send("priceUpdated".to_string());
    }
    Ok(())
}

/// RSS fetch, then tagging of whatever came in untagged.
pub async fn refresh_news(state: &AppState) -> Result<usize, String> {
    let inserted = rss_service::fetch_all_feeds(state).await?;

    if inserted > 0 {
        if let Err(e) = ai_service::classify_untagged(state).await {
            tracing::error!("[ai] classification failed: {}", e);
        }
    }

    Ok(inserted)
}

/// Next occurrence of `hour:00` UTC strictly after `now`.
pub fn next_daily_run(now: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    let at = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
    let today = now.date_naive().and_time(at).and_utc();

    if today > now { today } else { today + TimeDelta::days(1) }
}

fn spawn_daily_summary(state: AppState) {
    let hour = state.settings.daily_summary_hour_utc;

    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let next = next_daily_run(now, hour);
            let wait = (next - now).to_std().unwrap_or(Duration::from_secs(60));
            time::sleep(wait).await;

            tracing::info!("[cron] generating daily summary");
            if let Err(e) = ai_service::generate_daily_summary(&state).await {
                tracing::error!("[cron] daily summary failed: {}", e);
            }
        }
    });

    tracing::info!("[cron] registered daily-summary (at {:02}:00 UTC)", hour);
}
