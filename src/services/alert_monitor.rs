use std::time::Duration;

use chrono::Utc;
use tokio::time::{self, MissedTickBehavior};

use crate::AppState;

use super::{
    alerts_service::{AlertStore, MongoAlertStore},
    email_service::Notifier,
    price_cache::PriceCache,
};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CheckReport {
    pub price: f64,
    pub checked: usize,
    pub triggered: usize,
    pub emails_sent: usize,
    pub failures: usize,
}

pub fn spawn_price_alert_monitor(state: AppState) {
    let every = Duration::from_secs(state.settings.alert_check_interval_secs.max(1));

    tokio::spawn(async move {
        let store = MongoAlertStore::new(state.db.clone());
        let mut interval = time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            match check_alerts(&state.prices, &store, state.notifier.as_ref()).await {
                Ok(report) if report.triggered > 0 => {
                    tracing::info!(
                        "[alerts] tick: {} triggered, {} emailed, {} failed (BTC ${})",
                        report.triggered,
                        report.emails_sent,
                        report.failures,
                        report.price
                    );
                    let _ = state.events_tx.send("alertsUpdated".to_string());
                }
                Ok(_) => {}
                Err(e) => tracing::error!("[alerts] check failed: {}", e),
            }
        }
    });
}

/// One evaluation pass over every active alert.
///
/// A triggered alert is consumed whether or not its email went out; only
/// `email_sent` records the delivery outcome. A failure on one alert is
/// logged and counted, and the pass moves on to the next one.
pub async fn check_alerts(
    prices: &PriceCache,
    store: &dyn AlertStore,
    notifier: &dyn Notifier,
) -> Result<CheckReport, String> {
    let price = prices.get_or_fetch().await.map_err(|e| e.to_string())?;
    let current = price.usd;

    let alerts = store.active_alerts().await?;

    let mut report = CheckReport {
        price: current,
        checked: alerts.len(),
        ..CheckReport::default()
    };

    for alert in alerts {
        if !alert.should_trigger(current) {
            continue;
        }

        tracing::info!(
            "[alerts] triggering {} for {}: BTC {} {}",
            alert.id.to_hex(),
            alert.email,
            alert.direction.as_str(),
            alert.target_price
        );

        let email_sent = match notifier.send_price_alert(&alert, current).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("[alerts] email failed for {}: {}", alert.id.to_hex(), e);
                false
            }
        };

        match store
            .mark_triggered(alert.id, Utc::now().timestamp(), email_sent)
            .await
        {
            Ok(true) => {
                report.triggered += 1;
                if email_sent {
                    report.emails_sent += 1;
                }
            }
            Ok(false) => {
                tracing::warn!("[alerts] {} was already deactivated", alert.id.to_hex());
            }
            Err(e) => {
                tracing::error!("[alerts] failed to deactivate {}: {}", alert.id.to_hex(), e);
                report.failures += 1;
            }
        }
    }

    Ok(report)
}
