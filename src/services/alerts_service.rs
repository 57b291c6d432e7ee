use async_trait::async_trait;
use chrono::Utc;
use futures_util::StreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::options::FindOptions;
use mongodb::Database;
use regex::Regex;

use crate::{
    models::{Direction, PriceAlert},
    AppState,
};

pub const ALERTS: &str = "price_alerts";

pub fn is_valid_email(email: &str) -> bool {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
        .map(|re| re.is_match(email))
        .unwrap_or(false)
}

/// What the alert monitor needs from storage.
#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn active_alerts(&self) -> Result<Vec<PriceAlert>, String>;

    /// Deactivates an alert that is still active. Returns false when another
    /// writer got there first (or the alert is gone).
    async fn mark_triggered(&self, id: ObjectId, triggered_at: i64, email_sent: bool) -> Result<bool, String>;
}

#[derive(Clone)]
pub struct MongoAlertStore {
    db: Database,
}

impl MongoAlertStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AlertStore for MongoAlertStore {
    async fn active_alerts(&self) -> Result<Vec<PriceAlert>, String> {
        let alerts = self.db.collection::<PriceAlert>(ALERTS);

        let mut cursor = alerts
            .find(doc! { "is_active": true }, None)
            .await
            .map_err(|e| e.to_string())?;

        let mut items = Vec::new();
        while let Some(res) = cursor.next().await {
            items.push(res.map_err(|e| e.to_string())?);
        }
        Ok(items)
    }

    async fn mark_triggered(&self, id: ObjectId, triggered_at: i64, email_sent: bool) -> Result<bool, String> {
        let alerts = self.db.collection::<PriceAlert>(ALERTS);

        let res = alerts
            .update_one(
                doc! { "_id": id, "is_active": true },
                doc! { "$set": {
                    "is_active": false,
                    "triggered_at": triggered_at,
                    "email_sent": email_sent,
                } },
                None,
            )
            .await
            .map_err(|e| e.to_string())?;

        Ok(res.matched_count > 0)
    }
}

pub async fn create_alert(
    state: &AppState,
    email: &str,
    target_price: f64,
    direction: Direction,
) -> Result<PriceAlert, String> {
    let alerts = state.db.collection::<PriceAlert>(ALERTS);
    let alert = PriceAlert::new(email, target_price, direction, Utc::now().timestamp());

    alerts
        .insert_one(&alert, None)
        .await
        .map_err(|e| e.to_string())?;

    tracing::info!(
        "[alerts] created {} for {}: BTC {} {}",
        alert.id.to_hex(),
        alert.email,
        direction.as_str(),
        target_price
    );

    let _ = state.events_tx.send("alertsUpdated".to_string());

    Ok(alert)
}

pub async fn list_alerts_for_email(state: &AppState, email: &str) -> Result<Vec<PriceAlert>, String> {
    let alerts = state.db.collection::<PriceAlert>(ALERTS);

    let find_opts = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = alerts
        .find(doc! { "email": email }, find_opts)
        .await
        .map_err(|e| e.to_string())?;

    let mut items: Vec<PriceAlert> = Vec::new();
    while let Some(res) = cursor.next().await {
        items.push(res.map_err(|e| e.to_string())?);
    }

    Ok(items)
}

/// Returns false when no alert had that id.
pub async fn delete_alert(state: &AppState, alert_id: ObjectId) -> Result<bool, String> {
    let alerts = state.db.collection::<PriceAlert>(ALERTS);

    let res = alerts
        .delete_one(doc! { "_id": alert_id }, None)
        .await
        .map_err(|e| e.to_string())?;

    if res.deleted_count > 0 {
        let _ = state.events_tx.send("alertsUpdated".to_string());
    }

    Ok(res.deleted_count > 0)
}
