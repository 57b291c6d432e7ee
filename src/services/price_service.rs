use chrono::{TimeDelta, Utc};
use futures_util::StreamExt;
use mongodb::bson::doc;
use mongodb::options::FindOptions;
use serde::Serialize;

use crate::{
    models::{ts_to_rfc3339, PricePoint},
    AppState,
};

pub const HISTORY: &str = "btc_price_history";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryPeriod {
    Hour,
    Day,
    Week,
}

impl HistoryPeriod {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1h" => Some(HistoryPeriod::Hour),
            "24h" => Some(HistoryPeriod::Day),
            "7d" => Some(HistoryPeriod::Week),
            _ => None,
        }
    }

    pub fn span(self) -> TimeDelta {
        match self {
            HistoryPeriod::Hour => TimeDelta::hours(1),
            HistoryPeriod::Day => TimeDelta::hours(24),
            HistoryPeriod::Week => TimeDelta::days(7),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryPoint {
    pub price: f64,
    pub timestamp: Option<String>,
}

/// Records the current (cached or fetched) price.
pub async fn save_price_history(state: &AppState) -> Result<(), String> {
    let price = state.prices.get_or_fetch().await.map_err(|e| e.to_string())?;

    let point = PricePoint {
        id: None,
        price_usd: price.usd,
        price_brl: price.brl,
        recorded_at: Utc::now().timestamp(),
    };

    state
        .db
        .collection::<PricePoint>(HISTORY)
        .insert_one(&point, None)
        .await
        .map_err(|e| e.to_string())?;

    tracing::debug!("[price] history saved at ${}", point.price_usd);
    Ok(())
}

pub async fn price_history(state: &AppState, period: HistoryPeriod) -> Result<Vec<HistoryPoint>, String> {
    let since = (Utc::now() - period.span()).timestamp();

    let find_opts = FindOptions::builder()
        .sort(doc! { "recorded_at": 1 })
        .build();

    let mut cursor = state
        .db
        .collection::<PricePoint>(HISTORY)
        .find(doc! { "recorded_at": { "$gte": since } }, find_opts)
        .await
        .map_err(|e| e.to_string())?;

    let mut points = Vec::new();
    while let Some(res) = cursor.next().await {
        let p = res.map_err(|e| e.to_string())?;
        points.push(HistoryPoint {
            price: p.price_usd,
            timestamp: ts_to_rfc3339(p.recorded_at),
        });
    }

    Ok(points)
}
