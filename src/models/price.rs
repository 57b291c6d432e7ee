use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Current BTC market data as served by `/api/price/btc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub usd: f64,
    pub brl: f64,
    pub change_24h: f64,
    pub volume_24h: f64,
    pub market_cap: f64,
    pub last_updated: DateTime<Utc>,
}

/// One row of `btc_price_history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub price_usd: f64,
    pub price_brl: f64,
    pub recorded_at: i64,
}
