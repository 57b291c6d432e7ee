use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::ts_to_rfc3339;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Above,
    Below,
}

impl Direction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "above" => Some(Direction::Above),
            "below" => Some(Direction::Below),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Above => "above",
            Direction::Below => "below",
        }
    }

    /// Threshold comparison is inclusive on both sides.
    pub fn is_crossed(self, price: f64, target: f64) -> bool {
        match self {
            Direction::Above => price >= target,
            Direction::Below => price <= target,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceAlert {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub email: String,
    pub target_price: f64,
    pub direction: Direction,

    // flips to false once, on trigger
    pub is_active: bool,
    pub triggered_at: Option<i64>,
    pub email_sent: bool,

    pub created_at: i64,
}

impl PriceAlert {
    pub fn new(email: &str, target_price: f64, direction: Direction, now: i64) -> Self {
        Self {
            id: ObjectId::new(),
            email: email.to_string(),
            target_price,
            direction,
            is_active: true,
            triggered_at: None,
            email_sent: false,
            created_at: now,
        }
    }

    pub fn should_trigger(&self, price: f64) -> bool {
        self.is_active && self.direction.is_crossed(price, self.target_price)
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "id": self.id.to_hex(),
            "email": self.email,
            "target_price": self.target_price,
            "direction": self.direction.as_str(),
            "is_active": self.is_active,
            "triggered_at": self.triggered_at.and_then(ts_to_rfc3339),
            "email_sent": self.email_sent,
            "created_at": ts_to_rfc3339(self.created_at),
        })
    }
}
