use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::ts_to_rfc3339;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySummary {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    // YYYY-MM-DD (UTC), unique
    pub summary_date: String,
    pub content: String,
    pub model_used: String,
    pub news_count: i64,
    pub created_at: i64,
}

impl DailySummary {
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "id": self.id.map(|id| id.to_hex()),
            "summary_date": self.summary_date,
            "content": self.content,
            "model_used": self.model_used,
            "news_count": self.news_count,
            "created_at": ts_to_rfc3339(self.created_at),
        })
    }
}
