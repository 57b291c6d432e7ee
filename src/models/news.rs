use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::ts_to_rfc3339;

/// The only tags the classifier is allowed to assign.
pub const TAG_VOCABULARY: [&str; 15] = [
    "Bitcoin",
    "Ethereum",
    "DeFi",
    "NFT",
    "Regulation",
    "Startup",
    "Funding",
    "Web3",
    "Layer2",
    "Stablecoin",
    "Exchange",
    "Mining",
    "GameFi",
    "AI",
    "Macro",
];

pub fn is_known_tag(tag: &str) -> bool {
    TAG_VOCABULARY.contains(&tag)
}

/// Keeps vocabulary tags only, in order, without duplicates.
pub fn filter_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if is_known_tag(tag) && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Rss,
    Newsletter,
    Manual,
}

impl SourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::Rss => "rss",
            SourceType::Newsletter => "newsletter",
            SourceType::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub title: String,
    pub summary: Option<String>,
    pub content: Option<String>,

    // unique (sparse index), so never stored as null
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    pub source_name: String,
    pub source_type: SourceType,
    pub image_url: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    pub published_at: i64,
    pub created_at: i64,
}

impl NewsItem {
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "id": self.id.to_hex(),
            "title": self.title,
            "summary": self.summary,
            "content": self.content,
            "url": self.url,
            "source_name": self.source_name,
            "source_type": self.source_type.as_str(),
            "image_url": self.image_url,
            "tags": self.tags,
            "published_at": ts_to_rfc3339(self.published_at),
            "created_at": ts_to_rfc3339(self.created_at),
        })
    }
}
