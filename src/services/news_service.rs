use async_trait::async_trait;
use chrono::Utc;
use futures_util::StreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::options::{FindOptions, UpdateOptions};
use mongodb::Database;

use crate::{
    models::{NewsItem, SourceType},
    AppState,
};

use super::{ai_gateway::AiGateway, ai_service};

pub const NEWS: &str = "news";

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 50;

#[derive(Debug, Clone, Default)]
pub struct NewsFilter {
    pub source_type: Option<String>,
    pub tag: Option<String>,
    pub search: Option<String>,
}

impl NewsFilter {
    pub fn to_document(&self) -> Document {
        let mut filter = doc! {};

        if let Some(st) = self.source_type.as_deref().map(str::trim) {
            if !st.is_empty() && st != "all" {
                filter.insert("source_type", st);
            }
        }

        if let Some(tag) = self.tag.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            // array membership
            filter.insert("tags", tag);
        }

        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = regex::escape(search);
            filter.insert(
                "$or",
                vec![
                    doc! { "title": { "$regex": &pattern, "$options": "i" } },
                    doc! { "summary": { "$regex": &pattern, "$options": "i" } },
                ],
            );
        }

        filter
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Pagination {
    /// Lenient parsing: anything unparsable falls back to the defaults.
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p > 0)
            .unwrap_or(1) as u64;

        let limit = limit
            .and_then(|l| l.trim().parse::<i64>().ok())
            .filter(|l| *l > 0)
            .map(|l| (l as u64).min(MAX_PAGE_SIZE))
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Self { page, limit }
    }

    /// Clamped to what the driver can send (an i64).
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit).min(i64::MAX as u64)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

#[derive(Debug, Clone)]
pub struct NewsPage {
    pub items: Vec<NewsItem>,
    pub total: u64,
    pub page: u64,
    pub total_pages: u64,
}

async fn collect(db: &Database, filter: Document, opts: FindOptions) -> Result<Vec<NewsItem>, String> {
    let mut cursor = db
        .collection::<NewsItem>(NEWS)
        .find(filter, opts)
        .await
        .map_err(|e| e.to_string())?;

    let mut items = Vec::new();
    while let Some(res) = cursor.next().await {
        items.push(res.map_err(|e| e.to_string())?);
    }
    Ok(items)
}

fn newest_first(limit: i64) -> FindOptions {
    FindOptions::builder()
        .sort(doc! { "published_at": -1 })
        .limit(limit)
        .build()
}

pub async fn list_news(state: &AppState, filter: &NewsFilter, pagination: Pagination) -> Result<NewsPage, String> {
    let filter_doc = filter.to_document();

    let total = state
        .db
        .collection::<NewsItem>(NEWS)
        .count_documents(filter_doc.clone(), None)
        .await
        .map_err(|e| e.to_string())?;

    let opts = FindOptions::builder()
        .sort(doc! { "published_at": -1 })
        .skip(pagination.skip())
        .limit(pagination.limit as i64)
        .build();

    let items = collect(&state.db, filter_doc, opts).await?;

    Ok(NewsPage {
        items,
        total,
        page: pagination.page,
        total_pages: pagination.total_pages(total),
    })
}

pub async fn get_news(state: &AppState, id: ObjectId) -> Result<Option<NewsItem>, String> {
    state
        .db
        .collection::<NewsItem>(NEWS)
        .find_one(doc! { "_id": id }, None)
        .await
        .map_err(|e| e.to_string())
}

/// Inserts unless an item with the same url exists. Returns true on insert.
pub async fn insert_if_absent(db: &Database, item: &NewsItem) -> Result<bool, String> {
    let news = db.collection::<NewsItem>(NEWS);

    let Some(url) = item.url.as_deref() else {
        news.insert_one(item, None).await.map_err(|e| e.to_string())?;
        return Ok(true);
    };

    let fields = mongodb::bson::to_document(item).map_err(|e| e.to_string())?;
    let opts = UpdateOptions::builder().upsert(true).build();

    let res = news
        .update_one(doc! { "url": url }, doc! { "$setOnInsert": fields }, opts)
        .await
        .map_err(|e| e.to_string())?;

    Ok(res.upserted_id.is_some())
}

/// Storage used by manual news creation.
#[async_trait]
pub trait NewsStore: Send + Sync {
    async fn url_exists(&self, url: &str) -> Result<bool, String>;
    async fn insert_if_absent(&self, item: &NewsItem) -> Result<bool, String>;
}

pub struct MongoNewsStore {
    db: Database,
}

impl MongoNewsStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NewsStore for MongoNewsStore {
    async fn url_exists(&self, url: &str) -> Result<bool, String> {
        let found = self
            .db
            .collection::<NewsItem>(NEWS)
            .count_documents(doc! { "url": url }, None)
            .await
            .map_err(|e| e.to_string())?;
        Ok(found > 0)
    }

    async fn insert_if_absent(&self, item: &NewsItem) -> Result<bool, String> {
        insert_if_absent(&self.db, item).await
    }
}

pub struct ManualNews {
    pub title: String,
    pub url: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub source_name: Option<String>,
}

/// Stores a manually submitted item. Returns `Ok(None)` when the url is
/// already stored; that check runs before any AI summary is requested.
pub async fn create_manual(
    store: &dyn NewsStore,
    ai: &AiGateway,
    language: &str,
    input: ManualNews,
) -> Result<Option<NewsItem>, String> {
    if let Some(url) = input.url.as_deref() {
        if store.url_exists(url).await? {
            return Ok(None);
        }
    }

    let summary = match (input.summary, input.content.as_deref()) {
        (Some(s), _) => Some(s),
        (None, Some(body)) => Some(ai_service::summarize_newsletter(ai, language, &input.title, body).await),
        (None, None) => None,
    };

    let now = Utc::now().timestamp();
    let item = NewsItem {
        id: ObjectId::new(),
        title: input.title,
        summary,
        content: input.content,
        url: input.url,
        source_name: input.source_name.unwrap_or_else(|| "Manual".to_string()),
        source_type: SourceType::Manual,
        image_url: None,
        tags: Vec::new(),
        published_at: now,
        created_at: now,
    };

    // a concurrent insert of the same url can still win
    if !store.insert_if_absent(&item).await? {
        return Ok(None);
    }

    Ok(Some(item))
}

pub async fn untagged(db: &Database, limit: i64) -> Result<Vec<NewsItem>, String> {
    let opts = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .limit(limit)
        .build();

    let filter = doc! { "$or": [ { "tags": { "$size": 0 } }, { "tags": { "$exists": false } } ] };
    collect(db, filter, opts).await
}

pub async fn set_tags(db: &Database, id: ObjectId, tags: &[String]) -> Result<(), String> {
    db.collection::<NewsItem>(NEWS)
        .update_one(doc! { "_id": id }, doc! { "$set": { "tags": tags.to_vec() } }, None)
        .await
        .map_err(|e| e.to_string())?;
    Ok(())
}

pub async fn published_since(db: &Database, since: i64, limit: i64) -> Result<Vec<NewsItem>, String> {
    collect(db, doc! { "published_at": { "$gte": since } }, newest_first(limit)).await
}

pub async fn latest(db: &Database, limit: i64) -> Result<Vec<NewsItem>, String> {
    collect(db, doc! {}, newest_first(limit)).await
}

pub async fn search_keyword(db: &Database, keyword: &str, limit: i64) -> Result<Vec<NewsItem>, String> {
    let filter = NewsFilter {
        search: Some(keyword.to_string()),
        ..NewsFilter::default()
    };
    collect(db, filter.to_document(), newest_first(limit)).await
}
