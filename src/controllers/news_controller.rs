use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use mongodb::bson::oid::ObjectId;
use serde::Deserialize;
use serde_json::json;

use crate::{
    controllers::{internal_error, json_error, json_str},
    services::news_service::{self, ManualNews, MongoNewsStore, NewsFilter, Pagination},
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct NewsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub source_type: Option<String>,
    pub tag: Option<String>,
    pub search: Option<String>,
}

// GET /api/news
pub async fn get_news(State(state): State<AppState>, Query(q): Query<NewsQuery>) -> Response {
    let pagination = Pagination::from_query(q.page.as_deref(), q.limit.as_deref());
    let filter = NewsFilter {
        source_type: q.source_type,
        tag: q.tag,
        search: q.search,
    };

    match news_service::list_news(&state, &filter, pagination).await {
        Ok(page) => {
            let data: Vec<serde_json::Value> = page.items.iter().map(|n| n.to_json()).collect();
            Json(json!({
                "data": data,
                "total": page.total,
                "page": page.page,
                "totalPages": page.total_pages,
            }))
            .into_response()
        }
        Err(e) => {
            tracing::error!("[news] list error: {}", e);
            internal_error()
        }
    }
}

// GET /api/news/:id
pub async fn get_news_item(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Ok(oid) = ObjectId::parse_str(&id) else {
        return json_error(StatusCode::BAD_REQUEST, "Invalid ID");
    };

    match news_service::get_news(&state, oid).await {
        Ok(Some(item)) => Json(item.to_json()).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "News not found"),
        Err(e) => {
            tracing::error!("[news] get error: {}", e);
            internal_error()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateNewsBody {
    #[serde(default)]
    pub title: Option<serde_json::Value>,
    #[serde(default)]
    pub url: Option<serde_json::Value>,
    #[serde(default)]
    pub summary: Option<serde_json::Value>,
    #[serde(default)]
    pub content: Option<serde_json::Value>,
    #[serde(default)]
    pub source_name: Option<serde_json::Value>,
}

fn non_blank(v: Option<&serde_json::Value>) -> Option<String> {
    json_str(v).map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn is_http_url(u: &str) -> bool {
    u.starts_with("http://") || u.starts_with("https://")
}

// POST /api/news
pub async fn post_news(State(state): State<AppState>, Json(body): Json<CreateNewsBody>) -> Response {
    let Some(title) = non_blank(body.title.as_ref()) else {
        return json_error(StatusCode::BAD_REQUEST, "title is required");
    };

    let url = match body.url.as_ref() {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(u)) if u.trim().is_empty() => None,
        Some(serde_json::Value::String(u)) if is_http_url(u.trim()) => Some(u.trim().to_string()),
        Some(_) => return json_error(StatusCode::BAD_REQUEST, "url must start with http:// or https://"),
    };

    let input = ManualNews {
        title,
        url,
        summary: non_blank(body.summary.as_ref()).map(|s| s.chars().take(500).collect()),
        content: non_blank(body.content.as_ref()).map(|c| c.chars().take(5000).collect()),
        source_name: non_blank(body.source_name.as_ref()),
    };

    let store = MongoNewsStore::new(state.db.clone());
    match news_service::create_manual(&store, &state.ai, &state.settings.ai_response_language, input).await {
        Ok(Some(item)) => {
            let _ = state.events_tx.send("newsUpdated".to_string());
            (
                StatusCode::CREATED,
                Json(json!({ "id": item.id.to_hex(), "message": "News created" })),
            )
                .into_response()
        }
        Ok(None) => json_error(StatusCode::CONFLICT, "News with this url already exists"),
        Err(e) => {
            tracing::error!("[news] create error: {}", e);
            internal_error()
        }
    }
}
