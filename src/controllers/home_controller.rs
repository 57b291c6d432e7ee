use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use mongodb::bson::doc;
use serde_json::json;

use crate::{controllers::json_error, AppState};

// GET /api/health
pub async fn health(State(state): State<AppState>) -> Response {
    let db = match state.db.run_command(doc! { "ping": 1 }, None).await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::warn!("[health] mongo ping failed: {}", e);
            "error"
        }
    };

    let last_news_fetch = state
        .status
        .last_news_fetch()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "never".to_string());

    Json(json!({
        "status": "ok",
        "uptime": state.status.uptime_secs(),
        "db": db,
        "lastNewsFetch": last_news_fetch,
    }))
    .into_response()
}

// any unmatched /api path
pub async fn api_not_found() -> Response {
    json_error(StatusCode::NOT_FOUND, "Not found")
}
