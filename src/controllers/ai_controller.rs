use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::{
    controllers::{internal_error, json_error},
    services::ai_service,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    pub message: Option<serde_json::Value>,
}

// POST /api/ai/chat
pub async fn post_chat(State(state): State<AppState>, Json(body): Json<ChatBody>) -> Response {
    let message = match body.message {
        Some(serde_json::Value::String(m)) if !m.is_empty() => m,
        _ => return json_error(StatusCode::BAD_REQUEST, "message is required"),
    };

    if message.trim().chars().count() < 3 {
        return json_error(StatusCode::BAD_REQUEST, "message must be at least 3 characters");
    }

    match ai_service::chat(&state, &message).await {
        Ok(answer) => {
            let sources: Vec<serde_json::Value> = answer
                .sources
                .iter()
                .map(|s| json!({ "id": s.id, "title": s.title, "url": s.url }))
                .collect();
            Json(json!({ "reply": answer.reply, "sources": sources })).into_response()
        }
        Err(e) => {
            tracing::error!("[ai] chat error: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "AI service unavailable")
        }
    }
}

// POST /api/ai/summary/generate
pub async fn post_generate_summary(State(state): State<AppState>) -> Response {
    match ai_service::generate_daily_summary(&state).await {
        Ok(summary) => Json(json!({ "summary": summary })).into_response(),
        Err(e) => {
            tracing::error!("[ai] generate summary error: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate summary")
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub date: Option<String>,
}

// GET /api/ai/summary?date=YYYY-MM-DD
pub async fn get_summary(State(state): State<AppState>, Query(q): Query<SummaryQuery>) -> Response {
    let date = match q.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => match NaiveDate::parse_from_str(d, "%Y-%m-%d") {
            Ok(parsed) => parsed.format("%Y-%m-%d").to_string(),
            Err(_) => return json_error(StatusCode::BAD_REQUEST, "date must be YYYY-MM-DD"),
        },
        None => Utc::now().format("%Y-%m-%d").to_string(),
    };

    match ai_service::summary_for_date(&state, &date).await {
        Ok(Some(summary)) => Json(json!({ "summary": summary.to_json() })).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "Summary not found for this date"),
        Err(e) => {
            tracing::error!("[ai] get summary error: {}", e);
            internal_error()
        }
    }
}

// GET /api/ai/summary/latest
pub async fn get_latest_summary(State(state): State<AppState>) -> Response {
    match ai_service::latest_summary(&state).await {
        Ok(Some(summary)) => Json(json!({ "summary": summary.to_json() })).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "No summaries available"),
        Err(e) => {
            tracing::error!("[ai] get latest summary error: {}", e);
            internal_error()
        }
    }
}
