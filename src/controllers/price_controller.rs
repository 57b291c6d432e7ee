use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    controllers::{internal_error, json_error},
    services::price_service::{self, HistoryPeriod},
    AppState,
};

// GET /api/price/btc
pub async fn get_btc(State(state): State<AppState>) -> Response {
    match state.prices.get_or_fetch().await {
        Ok(snapshot) => Json(snapshot.as_ref().clone()).into_response(),
        Err(e) => {
            tracing::error!("[price] route error: {}", e);
            json_error(StatusCode::SERVICE_UNAVAILABLE, "Price service unavailable")
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub period: Option<String>,
}

// GET /api/price/btc/history?period=1h|24h|7d
pub async fn get_btc_history(State(state): State<AppState>, Query(q): Query<HistoryQuery>) -> Response {
    let raw = q.period.as_deref().unwrap_or("24h");
    let Some(period) = HistoryPeriod::parse(raw) else {
        return json_error(StatusCode::BAD_REQUEST, "Invalid period. Use: 1h, 24h, 7d");
    };

    match price_service::price_history(&state, period).await {
        Ok(points) => Json(json!({ "data": points })).into_response(),
        Err(e) => {
            tracing::error!("[price] history error: {}", e);
            internal_error()
        }
    }
}
