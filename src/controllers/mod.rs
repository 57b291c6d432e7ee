use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

pub mod ai_controller;
pub mod alerts_controller;
pub mod auth_controller;
pub mod home_controller;
pub mod news_controller;
pub mod price_controller;
pub mod realtime_controller;

pub(crate) fn json_error(status: StatusCode, msg: &str) -> Response {
    (status, Json(json!({ "error": msg }))).into_response()
}

/// String value of an optional JSON field; other JSON types count as absent
/// so handlers answer with their own 400 instead of a deserialize error.
pub(crate) fn json_str(v: Option<&serde_json::Value>) -> Option<&str> {
    v.and_then(serde_json::Value::as_str)
}

pub(crate) fn internal_error() -> Response {
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}
