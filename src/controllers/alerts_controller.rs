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
    models::Direction,
    services::alerts_service::{self, is_valid_email},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreateAlertBody {
    #[serde(default)]
    pub email: Option<serde_json::Value>,
    // number or numeric string
    #[serde(default)]
    pub target_price: Option<serde_json::Value>,
    #[serde(default)]
    pub direction: Option<serde_json::Value>,
}

fn parse_target_price(raw: Option<&serde_json::Value>) -> Option<f64> {
    let price = match raw? {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    (price.is_finite() && price > 0.0).then_some(price)
}

// POST /api/alerts
pub async fn post_create_alert(
    State(state): State<AppState>,
    Json(body): Json<CreateAlertBody>,
) -> Response {
    let email = json_str(body.email.as_ref()).map(str::trim).unwrap_or("");
    if email.is_empty() || !is_valid_email(email) {
        return json_error(StatusCode::BAD_REQUEST, "Valid email is required");
    }

    let Some(target) = parse_target_price(body.target_price.as_ref()) else {
        return json_error(StatusCode::BAD_REQUEST, "target_price must be a positive number");
    };

    let Some(direction) = json_str(body.direction.as_ref()).and_then(Direction::parse) else {
        return json_error(StatusCode::BAD_REQUEST, r#"direction must be "above" or "below""#);
    };

    match alerts_service::create_alert(&state, email, target, direction).await {
        Ok(alert) => (
            StatusCode::CREATED,
            Json(json!({ "id": alert.id.to_hex(), "message": "Alert created" })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("[alerts] create error: {}", e);
            internal_error()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    #[serde(default)]
    pub email: Option<String>,
}

// GET /api/alerts?email=
pub async fn get_alerts(State(state): State<AppState>, Query(q): Query<AlertsQuery>) -> Response {
    let email = q.email.as_deref().map(str::trim).unwrap_or("");
    if email.is_empty() || !is_valid_email(email) {
        return json_error(StatusCode::BAD_REQUEST, "Valid email query parameter is required");
    }

    match alerts_service::list_alerts_for_email(&state, email).await {
        Ok(alerts) => {
            let items: Vec<serde_json::Value> = alerts.iter().map(|a| a.to_json()).collect();
            (StatusCode::OK, Json(serde_json::Value::Array(items))).into_response()
        }
        Err(e) => {
            tracing::error!("[alerts] list error: {}", e);
            internal_error()
        }
    }
}

// DELETE /api/alerts/:id
pub async fn delete_alert(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Ok(oid) = ObjectId::parse_str(&id) else {
        return json_error(StatusCode::BAD_REQUEST, "Invalid ID");
    };

    match alerts_service::delete_alert(&state, oid).await {
        Ok(true) => (StatusCode::OK, Json(json!({ "message": "Alert removed" }))).into_response(),
        Ok(false) => json_error(StatusCode::NOT_FOUND, "Alert not found"),
        Err(e) => {
            tracing::error!("[alerts] delete error: {}", e);
            internal_error()
        }
    }
}
