use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;

use crate::{auth, services::auth_service, AppState};

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    #[serde(default)]
    pub password: String,
}

// POST /api/auth/login
pub async fn post_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginBody>,
) -> Response {
    if state.site_gate.is_open() {
        return Json(json!({ "success": true, "token": auth_service::OPEN_TOKEN })).into_response();
    }

    if !state.site_gate.check_password(&body.password) {
        tracing::warn!("[auth] rejected login attempt");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "error": "Incorrect password" })),
        )
            .into_response();
    }

    let token = match auth_service::make_jwt_with_days(&state.settings, 7) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("[auth] token error: {}", e);
            return crate::controllers::internal_error();
        }
    };

    let jar = jar.add(auth_service::auth_cookie(&state.settings, token.clone()));
    (jar, Json(json!({ "success": true, "token": token }))).into_response()
}

// GET /api/auth/check
pub async fn get_check(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let authenticated = auth::is_authenticated(&state, &headers);
    Json(json!({ "authenticated": authenticated })).into_response()
}
