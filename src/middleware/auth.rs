use axum::{
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::{services::auth_service, AppState};

fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;

    for part in raw.split(';') {
        let part = part.trim();
        let mut it = part.splitn(2, '=');
        let k = it.next()?.trim();
        let v = it.next()?.trim();
        if k == name {
            return Some(v.to_string());
        }
    }
    None
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = raw.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token.to_string()) }
}

/// True when the site is open or the request carries a valid token
/// (bearer header first, then the auth cookie).
pub fn is_authenticated(state: &AppState, headers: &HeaderMap) -> bool {
    if state.site_gate.is_open() {
        return true;
    }

    bearer_token(headers)
        .or_else(|| get_cookie(headers, &state.settings.jwt_cookie_name))
        .map(|token| auth_service::verify_jwt(&state.settings, &token))
        .unwrap_or(false)
}

fn is_public_path(path: &str) -> bool {
    !path.starts_with("/api/")
        || path.starts_with("/api/auth/")
        || path == "/api/health"
}

pub async fn require_site_auth(
    State(state): State<AppState>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    if is_public_path(req.uri().path()) || is_authenticated(&state, req.headers()) {
        return next.run(req).await;
    }

    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Unauthorized. Please log in first." })),
    )
        .into_response()
}
