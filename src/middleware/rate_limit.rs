use std::net::SocketAddr;
use std::num::NonZeroU32;

use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use governor::{
    clock::{Clock, DefaultClock},
    DefaultKeyedRateLimiter, Quota, RateLimiter,
};
use serde_json::json;

use crate::AppState;

// drop idle client entries once the table grows past this
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// Per-client request budgets: one for all of `/api`, a tighter one for chat.
pub struct RateLimits {
    api: DefaultKeyedRateLimiter<String>,
    chat: DefaultKeyedRateLimiter<String>,
}

fn per_minute(n: u32) -> Quota {
    Quota::per_minute(NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN))
}

impl RateLimits {
    pub fn new(api_per_minute: u32, chat_per_minute: u32) -> Self {
        Self {
            api: RateLimiter::keyed(per_minute(api_per_minute)),
            chat: RateLimiter::keyed(per_minute(chat_per_minute)),
        }
    }
}

fn client_key<B>(req: &Request<B>) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "local".to_string())
}

fn is_chat(method: &Method, path: &str) -> bool {
    method == Method::POST && path == "/api/ai/chat"
}

fn too_many(limiter: &DefaultKeyedRateLimiter<String>, key: &String, message: &str) -> Option<Response> {
    if limiter.len() > MAX_TRACKED_CLIENTS {
        limiter.retain_recent();
    }

    let not_until = limiter.check_key(key).err()?;
    let wait = not_until.wait_time_from(DefaultClock::default().now());

    let mut res = (StatusCode::TOO_MANY_REQUESTS, Json(json!({ "error": message }))).into_response();
    let secs = wait.as_secs().max(1).to_string();
    if let Ok(v) = HeaderValue::from_str(&secs) {
        res.headers_mut().insert(header::RETRY_AFTER, v);
    }
    Some(res)
}

pub async fn limit_requests(
    State(state): State<AppState>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let path = req.uri().path();
    if !path.starts_with("/api/") {
        return next.run(req).await;
    }

    let key = client_key(&req);
    let limits = &state.rate_limits;

    if let Some(res) = too_many(&limits.api, &key, "Too many requests") {
        tracing::warn!("[rate] {} over the api budget", key);
        return res;
    }

    if is_chat(req.method(), path) {
        if let Some(res) = too_many(&limits.chat, &key, "Too many requests. Please wait a moment.") {
            tracing::warn!("[rate] {} over the chat budget", key);
            return res;
        }
    }

    next.run(req).await
}
