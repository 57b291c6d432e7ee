mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use tower::ServiceExt;

use common::{response_json, test_state};
use cryptopulse::{rate_limit::RateLimits, routes, services::auth_service::SiteGate};

async fn app_with_limits(api_per_minute: u32, chat_per_minute: u32) -> Router {
    let mut state = test_state(SiteGate::open()).await;
    state.rate_limits = Arc::new(RateLimits::new(api_per_minute, chat_per_minute));
    routes::app(state)
}

fn chat(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/ai/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn chat_over_budget_gets_429() {
    let app = app_with_limits(100, 3).await;

    for _ in 0..3 {
        let res = app.clone().oneshot(chat("{}")).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    let res = app.clone().oneshot(chat("{}")).await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(res.headers().contains_key(header::RETRY_AFTER));
    assert_eq!(
        response_json(res).await["error"],
        "Too many requests. Please wait a moment."
    );

    // the chat budget does not block other routes
    let res = app.oneshot(get("/api/nope")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn api_over_budget_gets_429() {
    let app = app_with_limits(2, 10).await;

    for _ in 0..2 {
        let res = app.clone().oneshot(get("/api/nope")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    let res = app.clone().oneshot(get("/api/nope")).await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response_json(res).await["error"], "Too many requests");
}

#[tokio::test]
async fn login_attempts_count_against_the_budget() {
    let mut state = test_state(SiteGate::from_password("hunter22", 4).unwrap()).await;
    state.rate_limits = Arc::new(RateLimits::new(1, 10));
    let app = routes::app(state);

    let login = || {
        Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"password":"guess"}"#))
            .unwrap()
    };

    let res = app.clone().oneshot(login()).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app.oneshot(login()).await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
}
