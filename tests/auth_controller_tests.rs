mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

use common::{response_json, test_state};
use cryptopulse::{routes, services::auth_service::SiteGate, AppState};

const PASSWORD: &str = "hunter22";

async fn gated_state() -> AppState {
    // low bcrypt cost keeps the test fast
    test_state(SiteGate::from_password(PASSWORD, 4).unwrap()).await
}

fn login(password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(format!(r#"{{"password":"{password}"}}"#)))
        .unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut req = Request::builder().uri(uri);
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    req.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn open_site_hands_out_open_token() {
    let app = routes::app(test_state(SiteGate::open()).await);

    let res = app.oneshot(login("anything")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let json = response_json(res).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["token"], "open");
}

#[tokio::test]
async fn open_site_check_is_authenticated() {
    let app = routes::app(test_state(SiteGate::open()).await);

    let res = app.oneshot(get("/api/auth/check", None)).await.unwrap();
    assert_eq!(response_json(res).await["authenticated"], true);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = routes::app(gated_state().await);

    let res = app.oneshot(login("nope")).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let json = response_json(res).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "Incorrect password");
}

#[tokio::test]
async fn open_token_is_not_accepted_on_gated_site() {
    let app = routes::app(gated_state().await);

    let res = app.oneshot(get("/api/auth/check", Some("open"))).await.unwrap();
    assert_eq!(response_json(res).await["authenticated"], false);
}

#[tokio::test]
async fn login_sets_cookie_and_token_unlocks_api() {
    let state = gated_state().await;
    let cookie_name = state.settings.jwt_cookie_name.clone();
    let app = routes::app(state);

    let res = app.clone().oneshot(login(PASSWORD)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let set_cookie = res
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(set_cookie.starts_with(&format!("{cookie_name}=")));
    assert!(set_cookie.contains("HttpOnly"));

    let token = response_json(res).await["token"].as_str().unwrap().to_string();

    let res = app
        .clone()
        .oneshot(get("/api/auth/check", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response_json(res).await["authenticated"], true);

    // past the gate, the handler's own validation answers
    let res = app
        .clone()
        .oneshot(get("/api/alerts?email=bad", Some(&token)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let cookie_req = Request::builder()
        .uri("/api/alerts?email=bad")
        .header(header::COOKIE, format!("{cookie_name}={token}"))
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(cookie_req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn gated_api_without_token_is_unauthorized() {
    let app = routes::app(gated_state().await);

    for uri in ["/api/alerts?email=a@b.co", "/api/news", "/api/price/btc"] {
        let res = app.clone().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(
            response_json(res).await["error"],
            "Unauthorized. Please log in first."
        );
    }
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    let app = routes::app(gated_state().await);

    let res = app
        .oneshot(get("/api/alerts?email=bad", Some("not.a.jwt")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}
