mod common;

use axum::{
    http::{header, Request, StatusCode},
    routing::{delete, get},
    Router,
};
use tower::ServiceExt;

use common::{response_json, test_state};
use cryptopulse::{controllers::alerts_controller, services::auth_service::SiteGate};

async fn app() -> Router {
    let state = test_state(SiteGate::open()).await;
    Router::new()
        .route(
            "/alerts",
            get(alerts_controller::get_alerts).post(alerts_controller::post_create_alert),
        )
        .route("/alerts/:id", delete(alerts_controller::delete_alert))
        .with_state(state)
}

fn post_json(uri: &str, body: &str) -> Request<axum::body::Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap()
}

async fn assert_create_rejected(body: &str, message: &str) {
    let res = app().await.oneshot(post_json("/alerts", body)).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let json = response_json(res).await;
    assert_eq!(json["error"], message);
}

#[tokio::test]
async fn create_with_invalid_email_is_rejected() {
    assert_create_rejected(
        r#"{"email":"not-an-email","target_price":100000,"direction":"above"}"#,
        "Valid email is required",
    )
    .await;
}

#[tokio::test]
async fn create_without_email_is_rejected() {
    assert_create_rejected(
        r#"{"target_price":100000,"direction":"above"}"#,
        "Valid email is required",
    )
    .await;
}

#[tokio::test]
async fn create_with_non_positive_price_is_rejected() {
    for price in ["0", "-5", "\"abc\"", "null", "true"] {
        let body = format!(r#"{{"email":"a@b.co","target_price":{price},"direction":"above"}}"#);
        assert_create_rejected(&body, "target_price must be a positive number").await;
    }
}

#[tokio::test]
async fn create_with_unknown_direction_is_rejected() {
    assert_create_rejected(
        r#"{"email":"a@b.co","target_price":"95000.5","direction":"sideways"}"#,
        r#"direction must be "above" or "below""#,
    )
    .await;
}

#[tokio::test]
async fn list_requires_valid_email_query() {
    for uri in ["/alerts", "/alerts?email=", "/alerts?email=bad"] {
        let req = Request::builder().uri(uri).body(axum::body::Body::empty()).unwrap();
        let res = app().await.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{uri}");

        let json = response_json(res).await;
        assert_eq!(json["error"], "Valid email query parameter is required");
    }
}

#[tokio::test]
async fn delete_with_malformed_id_is_rejected() {
    let req = Request::builder()
        .method("DELETE")
        .uri("/alerts/not-an-id")
        .body(axum::body::Body::empty())
        .unwrap();

    let res = app().await.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(res).await["error"], "Invalid ID");
}

#[tokio::test]
async fn create_with_non_string_email_is_rejected() {
    for email in ["123", "true", "[\"a@b.co\"]", "{}"] {
        let body = format!(r#"{{"email":{email},"target_price":100000,"direction":"above"}}"#);
        assert_create_rejected(&body, "Valid email is required").await;
    }
}

#[tokio::test]
async fn create_with_non_string_direction_is_rejected() {
    for direction in ["5", "null", "[\"above\"]"] {
        let body = format!(r#"{{"email":"a@b.co","target_price":100000,"direction":{direction}}}"#);
        assert_create_rejected(&body, r#"direction must be "above" or "below""#).await;
    }
}
