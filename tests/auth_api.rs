//! Health check and token helper routes.

use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;

#[tokio::test]
async fn health_reports_service() {
    let app = common::spawn_app().await;

    let res = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "site-backend");
    assert!(body["time"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn request_id_is_propagated() {
    let app = common::spawn_app().await;

    let res = app
        .client
        .get(app.url("/health"))
        .header("x-request-id", "abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "abc-123");
}

#[tokio::test]
async fn verify_accepts_and_rejects() {
    let app = common::spawn_app().await;

    let res = app
        .client
        .post(app.url("/auth/verify"))
        .json(&json!({ "idToken": "token-ada@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["valid"], true);
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["displayName"], "Test User");

    let res = app
        .client
        .post(app.url("/auth/verify"))
        .json(&json!({ "idToken": "forged" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "valid": false, "error": "Invalid token" }));

    let res = app
        .client
        .post(app.url("/auth/verify"))
        .json(&json!({ "idToken": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn provider_outage_is_a_server_error() {
    let app = common::spawn_app().await;

    let res = app
        .client
        .post(app.url("/auth/verify"))
        .json(&json!({ "idToken": "down" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Internal server error");
}

#[tokio::test]
async fn user_and_refresh() {
    let app = common::spawn_app().await;

    let res = app
        .client
        .get(app.url("/auth/user"))
        .header("authorization", "Bearer token-ada@example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["uid"], "uid-ada@example.com");

    let res = app.client.get(app.url("/auth/user")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app
        .client
        .post(app.url("/auth/refresh"))
        .json(&json!({ "idToken": "token-ada@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Token is valid");
}
