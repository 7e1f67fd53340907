use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use skillswap::{api_router, services::TokenService, test_utils::test_helpers};
use sqlx::SqlitePool;
use tower::ServiceExt;

async fn setup_app() -> (SqlitePool, Router) {
    let pool = test_helpers::create_test_db().await.unwrap();
    let state = test_helpers::test_state(pool.clone()).unwrap();
    (pool, api_router(state))
}

async fn request_json(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_me_requires_token() {
    let (_pool, app) = setup_app().await;

    let (status, body) = request_json(&app, "GET", "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "missing_token");
}

#[tokio::test]
async fn test_malformed_authorization_header_is_missing_token() {
    let (_pool, app) = setup_app().await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/auth/me")
        .header("authorization", "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "missing_token");
}

#[tokio::test]
async fn test_garbage_bearer_token_rejected() {
    let (_pool, app) = setup_app().await;

    let (status, body) =
        request_json(&app, "GET", "/api/auth/me", Some("not-a-real-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "invalid_token");
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let (_pool, app) = setup_app().await;

    // Same secret as the app, but issued already past its expiry
    let stale_issuer = TokenService::new("test-jwt-secret", -60);
    let token = stale_issuer.issue(1, "old@example.com").unwrap();

    let (status, body) = request_json(&app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "invalid_token");
}

#[tokio::test]
async fn test_foreign_secret_token_rejected() {
    let (_pool, app) = setup_app().await;

    let foreign_issuer = TokenService::new("some-other-secret", 3600);
    let token = foreign_issuer.issue(1, "spoof@example.com").unwrap();

    let (status, body) = request_json(&app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "invalid_token");
}

#[tokio::test]
async fn test_login_requires_fields() {
    let (_pool, app) = setup_app().await;

    let (status, body) = request_json(&app, "POST", "/api/auth/login", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");
    assert_eq!(body["error"], "Email and password are required");
}

#[tokio::test]
async fn test_bad_credentials_are_indistinguishable() {
    let (pool, app) = setup_app().await;
    test_helpers::insert_test_user(&pool, "dana@example.com", "correct-horse", "Dana Petrov", true)
        .await
        .unwrap();

    let (status, wrong_password) = request_json(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "dana@example.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, unknown_email) = request_json(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Same code and same message either way
    assert_eq!(wrong_password["code"], "invalid_credentials");
    assert_eq!(wrong_password, unknown_email);
}

#[tokio::test]
async fn test_login_and_me_roundtrip() {
    let (pool, app) = setup_app().await;
    test_helpers::insert_test_user(&pool, "dana@example.com", "correct-horse", "Dana Petrov", true)
        .await
        .unwrap();

    let (status, body) = request_json(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "dana@example.com", "password": "correct-horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user"]["full_name"], "Dana Petrov");
    assert!(body["user"].get("password_hash").is_none());
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = request_json(&app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "dana@example.com");
}

#[tokio::test]
async fn test_login_trims_email_whitespace() {
    let (pool, app) = setup_app().await;
    test_helpers::insert_test_user(&pool, "dana@example.com", "correct-horse", "Dana Petrov", true)
        .await
        .unwrap();

    let (status, _body) = request_json(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "  dana@example.com  ", "password": "correct-horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
