//! Router-level checks of the bearer-auth stage: which routes are open,
//! which reject on missing/invalid tokens, and that a valid token makes it
//! past authorization into the storage layer.

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Request, StatusCode},
    Router,
};
use saldo::{auth::TokenSigner, cli::globals::GlobalArgs, saldo::router};
use secrecy::SecretString;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use std::{sync::Arc, time::Duration};
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "http-test-secret";

// Lazy pool pointing nowhere: requests that reach storage fail with an
// internal error, which is enough to show the auth stage let them through.
fn unreachable_pool() -> sqlx::PgPool {
    let options = PgConnectOptions::new()
        .host("127.0.0.1")
        .port(1)
        .username("invalid")
        .database("invalid")
        .ssl_mode(PgSslMode::Disable);
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy_with(options)
}

fn app() -> (Router, TokenSigner) {
    let secret = SecretString::from(SECRET.to_string());
    let signer = TokenSigner::new(&secret);
    let globals = GlobalArgs::new(secret, 3600);
    let app = router(unreachable_pool(), Arc::new(signer.clone()), globals);
    (app, signer)
}

#[tokio::test]
async fn health_is_open() {
    let (app, _) = app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("request should run");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn entries_reject_missing_token() {
    let (app, _) = app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/entries")
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("request should run");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn entries_reject_garbage_token() {
    let (app, _) = app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/entries")
                .header(AUTHORIZATION, "Bearer not-a-token")
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("request should run");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn entries_reject_token_signed_with_other_secret() {
    let (app, _) = app();

    let other = TokenSigner::new(&SecretString::from("other-secret".to_string()));
    let token = other
        .issue(Uuid::new_v4(), 3600)
        .expect("issue should succeed");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/entries")
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("request should run");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn entries_accept_valid_token_past_the_auth_stage() {
    let (app, signer) = app();

    let token = signer
        .issue(Uuid::new_v4(), 3600)
        .expect("issue should succeed");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/entries")
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("request should run");

    // Authorization succeeded; the failure comes from the unreachable
    // database behind it.
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn login_is_open_but_validates_payload() {
    let (app, _) = app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/login")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"email":"not-an-email","password":"hunter2hunter2"}"#))
                .expect("request should build"),
        )
        .await
        .expect("request should run");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
