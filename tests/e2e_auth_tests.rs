//! End-to-end tests for the session credential exchange.

mod common;

use std::collections::HashMap;

use axum::extract::Form;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use reqwest::Client;
use serde_json::Value;

use common::{MockServer, TEST_ACCESS_TOKEN, TEST_PASS, TEST_SESSION_TOKEN, TEST_USER};
use sgctl::auth::{self, AuthError};

fn login_router() -> Router {
    Router::new().route(
        "/api/auth/jwt/login",
        post(|Form(params): Form<HashMap<String, String>>| async move {
            if params.get("username").map(String::as_str) == Some(TEST_USER)
                && params.get("password").map(String::as_str) == Some(TEST_PASS)
            {
                (
                    StatusCode::NO_CONTENT,
                    [(
                        header::SET_COOKIE,
                        format!("session_token={}; Path=/; HttpOnly", TEST_SESSION_TOKEN),
                    )],
                )
                    .into_response()
            } else {
                StatusCode::UNAUTHORIZED.into_response()
            }
        }),
    )
}

fn token_router() -> Router {
    Router::new().route(
        "/api/token/access",
        post(|Json(body): Json<Value>| async move {
            if body.get("token").and_then(Value::as_str) == Some(TEST_ACCESS_TOKEN) {
                (StatusCode::OK, TEST_SESSION_TOKEN.to_string()).into_response()
            } else {
                StatusCode::FORBIDDEN.into_response()
            }
        }),
    )
}

#[tokio::test]
async fn password_login_returns_session_cookie_value() {
    let server = MockServer::spawn(login_router()).await;
    let client = Client::new();

    let token = auth::login_with_password(&client, &server.base_url, TEST_USER, TEST_PASS)
        .await
        .unwrap();

    assert_eq!(token, TEST_SESSION_TOKEN);
}

#[tokio::test]
async fn password_login_rejected_credentials() {
    let server = MockServer::spawn(login_router()).await;
    let client = Client::new();

    let err = auth::login_with_password(&client, &server.base_url, TEST_USER, "wrong_password")
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::UnexpectedStatus(401)));
}

#[tokio::test]
async fn password_login_missing_session_cookie() {
    let router = Router::new().route(
        "/api/auth/jwt/login",
        post(|| async { StatusCode::NO_CONTENT }),
    );
    let server = MockServer::spawn(router).await;
    let client = Client::new();

    let err = auth::login_with_password(&client, &server.base_url, TEST_USER, TEST_PASS)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::MissingSessionCookie));
}

#[tokio::test]
async fn access_token_exchange_returns_body() {
    let server = MockServer::spawn(token_router()).await;
    let client = Client::new();

    let token = auth::login_with_access_token(&client, &server.base_url, TEST_ACCESS_TOKEN)
        .await
        .unwrap();

    assert_eq!(token, TEST_SESSION_TOKEN);
}

#[tokio::test]
async fn access_token_exchange_rejected() {
    let server = MockServer::spawn(token_router()).await;
    let client = Client::new();

    let err = auth::login_with_access_token(&client, &server.base_url, "unknown_token")
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::UnexpectedStatus(403)));
}
