//! Session credential exchange.
//!
//! Both login flows return a short-lived session token that the search
//! request attaches as a cookie or bearer header.

use reqwest::{header, Client, StatusCode};
use thiserror::Error;
use tracing::debug;

/// Name of the session cookie set by the server on password login.
pub const SESSION_COOKIE: &str = "session_token";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("login request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("login failed with status {0}")]
    UnexpectedStatus(u16),

    #[error("session token not found in response cookies")]
    MissingSessionCookie,
}

/// Exchange username and password for a session token.
///
/// Success is a 204 with the token in the `session_token` cookie.
pub async fn login_with_password(
    client: &Client,
    endpoint: &str,
    username: &str,
    password: &str,
) -> Result<String, AuthError> {
    let url = format!("{}/api/auth/jwt/login", endpoint);
    debug!(%url, %username, "logging in with password");

    let response = client
        .post(&url)
        .header(header::ACCEPT, "application/json")
        .form(&[("username", username), ("password", password)])
        .send()
        .await?;

    let status = response.status();
    if status != StatusCode::NO_CONTENT {
        return Err(AuthError::UnexpectedStatus(status.as_u16()));
    }

    let token = response
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or(AuthError::MissingSessionCookie);
    token
}

/// Exchange a long-lived access token for a session token.
///
/// Success is a 200 whose raw body is the session token.
pub async fn login_with_access_token(
    client: &Client,
    endpoint: &str,
    access_token: &str,
) -> Result<String, AuthError> {
    let url = format!("{}/api/token/access", endpoint);
    debug!(%url, "exchanging access token for session token");

    let response = client
        .post(&url)
        .json(&serde_json::json!({ "token": access_token }))
        .send()
        .await?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(AuthError::UnexpectedStatus(status.as_u16()));
    }

    Ok(response.text().await?)
}
