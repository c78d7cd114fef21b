//! Input validation and client-wide settings.
//!
//! Every value reaching the network layer goes through one of the
//! `sanitize_*` functions first, so the HTTP modules can assume their
//! inputs are well formed.

use anyhow::{bail, Result};
use clap::ValueEnum;
use reqwest::Url;
use uuid::Uuid;

/// Default API endpoint for the hosted service.
pub const DEFAULT_ENDPOINT: &str = "https://app.sentrigraph.io";

/// Hosted service domain. Only this domain (and subdomains) or
/// localhost are accepted as endpoints.
const HOSTED_DOMAIN: &str = "sentrigraph.io";

const MAX_CREDENTIAL_LEN: usize = 128;
const MAX_SEARCH_LEN: usize = 4096;
const MAX_TOKEN_LEN: usize = 4096;

/// Output format for search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Csv,
}

/// How the session token is attached to the search request.
///
/// Deployments differ here, so it is a configuration choice rather
/// than an assumption baked into the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AuthTransport {
    /// `Cookie: session_token=<token>`
    #[default]
    Cookie,
    /// `Authorization: Bearer <token>`
    Bearer,
}

/// User-Agent header value sent on every request.
pub fn user_agent() -> String {
    format!("sgctl-{}", env!("CARGO_PKG_VERSION"))
}

fn is_loopback_host(host: &str) -> bool {
    host == "localhost" || host == "127.0.0.1" || host == "[::1]" || host == "::1"
}

/// Validate and normalize the API endpoint URL.
///
/// The hosted domain requires https; plain http is only accepted for
/// localhost (development and tests). A trailing slash is stripped so
/// the endpoint can be joined with request paths directly.
pub fn sanitize_api_endpoint(endpoint: &str) -> Result<String> {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        bail!("endpoint must not be empty");
    }

    let url = Url::parse(trimmed)?;
    let host = match url.host_str() {
        Some(host) => host.to_ascii_lowercase(),
        None => bail!("endpoint has no host: {}", trimmed),
    };

    match url.scheme() {
        "https" => {
            if host != HOSTED_DOMAIN
                && !host.ends_with(&format!(".{}", HOSTED_DOMAIN))
                && !is_loopback_host(&host)
            {
                bail!("endpoint host {} is not a {} domain", host, HOSTED_DOMAIN);
            }
        }
        "http" => {
            if !is_loopback_host(&host) {
                bail!("http endpoints are only allowed for localhost");
            }
        }
        scheme => bail!("unsupported endpoint scheme: {}", scheme),
    }

    Ok(trimmed.to_string())
}

/// Validate username and password. Empty values are allowed since
/// credentials are unused when an access token is supplied.
pub fn sanitize_credentials(username: &str, password: &str) -> Result<(String, String)> {
    for (name, value) in [("username", username), ("password", password)] {
        if value.len() > MAX_CREDENTIAL_LEN {
            bail!("{} is longer than {} characters", name, MAX_CREDENTIAL_LEN);
        }
        if value.chars().any(char::is_whitespace) {
            bail!("{} must not contain whitespace", name);
        }
    }
    Ok((username.to_string(), password.to_string()))
}

/// Validate the search string: non-empty and within the server limit.
pub fn sanitize_search_string(search: &str) -> Result<String> {
    if search.is_empty() {
        bail!("search string must not be empty");
    }
    if search.len() > MAX_SEARCH_LEN {
        bail!("search string is longer than {} characters", MAX_SEARCH_LEN);
    }
    Ok(search.to_string())
}

/// Validate the access token. Empty means "not provided".
pub fn sanitize_token(token: &str) -> Result<String> {
    if token.len() > MAX_TOKEN_LEN {
        bail!("token is longer than {} characters", MAX_TOKEN_LEN);
    }
    Ok(token.to_string())
}

/// Workspace IDs are UUIDs. The server is the authority on their
/// meaning; this only rejects obviously malformed input early.
pub fn sanitize_workspace_id(workspace_id: &str) -> Result<String> {
    if workspace_id.is_empty() {
        bail!("workspace ID must not be empty");
    }
    if Uuid::parse_str(workspace_id).is_err() {
        bail!("workspace ID is not a valid UUID: {}", workspace_id);
    }
    Ok(workspace_id.to_string())
}

/// Parse the CSV header list. Bare names are rooted under `/reported.`,
/// names already starting with `/` are taken as-is.
pub fn sanitize_csv_headers(headers: &str) -> Result<Vec<String>> {
    if headers.trim().is_empty() {
        bail!("CSV headers must not be empty");
    }

    let mut sanitized = Vec::new();
    for header in headers.split(',') {
        let header = header.trim();
        if header.is_empty() {
            bail!("CSV headers must not contain empty entries");
        }
        if let Some(stripped) = header.strip_prefix('/') {
            sanitized.push(format!("/{}", stripped));
        } else {
            sanitized.push(format!("/reported.{}", header));
        }
    }
    Ok(sanitized)
}
