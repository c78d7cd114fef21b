//! Streaming graph search.
//!
//! One POST opens a long-lived ndjson response; a reader task decodes it
//! line by line and hands records to the consumer through a capacity-1
//! channel, so decoding never runs ahead of consumption. The reader
//! reports at most one terminal error through a oneshot slot, observed
//! by the consumer after the record sequence is drained.

use std::io;

use futures::TryStreamExt;
use reqwest::{header, Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::io::AsyncBufReadExt;
use tokio::sync::{mpsc, oneshot};
use tokio_util::io::StreamReader;
use tracing::debug;

use crate::auth::SESSION_COOKIE;
use crate::config::AuthTransport;

/// Body of the search request.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub query: String,
    pub with_edges: bool,
}

/// Everything the stream-open call needs beyond the query itself.
/// Passed explicitly; there is no ambient client state.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub endpoint: String,
    pub workspace_id: String,
    pub session_token: String,
    pub auth_transport: AuthTransport,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("error serializing search request: {0}")]
    Request(#[source] serde_json::Error),

    #[error("error making search request: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("search request failed with status {status}: {body}")]
    Server { status: u16, body: String },

    #[error("error reading response body: {0}")]
    Read(#[source] io::Error),

    #[error("error decoding result: {0}")]
    Decode(#[source] serde_json::Error),
}

/// A live search: a sequence of records plus a single error slot.
///
/// Drain records with [`next_record`](Self::next_record) until it returns
/// `None`, then call [`finish`](Self::finish); the terminal error, if any,
/// is only guaranteed visible once the record sequence is exhausted.
/// Dropping the stream early stops the reader at its next handoff.
pub struct SearchStream {
    records: mpsc::Receiver<Value>,
    error: oneshot::Receiver<SearchError>,
}

impl SearchStream {
    /// Next record, in response-body order. `None` means the stream ended,
    /// either cleanly or with an error held in the error slot.
    pub async fn next_record(&mut self) -> Option<Value> {
        self.records.recv().await
    }

    /// Consume the stream and report how it ended.
    pub async fn finish(self) -> Result<(), SearchError> {
        drop(self.records);
        match self.error.await {
            Ok(err) => Err(err),
            // Sender dropped without a value: clean end of input.
            Err(_) => Ok(()),
        }
    }
}

/// Open a streaming search against the inventory of one workspace.
///
/// The reader runs on its own task; records arrive through the returned
/// [`SearchStream`] in input order, one decoded record in flight at a time.
pub fn search_graph(
    client: Client,
    config: SearchConfig,
    query: impl Into<String>,
    with_edges: bool,
) -> SearchStream {
    let request = SearchRequest {
        query: query.into(),
        with_edges,
    };
    let (record_tx, record_rx) = mpsc::channel(1);
    let (error_tx, error_rx) = oneshot::channel();

    tokio::spawn(async move {
        if let Err(err) = stream_records(&client, &config, &request, &record_tx).await {
            // The consumer may already be gone; that is not our problem.
            let _ = error_tx.send(err);
        }
    });

    SearchStream {
        records: record_rx,
        error: error_rx,
    }
}

fn escape_single_quotes(s: &str) -> String {
    s.replace('\'', "'\\''")
}

async fn stream_records(
    client: &Client,
    config: &SearchConfig,
    request: &SearchRequest,
    records: &mpsc::Sender<Value>,
) -> Result<(), SearchError> {
    let body = serde_json::to_string(request).map_err(SearchError::Request)?;
    let url = format!(
        "{}/api/workspaces/{}/inventory/search",
        config.endpoint, config.workspace_id
    );

    if tracing::enabled!(tracing::Level::DEBUG) {
        let auth_header = match config.auth_transport {
            AuthTransport::Cookie => {
                format!("Cookie: {}={}", SESSION_COOKIE, config.session_token)
            }
            AuthTransport::Bearer => format!("Authorization: Bearer {}", config.session_token),
        };
        debug!(
            "equivalent curl command: curl -X POST -H 'Content-Type: application/json' \
             -H 'Accept: application/ndjson' -H '{}' -d '{}' {}",
            auth_header,
            escape_single_quotes(&body),
            url
        );
    }

    let mut builder = client
        .post(&url)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT, "application/ndjson")
        .body(body);
    builder = match config.auth_transport {
        AuthTransport::Cookie => builder.header(
            header::COOKIE,
            format!("{}={}", SESSION_COOKIE, config.session_token),
        ),
        AuthTransport::Bearer => builder.bearer_auth(&config.session_token),
    };

    let response = builder.send().await.map_err(SearchError::Transport)?;

    let status = response.status();
    if status != StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        return Err(SearchError::Server {
            status: status.as_u16(),
            body,
        });
    }

    // Each line is one complete JSON document; lines can be arbitrarily
    // large, so the line buffer must be allowed to grow without a cap.
    let body_stream = Box::pin(response.bytes_stream().map_err(io::Error::other));
    let mut lines = StreamReader::new(body_stream).lines();

    loop {
        // Reserve the handoff slot before reading the next line. The
        // previous record must be taken by the consumer first, which keeps
        // at most one decoded-but-unconsumed record alive (backpressure)
        // and lets a dropped consumer stop the reader right here.
        let permit = match records.reserve().await {
            Ok(permit) => permit,
            Err(_) => return Ok(()),
        };

        let line = match lines.next_line().await.map_err(SearchError::Read)? {
            Some(line) => line,
            None => return Ok(()),
        };

        let record: Value = serde_json::from_str(&line).map_err(SearchError::Decode)?;
        permit.send(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_field_names() {
        let body = serde_json::to_string(&SearchRequest {
            query: "is(instance)".to_string(),
            with_edges: true,
        })
        .unwrap();
        assert_eq!(body, r#"{"query":"is(instance)","with_edges":true}"#);
    }

    #[test]
    fn single_quote_escaping() {
        assert_eq!(escape_single_quotes("no quotes"), "no quotes");
        assert_eq!(escape_single_quotes("it's"), "it'\\''s");
        assert_eq!(escape_single_quotes("''"), "'\\'''\\''");
    }
}
