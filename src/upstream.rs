//! Shared HTTP plumbing for upstream providers.
//!
//! Every outbound request goes through one `reqwest::Client` built from
//! `[http]` config, so all calls carry the same I/O timeout and user agent.
//! Responses are mapped onto [`UpstreamError`]:
//!
//! | Condition | Error |
//! |-----------|-------|
//! | connect / timeout / read failure | `Unavailable` |
//! | non-2xx status | `Unavailable` |
//! | body is not JSON | `Malformed` |

use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;

use crate::config::HttpConfig;
use crate::error::UpstreamError;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Longest slice of an error body kept in an error message.
const ERROR_BODY_LIMIT: usize = 200;

/// Build the HTTP client used for all upstream calls.
pub fn http_client(config: &HttpConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")
}

/// Send a GET request and parse the JSON body.
pub async fn get_json(
    http: &reqwest::Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<Value, UpstreamError> {
    let response = http
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| UpstreamError::Unavailable(format!("GET {}: {}", url, e)))?;
    read_json(response, url).await
}

/// Check the status of a response and parse its body as JSON.
///
/// `what` names the request in error messages.
pub async fn read_json(response: reqwest::Response, what: &str) -> Result<Value, UpstreamError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(UpstreamError::Unavailable(format!(
            "{} returned {}: {}",
            what,
            status,
            truncate(&body, ERROR_BODY_LIMIT)
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| UpstreamError::Unavailable(format!("{}: failed to read body: {}", what, e)))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| UpstreamError::Malformed(format!("{}: invalid JSON: {}", what, e)))
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
