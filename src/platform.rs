//! Host platform (Slack Web API) access.
//!
//! Everything the step functions send to the platform goes through the
//! [`Platform`] trait: completing or failing a function execution, presenting
//! entity details, and the `developer.sampleData.get` search provider.
//! [`SlackClient`] is the production implementation; tests substitute a
//! recording fake.
//!
//! Slack answers every method with an envelope `{"ok": bool, ...}`.
//! [`Platform::api_call`] returns the envelope as-is; [`ensure_ok`] turns
//! `ok: false` into an error and logs the platform's `error` code.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::SlackConfig;
use crate::error::UpstreamError;
use crate::upstream::read_json;

pub const COMPLETE_SUCCESS_METHOD: &str = "functions.completeSuccess";
pub const COMPLETE_ERROR_METHOD: &str = "functions.completeError";
pub const PRESENT_DETAILS_METHOD: &str = "entity.presentDetails";

/// A Web API method call against the host platform.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Call `method` with a JSON body and return the response envelope.
    async fn api_call(&self, method: &str, params: Value) -> Result<Value, UpstreamError>;
}

/// Slack Web API client.
///
/// Sends `POST {api_base_url}/{method}` with a JSON body and the bot token as
/// a bearer credential.
pub struct SlackClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl SlackClient {
    pub fn new(config: &SlackConfig, http: reqwest::Client) -> Self {
        let token = config.token();
        if token.is_none() {
            tracing::warn!(
                env = %config.token_env,
                "no bot token in environment; platform calls will be unauthenticated"
            );
        }
        Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token,
        }
    }
}

#[async_trait]
impl Platform for SlackClient {
    async fn api_call(&self, method: &str, params: Value) -> Result<Value, UpstreamError> {
        let url = format!("{}/{}", self.base_url, method);
        let mut request = self.http.post(&url).json(&params);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| UpstreamError::Unavailable(format!("{}: {}", method, e)))?;
        read_json(response, method).await
    }
}

/// Pass the envelope through if `ok` is true, otherwise log and reject it.
pub fn ensure_ok(method: &str, envelope: Value) -> Result<Value, UpstreamError> {
    if envelope.get("ok").and_then(Value::as_bool) == Some(true) {
        return Ok(envelope);
    }
    let error = envelope
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("no error found");
    tracing::error!(method, error, "platform API request failed");
    Err(UpstreamError::Malformed(format!(
        "ok=false for method={}",
        method
    )))
}

/// Report a function execution as completed with `outputs`.
pub async fn complete_success(
    platform: &dyn Platform,
    function_execution_id: &str,
    outputs: Value,
) -> Result<(), UpstreamError> {
    let params = json!({
        "function_execution_id": function_execution_id,
        "outputs": outputs,
    });
    let envelope = platform.api_call(COMPLETE_SUCCESS_METHOD, params).await?;
    ensure_ok(COMPLETE_SUCCESS_METHOD, envelope).map(|_| ())
}

/// Report a function execution as failed with a user-facing message.
pub async fn complete_error(
    platform: &dyn Platform,
    function_execution_id: &str,
    error: &str,
) -> Result<(), UpstreamError> {
    let params = json!({
        "function_execution_id": function_execution_id,
        "error": error,
    });
    let envelope = platform.api_call(COMPLETE_ERROR_METHOD, params).await?;
    ensure_ok(COMPLETE_ERROR_METHOD, envelope).map(|_| ())
}

/// Open the entity detail pane.
pub async fn present_details(platform: &dyn Platform, payload: Value) -> Result<(), UpstreamError> {
    let envelope = platform.api_call(PRESENT_DETAILS_METHOD, payload).await?;
    ensure_ok(PRESENT_DETAILS_METHOD, envelope).map(|_| ())
}
