//! HTTP event receiver.
//!
//! Receives platform events and hands each one to its own tokio task.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/slack/events` | Events API envelope (challenge, function, entity details) |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Acknowledgement
//!
//! For `function_executed` the handler waits for the step's [`Ack`] for at
//! most `[server].ack_timeout_secs`, then answers `200` regardless. The step
//! task keeps running after the response has been sent.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "missing event type" } }
//! ```

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::assemble::Assembler;
use crate::config::Config;
use crate::details::{handle_entity_details, EntityDetailsRequest};
use crate::platform::SlackClient;
use crate::step::{run_step, Ack, FunctionInvocation};
use crate::traits::{FunctionRegistry, StepContext};
use crate::upstream::http_client;

/// Shared state for the route handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<FunctionRegistry>,
    pub ctx: Arc<StepContext>,
    pub ack_timeout: Duration,
}

impl AppState {
    pub fn new(registry: FunctionRegistry, ctx: StepContext, ack_timeout: Duration) -> Self {
        Self {
            registry: Arc::new(registry),
            ctx: Arc::new(ctx),
            ack_timeout,
        }
    }
}

/// Build the router. Exposed separately from [`run_server`] so tests can
/// serve it on an ephemeral port.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/slack/events", post(handle_events))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the receiver on `[server].bind` with the built-in step functions.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let http = http_client(&config.http)?;
    let platform = Arc::new(SlackClient::new(&config.slack, http));
    let assembler = Assembler::from_config(config, platform.clone())?;
    let ctx = StepContext::new(platform, Arc::new(assembler));
    let registry = FunctionRegistry::with_builtins();

    for f in registry.functions() {
        tracing::info!(
            callback_id = f.callback_id(),
            "registered step function: {}",
            f.description()
        );
    }

    let state = AppState::new(
        registry,
        ctx,
        Duration::from_secs(config.server.ack_timeout_secs),
    );
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(
        bind = %config.server.bind,
        provider = config.search.provider.as_str(),
        max_results = config.max_results(),
        "event receiver listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /slack/events ============

async fn handle_events(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let envelope: Value = serde_json::from_slice(&body)
        .map_err(|e| bad_request(format!("invalid JSON body: {}", e)))?;

    let kind = envelope
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| bad_request("missing envelope type"))?;

    match kind {
        "url_verification" => {
            let challenge = envelope
                .get("challenge")
                .and_then(Value::as_str)
                .ok_or_else(|| bad_request("url_verification without challenge"))?;
            Ok(Json(json!({ "challenge": challenge })))
        }
        "event_callback" => {
            let event = envelope
                .get("event")
                .cloned()
                .ok_or_else(|| bad_request("event_callback without event"))?;
            dispatch_event(&state, event).await?;
            Ok(Json(json!({})))
        }
        other => {
            tracing::debug!(envelope_type = other, "ignoring envelope");
            Ok(Json(json!({})))
        }
    }
}

async fn dispatch_event(state: &AppState, event: Value) -> Result<(), AppError> {
    let event_type = event
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| bad_request("missing event type"))?
        .to_string();

    match event_type.as_str() {
        "function_executed" => {
            let invocation: FunctionInvocation = serde_json::from_value(event)
                .map_err(|e| bad_request(format!("invalid function_executed event: {}", e)))?;
            dispatch_function(state, invocation).await;
        }
        "entity_details_requested" => {
            let request: EntityDetailsRequest = serde_json::from_value(event).map_err(|e| {
                bad_request(format!("invalid entity_details_requested event: {}", e))
            })?;
            let ctx = state.ctx.clone();
            tokio::spawn(async move {
                handle_entity_details(&request, &ctx).await;
            });
        }
        other => {
            tracing::debug!(event_type = other, "ignoring event");
        }
    }
    Ok(())
}

async fn dispatch_function(state: &AppState, invocation: FunctionInvocation) {
    let callback_id = invocation.function.callback_id.clone();
    let Some(function) = state.registry.find(&callback_id) else {
        tracing::warn!(callback_id = %callback_id, "no step function registered, acknowledging");
        return;
    };

    let (ack, acked) = Ack::channel();
    let ctx = state.ctx.clone();
    tokio::spawn(async move {
        run_step(function.as_ref(), invocation, &ctx, ack).await;
    });

    if tokio::time::timeout(state.ack_timeout, acked).await.is_err() {
        tracing::warn!(
            callback_id = %callback_id,
            timeout_secs = state.ack_timeout.as_secs(),
            "step still running at ack deadline, answering platform"
        );
    }
}
