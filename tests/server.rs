//! Integration tests for the HTTP event receiver.
//!
//! Each test serves the real router on an ephemeral port with a fake
//! platform behind it and talks to it over HTTP.

use async_trait::async_trait;
use search_step::assemble::Assembler;
use search_step::error::{StepError, UpstreamError};
use search_step::platform::Platform;
use search_step::sample_data::SampleDataProvider;
use search_step::server::{router, AppState};
use search_step::traits::{FunctionRegistry, StepContext, StepFunction};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct RecordingPlatform {
    calls: Mutex<Vec<(String, Value)>>,
}

#[async_trait]
impl Platform for RecordingPlatform {
    async fn api_call(&self, method: &str, params: Value) -> Result<Value, UpstreamError> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), params));
        match method {
            "developer.sampleData.get" => Ok(json!({
                "ok": true,
                "samples": [{
                    "title": "Sample 1",
                    "description": "Description 1",
                    "link": "https://example.com/1",
                    "date_updated": "2023-01-01",
                    "external_ref": {"id": "sample1"},
                }]
            })),
            _ => Ok(json!({"ok": true})),
        }
    }
}

impl RecordingPlatform {
    fn methods(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(m, _)| m.clone())
            .collect()
    }
}

/// A step that outlives the ack deadline.
struct Slow;

#[async_trait]
impl StepFunction for Slow {
    fn callback_id(&self) -> &str {
        "slow"
    }
    fn description(&self) -> &str {
        "sleeps before completing"
    }
    fn failure_message(&self) -> &str {
        "Slow step failed."
    }
    async fn execute(&self, _inputs: Value, _ctx: &StepContext) -> Result<Value, StepError> {
        tokio::time::sleep(Duration::from_millis(1500)).await;
        Ok(json!({"done": true}))
    }
}

async fn spawn_server(ack_timeout: Duration) -> (String, Arc<RecordingPlatform>) {
    let platform = Arc::new(RecordingPlatform {
        calls: Mutex::new(Vec::new()),
    });
    let provider = SampleDataProvider::new(platform.clone(), 10);
    let ctx = StepContext::new(platform.clone(), Arc::new(Assembler::new(Box::new(provider))));
    let mut registry = FunctionRegistry::with_builtins();
    registry.register(Arc::new(Slow));

    let app = router(AppState::new(registry, ctx, ack_timeout));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), platform)
}

fn function_event(callback_id: &str, inputs: Value) -> Value {
    json!({
        "type": "event_callback",
        "event": {
            "type": "function_executed",
            "function": {"callback_id": callback_id},
            "function_execution_id": "Fx123",
            "inputs": inputs,
        }
    })
}

#[tokio::test]
async fn test_health() {
    let (base, _) = spawn_server(Duration::from_secs(5)).await;
    let resp = reqwest::get(format!("{}/health", base)).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_url_verification() {
    let (base, _) = spawn_server(Duration::from_secs(5)).await;
    let challenge = "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P";
    let resp = reqwest::Client::new()
        .post(format!("{}/slack/events", base))
        .json(&json!({"type": "url_verification", "challenge": challenge}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["challenge"], challenge);
}

#[tokio::test]
async fn test_function_event_completes_before_response() {
    let (base, platform) = spawn_server(Duration::from_secs(5)).await;
    let resp = reqwest::Client::new()
        .post(format!("{}/slack/events", base))
        .json(&function_event("search", json!({"query": "python"})))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        platform.methods(),
        vec!["developer.sampleData.get", "functions.completeSuccess"]
    );
}

#[tokio::test]
async fn test_slow_step_answered_at_deadline() {
    let (base, platform) = spawn_server(Duration::from_millis(200)).await;
    let resp = reqwest::Client::new()
        .post(format!("{}/slack/events", base))
        .json(&function_event("slow", json!({})))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(platform.methods().is_empty());

    // The step keeps running after the response.
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(platform.methods(), vec!["functions.completeSuccess"]);
}

#[tokio::test]
async fn test_unknown_callback_acknowledged() {
    let (base, platform) = spawn_server(Duration::from_secs(5)).await;
    let resp = reqwest::Client::new()
        .post(format!("{}/slack/events", base))
        .json(&function_event("does_not_exist", json!({})))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(platform.methods().is_empty());
}

#[tokio::test]
async fn test_malformed_envelope_rejected() {
    let (base, _) = spawn_server(Duration::from_secs(5)).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/slack/events", base))
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");

    let resp = client
        .post(format!("{}/slack/events", base))
        .json(&json!({"type": "event_callback", "event": {"type": "function_executed"}}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}
