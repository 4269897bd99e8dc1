// system-tests/tests/gateway_flow.rs
// ============================================================================
// Module: Gateway Flow Suite
// Description: End-to-end save/load coverage for the studykeep gateway.
// Purpose: Drive the real HTTP server against a local channel stub.
// Dependencies: studykeep-config, studykeep-gateway, axum, reqwest, tiny_http
// ============================================================================

//! ## Overview
//! These suites boot the real gateway router on an ephemeral port and a
//! local `tiny_http` stub playing the channel API, then exercise the two
//! endpoints over HTTP: record append and reconstruction, absent records,
//! missing credentials, upstream error passthrough, and corrupt records.
//! The stub serves scripted responses in order and records every request
//! it sees.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;
use std::thread::JoinHandle;

use serde_json::Value;
use serde_json::json;
use studykeep_config::AuditSinkType;
use studykeep_config::StudykeepConfig;
use studykeep_gateway::GatewayServer;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Channel Stub
// ============================================================================

/// One request observed by the channel stub.
#[derive(Clone)]
struct SeenRequest {
    /// Request method.
    method: String,
    /// Request path and query string.
    url: String,
    /// Request body.
    body: String,
}

/// Local channel API stand-in serving scripted responses in order.
struct ChannelStub {
    /// Underlying HTTP server handle.
    server: Arc<Server>,
    /// Stub port on localhost.
    port: u16,
    /// Requests observed so far.
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    /// Worker draining incoming requests.
    worker: Option<JoinHandle<()>>,
}

impl ChannelStub {
    /// Starts a stub serving the scripted `(status, body)` responses.
    fn start(script: Vec<(u16, &str)>) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let port = server.server_addr().to_ip().map(|addr| addr.port()).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let worker = {
            let server = Arc::clone(&server);
            let seen = Arc::clone(&seen);
            let mut script: VecDeque<(u16, String)> = script
                .into_iter()
                .map(|(status, body)| (status, body.to_string()))
                .collect();
            thread::spawn(move || {
                while let Ok(mut request) = server.recv() {
                    let mut body = String::new();
                    let _ = request.as_reader().read_to_string(&mut body);
                    if let Ok(mut entries) = seen.lock() {
                        entries.push(SeenRequest {
                            method: request.method().to_string(),
                            url: request.url().to_string(),
                            body,
                        });
                    }
                    let (status, payload) = script.pop_front().unwrap_or((
                        500,
                        r#"{"ok":false,"description":"stub script exhausted"}"#.to_string(),
                    ));
                    let header =
                        Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                            .unwrap();
                    let response = Response::from_string(payload)
                        .with_status_code(status)
                        .with_header(header);
                    let _ = request.respond(response);
                }
            })
        };
        Self {
            server,
            port,
            seen,
            worker: Some(worker),
        }
    }

    /// Returns the stub API base URL.
    fn api_base(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Returns the requests observed so far.
    fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().map_or_else(|_| Vec::new(), |entries| entries.clone())
    }
}

impl Drop for ChannelStub {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

// ============================================================================
// SECTION: Gateway Boot
// ============================================================================

/// Boots the gateway against the stub and returns its base URL.
async fn spawn_gateway(api_base: String) -> String {
    let mut config = StudykeepConfig::default();
    config.transport.api_base = api_base;
    config.transport.allow_http = true;
    config.audit.sink = AuditSinkType::Noop;
    // The blocking transport client must be built off the async reactor.
    let router = tokio::task::spawn_blocking(move || {
        GatewayServer::from_config(config).map(GatewayServer::into_router)
    })
    .await
    .unwrap()
    .unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await;
    });
    format!("http://{addr}")
}

/// Posts a JSON body to a gateway endpoint and returns status and reply.
async fn post_json(gateway: &str, endpoint: &str, body: &Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("{gateway}{endpoint}"))
        .json(body)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    let reply: Value = response.json().await.unwrap();
    (status, reply)
}

/// Builds the credential fields used across suites.
fn with_credentials(mut body: Value) -> Value {
    body["botToken"] = json!("123456:test-token");
    body["channelId"] = json!("@records");
    body
}

// ============================================================================
// SECTION: Save Suite
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn save_appends_record_and_reports_message_id() {
    let stub = ChannelStub::start(vec![(200, r#"{"ok":true,"result":{"message_id":42}}"#)]);
    let gateway = spawn_gateway(stub.api_base()).await;
    let body = with_credentials(json!({
        "userData": {"goal": "math", "sessions": [1, 2]},
        "userId": "u1",
    }));
    let (status, reply) = post_json(&gateway, "/save", &body).await;
    assert_eq!(status, 200);
    assert_eq!(reply, json!({"success": true, "messageId": 42}));

    let seen = stub.requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].url, "/bot123456:test-token/sendMessage");
    let sent: Value = serde_json::from_str(&seen[0].body).unwrap();
    assert_eq!(sent["chat_id"], "@records");
    let text = sent["text"].as_str().unwrap();
    let (header, payload) = text.split_once('\n').unwrap();
    assert!(header.starts_with("STUDY_PLANNER:u1:"));
    let stored: Value = serde_json::from_str(payload).unwrap();
    assert_eq!(stored, json!({"goal": "math", "sessions": [1, 2]}));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn save_without_credentials_is_rejected_before_any_channel_call() {
    let stub = ChannelStub::start(vec![]);
    let gateway = spawn_gateway(stub.api_base()).await;
    let body = json!({"userData": {"goal": "math"}, "userId": "u1"});
    let (status, reply) = post_json(&gateway, "/save", &body).await;
    assert_eq!(status, 400);
    assert_eq!(
        reply,
        json!({"success": false, "error": "Bot token and channel ID required"})
    );
    assert!(stub.requests().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn upstream_error_text_passes_through_on_save() {
    let stub = ChannelStub::start(vec![(
        400,
        r#"{"ok":false,"description":"Bad Request: chat not found"}"#,
    )]);
    let gateway = spawn_gateway(stub.api_base()).await;
    let body = with_credentials(json!({"userData": {}, "userId": "u1"}));
    let (status, reply) = post_json(&gateway, "/save", &body).await;
    assert_eq!(status, 500);
    assert_eq!(
        reply,
        json!({"success": false, "error": "Bad Request: chat not found"})
    );
}

// ============================================================================
// SECTION: Load Suite
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn load_reconstructs_newest_record_from_any_delivery_order() {
    // Oldest-first delivery with foreign records and chatter interleaved.
    let stub = ChannelStub::start(vec![(
        200,
        r#"{"ok":true,"result":[
            {"message_id":1,"text":"STUDY_PLANNER:u1:2024-01-01T00:00:00Z\n{\"rev\":1}","date":1704067200},
            {"message_id":2,"text":"unrelated chatter","date":1704070000},
            {"message_id":3,"date":1704080000},
            {"message_id":4,"text":"STUDY_PLANNER:u2:2024-01-05T00:00:00Z\n{}","date":1704100000},
            {"message_id":5,"text":"STUDY_PLANNER:u1:2024-01-03T00:00:00Z\n{\"rev\":2}","date":1704326400}
        ]}"#,
    )]);
    let gateway = spawn_gateway(stub.api_base()).await;
    let body = with_credentials(json!({"userId": "u1"}));
    let (status, reply) = post_json(&gateway, "/load", &body).await;
    assert_eq!(status, 200);
    assert_eq!(
        reply,
        json!({
            "success": true,
            "data": {"rev": 2},
            "lastUpdated": "2024-01-04T00:00:00Z"
        })
    );

    let seen = stub.requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "GET");
    assert!(seen[0].url.starts_with("/bot123456:test-token/getChatHistory?"));
    assert!(seen[0].url.contains("limit=100"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn load_reports_null_data_when_no_record_exists() {
    let stub = ChannelStub::start(vec![(200, r#"{"ok":true,"result":[]}"#)]);
    let gateway = spawn_gateway(stub.api_base()).await;
    let body = with_credentials(json!({"userId": "u1"}));
    let (status, reply) = post_json(&gateway, "/load", &body).await;
    assert_eq!(status, 200);
    assert_eq!(reply, json!({"success": true, "data": null}));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn corrupt_record_is_a_server_error_not_a_miss() {
    // Matching header with no payload line after it.
    let stub = ChannelStub::start(vec![(
        200,
        r#"{"ok":true,"result":[
            {"message_id":1,"text":"STUDY_PLANNER:u1:2024-01-01T00:00:00Z","date":1704067200}
        ]}"#,
    )]);
    let gateway = spawn_gateway(stub.api_base()).await;
    let body = with_credentials(json!({"userId": "u1"}));
    let (status, reply) = post_json(&gateway, "/load", &body).await;
    assert_eq!(status, 500);
    assert_eq!(reply["success"], json!(false));
    let error = reply["error"].as_str().unwrap();
    assert!(error.contains("record decoding failed"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn load_without_user_id_is_rejected() {
    let stub = ChannelStub::start(vec![]);
    let gateway = spawn_gateway(stub.api_base()).await;
    let body = with_credentials(json!({}));
    let (status, reply) = post_json(&gateway, "/load", &body).await;
    assert_eq!(status, 400);
    assert_eq!(reply, json!({"success": false, "error": "User ID required"}));
    assert!(stub.requests().is_empty());
}
