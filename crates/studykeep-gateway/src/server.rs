// crates/studykeep-gateway/src/server.rs
// ============================================================================
// Module: Gateway HTTP Server
// Description: axum server exposing the save/load record endpoints.
// Purpose: Parse untrusted requests, enforce limits, map errors uniformly.
// Dependencies: studykeep-config, studykeep-transport, axum, tokio
// ============================================================================

//! ## Overview
//! The server exposes `POST /save` and `POST /load`. Bodies are read as
//! raw bytes so the size limit applies before any parsing; every failure
//! maps onto the uniform `{ "success": false, "error": ... }` shape with
//! the taxonomy's status code. Handlers are stateless: credentials travel
//! in each request and the shared state holds only the transport client,
//! limits, and observability sinks.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use axum::Router;
use axum::body::Bytes;
use axum::extract::ConnectInfo;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::post;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use studykeep_config::StudykeepConfig;
use studykeep_core::UserId;
use studykeep_transport::ChannelCredentials;
use studykeep_transport::TelegramClient;

use crate::audit::AuditSink;
use crate::audit::GatewayAuditEvent;
use crate::audit::GatewayAuditEventParams;
use crate::audit::sink_from_config;
use crate::clock::SystemClock;
use crate::service::GatewayError;
use crate::service::RecordService;
use crate::telemetry::GatewayEndpoint;
use crate::telemetry::GatewayMetricEvent;
use crate::telemetry::GatewayMetrics;
use crate::telemetry::GatewayOutcome;
use crate::telemetry::NoopMetrics;

// ============================================================================
// SECTION: Validation Messages
// ============================================================================

/// Failure text when credentials are absent (pinned by the API contract).
const CREDENTIALS_REQUIRED: &str = "Bot token and channel ID required";
/// Failure text when the user identifier is absent.
const USER_ID_REQUIRED: &str = "User ID required";
/// Failure text when the save payload is absent.
const USER_DATA_REQUIRED: &str = "User data required";
/// Failure text when the body is not decodable JSON.
const INVALID_BODY: &str = "invalid request body";

// ============================================================================
// SECTION: Gateway Server
// ============================================================================

/// Gateway server instance.
pub struct GatewayServer {
    /// Socket address string the server binds to.
    bind: String,
    /// Record orchestration service.
    service: RecordService,
    /// Maximum allowed request body size.
    max_body_bytes: usize,
    /// Audit sink receiving request events.
    audit: Arc<dyn AuditSink>,
    /// Metrics sink receiving request events.
    metrics: Arc<dyn GatewayMetrics>,
}

impl GatewayServer {
    /// Builds a new gateway server from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError`] when initialization fails.
    pub fn from_config(config: StudykeepConfig) -> Result<Self, ServeError> {
        config.validate().map_err(|err| ServeError::Config(err.to_string()))?;
        let transport = TelegramClient::new(config.transport.clone())
            .map_err(|err| ServeError::Init(err.to_string()))?;
        let audit =
            sink_from_config(&config.audit).map_err(|err| ServeError::Init(err.to_string()))?;
        let service =
            RecordService::new(transport, config.retrieval.history_limit, Arc::new(SystemClock));
        Ok(Self {
            bind: config.server.bind,
            service,
            max_body_bytes: config.server.max_body_bytes,
            audit,
            metrics: Arc::new(NoopMetrics),
        })
    }

    /// Replaces the metrics sink, for deployments that export telemetry.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn GatewayMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Consumes the server and returns its request router.
    ///
    /// The router expects to be served with peer connect info, as
    /// [`GatewayServer::serve`] does.
    #[must_use]
    pub fn into_router(self) -> Router {
        let state = Arc::new(ServerState {
            service: self.service,
            max_body_bytes: self.max_body_bytes,
            audit: self.audit,
            metrics: self.metrics,
        });
        Router::new()
            .route("/save", post(handle_save))
            .route("/load", post(handle_load))
            .with_state(state)
    }

    /// Serves requests on the configured bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError`] when the server fails.
    pub async fn serve(self) -> Result<(), ServeError> {
        let addr: SocketAddr = self
            .bind
            .parse()
            .map_err(|_| ServeError::Config("invalid bind address".to_string()))?;
        let app = self.into_router();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|_| ServeError::Transport("http bind failed".to_string()))?;
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .map_err(|_| ServeError::Transport("http server failed".to_string()))
    }
}

/// Shared server state for request handlers.
struct ServerState {
    /// Record orchestration service.
    service: RecordService,
    /// Maximum allowed request body size.
    max_body_bytes: usize,
    /// Audit sink receiving request events.
    audit: Arc<dyn AuditSink>,
    /// Metrics sink receiving request events.
    metrics: Arc<dyn GatewayMetrics>,
}

// ============================================================================
// SECTION: Wire Shapes
// ============================================================================

/// `POST /save` request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveBody {
    /// Planner state payload to persist.
    user_data: Option<Value>,
    /// Bot token authorizing the channel call.
    bot_token: Option<String>,
    /// Channel receiving the record.
    channel_id: Option<String>,
    /// Record owner.
    user_id: Option<String>,
}

/// `POST /load` request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadBody {
    /// Bot token authorizing the channel call.
    bot_token: Option<String>,
    /// Channel serving the history window.
    channel_id: Option<String>,
    /// Record owner.
    user_id: Option<String>,
}

/// Successful `POST /save` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveReply {
    /// Always true.
    success: bool,
    /// Transport-assigned message identifier.
    message_id: i64,
}

/// Successful `POST /load` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoadReply {
    /// Always true.
    success: bool,
    /// Stored payload, or null when no record exists.
    data: Value,
    /// Creation time of the message the record was read from.
    #[serde(skip_serializing_if = "Option::is_none")]
    last_updated: Option<String>,
}

/// Uniform failure response.
#[derive(Debug, Serialize)]
struct FailureReply {
    /// Always false.
    success: bool,
    /// Failure description.
    error: String,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Handles `POST /save`.
async fn handle_save(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    bytes: Bytes,
) -> Response {
    let started = Instant::now();
    let (user_id, result) = run_save(&state, &bytes);
    finalize(&state, GatewayEndpoint::Save, peer, bytes.len(), user_id, started, result)
}

/// Handles `POST /load`.
async fn handle_load(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    bytes: Bytes,
) -> Response {
    let started = Instant::now();
    let (user_id, result) = run_load(&state, &bytes);
    finalize(&state, GatewayEndpoint::Load, peer, bytes.len(), user_id, started, result)
}

/// Parses and executes a save request.
fn run_save(
    state: &ServerState,
    bytes: &Bytes,
) -> (Option<String>, Result<SaveReply, GatewayError>) {
    if bytes.len() > state.max_body_bytes {
        return (None, Err(GatewayError::PayloadTooLarge));
    }
    let body: SaveBody = match serde_json::from_slice(bytes) {
        Ok(body) => body,
        Err(_) => return (None, Err(GatewayError::Validation(INVALID_BODY.to_string()))),
    };
    let observed_user = body.user_id.clone();
    (observed_user, save_with(state, body))
}

/// Validates a save body and appends the record.
fn save_with(state: &ServerState, body: SaveBody) -> Result<SaveReply, GatewayError> {
    let credentials = require_credentials(body.bot_token.as_deref(), body.channel_id.as_deref())?;
    let user_id = require_user_id(body.user_id.as_deref())?;
    let user_data = body
        .user_data
        .ok_or_else(|| GatewayError::Validation(USER_DATA_REQUIRED.to_string()))?;
    let message_id =
        call_with_blocking(|| state.service.save(&credentials, &user_id, &user_data))?;
    Ok(SaveReply {
        success: true,
        message_id,
    })
}

/// Parses and executes a load request.
fn run_load(
    state: &ServerState,
    bytes: &Bytes,
) -> (Option<String>, Result<LoadReply, GatewayError>) {
    if bytes.len() > state.max_body_bytes {
        return (None, Err(GatewayError::PayloadTooLarge));
    }
    let body: LoadBody = match serde_json::from_slice(bytes) {
        Ok(body) => body,
        Err(_) => return (None, Err(GatewayError::Validation(INVALID_BODY.to_string()))),
    };
    let observed_user = body.user_id.clone();
    (observed_user, load_with(state, body))
}

/// Validates a load body and reconstructs the latest record.
fn load_with(state: &ServerState, body: LoadBody) -> Result<LoadReply, GatewayError> {
    let credentials = require_credentials(body.bot_token.as_deref(), body.channel_id.as_deref())?;
    let user_id = require_user_id(body.user_id.as_deref())?;
    let record = call_with_blocking(|| state.service.load(&credentials, &user_id))?;
    Ok(match record {
        Some(record) => LoadReply {
            success: true,
            data: record.payload,
            last_updated: Some(record.last_updated.as_str().to_string()),
        },
        None => LoadReply {
            success: true,
            data: Value::Null,
            last_updated: None,
        },
    })
}

// ============================================================================
// SECTION: Validation Helpers
// ============================================================================

/// Requires both credential fields, then validates their shape.
fn require_credentials(
    bot_token: Option<&str>,
    channel_id: Option<&str>,
) -> Result<ChannelCredentials, GatewayError> {
    let (Some(bot_token), Some(channel_id)) = (bot_token, channel_id) else {
        return Err(GatewayError::Validation(CREDENTIALS_REQUIRED.to_string()));
    };
    if bot_token.is_empty() || channel_id.is_empty() {
        return Err(GatewayError::Validation(CREDENTIALS_REQUIRED.to_string()));
    }
    ChannelCredentials::new(bot_token, channel_id)
        .map_err(|err| GatewayError::Validation(err.to_string()))
}

/// Requires a present, valid user identifier.
fn require_user_id(user_id: Option<&str>) -> Result<UserId, GatewayError> {
    let Some(user_id) = user_id else {
        return Err(GatewayError::Validation(USER_ID_REQUIRED.to_string()));
    };
    if user_id.is_empty() {
        return Err(GatewayError::Validation(USER_ID_REQUIRED.to_string()));
    }
    UserId::new(user_id).map_err(|err| GatewayError::Validation(err.to_string()))
}

/// Executes channel work, shifting to a blocking context when available.
fn call_with_blocking<T>(
    call: impl FnOnce() -> Result<T, GatewayError>,
) -> Result<T, GatewayError> {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(call)
        }
        _ => call(),
    }
}

// ============================================================================
// SECTION: Response Assembly
// ============================================================================

/// Serializes a reply and packages the HTTP response with its byte size.
fn json_response(status: StatusCode, body: &impl Serialize) -> (usize, Response) {
    serde_json::to_vec(body).map_or_else(
        |_| {
            let fallback =
                br#"{"success":false,"error":"response serialization failed"}"#.to_vec();
            let len = fallback.len();
            (
                len,
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [(header::CONTENT_TYPE, "application/json")],
                    fallback,
                )
                    .into_response(),
            )
        },
        |bytes| {
            let len = bytes.len();
            (len, (status, [(header::CONTENT_TYPE, "application/json")], bytes).into_response())
        },
    )
}

/// Maps a handler result onto the wire and records audit and telemetry.
fn finalize<T: Serialize>(
    state: &ServerState,
    endpoint: GatewayEndpoint,
    peer: SocketAddr,
    request_bytes: usize,
    user_id: Option<String>,
    started: Instant,
    result: Result<T, GatewayError>,
) -> Response {
    let (status, error_kind, sized_response) = match result {
        Ok(reply) => (StatusCode::OK, None, json_response(StatusCode::OK, &reply)),
        Err(err) => {
            let status = err.status();
            let failure = FailureReply {
                success: false,
                error: err.to_string(),
            };
            (status, Some(err.kind()), json_response(status, &failure))
        }
    };
    let (response_bytes, response) = sized_response;
    record_request(
        state,
        &RequestRecord {
            endpoint,
            peer_ip: Some(peer.ip().to_string()),
            status,
            error_kind,
            request_bytes,
            response_bytes,
            user_id,
            latency: started.elapsed(),
        },
    );
    response
}

/// Request metadata captured for audit and telemetry.
struct RequestRecord {
    /// Endpoint handling the request.
    endpoint: GatewayEndpoint,
    /// Peer IP address when available.
    peer_ip: Option<String>,
    /// Response HTTP status code.
    status: StatusCode,
    /// Normalized error kind label.
    error_kind: Option<&'static str>,
    /// Request body size in bytes.
    request_bytes: usize,
    /// Response body size in bytes.
    response_bytes: usize,
    /// Record owner when the request named one.
    user_id: Option<String>,
    /// End-to-end handling latency.
    latency: Duration,
}

/// Emits one audit event and one metric event for a handled request.
fn record_request(state: &ServerState, record: &RequestRecord) {
    let outcome = if record.error_kind.is_none() {
        GatewayOutcome::Ok
    } else {
        GatewayOutcome::Error
    };
    state.audit.record(&GatewayAuditEvent::from_params(GatewayAuditEventParams {
        endpoint: record.endpoint,
        peer_ip: record.peer_ip.clone(),
        outcome,
        status: record.status.as_u16(),
        error_kind: record.error_kind,
        request_bytes: record.request_bytes,
        response_bytes: record.response_bytes,
        user_id: record.user_id.clone(),
    }));
    state.metrics.record(&GatewayMetricEvent {
        endpoint: record.endpoint,
        outcome,
        status: record.status.as_u16(),
        error_kind: record.error_kind,
        request_bytes: record.request_bytes,
        response_bytes: record.response_bytes,
        latency: record.latency,
    });
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Gateway server lifecycle errors.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================
