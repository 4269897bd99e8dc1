// crates/studykeep-gateway/src/audit.rs
// ============================================================================
// Module: Gateway Audit Logging
// Description: Structured audit events for gateway request handling.
// Purpose: Emit redacted audit logs without hard dependencies.
// Dependencies: studykeep-config, serde
// ============================================================================

//! ## Overview
//! This module defines the audit event payload and sinks for gateway
//! request logging. Events are JSON lines so deployments can route them
//! to their preferred logging pipeline without redesign. Credentials and
//! payloads never enter audit events; the user identifier does, since it
//! is the retrieval key rather than a secret.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;
use studykeep_config::AuditConfig;
use studykeep_config::AuditSinkType;

use crate::telemetry::GatewayEndpoint;
use crate::telemetry::GatewayOutcome;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Gateway audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Endpoint handling the request.
    pub endpoint: GatewayEndpoint,
    /// Peer IP address when available.
    pub peer_ip: Option<String>,
    /// Request outcome.
    pub outcome: GatewayOutcome,
    /// Response HTTP status code.
    pub status: u16,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Response body size in bytes.
    pub response_bytes: usize,
    /// Record owner when the request named one.
    pub user_id: Option<String>,
}

/// Inputs required to construct an audit event.
pub struct GatewayAuditEventParams {
    /// Endpoint handling the request.
    pub endpoint: GatewayEndpoint,
    /// Peer IP address if known.
    pub peer_ip: Option<String>,
    /// Request outcome.
    pub outcome: GatewayOutcome,
    /// Response HTTP status code.
    pub status: u16,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Response body size in bytes.
    pub response_bytes: usize,
    /// Record owner when the request named one.
    pub user_id: Option<String>,
}

impl GatewayAuditEvent {
    /// Builds an event stamped with the current wall-clock time.
    #[must_use]
    pub fn from_params(params: GatewayAuditEventParams) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default();
        Self {
            event: "gateway_request",
            timestamp_ms,
            endpoint: params.endpoint,
            peer_ip: params.peer_ip,
            outcome: params.outcome,
            status: params.status,
            error_kind: params.error_kind,
            request_bytes: params.request_bytes,
            response_bytes: params.response_bytes,
            user_id: params.user_id,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for gateway request events.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &GatewayAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &GatewayAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &GatewayAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &GatewayAuditEvent) {}
}

// ============================================================================
// SECTION: Construction
// ============================================================================

/// Builds the configured audit sink.
///
/// # Errors
///
/// Returns an error when the file sink cannot open its log file.
pub fn sink_from_config(config: &AuditConfig) -> io::Result<std::sync::Arc<dyn AuditSink>> {
    match config.sink {
        AuditSinkType::Stderr => Ok(std::sync::Arc::new(StderrAuditSink)),
        AuditSinkType::Noop => Ok(std::sync::Arc::new(NoopAuditSink)),
        AuditSinkType::File => {
            let path = config.path.as_deref().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "file audit sink requires path")
            })?;
            Ok(std::sync::Arc::new(FileAuditSink::new(path)?))
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
