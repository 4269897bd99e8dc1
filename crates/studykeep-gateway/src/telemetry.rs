// crates/studykeep-gateway/src/telemetry.rs
// ============================================================================
// Module: Gateway Telemetry
// Description: Observability hooks for gateway request handling.
// Purpose: Provide metric events and latency buckets without hard deps.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module exposes a thin metrics interface for gateway request
//! counters and latency histograms. It is intentionally dependency-light
//! so deployments can plug in Prometheus or OpenTelemetry without
//! redesign. Labels carry no payloads, user identifiers, or credentials.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default latency buckets in milliseconds for gateway request histograms.
pub const GATEWAY_LATENCY_BUCKETS_MS: &[u64] =
    &[1, 2, 5, 10, 25, 50, 100, 250, 500, 1_000, 2_500, 5_000, 10_000, 30_000];

// ============================================================================
// SECTION: Metric Labels
// ============================================================================

/// Gateway endpoint classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayEndpoint {
    /// `POST /save`.
    Save,
    /// `POST /load`.
    Load,
}

impl GatewayEndpoint {
    /// Returns a stable label for the endpoint.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Save => "save",
            Self::Load => "load",
        }
    }
}

/// Gateway request outcome classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayOutcome {
    /// Successful request.
    Ok,
    /// Failed request.
    Error,
}

impl GatewayOutcome {
    /// Returns a stable label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

// ============================================================================
// SECTION: Metric Events
// ============================================================================

/// Gateway request metric event payload.
///
/// # Invariants
/// - Optional fields are `None` when the metadata is unavailable.
#[derive(Debug, Clone)]
pub struct GatewayMetricEvent {
    /// Endpoint handling the request.
    pub endpoint: GatewayEndpoint,
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
    /// End-to-end handling latency.
    pub latency: Duration,
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Metrics sink for gateway request events.
pub trait GatewayMetrics: Send + Sync {
    /// Record a request metric event.
    fn record(&self, event: &GatewayMetricEvent);
}

/// Metrics sink that discards all events.
pub struct NoopMetrics;

impl GatewayMetrics for NoopMetrics {
    fn record(&self, _event: &GatewayMetricEvent) {}
}
