// crates/studykeep-gateway/src/lib.rs
// ============================================================================
// Module: Studykeep Gateway Library
// Description: HTTP gateway persisting planner records in a channel log.
// Purpose: Expose the server, service, and observability surfaces.
// Dependencies: crate::{audit, clock, server, service, telemetry}
// ============================================================================

//! ## Overview
//! The gateway lets a browser-based study planner persist and retrieve
//! user state through two endpoints, using a Telegram channel as an
//! append-and-scan record log. Handlers are stateless per request and
//! perform at most one outbound channel call each. Concurrent saves for
//! the same user are inherently racy: the channel, not this gateway,
//! determines final message order, and no per-user serialization is
//! attempted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod clock;
pub mod server;
pub mod service;
pub mod telemetry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::GatewayAuditEvent;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use clock::Clock;
pub use clock::FixedClock;
pub use clock::SystemClock;
pub use server::GatewayServer;
pub use server::ServeError;
pub use service::GatewayError;
pub use service::RecordService;
pub use telemetry::GATEWAY_LATENCY_BUCKETS_MS;
pub use telemetry::GatewayEndpoint;
pub use telemetry::GatewayMetricEvent;
pub use telemetry::GatewayMetrics;
pub use telemetry::GatewayOutcome;
pub use telemetry::NoopMetrics;
