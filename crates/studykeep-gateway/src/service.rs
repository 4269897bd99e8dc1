// crates/studykeep-gateway/src/service.rs
// ============================================================================
// Module: Gateway Record Service
// Description: Save/load orchestration over the codec and the transport.
// Purpose: Compose pure record logic with channel calls per request.
// Dependencies: studykeep-core, studykeep-transport
// ============================================================================

//! ## Overview
//! The service is the thin orchestration layer between the HTTP surface
//! and the record core: a save encodes one record with a clock-supplied
//! timestamp and appends it; a load fetches one bounded history window
//! and reconstructs the latest record. Handlers stay stateless:
//! credentials arrive with each call and at most one outbound request is
//! made per gateway request. Failures are terminal; there are no
//! retries and no partial success.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::Value;
use studykeep_core::DecodeError;
use studykeep_core::EncodeError;
use studykeep_core::StoredRecord;
use studykeep_core::TimestampError;
use studykeep_core::UserId;
use studykeep_core::encode_record;
use studykeep_core::retrieve_latest;
use studykeep_transport::ChannelCredentials;
use studykeep_transport::TelegramClient;
use studykeep_transport::TransportError;
use thiserror::Error;

use crate::clock::Clock;

// ============================================================================
// SECTION: Service
// ============================================================================

/// Record save/load orchestration over one channel transport.
pub struct RecordService {
    /// Channel transport client.
    transport: TelegramClient,
    /// Number of recent messages fetched per load.
    history_limit: u32,
    /// Source of encode-time timestamps.
    clock: Arc<dyn Clock>,
}

impl RecordService {
    /// Creates a service over the given transport and clock.
    #[must_use]
    pub fn new(transport: TelegramClient, history_limit: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            transport,
            history_limit,
            clock,
        }
    }

    /// Encodes the payload as a record and appends it to the channel.
    ///
    /// Returns the transport-assigned message identifier.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when encoding or the channel append
    /// fails.
    pub fn save(
        &self,
        credentials: &ChannelCredentials,
        user_id: &UserId,
        payload: &Value,
    ) -> Result<i64, GatewayError> {
        let timestamp = self.clock.now()?;
        let text = encode_record(user_id, payload, &timestamp)?;
        let message_id = self.transport.send_message(credentials, &text)?;
        Ok(message_id)
    }

    /// Reconstructs the user's latest record from the channel history.
    ///
    /// `Ok(None)` means no saved data yet, which is a valid state.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the window fetch fails or a matching
    /// record is corrupt.
    pub fn load(
        &self,
        credentials: &ChannelCredentials,
        user_id: &UserId,
    ) -> Result<Option<StoredRecord>, GatewayError> {
        let window = self.transport.fetch_history(credentials, self.history_limit)?;
        let record = retrieve_latest(user_id, &window)?;
        Ok(record)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Gateway request errors, mapped onto the uniform failure response.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Request failed validation before any channel call.
    #[error("{0}")]
    Validation(String),
    /// Request body exceeded the configured limit.
    #[error("request body too large")]
    PayloadTooLarge,
    /// Record payload could not be encoded.
    #[error("record encoding failed: {0}")]
    Encoding(#[from] EncodeError),
    /// A matching record in the channel could not be decoded.
    #[error("record decoding failed: {0}")]
    Decoding(#[from] DecodeError),
    /// Channel transport failed; upstream text passed through.
    #[error("{0}")]
    Transport(#[from] TransportError),
    /// The system clock produced an unrepresentable timestamp.
    #[error("timestamp generation failed: {0}")]
    Time(#[from] TimestampError),
}

impl GatewayError {
    /// Returns the HTTP status for the uniform failure response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Encoding(_) | Self::Decoding(_) | Self::Transport(_) | Self::Time(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns a stable label for audit and telemetry.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::PayloadTooLarge => "payload_too_large",
            Self::Encoding(_) => "encoding",
            Self::Decoding(_) => "decoding",
            Self::Transport(_) => "transport",
            Self::Time(_) => "time",
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
