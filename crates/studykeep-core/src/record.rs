// crates/studykeep-core/src/record.rs
// ============================================================================
// Module: Studykeep Record Model
// Description: Canonical record types for planner state persisted in a channel.
// Purpose: Provide validated identifiers and timestamps with stable wire forms.
// Dependencies: serde_json, thiserror, time
// ============================================================================

//! ## Overview
//! This module defines the record model shared by the codec and the
//! retriever. A record is one user's planner state plus its creation time;
//! it exists only as an encoded message inside the remote channel log.
//! Identifiers and timestamps validate at construction boundaries so the
//! two-line message frame cannot be forged or corrupted by caller input.
//! The core never reads wall-clock time; hosts supply timestamps.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: User Identifiers
// ============================================================================

/// Owner identifier for persisted records.
///
/// # Invariants
/// - Never empty.
/// - Never contains `:` (the frame field delimiter) or ASCII control
///   characters. A `:` inside an id would let records for one user match
///   the retrieval prefix of another; a line break would forge a frame
///   boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    /// Creates a validated user identifier.
    ///
    /// # Errors
    ///
    /// Returns [`UserIdError`] when the identifier is empty or contains a
    /// delimiter or control character.
    pub fn new(id: impl Into<String>) -> Result<Self, UserIdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(UserIdError::Empty);
        }
        if id.chars().any(|ch| ch == ':' || ch.is_control()) {
            return Err(UserIdError::ForbiddenCharacter);
        }
        Ok(Self(id))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// User identifier validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UserIdError {
    /// Identifier is the empty string.
    #[error("user id must not be empty")]
    Empty,
    /// Identifier contains a frame delimiter or control character.
    #[error("user id must not contain ':' or control characters")]
    ForbiddenCharacter,
}

// ============================================================================
// SECTION: Timestamps
// ============================================================================

/// RFC 3339 timestamp attached to records and channel messages.
///
/// # Invariants
/// - `raw` parses as RFC 3339 and is preserved verbatim so encoded
///   messages round-trip exactly.
/// - `instant` is the parsed form used for recency comparisons.
#[derive(Debug, Clone)]
pub struct RecordTimestamp {
    /// Original RFC 3339 string form.
    raw: String,
    /// Parsed instant used for ordering.
    instant: OffsetDateTime,
}

impl RecordTimestamp {
    /// Parses an RFC 3339 timestamp, keeping the original string form.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError`] when the value is not valid RFC 3339.
    pub fn parse(value: &str) -> Result<Self, TimestampError> {
        let instant = OffsetDateTime::parse(value, &Rfc3339)
            .map_err(|_| TimestampError::InvalidFormat)?;
        Ok(Self {
            raw: value.to_string(),
            instant,
        })
    }

    /// Builds a timestamp from unix seconds, as delivered by the channel
    /// transport for message creation times.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError`] when the value falls outside the
    /// representable RFC 3339 range.
    pub fn from_unix_seconds(seconds: i64) -> Result<Self, TimestampError> {
        let instant = OffsetDateTime::from_unix_timestamp(seconds)
            .map_err(|_| TimestampError::OutOfRange)?;
        let raw = instant.format(&Rfc3339).map_err(|_| TimestampError::OutOfRange)?;
        Ok(Self {
            raw,
            instant,
        })
    }

    /// Builds a timestamp from an explicit instant.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError`] when the instant cannot be formatted as
    /// RFC 3339.
    pub fn from_instant(instant: OffsetDateTime) -> Result<Self, TimestampError> {
        let raw = instant.format(&Rfc3339).map_err(|_| TimestampError::OutOfRange)?;
        Ok(Self {
            raw,
            instant,
        })
    }

    /// Returns the original RFC 3339 string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed instant used for recency comparisons.
    #[must_use]
    pub const fn instant(&self) -> OffsetDateTime {
        self.instant
    }
}

impl fmt::Display for RecordTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.raw.fmt(f)
    }
}

/// Timestamp validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimestampError {
    /// Value is not valid RFC 3339.
    #[error("timestamp is not valid rfc 3339")]
    InvalidFormat,
    /// Value falls outside the representable range.
    #[error("timestamp is outside the representable range")]
    OutOfRange,
}

// ============================================================================
// SECTION: Messages and Records
// ============================================================================

/// One message from the bounded channel history window.
///
/// # Invariants
/// - `created_at` is the transport-assigned creation time, not the
///   timestamp embedded in `text`.
#[derive(Debug, Clone)]
pub struct CandidateMessage {
    /// Transport-assigned message identifier.
    pub id: i64,
    /// Raw message text.
    pub text: String,
    /// Transport-assigned creation time.
    pub created_at: RecordTimestamp,
}

/// One user's persisted planner state, reconstructed from the channel.
#[derive(Debug, Clone)]
pub struct StoredRecord {
    /// Owner of the record.
    pub user_id: UserId,
    /// Planner state payload.
    pub payload: Value,
    /// Creation time of the message the record was read from.
    pub last_updated: RecordTimestamp,
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
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

    use super::RecordTimestamp;
    use super::TimestampError;
    use super::UserId;
    use super::UserIdError;

    #[test]
    fn user_id_rejects_empty() {
        assert_eq!(UserId::new(""), Err(UserIdError::Empty));
    }

    #[test]
    fn user_id_rejects_delimiter_and_controls() {
        assert_eq!(UserId::new("a:b"), Err(UserIdError::ForbiddenCharacter));
        assert_eq!(UserId::new("a\nb"), Err(UserIdError::ForbiddenCharacter));
        assert_eq!(UserId::new("a\rb"), Err(UserIdError::ForbiddenCharacter));
    }

    #[test]
    fn user_id_accepts_opaque_values() {
        let id = UserId::new("user-42_x").unwrap();
        assert_eq!(id.as_str(), "user-42_x");
    }

    #[test]
    fn timestamp_preserves_raw_form() {
        let ts = RecordTimestamp::parse("2024-01-01T00:00:00Z").unwrap();
        assert_eq!(ts.as_str(), "2024-01-01T00:00:00Z");
    }

    #[test]
    fn timestamp_rejects_non_rfc3339() {
        assert!(matches!(
            RecordTimestamp::parse("yesterday"),
            Err(TimestampError::InvalidFormat)
        ));
    }

    #[test]
    fn timestamp_from_unix_seconds_formats_rfc3339() {
        let ts = RecordTimestamp::from_unix_seconds(1_704_153_600).unwrap();
        assert_eq!(ts.as_str(), "2024-01-02T00:00:00Z");
    }
}
