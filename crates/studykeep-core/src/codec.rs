// crates/studykeep-core/src/codec.rs
// ============================================================================
// Module: Studykeep Record Codec
// Description: Two-line text framing for records embedded in channel messages.
// Purpose: Encode and decode records with an exact, round-trippable wire form.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! A record travels as one channel message with a fixed two-line frame:
//!
//! ```text
//! STUDY_PLANNER:<userId>:<RFC 3339 timestamp>
//! <single-line JSON payload>
//! ```
//!
//! The header and payload are separated by exactly one line break. The
//! payload line cannot contain an unescaped line break: `serde_json`
//! escapes newlines inside strings as `\n` and never emits literal line
//! breaks when serializing without a pretty printer, so the frame
//! boundary is unambiguous. Decoding distinguishes corrupt records from
//! absent ones; a matching message that fails to decode is an error, not
//! a miss.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;

use crate::record::RecordTimestamp;
use crate::record::UserId;

// ============================================================================
// SECTION: Wire Constants
// ============================================================================

/// Fixed literal tag opening every encoded record header.
pub const MESSAGE_TAG: &str = "STUDY_PLANNER";

/// Delimiter separating header fields.
const FIELD_DELIMITER: char = ':';

/// Separator between the header line and the payload line.
const FRAME_SEPARATOR: char = '\n';

// ============================================================================
// SECTION: Encoding
// ============================================================================

/// Encodes a record into its two-line wire form.
///
/// The output is exactly `STUDY_PLANNER:{userId}:{timestamp}` followed by
/// one line break and the single-line JSON payload.
///
/// # Errors
///
/// Returns [`EncodeError`] when the payload cannot be serialized to JSON.
pub fn encode_record(
    user_id: &UserId,
    payload: &Value,
    timestamp: &RecordTimestamp,
) -> Result<String, EncodeError> {
    let json = serde_json::to_string(payload).map_err(|_| EncodeError::Serialization)?;
    Ok(format!(
        "{MESSAGE_TAG}{FIELD_DELIMITER}{user_id}{FIELD_DELIMITER}{timestamp}{FRAME_SEPARATOR}{json}"
    ))
}

/// Returns the exact header prefix identifying one user's records.
///
/// Retrieval filters on this prefix with case-sensitive, whole-string
/// matching; the trailing delimiter keeps `u1` from matching `u10`.
#[must_use]
pub fn record_prefix(user_id: &UserId) -> String {
    format!("{MESSAGE_TAG}{FIELD_DELIMITER}{user_id}{FIELD_DELIMITER}")
}

// ============================================================================
// SECTION: Decoding
// ============================================================================

/// Decodes a message carrying a record for the given user.
///
/// Returns the timestamp embedded in the header and the parsed payload.
///
/// # Errors
///
/// Returns [`DecodeError`] when the message does not carry the user's
/// record prefix, the payload line is missing, the embedded timestamp is
/// not valid RFC 3339, or the payload is not valid JSON.
pub fn decode_record_text(
    text: &str,
    user_id: &UserId,
) -> Result<(RecordTimestamp, Value), DecodeError> {
    let prefix = record_prefix(user_id);
    let remainder = text.strip_prefix(&prefix).ok_or(DecodeError::PrefixMismatch)?;
    let (embedded, payload_text) =
        remainder.split_once(FRAME_SEPARATOR).ok_or(DecodeError::MissingPayload)?;
    let timestamp =
        RecordTimestamp::parse(embedded).map_err(|_| DecodeError::InvalidTimestamp)?;
    let payload = serde_json::from_str(payload_text)
        .map_err(|err| DecodeError::InvalidPayload(err.to_string()))?;
    Ok((timestamp, payload))
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Record encoding errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Payload cannot be serialized to JSON.
    #[error("payload is not serializable to json")]
    Serialization,
}

/// Record decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Message does not start with the user's record prefix.
    #[error("message does not carry the expected record prefix")]
    PrefixMismatch,
    /// Message has no payload line after the header.
    #[error("record frame is missing the payload line")]
    MissingPayload,
    /// Embedded header timestamp is not valid RFC 3339.
    #[error("record header timestamp is not valid rfc 3339")]
    InvalidTimestamp,
    /// Payload line is not valid JSON.
    #[error("record payload is not valid json: {0}")]
    InvalidPayload(String),
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

    use serde_json::json;

    use super::DecodeError;
    use super::decode_record_text;
    use super::encode_record;
    use super::record_prefix;
    use crate::record::RecordTimestamp;
    use crate::record::UserId;

    /// Builds the validated id used across codec tests.
    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    /// Parses the fixed timestamp used across codec tests.
    fn ts(value: &str) -> RecordTimestamp {
        RecordTimestamp::parse(value).unwrap()
    }

    #[test]
    fn encode_produces_exact_wire_form() {
        let encoded =
            encode_record(&user("u1"), &json!({"goal": "math"}), &ts("2024-01-01T00:00:00Z"))
                .unwrap();
        assert_eq!(encoded, "STUDY_PLANNER:u1:2024-01-01T00:00:00Z\n{\"goal\":\"math\"}");
    }

    #[test]
    fn encode_keeps_payload_on_a_single_line() {
        let encoded = encode_record(
            &user("u1"),
            &json!({"note": "line one\nline two"}),
            &ts("2024-01-01T00:00:00Z"),
        )
        .unwrap();
        assert_eq!(encoded.matches('\n').count(), 1);
    }

    #[test]
    fn prefix_is_terminated_by_delimiter() {
        assert_eq!(record_prefix(&user("u1")), "STUDY_PLANNER:u1:");
    }

    #[test]
    fn decode_round_trips_payload() {
        let payload = json!({"goal": "math", "sessions": [1, 2, 3], "done": false});
        let encoded =
            encode_record(&user("u1"), &payload, &ts("2024-01-01T00:00:00Z")).unwrap();
        let (timestamp, decoded) = decode_record_text(&encoded, &user("u1")).unwrap();
        assert_eq!(timestamp.as_str(), "2024-01-01T00:00:00Z");
        assert_eq!(decoded, payload);
    }

    #[test]
    fn decode_rejects_foreign_prefix() {
        let encoded =
            encode_record(&user("u2"), &json!({}), &ts("2024-01-01T00:00:00Z")).unwrap();
        assert!(matches!(
            decode_record_text(&encoded, &user("u1")),
            Err(DecodeError::PrefixMismatch)
        ));
    }

    #[test]
    fn decode_rejects_missing_payload_line() {
        assert!(matches!(
            decode_record_text("STUDY_PLANNER:u1:2024-01-01T00:00:00Z", &user("u1")),
            Err(DecodeError::MissingPayload)
        ));
    }

    #[test]
    fn decode_rejects_invalid_embedded_timestamp() {
        assert!(matches!(
            decode_record_text("STUDY_PLANNER:u1:not-a-time\n{}", &user("u1")),
            Err(DecodeError::InvalidTimestamp)
        ));
    }

    #[test]
    fn decode_rejects_invalid_payload_json() {
        let result = decode_record_text(
            "STUDY_PLANNER:u1:2024-01-01T00:00:00Z\n{broken",
            &user("u1"),
        );
        assert!(matches!(result, Err(DecodeError::InvalidPayload(_))));
    }
}
