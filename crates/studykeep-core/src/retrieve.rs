// crates/studykeep-core/src/retrieve.rs
// ============================================================================
// Module: Studykeep Record Retrieval
// Description: Latest-record selection over a bounded channel history window.
// Purpose: Reconstruct one user's newest record without trusting transport order.
// Dependencies: crate::codec, crate::record
// ============================================================================

//! ## Overview
//! Retrieval filters a bounded message window down to one user's records
//! and selects the newest by the timestamp embedded in each record header.
//! Taking the structurally first match would lean on the transport
//! delivering newest-first, an unverified contract, so selection compares
//! embedded timestamps explicitly and works for any delivery order. An empty result is a
//! valid state, never an error; a matching message that fails to decode
//! is an error, never an empty result.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::codec::DecodeError;
use crate::codec::decode_record_text;
use crate::codec::record_prefix;
use crate::record::CandidateMessage;
use crate::record::RecordTimestamp;
use crate::record::StoredRecord;
use crate::record::UserId;

// ============================================================================
// SECTION: Retrieval
// ============================================================================

/// Selected candidate state while scanning the window.
struct Selected<'a> {
    /// Timestamp embedded in the selected record header.
    embedded: RecordTimestamp,
    /// Message the record was decoded from.
    message: &'a CandidateMessage,
    /// Decoded payload.
    payload: serde_json::Value,
}

/// Reconstructs the user's latest record from a bounded history window.
///
/// Candidates may arrive in any order; the newest embedded timestamp
/// wins, and equal timestamps keep the earliest-seen candidate. The
/// record's `last_updated` is the selected message's own creation time,
/// not the embedded timestamp.
///
/// # Errors
///
/// Returns [`DecodeError`] when any message matching the user's prefix
/// fails to decode. "No saved data yet" is `Ok(None)`, not an error.
pub fn retrieve_latest(
    user_id: &UserId,
    candidates: &[CandidateMessage],
) -> Result<Option<StoredRecord>, DecodeError> {
    let prefix = record_prefix(user_id);
    let mut selected: Option<Selected<'_>> = None;
    for candidate in candidates {
        if !candidate.text.starts_with(&prefix) {
            continue;
        }
        let (embedded, payload) = decode_record_text(&candidate.text, user_id)?;
        let newer = selected
            .as_ref()
            .is_none_or(|current| embedded.instant() > current.embedded.instant());
        if newer {
            selected = Some(Selected {
                embedded,
                message: candidate,
                payload,
            });
        }
    }
    Ok(selected.map(|selected| StoredRecord {
        user_id: user_id.clone(),
        payload: selected.payload,
        last_updated: selected.message.created_at.clone(),
    }))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
