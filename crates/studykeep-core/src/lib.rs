// crates/studykeep-core/src/lib.rs
// ============================================================================
// Module: Studykeep Core Library
// Description: Public API surface for the Studykeep record core.
// Purpose: Expose the record model, codec, and retrieval logic.
// Dependencies: crate::{codec, record, retrieve}
// ============================================================================

//! ## Overview
//! Studykeep core holds the only logic with design decisions in the
//! system: the two-line message framing that embeds a planner record in a
//! channel message, and the retrieval filter that reconstructs a user's
//! latest record from a bounded history window. It performs no I/O and
//! never reads wall-clock time; hosts supply timestamps explicitly so
//! encoding stays deterministic and testable.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod codec;
pub mod record;
pub mod retrieve;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use codec::DecodeError;
pub use codec::EncodeError;
pub use codec::MESSAGE_TAG;
pub use codec::decode_record_text;
pub use codec::encode_record;
pub use codec::record_prefix;
pub use record::CandidateMessage;
pub use record::RecordTimestamp;
pub use record::StoredRecord;
pub use record::TimestampError;
pub use record::UserId;
pub use record::UserIdError;
pub use retrieve::retrieve_latest;
