// crates/studykeep-gateway/src/clock.rs
// ============================================================================
// Module: Gateway Clock
// Description: Wall-clock seam for record timestamp assignment.
// Purpose: Keep "now" injectable so encoding stays deterministic in tests.
// Dependencies: studykeep-core, time
// ============================================================================

//! ## Overview
//! The record core never reads wall-clock time; the gateway supplies the
//! encode-time timestamp through this seam. Production uses the system
//! clock; tests pin a fixed instant so encoded frames are byte-stable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use studykeep_core::RecordTimestamp;
use studykeep_core::TimestampError;
use time::OffsetDateTime;

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Source of the timestamp embedded in newly encoded records.
pub trait Clock: Send + Sync {
    /// Returns the current instant as a record timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError`] when the instant cannot be represented
    /// as RFC 3339.
    fn now(&self) -> Result<RecordTimestamp, TimestampError>;
}

/// Clock reading the system wall-clock in UTC.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Result<RecordTimestamp, TimestampError> {
        RecordTimestamp::from_instant(OffsetDateTime::now_utc())
    }
}

/// Clock pinned to one instant, for deterministic embedding and tests.
pub struct FixedClock {
    /// Timestamp returned by every `now` call.
    timestamp: RecordTimestamp,
}

impl FixedClock {
    /// Creates a clock pinned to the given timestamp.
    #[must_use]
    pub const fn new(timestamp: RecordTimestamp) -> Self {
        Self {
            timestamp,
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Result<RecordTimestamp, TimestampError> {
        Ok(self.timestamp.clone())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
