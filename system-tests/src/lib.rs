// system-tests/src/lib.rs
// ============================================================================
// Module: Studykeep System Tests
// Description: End-to-end test crate for the studykeep gateway.
// Purpose: Anchor the system-tests package; suites live under tests/.
// Dependencies: none
// ============================================================================

//! ## Overview
//! This crate exists to host the end-to-end suites under `tests/`, which
//! boot the real gateway server against a local channel stub.
