// crates/studykeep-transport/src/lib.rs
// ============================================================================
// Module: Studykeep Transport Library
// Description: Public API surface for the Telegram channel transport.
// Purpose: Expose the channel client and credential types.
// Dependencies: crate::{client, credentials}
// ============================================================================

//! ## Overview
//! The transport treats a Telegram channel as an append-and-scan record
//! log: saves append one message, loads read one bounded history window.
//! Credentials travel per call so the process holds no channel state;
//! request limits fail closed in the same manner as the rest of the
//! stack.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
pub mod credentials;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::TelegramClient;
pub use client::TelegramClientConfig;
pub use client::TransportError;
pub use credentials::BotToken;
pub use credentials::ChannelCredentials;
pub use credentials::ChannelId;
pub use credentials::CredentialsError;
