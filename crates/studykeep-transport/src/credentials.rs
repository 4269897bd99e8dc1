// crates/studykeep-transport/src/credentials.rs
// ============================================================================
// Module: Channel Credentials
// Description: Per-request bot token and channel identifier pair.
// Purpose: Validate credential shape at the boundary and keep tokens redacted.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Credentials travel with every request rather than living in process
//! configuration, so the gateway stays stateless across callers. The bot
//! token is embedded in the request URL path by the Telegram API, which
//! makes its character set a routing concern: anything outside the token
//! alphabet is rejected before a URL is ever built. Tokens are redacted
//! from `Debug` output and never appear in error text.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use thiserror::Error;

// ============================================================================
// SECTION: Bot Token
// ============================================================================

/// Telegram bot token used to authorize API calls.
///
/// # Invariants
/// - Non-empty, restricted to the token alphabet `[A-Za-z0-9:_-]` so the
///   token cannot alter the request path it is embedded in.
/// - Never printed: `Debug` is redacted and the type has no `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct BotToken(String);

impl BotToken {
    /// Creates a validated bot token.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsError`] when the token is empty or contains
    /// characters outside the token alphabet.
    pub fn new(token: impl Into<String>) -> Result<Self, CredentialsError> {
        let token = token.into();
        if token.is_empty() {
            return Err(CredentialsError::EmptyBotToken);
        }
        let valid = token
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == ':' || ch == '_' || ch == '-');
        if !valid {
            return Err(CredentialsError::MalformedBotToken);
        }
        Ok(Self(token))
    }

    /// Returns the raw token for request construction.
    pub(crate) fn reveal(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BotToken(<redacted>)")
    }
}

// ============================================================================
// SECTION: Channel Identifier
// ============================================================================

/// Telegram chat identifier addressing the storage channel.
///
/// # Invariants
/// - Non-empty; no whitespace or control characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelId(String);

impl ChannelId {
    /// Creates a validated channel identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsError`] when the identifier is empty or
    /// contains whitespace or control characters.
    pub fn new(id: impl Into<String>) -> Result<Self, CredentialsError> {
        let id = id.into();
        if id.is_empty() {
            return Err(CredentialsError::EmptyChannelId);
        }
        if id.chars().any(|ch| ch.is_whitespace() || ch.is_control()) {
            return Err(CredentialsError::MalformedChannelId);
        }
        Ok(Self(id))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Credential Pair
// ============================================================================

/// Per-request credential pair for one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelCredentials {
    /// Bot token authorizing the call.
    pub bot_token: BotToken,
    /// Channel receiving or serving messages.
    pub channel_id: ChannelId,
}

impl ChannelCredentials {
    /// Creates a validated credential pair.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsError`] when either component fails
    /// validation.
    pub fn new(
        bot_token: impl Into<String>,
        channel_id: impl Into<String>,
    ) -> Result<Self, CredentialsError> {
        Ok(Self {
            bot_token: BotToken::new(bot_token)?,
            channel_id: ChannelId::new(channel_id)?,
        })
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Credential validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CredentialsError {
    /// Bot token is the empty string.
    #[error("bot token must not be empty")]
    EmptyBotToken,
    /// Bot token contains characters outside the token alphabet.
    #[error("bot token contains invalid characters")]
    MalformedBotToken,
    /// Channel identifier is the empty string.
    #[error("channel id must not be empty")]
    EmptyChannelId,
    /// Channel identifier contains whitespace or control characters.
    #[error("channel id contains invalid characters")]
    MalformedChannelId,
}

// ============================================================================
// SECTION: Tests
// ============================================================================
