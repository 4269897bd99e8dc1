// crates/studykeep-transport/src/client.rs
// ============================================================================
// Module: Telegram Channel Client
// Description: Bounded Telegram Bot API calls for the channel record log.
// Purpose: Append encoded records and read bounded history with strict limits.
// Dependencies: studykeep-core, reqwest, serde_json, url
// ============================================================================

//! ## Overview
//! The client issues the two Bot API calls the gateway composes: one
//! `sendMessage` append per save and one `getChatHistory` window read per
//! load. Limits fail closed: HTTPS-only unless cleartext is explicitly
//! allowed, redirects disabled, a request timeout, and a hard cap on
//! response bodies. Upstream failures surface the API's own
//! `description` text when one is present. Error text never includes the
//! request URL, which embeds the bot token.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::blocking::Response;
use reqwest::redirect::Policy;
use serde::Deserialize;
use studykeep_core::CandidateMessage;
use studykeep_core::RecordTimestamp;
use thiserror::Error;
use url::Url;

use crate::credentials::ChannelCredentials;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the Telegram channel client.
///
/// # Invariants
/// - `allow_http = false` blocks cleartext `http://` API bases.
/// - `max_response_bytes` is enforced as a hard upper bound on response
///   bodies.
/// - `timeout_ms` applies to the full request lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelegramClientConfig {
    /// Base URL of the Bot API.
    pub api_base: String,
    /// Allow cleartext HTTP (disabled by default; test stubs only).
    pub allow_http: bool,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum response size allowed, in bytes.
    pub max_response_bytes: usize,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl Default for TelegramClientConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.telegram.org".to_string(),
            allow_http: false,
            timeout_ms: 10_000,
            max_response_bytes: 1024 * 1024,
            user_agent: "studykeep/0.1".to_string(),
        }
    }
}

// ============================================================================
// SECTION: Wire Envelopes
// ============================================================================

/// Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    /// Whether the call succeeded upstream.
    ok: bool,
    /// Result payload when `ok` is true.
    result: Option<T>,
    /// Upstream error description when `ok` is false.
    description: Option<String>,
}

/// `sendMessage` result payload.
#[derive(Debug, Deserialize)]
struct SentMessage {
    /// Identifier assigned to the appended message.
    message_id: i64,
}

/// One message entry from `getChatHistory`.
#[derive(Debug, Deserialize)]
struct HistoryMessage {
    /// Transport-assigned message identifier.
    message_id: i64,
    /// Message text; absent for media-only messages.
    text: Option<String>,
    /// Creation time in unix seconds.
    date: i64,
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Telegram Bot API client with fail-closed limits.
///
/// # Invariants
/// - Redirects are not followed.
/// - Responses exceeding configured limits fail closed.
/// - Credentials are supplied per call, never stored on the client.
pub struct TelegramClient {
    /// Client configuration, including limits and policy.
    config: TelegramClientConfig,
    /// Validated API base URL.
    api_base: Url,
    /// HTTP client used for outbound requests.
    client: Client,
}

impl TelegramClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the API base is invalid or the
    /// HTTP client cannot be created.
    pub fn new(config: TelegramClientConfig) -> Result<Self, TransportError> {
        let api_base = validate_api_base(&config)?;
        let client = build_http_client(&config)?;
        Ok(Self {
            config,
            api_base,
            client,
        })
    }

    /// Appends one encoded record message to the channel.
    ///
    /// Returns the transport-assigned message identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the request fails, the response is
    /// malformed or oversized, or the API reports an error.
    pub fn send_message(
        &self,
        credentials: &ChannelCredentials,
        text: &str,
    ) -> Result<i64, TransportError> {
        let url = self.endpoint(credentials, "sendMessage")?;
        let body = serde_json::json!({
            "chat_id": credentials.channel_id.as_str(),
            "text": text,
        });
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .map_err(|_| TransportError::Request("telegram send failed".to_string()))?;
        let sent: SentMessage = self.parse_envelope(response)?;
        Ok(sent.message_id)
    }

    /// Reads the bounded recent-message window from the channel.
    ///
    /// Messages without text (media, service entries) are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the request fails, the response is
    /// malformed or oversized, or the API reports an error.
    pub fn fetch_history(
        &self,
        credentials: &ChannelCredentials,
        limit: u32,
    ) -> Result<Vec<CandidateMessage>, TransportError> {
        let url = self.endpoint(credentials, "getChatHistory")?;
        let response = self
            .client
            .get(url)
            .query(&[
                ("chat_id", credentials.channel_id.as_str()),
                ("limit", &limit.to_string()),
            ])
            .send()
            .map_err(|_| TransportError::Request("telegram history fetch failed".to_string()))?;
        let entries: Vec<HistoryMessage> = self.parse_envelope(response)?;
        let mut messages = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(text) = entry.text else {
                continue;
            };
            let created_at = RecordTimestamp::from_unix_seconds(entry.date)
                .map_err(|_| TransportError::MalformedResponse)?;
            messages.push(CandidateMessage {
                id: entry.message_id,
                text,
                created_at,
            });
        }
        Ok(messages)
    }

    /// Builds the per-method endpoint URL for the credential pair.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the assembled URL is invalid.
    fn endpoint(
        &self,
        credentials: &ChannelCredentials,
        method: &str,
    ) -> Result<Url, TransportError> {
        let base = self.api_base.as_str().trim_end_matches('/');
        let token = credentials.bot_token.reveal();
        Url::parse(&format!("{base}/bot{token}/{method}"))
            .map_err(|_| TransportError::Config("endpoint url construction failed".to_string()))
    }

    /// Reads and decodes a Bot API envelope, surfacing upstream errors.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the body is oversized or
    /// malformed, or when the envelope reports `ok = false`.
    fn parse_envelope<T: for<'de> Deserialize<'de>>(
        &self,
        mut response: Response,
    ) -> Result<T, TransportError> {
        let status = response.status();
        let body = read_response_limited(&mut response, self.config.max_response_bytes)?;
        let envelope: ApiEnvelope<T> = serde_json::from_slice(&body).map_err(|_| {
            if status.is_success() {
                TransportError::MalformedResponse
            } else {
                TransportError::Api(format!("telegram returned http {status}"))
            }
        })?;
        if !envelope.ok {
            let description = envelope
                .description
                .unwrap_or_else(|| "telegram api call failed".to_string());
            return Err(TransportError::Api(description));
        }
        envelope.result.ok_or(TransportError::MalformedResponse)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates the configured API base URL and scheme policy.
fn validate_api_base(config: &TelegramClientConfig) -> Result<Url, TransportError> {
    let url = Url::parse(&config.api_base)
        .map_err(|_| TransportError::Config("invalid api base url".to_string()))?;
    match url.scheme() {
        "https" => {}
        "http" if config.allow_http => {}
        _ => return Err(TransportError::Config("unsupported api base scheme".to_string())),
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(TransportError::Config("api base credentials are not allowed".to_string()));
    }
    Ok(url)
}

/// Builds the HTTP client with timeout and redirect policy applied.
fn build_http_client(config: &TelegramClientConfig) -> Result<Client, TransportError> {
    Client::builder()
        .timeout(Duration::from_millis(config.timeout_ms))
        .user_agent(config.user_agent.clone())
        .redirect(Policy::none())
        .build()
        .map_err(|_| TransportError::Config("http client build failed".to_string()))
}

/// Reads the response body while enforcing a byte limit.
fn read_response_limited(
    response: &mut Response,
    max_bytes: usize,
) -> Result<Vec<u8>, TransportError> {
    let max_bytes_u64 =
        u64::try_from(max_bytes).map_err(|_| TransportError::MalformedResponse)?;
    if let Some(expected) = response.content_length()
        && expected > max_bytes_u64
    {
        return Err(TransportError::ResponseTooLarge);
    }
    let mut buf = Vec::new();
    let limit = max_bytes_u64.saturating_add(1);
    let mut handle = response.take(limit);
    handle.read_to_end(&mut buf).map_err(|_| TransportError::MalformedResponse)?;
    if buf.len() > max_bytes {
        return Err(TransportError::ResponseTooLarge);
    }
    Ok(buf)
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Telegram transport errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Client configuration is invalid.
    #[error("transport config error: {0}")]
    Config(String),
    /// Outbound request failed before a response arrived.
    #[error("{0}")]
    Request(String),
    /// The API answered with an error; text passed through when present.
    #[error("{0}")]
    Api(String),
    /// Response body was not a decodable Bot API envelope.
    #[error("telegram response was malformed")]
    MalformedResponse,
    /// Response body exceeded the configured size limit.
    #[error("telegram response exceeds size limit")]
    ResponseTooLarge,
}
