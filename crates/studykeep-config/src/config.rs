// crates/studykeep-config/src/config.rs
// ============================================================================
// Module: Studykeep Configuration
// Description: Configuration loading and validation for the gateway process.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: studykeep-transport, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size limits and
//! fail-closed validation. Channel credentials are deliberately absent:
//! they travel with every request so the process never holds per-channel
//! state. When no config file is named and the default file does not
//! exist, the built-in defaults apply.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use studykeep_transport::TelegramClientConfig;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "studykeep.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "STUDYKEEP_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Minimum accepted request body limit in bytes.
pub(crate) const MIN_BODY_BYTES: usize = 1024;
/// Maximum accepted request body limit in bytes.
pub(crate) const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
/// Default request body limit in bytes.
pub(crate) const DEFAULT_BODY_BYTES: usize = 256 * 1024;
/// Default server bind address.
const DEFAULT_BIND: &str = "127.0.0.1:8080";
/// Minimum transport timeout in milliseconds.
pub(crate) const MIN_TRANSPORT_TIMEOUT_MS: u64 = 100;
/// Maximum transport timeout in milliseconds.
pub(crate) const MAX_TRANSPORT_TIMEOUT_MS: u64 = 120_000;
/// Minimum transport response size limit in bytes.
pub(crate) const MIN_TRANSPORT_RESPONSE_BYTES: usize = 1024;
/// Maximum transport response size limit in bytes.
pub(crate) const MAX_TRANSPORT_RESPONSE_BYTES: usize = 16 * 1024 * 1024;
/// Default channel history window size.
pub(crate) const DEFAULT_HISTORY_LIMIT: u32 = 100;
/// Maximum channel history window size.
pub(crate) const MAX_HISTORY_LIMIT: u32 = 1_000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Studykeep gateway configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudykeepConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Channel transport configuration.
    #[serde(default)]
    pub transport: TelegramClientConfig,
    /// History retrieval configuration.
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Audit logging configuration.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl StudykeepConfig {
    /// Loads configuration from the given path, the `STUDYKEEP_CONFIG`
    /// environment variable, or the default file. Built-in defaults
    /// apply when no path is named and the default file is absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_config_path(path);
        let Some(resolved) = resolved else {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        };
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every configuration section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        validate_transport(&self.transport)?;
        self.retrieval.validate()?;
        self.audit.validate()?;
        Ok(())
    }
}

/// Resolves the effective config path; `None` means use defaults.
fn resolve_config_path(path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = path {
        return Some(path.to_path_buf());
    }
    if let Ok(value) = env::var(CONFIG_ENV_VAR)
        && !value.is_empty()
    {
        return Some(PathBuf::from(value));
    }
    let default = PathBuf::from(DEFAULT_CONFIG_NAME);
    default.exists().then_some(default)
}

// ============================================================================
// SECTION: Server Section
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address the server binds to.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum allowed request body size in bytes.
    #[serde(default = "default_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// Validates bind address and body limits.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Invalid("invalid bind address".to_string()))?;
        if self.max_body_bytes < MIN_BODY_BYTES || self.max_body_bytes > MAX_BODY_BYTES {
            return Err(ConfigError::Invalid(format!(
                "max_body_bytes must be between {MIN_BODY_BYTES} and {MAX_BODY_BYTES}"
            )));
        }
        Ok(())
    }
}

/// Returns the default bind address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Returns the default request body limit.
const fn default_body_bytes() -> usize {
    DEFAULT_BODY_BYTES
}

// ============================================================================
// SECTION: Transport Section
// ============================================================================

/// Validates transport limits; URL and scheme policy are enforced again
/// when the client is built.
fn validate_transport(transport: &TelegramClientConfig) -> Result<(), ConfigError> {
    if transport.api_base.is_empty() {
        return Err(ConfigError::Invalid("transport api_base must be set".to_string()));
    }
    if transport.timeout_ms < MIN_TRANSPORT_TIMEOUT_MS
        || transport.timeout_ms > MAX_TRANSPORT_TIMEOUT_MS
    {
        return Err(ConfigError::Invalid(format!(
            "transport timeout_ms must be between {MIN_TRANSPORT_TIMEOUT_MS} and \
             {MAX_TRANSPORT_TIMEOUT_MS}"
        )));
    }
    if transport.max_response_bytes < MIN_TRANSPORT_RESPONSE_BYTES
        || transport.max_response_bytes > MAX_TRANSPORT_RESPONSE_BYTES
    {
        return Err(ConfigError::Invalid(format!(
            "transport max_response_bytes must be between {MIN_TRANSPORT_RESPONSE_BYTES} and \
             {MAX_TRANSPORT_RESPONSE_BYTES}"
        )));
    }
    if transport.user_agent.is_empty() {
        return Err(ConfigError::Invalid("transport user_agent must be set".to_string()));
    }
    Ok(())
}

// ============================================================================
// SECTION: Retrieval Section
// ============================================================================

/// History retrieval configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Number of recent messages fetched per load.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
        }
    }
}

impl RetrievalConfig {
    /// Validates the history window bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.history_limit == 0 || self.history_limit > MAX_HISTORY_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "history_limit must be between 1 and {MAX_HISTORY_LIMIT}"
            )));
        }
        Ok(())
    }
}

/// Returns the default history window size.
const fn default_history_limit() -> u32 {
    DEFAULT_HISTORY_LIMIT
}

// ============================================================================
// SECTION: Audit Section
// ============================================================================

/// Audit sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkType {
    /// JSON lines to stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Discard audit events.
    Noop,
}

/// Audit logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Selected sink implementation.
    #[serde(default)]
    pub sink: AuditSinkType,
    /// Log file path; required when `sink` is `file`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl AuditConfig {
    /// Validates sink and path pairing.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.sink == AuditSinkType::File && self.path.is_none() {
            return Err(ConfigError::Invalid("file audit sink requires path".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Filesystem errors while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parse errors.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Semantic validation errors.
    #[error("config error: {0}")]
    Invalid(String),
}
