//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use dmxnode_config::ConfigError;
use dmxnode_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const REJECTED: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the device")]
    #[diagnostic(
        code(dmxnode::connection_failed),
        help(
            "Check that the node is powered and on this network.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { reason: String },

    #[error("Request timed out after {timeout_ms}ms")]
    #[diagnostic(
        code(dmxnode::timeout),
        help("Increase the timeout with --timeout-ms or check the node's link.")
    )]
    Timeout { timeout_ms: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(dmxnode::auth_failed),
        help("Log in again with: dmxnode login")
    )]
    AuthFailed { message: String },

    // ── Device responses ─────────────────────────────────────────────
    #[error("Device rejected the request: {message}")]
    #[diagnostic(code(dmxnode::rejected))]
    Rejected { message: String },

    #[error("Device error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    #[diagnostic(code(dmxnode::api_error))]
    ApiError { status: Option<u16>, message: String },

    #[error("Unexpected response from device: {message}")]
    #[diagnostic(
        code(dmxnode::protocol),
        help("The node's firmware may be newer or older than this tool expects.")
    )]
    Protocol { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(dmxnode::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(dmxnode::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: dmxnode config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No device configured")]
    #[diagnostic(
        code(dmxnode::no_config),
        help(
            "Pass --address, set DMXNODE_ADDRESS, or create a profile with: dmxnode config init\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(dmxnode::config))]
    Config { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("'{action}' requires confirmation")]
    #[diagnostic(
        code(dmxnode::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(dmxnode::json), help("Check the file contents and try again."))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { reason } => CliError::ConnectionFailed { reason },
            CoreError::ShutDown => CliError::ConnectionFailed {
                reason: "the sync layer was shut down".into(),
            },
            CoreError::Timeout { timeout_ms } => CliError::Timeout { timeout_ms },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::Validation { field, reason } => CliError::Validation {
                field: field.into(),
                reason,
            },
            CoreError::Rejected { message } => CliError::Rejected { message },
            CoreError::Api { message, status } => CliError::ApiError { status, message },
            CoreError::Protocol { message } => CliError::Protocol { message },
            CoreError::Config { message } => CliError::Config { message },
            CoreError::Io(e) => CliError::Io(e),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}
