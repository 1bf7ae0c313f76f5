// ── Core error types ──
//
// User-facing errors from dmxnode-core. Callers of the user actions see
// these, never raw HTTP or JSON failures. The `From<dmxnode_api::Error>`
// impl folds transport-layer errors into this taxonomy.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach device: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Device request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    // ── Operation errors ─────────────────────────────────────────────
    /// Input rejected locally; nothing was sent to the device.
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("Device rejected the request: {message}")]
    Rejected { message: String },

    #[error("Device API error: {message}")]
    Api { message: String, status: Option<u16> },

    #[error("Unexpected response from device: {message}")]
    Protocol { message: String },

    // ── Configuration / local errors ─────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Controller is shut down")]
    ShutDown,
}

impl CoreError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// `true` for failures the sync layer retries on its own.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::Timeout { .. }
        ) || matches!(self, Self::Api { status: Some(s), .. } if *s >= 500)
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<dmxnode_api::Error> for CoreError {
    fn from(err: dmxnode_api::Error) -> Self {
        use dmxnode_api::Error as Api;
        match err {
            Api::Authentication { message } => CoreError::AuthenticationFailed { message },
            Api::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_ms: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            Api::Timeout { timeout_ms } => CoreError::Timeout { timeout_ms },
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            Api::InvalidAddress { address, reason } => CoreError::Config {
                message: format!("Invalid device address '{address}': {reason}"),
            },
            Api::Tls(msg) => CoreError::ConnectionFailed {
                reason: format!("TLS error: {msg}"),
            },
            Api::Api { status: 401, message } => CoreError::AuthenticationFailed { message },
            Api::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            Api::Rejected { message } => CoreError::Rejected { message },
            Api::WebSocketConnect(reason) => CoreError::ConnectionFailed { reason },
            Api::WebSocketClosed { code, reason } => CoreError::ConnectionFailed {
                reason: format!("WebSocket closed (code {code}): {reason}"),
            },
            Api::Deserialization { message, .. } => CoreError::Protocol { message },
            Api::Io(e) => CoreError::Io(e),
            Api::TokenStore(message) => CoreError::Config { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_and_validation_are_not_transient() {
        let rejected: CoreError = dmxnode_api::Error::Rejected {
            message: "busy".into(),
        }
        .into();
        assert!(matches!(rejected, CoreError::Rejected { .. }));
        assert!(!rejected.is_transient());
        assert!(!CoreError::validation("universe", "out of range").is_transient());
    }

    #[test]
    fn api_errors_keep_status() {
        let err: CoreError = dmxnode_api::Error::Api {
            status: 502,
            message: "bad gateway".into(),
        }
        .into();
        assert!(err.is_transient());
        assert!(matches!(err, CoreError::Api { status: Some(502), .. }));
    }

    #[test]
    fn unauthorized_becomes_authentication_failure() {
        let err: CoreError = dmxnode_api::Error::Api {
            status: 401,
            message: "token expired".into(),
        }
        .into();
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    }
}
