use thiserror::Error;

/// Top-level error type for the `dmxnode-api` crate.
///
/// Covers every failure mode of the device surfaces: HTTP transport,
/// the `{ok, data, error}` envelope, authentication, and the status
/// WebSocket. `dmxnode-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The device rejected the request (HTTP 401) or the login password.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Device address could not be turned into an endpoint.
    #[error("Invalid device address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// Request or handshake exceeded its deadline.
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Device API ──────────────────────────────────────────────────
    /// Non-2xx response. `message` is the body's `error` field when present.
    #[error("Device API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// HTTP 2xx with `{"ok": false, "error": "..."}`.
    #[error("Device rejected request: {message}")]
    Rejected { message: String },

    // ── WebSocket ───────────────────────────────────────────────────
    /// WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// WebSocket closed unexpectedly.
    #[error("WebSocket closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Local I/O (reading a firmware image, token storage).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Token persistence backend failed.
    #[error("Token storage error: {0}")]
    TokenStore(String),
}

impl Error {
    /// Returns `true` if the device wants a (new) bearer token.
    pub fn is_auth_expired(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::Api { status: 401, .. }
        )
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } | Self::WebSocketConnect(_) | Self::WebSocketClosed { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }
}
