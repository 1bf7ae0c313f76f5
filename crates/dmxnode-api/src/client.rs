// Device REST client
//
// Wraps `reqwest::Client` with device URL construction, bearer-token
// injection, per-request deadlines, and transparent unwrapping of the
// `{ok, data, error}` envelope. Endpoint groups (sys, dmx, network,
// auth, file) live in sibling modules as inherent methods to keep this
// module focused on transport mechanics.

use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::session::TokenStore;
use crate::endpoint::DeviceEndpoint;
use crate::error::Error;
use crate::transport::TransportConfig;

/// HTTP client for one DMX node.
///
/// Cheap to clone: the `reqwest::Client`, the token slot and the token
/// store are all shared. Every method returns the unwrapped payload --
/// callers never see the envelope.
#[derive(Clone)]
pub struct DeviceClient {
    http: reqwest::Client,
    endpoint: DeviceEndpoint,
    timeout: Duration,
    upload_timeout: Duration,
    token: Arc<RwLock<Option<SecretString>>>,
    token_store: Arc<dyn TokenStore>,
}

impl fmt::Debug for DeviceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceClient")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("authenticated", &self.has_token())
            .finish_non_exhaustive()
    }
}

impl DeviceClient {
    /// Create a client from a `TransportConfig`, seeding the bearer token
    /// from `token_store`.
    pub fn new(
        endpoint: DeviceEndpoint,
        transport: &TransportConfig,
        token_store: Arc<dyn TokenStore>,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let mut client = Self::with_client(http, endpoint, token_store)?;
        client.timeout = transport.timeout;
        client.upload_timeout = transport.upload_timeout;
        Ok(client)
    }

    /// Create a client around a pre-built `reqwest::Client` (default deadlines).
    pub fn with_client(
        http: reqwest::Client,
        endpoint: DeviceEndpoint,
        token_store: Arc<dyn TokenStore>,
    ) -> Result<Self, Error> {
        let token = token_store.load()?;
        let defaults = TransportConfig::default();
        Ok(Self {
            http,
            endpoint,
            timeout: defaults.timeout,
            upload_timeout: defaults.upload_timeout,
            token: Arc::new(RwLock::new(token)),
            token_store,
        })
    }

    /// The resolved device endpoint.
    pub fn endpoint(&self) -> &DeviceEndpoint {
        &self.endpoint
    }

    /// Deadline applied to ordinary requests.
    pub fn request_timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) fn upload_timeout(&self) -> Duration {
        self.upload_timeout
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── Token management ──────────────────────────────────────────────

    /// Whether a bearer token is currently attached to requests.
    pub fn has_token(&self) -> bool {
        self.token.read().map(|t| t.is_some()).unwrap_or(false)
    }

    /// Snapshot of the current token, for the WebSocket upgrade request.
    pub fn bearer_token(&self) -> Option<SecretString> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    /// Replace (or clear) the bearer token, writing through to the store.
    pub fn set_token(&self, token: Option<SecretString>) -> Result<(), Error> {
        match &token {
            Some(t) => self.token_store.save(t)?,
            None => self.token_store.clear()?,
        }
        let mut guard = self
            .token
            .write()
            .map_err(|_| Error::TokenStore("token lock poisoned".into()))?;
        *guard = token;
        Ok(())
    }

    /// Attach `Authorization: Bearer` when a token is present.
    /// Without one the request goes out as-is and the device decides.
    pub(crate) fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let Ok(guard) = self.token.read() else {
            return builder;
        };
        match guard.as_ref() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    // ── Request helpers ──────────────────────────────────────────────

    pub(crate) fn url(&self, path: &str) -> Url {
        self.endpoint.api_url(path)
    }

    /// Send a GET request and unwrap the envelope.
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path);
        debug!("GET {}", url);
        let builder = self.authorize(self.http.get(url));
        self.send(builder, self.timeout).await
    }

    /// Send a POST request with a JSON body and unwrap the envelope.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        let url = self.url(path);
        debug!("POST {}", url);
        let builder = self.authorize(self.http.post(url).json(body));
        self.send(builder, self.timeout).await
    }

    /// Execute a prepared request with `timeout` and parse the response.
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        timeout: Duration,
    ) -> Result<T, Error> {
        let resp = builder
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_reqwest(e, timeout))?;
        parse_response(resp, timeout).await
    }
}

/// Parse a device response.
///
/// - 401 → [`Error::Authentication`]
/// - other non-2xx → [`Error::Api`] with the body's `error` field, the
///   raw body, or `HTTP <status>` as the message
/// - `{ "ok": false, "error": ... }` → [`Error::Rejected`]
/// - `{ "ok": true, "data": ... }` → `data`
/// - anything else → the body itself
async fn parse_response<T: DeserializeOwned>(
    resp: reqwest::Response,
    timeout: Duration,
) -> Result<T, Error> {
    let status = resp.status();
    let body = resp.text().await.map_err(|e| map_reqwest(e, timeout))?;
    trace!(%status, len = body.len(), "device response");

    if !status.is_success() {
        let message = error_message(&body).unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication { message });
        }
        return Err(Error::Api {
            status: status.as_u16(),
            message,
        });
    }

    let value: serde_json::Value = if body.trim().is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_str(&body).map_err(|e| deserialization(&e, &body))?
    };

    let payload = unwrap_envelope(value)?;
    serde_json::from_value(payload).map_err(|e| deserialization(&e, &body))
}

/// Strip the `{ok, data, error}` wrapper when present.
pub(crate) fn unwrap_envelope(value: serde_json::Value) -> Result<serde_json::Value, Error> {
    let serde_json::Value::Object(mut map) = value else {
        return Ok(value);
    };
    let Some(ok) = map.get("ok").and_then(serde_json::Value::as_bool) else {
        return Ok(serde_json::Value::Object(map));
    };
    if !ok {
        let message = map
            .get("error")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("request failed")
            .to_owned();
        return Err(Error::Rejected { message });
    }
    Ok(map.remove("data").unwrap_or(serde_json::Value::Null))
}

/// Best-effort error text from a failed response body.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(trimmed)
    {
        return map
            .get("error")
            .and_then(serde_json::Value::as_str)
            .map(String::from);
    }
    Some(trimmed.chars().take(200).collect())
}

fn deserialization(err: &serde_json::Error, body: &str) -> Error {
    let preview: String = body.chars().take(200).collect();
    Error::Deserialization {
        message: format!("{err} (body preview: {preview:?})"),
        body: body.to_owned(),
    }
}

pub(crate) fn map_reqwest(err: reqwest::Error, timeout: Duration) -> Error {
    if err.is_timeout() {
        Error::Timeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    } else {
        Error::Transport(err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn envelope_is_unwrapped() {
        let data = unwrap_envelope(json!({ "ok": true, "data": { "uptime": 5 }, "error": null }))
            .unwrap();
        assert_eq!(data, json!({ "uptime": 5 }));
    }

    #[test]
    fn raw_payload_passes_through() {
        let raw = json!({ "eth_up": true, "wifi_up": false });
        assert_eq!(unwrap_envelope(raw.clone()).unwrap(), raw);
        assert_eq!(unwrap_envelope(json!([1, 2])).unwrap(), json!([1, 2]));
    }

    #[test]
    fn failed_envelope_surfaces_error_text() {
        let err = unwrap_envelope(json!({ "ok": false, "data": null, "error": "universe out of range" }))
            .unwrap_err();
        assert!(matches!(err, Error::Rejected { ref message } if message == "universe out of range"));
    }

    #[test]
    fn error_message_prefers_json_error_field() {
        assert_eq!(
            error_message(r#"{"error":"bad token"}"#).as_deref(),
            Some("bad token")
        );
        assert_eq!(error_message("plain failure").as_deref(), Some("plain failure"));
        assert_eq!(error_message("  "), None);
        assert_eq!(error_message(r#"{"status":"error"}"#), None);
    }
}
