// Device endpoint resolution
//
// Turns a configured device address ("192.168.4.1", "http://node.local:8080",
// "https://10.0.0.7") into the REST base and the status WebSocket URL.
// The WebSocket scheme follows the device scheme: https devices get wss.

use url::Url;

use crate::error::Error;

/// Path of the status push channel on the device.
pub const STATUS_SOCKET_PATH: &str = "/ws/status";

/// Resolved URLs for one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEndpoint {
    base: Url,
    ws: Url,
}

impl DeviceEndpoint {
    /// Parse a device address. A bare host or `host:port` is treated as `http`.
    pub fn parse(address: &str) -> Result<Self, Error> {
        let trimmed = address.trim();
        if trimmed.is_empty() {
            return Err(invalid(address, "address is empty"));
        }

        let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_owned()
        } else if trimmed.contains("://") {
            return Err(invalid(address, "only http and https are supported"));
        } else {
            format!("http://{trimmed}")
        };

        let mut base = Url::parse(&with_scheme).map_err(|e| invalid(address, &e.to_string()))?;
        if base.host_str().is_none() {
            return Err(invalid(address, "missing host"));
        }
        base.set_path("/");
        base.set_query(None);
        base.set_fragment(None);

        let mut ws = base.clone();
        let ws_scheme = if base.scheme() == "https" { "wss" } else { "ws" };
        ws.set_scheme(ws_scheme)
            .map_err(|()| invalid(address, "cannot derive WebSocket scheme"))?;
        ws.set_path(STATUS_SOCKET_PATH);

        Ok(Self { base, ws })
    }

    /// Device root, always ending in `/`.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `true` when the device is reached over TLS (and the socket over wss).
    pub fn is_secure(&self) -> bool {
        self.base.scheme() == "https"
    }

    /// Build `{base}/api/{path}`.
    pub fn api_url(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(&format!("/api/{}", path.trim_start_matches('/')));
        url
    }

    /// The status WebSocket URL.
    pub fn ws_url(&self) -> &Url {
        &self.ws
    }
}

fn invalid(address: &str, reason: &str) -> Error {
    Error::InvalidAddress {
        address: address.to_owned(),
        reason: reason.to_owned(),
    }
}
