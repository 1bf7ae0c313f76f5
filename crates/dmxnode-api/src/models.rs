// Wire models for the device REST API.
//
// Field names follow the device JSON exactly. Everything the device may
// omit is `Option` with `#[serde(default)]`, and `skip_serializing_if`
// keeps request bodies free of nulls the firmware would reject.

use serde::{Deserialize, Serialize};

/// Standard response wrapper: `{ "ok": bool, "data": T, "error": string|null }`.
///
/// Not every endpoint wraps its payload; see
/// [`DeviceClient`](crate::DeviceClient) for the transparent unwrap.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub ok: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Generic acknowledgement returned by mutating endpoints
/// (`{"status": "ok", "message": "..."}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub warning: Option<String>,
}

// ── System ──────────────────────────────────────────────────────────

/// `GET /api/sys/info`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    #[serde(default, alias = "device", skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, alias = "version", skip_serializing_if = "Option::is_none")]
    pub firmware_version: Option<String>,
    /// Seconds since boot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
    /// Percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_load: Option<f64>,
    /// Bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_heap: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_free_heap: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eth_up: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wifi_up: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

// ── DMX ─────────────────────────────────────────────────────────────

/// Output driver behind a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PortBackend {
    Rmt,
    Uart,
}

/// One entry of `GET /api/dmx/status`.
///
/// Only `port` is mandatory on the wire so the same type can carry a
/// single-port delta from the push channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DmxPortStatus {
    pub port: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub universe: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_us: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mab_us: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<PortBackend>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_counter: Option<u64>,
}

/// `dmx/status` is either a bare list or `{ "ports": [...] }` depending on firmware.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DmxStatusResponse {
    List(Vec<DmxPortStatus>),
    Wrapped { ports: Vec<DmxPortStatus> },
}

impl DmxStatusResponse {
    pub fn into_ports(self) -> Vec<DmxPortStatus> {
        match self {
            Self::List(ports) | Self::Wrapped { ports } => ports,
        }
    }
}

/// Per-port configuration sent to `POST /api/dmx/config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmxPortConfig {
    pub port: u8,
    pub universe: u16,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_us: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mab_us: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<PortBackend>,
}

/// Body of `POST /api/dmx/config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmxConfig {
    pub ports: Vec<DmxPortConfig>,
}

// ── Network ─────────────────────────────────────────────────────────

/// `GET /api/network/status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkStatus {
    #[serde(default)]
    pub eth_up: bool,
    #[serde(default)]
    pub wifi_up: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eth_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wifi_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eth_mac: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wifi_mac: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wifi_ssid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wifi_rssi: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthernetConfig {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhcp: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub netmask: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiStationConfig {
    pub enabled: bool,
    pub ssid: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiApConfig {
    pub enabled: bool,
    pub ssid: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<u8>,
}

/// Body of `POST /api/network/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ethernet: Option<EthernetConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wifi_sta: Option<WifiStationConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wifi_ap: Option<WifiApConfig>,
}

// ── Auth ────────────────────────────────────────────────────────────

/// `POST /api/auth/login` response.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub expires_seconds: Option<u64>,
}

// ── Export / import ─────────────────────────────────────────────────

/// Network section of an exported configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportedNetwork {
    #[serde(default)]
    pub dhcp: bool,
    #[serde(default)]
    pub static_ip: String,
    #[serde(default)]
    pub static_netmask: String,
    #[serde(default)]
    pub static_gateway: String,
    #[serde(default)]
    pub wifi_ssid: String,
    #[serde(default)]
    pub wifi_psk: String,
    #[serde(default)]
    pub wifi_enabled: bool,
    #[serde(default)]
    pub eth_enabled: bool,
    /// Fields newer firmware adds; carried through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One port of an exported configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportedPort {
    pub index: u8,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub universe: u16,
    /// Numeric protocol id as stored by the firmware.
    #[serde(default)]
    pub protocol: u8,
    #[serde(default)]
    pub break_us: u16,
    #[serde(default)]
    pub mab_us: u16,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The document produced by `GET /api/file/export` and accepted by
/// `POST /api/file/import`.
///
/// Known sections are typed; anything else lands in `extra` so an
/// export followed by an import never drops data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfigFile {
    #[serde(default)]
    pub device_label: String,
    #[serde(default)]
    pub led_brightness: u8,
    #[serde(default)]
    pub network: ExportedNetwork,
    #[serde(default)]
    pub ports: Vec<ExportedPort>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failsafe: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn dmx_status_accepts_both_shapes() {
        let list: DmxStatusResponse =
            serde_json::from_value(json!([{ "port": 0, "universe": 1, "enabled": true }])).unwrap();
        let wrapped: DmxStatusResponse = serde_json::from_value(json!({
            "ports": [{ "port": 2, "universe": 7, "enabled": false, "backend": "RMT" }]
        }))
        .unwrap();

        assert_eq!(list.into_ports()[0].universe, Some(1));
        let ports = wrapped.into_ports();
        assert_eq!(ports[0].port, 2);
        assert_eq!(ports[0].backend, Some(PortBackend::Rmt));
    }

    #[test]
    fn system_info_accepts_device_field_names() {
        let info: SystemInfo = serde_json::from_value(json!({
            "device": "node-a",
            "version": "4.0.0",
            "uptime": 12,
            "free_heap": 1024,
            "eth_up": true,
            "wifi_up": false,
            "ip": null
        }))
        .unwrap();
        assert_eq!(info.device_id.as_deref(), Some("node-a"));
        assert_eq!(info.firmware_version.as_deref(), Some("4.0.0"));
        assert_eq!(info.ip, None);
    }

    #[test]
    fn config_file_keeps_unknown_sections() {
        let raw = json!({
            "device_label": "stage-left",
            "led_brightness": 80,
            "network": { "dhcp": true, "wifi_enabled": false, "eth_enabled": true, "mdns_name": "sl" },
            "ports": [{ "index": 0, "enabled": true, "universe": 3, "protocol": 1,
                        "break_us": 176, "mab_us": 12, "merge": "htp" }],
            "failsafe": { "mode": 1, "timeout_ms": 2000 },
            "schema": 2
        });
        let parsed: DeviceConfigFile = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.network.extra["mdns_name"], "sl");
        assert_eq!(parsed.ports[0].extra["merge"], "htp");
        assert_eq!(parsed.extra["schema"], 2);
    }
}
