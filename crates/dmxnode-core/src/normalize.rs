// ── Push message normalization ──
//
// The status socket speaks two dialects:
//
//   canonical  {"type": "system.status", "ts": ..., "data": {...}}
//   companion  {"type": "SNAPSHOT", "payload": {...}}
//              {"type": "EVENT", "event": "SYS_EVT_LINK_UP", "payload": {...}}
//
// `WireMessage::decode` parses a frame into one variant per message
// kind; `into_updates` turns it into canonical `DomainUpdate`s.

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::model::{
    DeviceEvent, DmxPortStatus, EventLevel, Interface, NetworkState, SystemTelemetry,
};
use crate::store::DomainUpdate;

const LINK_UP_EVENT: &str = "SYS_EVT_LINK_UP";
const LINK_DOWN_EVENT: &str = "SYS_EVT_LINK_DOWN";

/// Why a frame could not be decoded. The frame is dropped; the session stays up.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("'{kind}' frame has no {field}")]
    MissingField { kind: String, field: &'static str },

    #[error("'{kind}' frame is invalid: {reason}")]
    Invalid { kind: String, reason: String },
}

// ── Raw frame ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    payload: Option<Value>,
    #[serde(default)]
    event: Option<String>,
}

// ── Canonical payloads ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SystemStatusData {
    #[serde(default)]
    pub cpu: Option<f64>,
    #[serde(default)]
    pub heap: Option<u64>,
    #[serde(default)]
    pub uptime: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct NetworkLinkData {
    iface: String,
    status: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct SystemEventData {
    code: Value,
    #[serde(default)]
    level: EventLevel,
}

// ── Companion payloads ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SnapshotPayload {
    #[serde(default)]
    pub uptime: Option<u64>,
    #[serde(default)]
    pub cpu_load: Option<f64>,
    #[serde(default)]
    pub free_heap: Option<u64>,
    #[serde(default)]
    pub eth_up: Option<bool>,
    #[serde(default)]
    pub wifi_up: Option<bool>,
    #[serde(default)]
    pub eth_ip: Option<String>,
    #[serde(default)]
    pub wifi_ip: Option<String>,
    /// Only a JSON array counts as port data.
    #[serde(default)]
    pub dmx: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct LinkEventPayload {
    link: String,
    #[serde(default)]
    up: Option<bool>,
}

/// One decoded push frame.
#[derive(Debug, Clone, PartialEq)]
pub enum WireMessage {
    SystemStatus(SystemStatusData),
    PortStatus(DmxPortStatus),
    NetworkLink { iface: Interface, up: bool },
    SystemEvent { code: String, level: EventLevel },
    Snapshot(SnapshotPayload),
    /// Companion event other than a link change.
    Event { name: String },
    /// `type` we do not understand.
    Unknown(String),
}

impl WireMessage {
    /// Parse one text frame.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let raw: RawFrame = serde_json::from_str(text)?;
        match raw.kind.as_str() {
            "system.status" => Ok(Self::SystemStatus(typed(&raw.kind, raw.data, "data")?)),
            "dmx.port_status" => Ok(Self::PortStatus(typed(&raw.kind, raw.data, "data")?)),
            "network.link" => {
                let link: NetworkLinkData = typed(&raw.kind, raw.data, "data")?;
                let iface = parse_iface(&raw.kind, &link.iface)?;
                let up = match link.status.as_str() {
                    "up" => true,
                    "down" => false,
                    other => {
                        return Err(DecodeError::Invalid {
                            kind: raw.kind,
                            reason: format!("link status '{other}'"),
                        });
                    }
                };
                Ok(Self::NetworkLink { iface, up })
            }
            "system.event" => {
                let event: SystemEventData = typed(&raw.kind, raw.data, "data")?;
                let code = match event.code {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                Ok(Self::SystemEvent {
                    code,
                    level: event.level,
                })
            }
            "SNAPSHOT" => Ok(Self::Snapshot(typed(&raw.kind, raw.payload, "payload")?)),
            "EVENT" => {
                let Some(name) = raw.event else {
                    return Err(DecodeError::MissingField {
                        kind: raw.kind,
                        field: "event",
                    });
                };
                if name != LINK_UP_EVENT && name != LINK_DOWN_EVENT {
                    return Ok(Self::Event { name });
                }
                let payload: LinkEventPayload = typed(&raw.kind, raw.payload, "payload")?;
                let iface = parse_iface(&raw.kind, &payload.link)?;
                let up = payload.up.unwrap_or(name == LINK_UP_EVENT);
                Ok(Self::NetworkLink { iface, up })
            }
            _ => Ok(Self::Unknown(raw.kind)),
        }
    }

    /// Convert to canonical per-domain updates. Unknown messages yield none.
    pub fn into_updates(self) -> Vec<DomainUpdate> {
        match self {
            Self::SystemStatus(data) => vec![DomainUpdate::System(SystemTelemetry {
                cpu_load: data.cpu,
                free_heap: data.heap,
                uptime: data.uptime,
                ..SystemTelemetry::default()
            })],
            Self::PortStatus(status) => vec![DomainUpdate::DmxPort(status)],
            Self::NetworkLink { iface, up } => vec![DomainUpdate::NetworkLink { iface, up }],
            Self::SystemEvent { code, level } => vec![DomainUpdate::Event(DeviceEvent {
                code,
                level,
                received_at: Utc::now(),
            })],
            Self::Snapshot(payload) => snapshot_updates(payload),
            Self::Event { name } => vec![DomainUpdate::Event(DeviceEvent {
                code: name,
                level: EventLevel::Info,
                received_at: Utc::now(),
            })],
            Self::Unknown(kind) => {
                tracing::warn!(kind, "ignoring status frame of unknown type");
                Vec::new()
            }
        }
    }
}

fn snapshot_updates(payload: SnapshotPayload) -> Vec<DomainUpdate> {
    let mut updates = Vec::new();

    if payload.uptime.is_some() {
        updates.push(DomainUpdate::System(SystemTelemetry {
            uptime: payload.uptime,
            cpu_load: payload.cpu_load,
            free_heap: payload.free_heap,
            eth_up: payload.eth_up,
            wifi_up: payload.wifi_up,
            ..SystemTelemetry::default()
        }));
    }

    if let Some(Value::Array(items)) = payload.dmx {
        let ports = items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<DmxPortStatus>(item) {
                Ok(port) => Some(port),
                Err(e) => {
                    tracing::warn!(error = %e, "dropping malformed port in snapshot");
                    None
                }
            })
            .collect();
        updates.push(DomainUpdate::DmxPorts(ports));
    }

    if payload.eth_up.is_some() || payload.wifi_up.is_some() {
        updates.push(DomainUpdate::Network(NetworkState {
            eth_up: payload.eth_up.unwrap_or(false),
            wifi_up: payload.wifi_up.unwrap_or(false),
            eth_ip: payload.eth_ip,
            wifi_ip: payload.wifi_ip,
            ..NetworkState::default()
        }));
    }

    updates
}

fn typed<T: serde::de::DeserializeOwned>(
    kind: &str,
    value: Option<Value>,
    field: &'static str,
) -> Result<T, DecodeError> {
    let value = value.ok_or_else(|| DecodeError::MissingField {
        kind: kind.to_owned(),
        field,
    })?;
    serde_json::from_value(value).map_err(|e| DecodeError::Invalid {
        kind: kind.to_owned(),
        reason: e.to_string(),
    })
}

fn parse_iface(kind: &str, name: &str) -> Result<Interface, DecodeError> {
    name.parse().map_err(|reason| DecodeError::Invalid {
        kind: kind.to_owned(),
        reason,
    })
}
