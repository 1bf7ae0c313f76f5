use serde::{Deserialize, Serialize};

use dmxnode_api::models::SystemInfo;

/// System telemetry and identity.
///
/// Every field is optional: the push channel sends partial updates
/// (`system.status` carries only cpu/heap/uptime) and [`merge`](Self::merge)
/// applies them field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemTelemetry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware_version: Option<String>,
    /// Seconds since boot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
    /// Percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_load: Option<f64>,
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

impl SystemTelemetry {
    /// Overlay every field present in `patch`; absent fields keep their value.
    pub fn merge(&mut self, patch: SystemTelemetry) {
        fn take<T>(slot: &mut Option<T>, incoming: Option<T>) {
            if incoming.is_some() {
                *slot = incoming;
            }
        }
        take(&mut self.device_id, patch.device_id);
        take(&mut self.firmware_version, patch.firmware_version);
        take(&mut self.uptime, patch.uptime);
        take(&mut self.cpu_load, patch.cpu_load);
        take(&mut self.free_heap, patch.free_heap);
        take(&mut self.min_free_heap, patch.min_free_heap);
        take(&mut self.eth_up, patch.eth_up);
        take(&mut self.wifi_up, patch.wifi_up);
        take(&mut self.ip, patch.ip);
    }
}

impl From<SystemInfo> for SystemTelemetry {
    fn from(info: SystemInfo) -> Self {
        Self {
            device_id: info.device_id,
            firmware_version: info.firmware_version,
            uptime: info.uptime,
            cpu_load: info.cpu_load,
            free_heap: info.free_heap,
            min_free_heap: info.min_free_heap,
            eth_up: info.eth_up,
            wifi_up: info.wifi_up,
            ip: info.ip,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn partial_update_keeps_identity() {
        let mut current = SystemTelemetry {
            device_id: Some("node-7".into()),
            firmware_version: Some("4.0.2".into()),
            uptime: Some(10),
            cpu_load: Some(12.0),
            ..SystemTelemetry::default()
        };
        current.merge(SystemTelemetry {
            uptime: Some(11),
            cpu_load: Some(30.5),
            free_heap: Some(90_000),
            ..SystemTelemetry::default()
        });

        assert_eq!(current.device_id.as_deref(), Some("node-7"));
        assert_eq!(current.uptime, Some(11));
        assert_eq!(current.cpu_load, Some(30.5));
        assert_eq!(current.free_heap, Some(90_000));
    }
}
