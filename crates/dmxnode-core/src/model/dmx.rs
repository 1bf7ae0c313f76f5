use serde::{Deserialize, Serialize};

use dmxnode_api::models::{DmxPortConfig, DmxPortStatus, PortBackend};

/// Number of DMX output ports on the node. Valid port numbers are `0..PORT_COUNT`.
pub const PORT_COUNT: u8 = 4;

/// One DMX output port as held by the store.
///
/// `universe`, `enabled`, `break_us` and `mab_us` are user-editable.
/// `fps`, `backend` and `activity_counter` are reported by the device only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DmxPort {
    pub port: u8,
    pub universe: u16,
    pub enabled: bool,
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

impl DmxPort {
    /// A port the device has not described yet: universe 0, disabled.
    pub fn new(port: u8) -> Self {
        Self {
            port,
            universe: 0,
            enabled: false,
            break_us: None,
            mab_us: None,
            fps: None,
            backend: None,
            activity_counter: None,
        }
    }

    /// Shallow-merge a device report into this port.
    ///
    /// With `keep_local` set, editable fields are left alone and only the
    /// read-only counters flow through.
    pub fn merge_status(&mut self, status: &DmxPortStatus, keep_local: bool) {
        if !keep_local {
            if let Some(universe) = status.universe {
                self.universe = universe;
            }
            if let Some(enabled) = status.enabled {
                self.enabled = enabled;
            }
            if status.break_us.is_some() {
                self.break_us = status.break_us;
            }
            if status.mab_us.is_some() {
                self.mab_us = status.mab_us;
            }
        }
        if status.fps.is_some() {
            self.fps = status.fps;
        }
        if status.backend.is_some() {
            self.backend = status.backend;
        }
        if status.activity_counter.is_some() {
            self.activity_counter = status.activity_counter;
        }
    }

    /// The request body that saves this port's editable fields.
    pub fn to_config(&self) -> DmxPortConfig {
        DmxPortConfig {
            port: self.port,
            universe: self.universe,
            enabled: self.enabled,
            break_us: self.break_us,
            mab_us: self.mab_us,
            protocol: None,
        }
    }
}

impl From<&DmxPortStatus> for DmxPort {
    fn from(status: &DmxPortStatus) -> Self {
        let mut port = Self::new(status.port);
        port.merge_status(status, false);
        port
    }
}

/// A local change to a port's editable fields. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortEdit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub universe: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_us: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mab_us: Option<u16>,
}

impl PortEdit {
    pub fn is_empty(&self) -> bool {
        self.universe.is_none()
            && self.enabled.is_none()
            && self.break_us.is_none()
            && self.mab_us.is_none()
    }

    pub fn apply_to(&self, port: &mut DmxPort) {
        if let Some(universe) = self.universe {
            port.universe = universe;
        }
        if let Some(enabled) = self.enabled {
            port.enabled = enabled;
        }
        if self.break_us.is_some() {
            port.break_us = self.break_us;
        }
        if self.mab_us.is_some() {
            port.mab_us = self.mab_us;
        }
    }
}
