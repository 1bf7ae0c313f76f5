// ── Domain state stores ──
//
// One `StateCell` per domain. Both the push path and the poll path feed
// `DomainStores::apply`, so merge rules live in exactly one place.

mod cell;
mod dmx;

pub use cell::{DomainSnapshot, StateCell};
pub use dmx::DmxTable;

use tracing::debug;

use crate::model::{
    DeviceEvent, DmxPortStatus, Domain, Interface, NetworkState, PortEdit, SystemTelemetry,
    set_link,
};

/// A canonical update for one domain, whatever source it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainUpdate {
    /// Partial telemetry; merged field-wise.
    System(SystemTelemetry),
    /// Full port list; replaces the table.
    DmxPorts(Vec<DmxPortStatus>),
    /// Single-port delta; merged by port number.
    DmxPort(DmxPortStatus),
    /// Full network status; replaces.
    Network(NetworkState),
    /// One interface went up or down.
    NetworkLink { iface: Interface, up: bool },
    /// Device notification; broadcast, never stored.
    Event(DeviceEvent),
}

impl DomainUpdate {
    pub fn domain(&self) -> Option<Domain> {
        match self {
            Self::System(_) => Some(Domain::System),
            Self::DmxPorts(_) | Self::DmxPort(_) => Some(Domain::DmxPorts),
            Self::Network(_) | Self::NetworkLink { .. } => Some(Domain::Network),
            Self::Event(_) => None,
        }
    }
}

/// The authoritative view of the device.
pub struct DomainStores {
    pub system: StateCell<SystemTelemetry>,
    pub dmx: StateCell<DmxTable>,
    pub network: StateCell<NetworkState>,
}

impl Default for DomainStores {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainStores {
    pub fn new() -> Self {
        Self {
            system: StateCell::new(),
            dmx: StateCell::new(),
            network: StateCell::new(),
        }
    }

    /// Apply one update. Returns `true` if a store changed.
    pub fn apply(&self, update: DomainUpdate) -> bool {
        match update {
            DomainUpdate::System(patch) => self.system.update(|value| {
                value.get_or_insert_with(SystemTelemetry::default).merge(patch);
                true
            }),
            DomainUpdate::DmxPorts(list) => self.dmx.update(|value| {
                value.get_or_insert_with(DmxTable::default).apply_list(&list);
                true
            }),
            DomainUpdate::DmxPort(delta) => self.dmx.update(|value| {
                value
                    .get_or_insert_with(DmxTable::default)
                    .apply_delta(&delta)
            }),
            DomainUpdate::Network(status) => {
                self.network.set_value(status);
                true
            }
            DomainUpdate::NetworkLink { iface, up } => self.network.update(|value| {
                let Some(state) = value.as_mut() else {
                    debug!(%iface, up, "ignoring link change before first network status");
                    return false;
                };
                set_link(state, iface, up);
                true
            }),
            DomainUpdate::Event(event) => {
                debug!(code = %event.code, "device event is not stored");
                false
            }
        }
    }

    /// Record a failed refresh for `domain`.
    pub fn set_error(&self, domain: Domain, error: &str) {
        match domain {
            Domain::System => self.system.set_error(error),
            Domain::DmxPorts => self.dmx.set_error(error),
            Domain::Network => self.network.set_error(error),
        }
    }

    // ── Edit arbitration ─────────────────────────────────────────────

    pub(crate) fn begin_edit(&self, port: u8) -> bool {
        self.dmx.modify_local(|value| {
            value.get_or_insert_with(DmxTable::default).begin_edit(port)
        })
    }

    pub(crate) fn edit_port(&self, port: u8, edit: &PortEdit) {
        self.dmx.modify_local(|value| {
            value.get_or_insert_with(DmxTable::default).edit(port, edit);
            true
        });
    }

    pub(crate) fn clear_dirty(&self, port: u8) -> bool {
        self.dmx.modify_local(|value| {
            value
                .as_mut()
                .is_some_and(|table| table.clear_dirty(port))
        })
    }

    pub fn is_dirty(&self, port: u8) -> bool {
        self.dmx
            .get()
            .value
            .is_some_and(|table| table.is_dirty(port))
    }
}
