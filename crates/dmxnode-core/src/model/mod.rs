// ── Domain model ──
//
// Canonical types held by the domain stores. Wire types from
// `dmxnode-api` are converted at the edge; push and poll data end up in
// the same shapes.

mod dmx;
mod domain;
mod event;
mod network;
mod system;

pub use dmx::{DmxPort, PORT_COUNT, PortEdit};
pub use domain::Domain;
pub use event::{DeviceEvent, EventLevel};
pub use network::{Interface, NetworkState};
pub(crate) use network::set_link;
pub use system::SystemTelemetry;

pub use dmxnode_api::models::{DmxPortStatus, PortBackend};
