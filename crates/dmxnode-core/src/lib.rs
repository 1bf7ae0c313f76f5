//! Real-time state synchronization between a DMX node and its clients.
//!
//! - **[`Controller`]**: One context object per device. [`start()`](Controller::start)
//!   spawns the push session manager, the reachability tracker and one poll
//!   task per [`Domain`]; [`shutdown()`](Controller::shutdown) cancels them all.
//!   User actions (`save_port`, `reboot`, `import_config`, ...) are methods on it.
//!
//! - **[`DomainStores`]**: One `watch`-backed [`StateCell`] per domain. Push
//!   frames and poll results both arrive as [`DomainUpdate`]s and merge here.
//!
//! - **Transport failover**: While a push session is open polling is
//!   suppressed; when it drops, every domain polls immediately and the push
//!   manager retries on a capped exponential backoff.
//!
//! - **Edit arbitration**: A port under local edit keeps its editable
//!   fields until the edit is committed or discarded.

pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod monitor;
pub mod normalize;
pub mod poll;
pub mod push;
pub mod store;
pub mod stream;
pub mod validate;

mod actions;
mod edit;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ControllerConfig, PollConfig, ReconnectConfig, SyncConfig};
pub use controller::Controller;
pub use error::CoreError;
pub use model::{
    DeviceEvent, DmxPort, Domain, EventLevel, Interface, NetworkState, PORT_COUNT, PortEdit,
    SystemTelemetry,
};
pub use monitor::{ConnectionState, TransportMode};
pub use normalize::{DecodeError, WireMessage};
pub use poll::{PollSource, RestPollSource};
pub use push::{Backoff, PushConnector, PushState, WebSocketConnector};
pub use store::{DmxTable, DomainSnapshot, DomainStores, DomainUpdate, StateCell};
pub use stream::SnapshotStream;
