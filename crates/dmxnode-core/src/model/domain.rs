use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// One independently synchronized slice of device state.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Domain {
    /// Uptime, CPU, heap, identity.
    System,
    /// The four DMX output ports.
    #[strum(to_string = "dmx", serialize = "dmx_ports")]
    #[serde(alias = "dmx")]
    DmxPorts,
    /// Link state and addresses.
    Network,
}
