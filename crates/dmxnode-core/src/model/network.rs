use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::Display;

/// Full network status as held by the store.
pub type NetworkState = dmxnode_api::models::NetworkStatus;

/// Network interface named by link events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Interface {
    #[strum(to_string = "eth")]
    #[serde(rename = "eth")]
    Ethernet,
    Wifi,
}

impl FromStr for Interface {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eth" | "ethernet" => Ok(Self::Ethernet),
            "wifi" | "wlan" | "sta" => Ok(Self::Wifi),
            other => Err(format!("unknown interface '{other}'")),
        }
    }
}

/// Patch link state in place.
pub(crate) fn set_link(state: &mut NetworkState, iface: Interface, up: bool) {
    match iface {
        Interface::Ethernet => state.eth_up = up,
        Interface::Wifi => state.wifi_up = up,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn interface_aliases() {
        assert_eq!("eth".parse::<Interface>().unwrap(), Interface::Ethernet);
        assert_eq!("WiFi".parse::<Interface>().unwrap(), Interface::Wifi);
        assert!("lte".parse::<Interface>().is_err());
        assert_eq!(Interface::Ethernet.to_string(), "eth");
    }

    #[test]
    fn link_patch_touches_one_interface() {
        let mut state = NetworkState {
            eth_up: true,
            wifi_up: true,
            ..NetworkState::default()
        };
        set_link(&mut state, Interface::Wifi, false);
        assert!(state.eth_up);
        assert!(!state.wifi_up);
    }
}
