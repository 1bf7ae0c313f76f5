// ── Input validation ──
//
// Pure checks run before any request leaves the process. A failure is
// always `CoreError::Validation` naming the offending field.

use std::net::Ipv4Addr;
use std::ops::RangeInclusive;

use secrecy::{ExposeSecret, SecretString};

use dmxnode_api::models::{DeviceConfigFile, NetworkConfig};

use crate::error::CoreError;
use crate::model::{DmxPort, PORT_COUNT, PortEdit};

pub const UNIVERSE_RANGE: RangeInclusive<u16> = 1..=32_768;
pub const BREAK_US_RANGE: RangeInclusive<u16> = 88..=500;
pub const MAB_US_RANGE: RangeInclusive<u16> = 8..=100;
pub const SSID_LEN: RangeInclusive<usize> = 1..=32;
pub const WIFI_PASSWORD_LEN: RangeInclusive<usize> = 8..=63;
pub const AP_CHANNEL_RANGE: RangeInclusive<u8> = 1..=11;

pub const DEFAULT_BREAK_US: u16 = 176;
pub const DEFAULT_MAB_US: u16 = 12;

fn in_range<T: PartialOrd + std::fmt::Display>(
    field: &'static str,
    value: T,
    range: &RangeInclusive<T>,
) -> Result<(), CoreError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(CoreError::validation(
            field,
            format!(
                "{value} is outside {}..={}",
                range.start(),
                range.end()
            ),
        ))
    }
}

pub fn validate_port(port: u8) -> Result<(), CoreError> {
    if port < PORT_COUNT {
        Ok(())
    } else {
        Err(CoreError::validation(
            "port",
            format!("{port} is outside 0..={}", PORT_COUNT - 1),
        ))
    }
}

pub fn validate_universe(universe: u16) -> Result<(), CoreError> {
    in_range("universe", universe, &UNIVERSE_RANGE)
}

pub fn validate_break_us(break_us: u16) -> Result<(), CoreError> {
    in_range("break_us", break_us, &BREAK_US_RANGE)
}

pub fn validate_mab_us(mab_us: u16) -> Result<(), CoreError> {
    in_range("mab_us", mab_us, &MAB_US_RANGE)
}

pub fn validate_ipv4(field: &'static str, value: &str) -> Result<Ipv4Addr, CoreError> {
    value
        .parse::<Ipv4Addr>()
        .map_err(|_| CoreError::validation(field, format!("'{value}' is not a dotted-quad IPv4 address")))
}

pub fn validate_netmask(value: &str) -> Result<Ipv4Addr, CoreError> {
    validate_ipv4("netmask", value)
}

pub fn validate_ssid(field: &'static str, ssid: &str) -> Result<(), CoreError> {
    // 802.11 limits the SSID to 32 octets, not characters.
    if SSID_LEN.contains(&ssid.len()) {
        Ok(())
    } else {
        Err(CoreError::validation(field, "must be 1-32 bytes"))
    }
}

pub fn validate_wifi_password(field: &'static str, password: &str) -> Result<(), CoreError> {
    let len = password.chars().count();
    if WIFI_PASSWORD_LEN.contains(&len) {
        Ok(())
    } else {
        Err(CoreError::validation(field, "must be 8-63 characters"))
    }
}

pub fn validate_admin_password(password: &SecretString) -> Result<(), CoreError> {
    if password.expose_secret().is_empty() {
        Err(CoreError::validation("password", "must not be empty"))
    } else {
        Ok(())
    }
}

/// Check the fields an edit sets.
pub fn validate_port_edit(edit: &PortEdit) -> Result<(), CoreError> {
    if let Some(universe) = edit.universe {
        validate_universe(universe)?;
    }
    if let Some(break_us) = edit.break_us {
        validate_break_us(break_us)?;
    }
    if let Some(mab_us) = edit.mab_us {
        validate_mab_us(mab_us)?;
    }
    Ok(())
}

/// Check a port about to be saved as a whole.
pub fn validate_port_config(port: &DmxPort) -> Result<(), CoreError> {
    validate_port(port.port)?;
    validate_universe(port.universe)?;
    if let Some(break_us) = port.break_us {
        validate_break_us(break_us)?;
    }
    if let Some(mab_us) = port.mab_us {
        validate_mab_us(mab_us)?;
    }
    Ok(())
}

pub fn validate_network_config(config: &NetworkConfig) -> Result<(), CoreError> {
    if let Some(eth) = &config.ethernet {
        if eth.dhcp == Some(false) {
            let ip = eth
                .ip
                .as_deref()
                .ok_or_else(|| CoreError::validation("ip", "required when DHCP is off"))?;
            validate_ipv4("ip", ip)?;
            let netmask = eth
                .netmask
                .as_deref()
                .ok_or_else(|| CoreError::validation("netmask", "required when DHCP is off"))?;
            validate_netmask(netmask)?;
        }
        if let Some(gateway) = eth.gateway.as_deref().filter(|g| !g.is_empty()) {
            validate_ipv4("gateway", gateway)?;
        }
    }
    if let Some(sta) = &config.wifi_sta {
        if sta.enabled {
            validate_ssid("wifi_sta.ssid", &sta.ssid)?;
            validate_wifi_password("wifi_sta.password", &sta.password)?;
        }
    }
    if let Some(ap) = &config.wifi_ap {
        if ap.enabled {
            validate_ssid("wifi_ap.ssid", &ap.ssid)?;
            // An empty AP password means an open network.
            if !ap.password.is_empty() {
                validate_wifi_password("wifi_ap.password", &ap.password)?;
            }
            if let Some(channel) = ap.channel {
                in_range("wifi_ap.channel", channel, &AP_CHANNEL_RANGE)?;
            }
        }
    }
    Ok(())
}

/// Structural checks on a configuration document before import.
pub fn validate_config_file(file: &DeviceConfigFile) -> Result<(), CoreError> {
    for port in &file.ports {
        validate_port(port.index)?;
    }
    let mut seen = [false; PORT_COUNT as usize];
    for port in &file.ports {
        let slot = &mut seen[usize::from(port.index)];
        if *slot {
            return Err(CoreError::validation(
                "ports",
                format!("port {} appears more than once", port.index),
            ));
        }
        *slot = true;
    }
    Ok(())
}
