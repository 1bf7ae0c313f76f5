//! One-shot status: fetch each domain once and print it.

use std::fmt::Write as _;
use std::time::Duration;

use bytesize::ByteSize;
use serde::Serialize;

use dmxnode_core::{Controller, DmxPort, Domain, NetworkState, SystemTelemetry};

use crate::cli::{DomainArg, GlobalOpts, StatusArgs};
use crate::error::CliError;
use crate::output::{self, opt};

use super::port::ports_table;

#[derive(Debug, Serialize)]
struct StatusReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<SystemTelemetry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ports: Option<Vec<DmxPort>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    network: Option<NetworkState>,
}

fn domains(arg: Option<DomainArg>) -> Vec<Domain> {
    match arg {
        None => vec![Domain::System, Domain::DmxPorts, Domain::Network],
        Some(DomainArg::System) => vec![Domain::System],
        Some(DomainArg::Dmx) => vec![Domain::DmxPorts],
        Some(DomainArg::Network) => vec![Domain::Network],
    }
}

pub async fn handle(
    controller: &Controller,
    args: &StatusArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let wanted = domains(args.domain);
    for domain in &wanted {
        controller.refresh(*domain).await?;
    }

    let stores = controller.stores();
    let report = StatusReport {
        system: wanted
            .contains(&Domain::System)
            .then(|| stores.system.value())
            .flatten(),
        ports: wanted
            .contains(&Domain::DmxPorts)
            .then(|| stores.dmx.value().map(|t| t.ports().cloned().collect()))
            .flatten(),
        network: wanted
            .contains(&Domain::Network)
            .then(|| stores.network.value())
            .flatten(),
    };

    let out = output::render_single(
        global.output,
        &report,
        |r| {
            let mut sections = Vec::new();
            if let Some(ref system) = r.system {
                sections.push(system_detail(system));
            }
            if let Some(ref ports) = r.ports {
                sections.push(ports_table(ports, |_| false));
            }
            if let Some(ref network) = r.network {
                sections.push(network_detail(network));
            }
            sections.join("\n\n")
        },
        |r| {
            r.system
                .as_ref()
                .and_then(|s| s.device_id.clone())
                .unwrap_or_default()
        },
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Detail views ─────────────────────────────────────────────────────

pub(crate) fn system_detail(s: &SystemTelemetry) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Device:    {}", opt(s.device_id.as_deref()));
    let _ = writeln!(out, "Firmware:  {}", opt(s.firmware_version.as_deref()));
    let _ = writeln!(
        out,
        "Uptime:    {}",
        opt(s.uptime.map(|secs| humantime::format_duration(Duration::from_secs(secs))))
    );
    let _ = writeln!(out, "CPU:       {}", opt(s.cpu_load.map(|c| format!("{c:.1}%"))));
    let _ = writeln!(
        out,
        "Heap:      {} free (min {})",
        opt(s.free_heap.map(ByteSize)),
        opt(s.min_free_heap.map(ByteSize))
    );
    let _ = write!(out, "IP:        {}", opt(s.ip.as_deref()));
    out
}

fn link(up: bool) -> &'static str {
    if up { "up" } else { "down" }
}

pub(crate) fn network_detail(n: &NetworkState) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Ethernet:  {} {} {}",
        link(n.eth_up),
        opt(n.eth_ip.as_deref()),
        opt(n.eth_mac.as_deref())
    );
    let _ = write!(
        out,
        "Wi-Fi:     {} {} {} ssid={} rssi={}",
        link(n.wifi_up),
        opt(n.wifi_ip.as_deref()),
        opt(n.wifi_mac.as_deref()),
        opt(n.wifi_ssid.as_deref()),
        opt(n.wifi_rssi)
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_filter_selects_one_domain() {
        assert_eq!(domains(None).len(), 3);
        assert_eq!(domains(Some(DomainArg::Dmx)), vec![Domain::DmxPorts]);
    }

    #[test]
    fn system_detail_formats_units() {
        let detail = system_detail(&SystemTelemetry {
            device_id: Some("node-7".into()),
            uptime: Some(3_661),
            cpu_load: Some(12.345),
            ..SystemTelemetry::default()
        });
        assert!(detail.contains("node-7"));
        assert!(detail.contains("1h 1m 1s"));
        assert!(detail.contains("12.3%"));
        assert!(detail.contains("Firmware:  -"));
    }

    #[test]
    fn network_detail_shows_link_state() {
        let detail = network_detail(&NetworkState {
            eth_up: true,
            eth_ip: Some("10.0.0.5".into()),
            ..NetworkState::default()
        });
        assert!(detail.contains("Ethernet:  up 10.0.0.5"));
        assert!(detail.contains("Wi-Fi:     down"));
    }
}
