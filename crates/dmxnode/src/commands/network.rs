//! Network command handlers.

use dmxnode_api::models::{EthernetConfig, NetworkConfig, WifiApConfig, WifiStationConfig};
use dmxnode_core::{Controller, Domain};
use secrecy::ExposeSecret;

use crate::cli::{GlobalOpts, NetworkArgs, NetworkCommand, NetworkSetArgs};
use crate::error::CliError;
use crate::output;

use super::status::network_detail;
use super::util;

pub async fn handle(
    controller: &Controller,
    args: NetworkArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        NetworkCommand::Show => {
            controller.refresh(Domain::Network).await?;
            let state = controller.stores().network.value().unwrap_or_default();
            let out = output::render_single(
                global.output,
                &state,
                network_detail,
                |s| s.ip.clone().unwrap_or_default(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
        NetworkCommand::Set(set) => {
            let config = match set.from_file {
                Some(ref path) => util::read_json_file(path)?,
                None => {
                    let wifi_password = match set.wifi_ssid {
                        Some(ref ssid) => Some(
                            util::prompt_secret(&format!("Password for '{ssid}': "))?
                                .expose_secret()
                                .to_owned(),
                        ),
                        None => None,
                    };
                    let ap_password = if set.ap_ssid.is_some() && !set.ap_open {
                        Some(
                            util::prompt_secret("Access point password: ")?
                                .expose_secret()
                                .to_owned(),
                        )
                    } else {
                        None
                    };
                    config_from_flags(&set, wifi_password, ap_password)?
                }
            };

            let ack = controller.save_network_config(&config).await?;
            if !global.quiet {
                eprintln!("Network settings saved; reboot the device to apply them");
                if let Some(warning) = ack.warning {
                    eprintln!("Warning: {warning}");
                }
            }
            Ok(())
        }
    }
}

/// Only the sections named on the command line are sent.
fn config_from_flags(
    args: &NetworkSetArgs,
    wifi_password: Option<String>,
    ap_password: Option<String>,
) -> Result<NetworkConfig, CliError> {
    let ethernet = if args.dhcp || args.static_ip.is_some() {
        Some(EthernetConfig {
            enabled: true,
            dhcp: Some(args.static_ip.is_none()),
            ip: args.static_ip.clone(),
            netmask: args.netmask.clone(),
            gateway: args.gateway.clone(),
        })
    } else {
        None
    };

    let wifi_sta = args.wifi_ssid.as_ref().map(|ssid| WifiStationConfig {
        enabled: true,
        ssid: ssid.clone(),
        password: wifi_password.unwrap_or_default(),
    });

    let wifi_ap = args.ap_ssid.as_ref().map(|ssid| WifiApConfig {
        enabled: true,
        ssid: ssid.clone(),
        password: ap_password.unwrap_or_default(),
        channel: args.ap_channel,
    });

    if ethernet.is_none() && wifi_sta.is_none() && wifi_ap.is_none() {
        return Err(CliError::validation(
            "network",
            "nothing to change; pass --dhcp, --static-ip, --wifi-ssid, --ap-ssid or --from-file",
        ));
    }

    Ok(NetworkConfig {
        ethernet,
        wifi_sta,
        wifi_ap,
    })
}
