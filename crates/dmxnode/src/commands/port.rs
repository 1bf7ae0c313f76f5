//! DMX port command handlers.

use tabled::Tabled;

use dmxnode_core::{Controller, DmxPort, Domain, PortEdit};

use crate::cli::{GlobalOpts, PortArgs, PortCommand, PortSetArgs};
use crate::error::CliError;
use crate::output::{self, opt};

// ── Table row ────────────────────────────────────────────────────────

#[derive(Tabled)]
struct PortRow {
    #[tabled(rename = "Port")]
    port: u8,
    #[tabled(rename = "Universe")]
    universe: u16,
    #[tabled(rename = "Enabled")]
    enabled: &'static str,
    #[tabled(rename = "Break µs")]
    break_us: String,
    #[tabled(rename = "MAB µs")]
    mab_us: String,
    #[tabled(rename = "FPS")]
    fps: String,
    #[tabled(rename = "Driver")]
    backend: String,
    #[tabled(rename = "Frames")]
    frames: String,
}

fn port_row(p: &DmxPort, dirty: bool) -> PortRow {
    PortRow {
        port: p.port,
        universe: p.universe,
        enabled: match (p.enabled, dirty) {
            (true, false) => "yes",
            (false, false) => "no",
            (true, true) => "yes*",
            (false, true) => "no*",
        },
        break_us: opt(p.break_us),
        mab_us: opt(p.mab_us),
        fps: opt(p.fps.map(|f| format!("{f:.1}"))),
        backend: opt(p.backend.map(|b| format!("{b:?}").to_uppercase())),
        frames: opt(p.activity_counter),
    }
}

/// Ports as a table; `dirty` marks ports holding unsaved local edits.
pub(crate) fn ports_table(ports: &[DmxPort], dirty: impl Fn(u8) -> bool) -> String {
    let rows: Vec<PortRow> = ports.iter().map(|p| port_row(p, dirty(p.port))).collect();
    output::render_table(&rows)
}

// ── Handler ──────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: PortArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        PortCommand::List => {
            controller.refresh(Domain::DmxPorts).await?;
            let ports: Vec<DmxPort> = controller
                .stores()
                .dmx
                .value()
                .map(|t| t.ports().cloned().collect())
                .unwrap_or_default();
            let out = output::render_list(
                global.output,
                &ports,
                |p| port_row(p, false),
                |p| p.port.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
        PortCommand::Set(set) => {
            let edit = port_edit(&set)?;
            // The commit sends the full port, so the current values are needed.
            controller.refresh(Domain::DmxPorts).await?;
            let ack = controller.save_port(set.port, &edit).await?;
            if !global.quiet {
                eprintln!("Port {} saved", set.port);
                if let Some(warning) = ack.warning {
                    eprintln!("Warning: {warning}");
                }
            }
            Ok(())
        }
    }
}

fn port_edit(args: &PortSetArgs) -> Result<PortEdit, CliError> {
    let enabled = match (args.enable, args.disable) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    };
    let edit = PortEdit {
        universe: args.universe,
        enabled,
        break_us: args.break_us,
        mab_us: args.mab_us,
    };
    if edit.is_empty() {
        return Err(CliError::validation(
            "port",
            "nothing to change; pass --universe, --enable/--disable, --break-us or --mab-us",
        ));
    }
    Ok(edit)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn set_args(universe: Option<u16>, enable: bool, disable: bool) -> PortSetArgs {
        PortSetArgs {
            port: 1,
            universe,
            enable,
            disable,
            break_us: None,
            mab_us: None,
        }
    }

    #[test]
    fn flags_become_a_sparse_edit() {
        let edit = port_edit(&set_args(Some(9), false, true)).unwrap();
        assert_eq!(edit.universe, Some(9));
        assert_eq!(edit.enabled, Some(false));
        assert_eq!(edit.break_us, None);
    }

    #[test]
    fn empty_edit_is_rejected() {
        assert!(matches!(
            port_edit(&set_args(None, false, false)),
            Err(CliError::Validation { .. })
        ));
    }

    #[test]
    fn dirty_ports_are_starred() {
        let mut port = DmxPort::new(2);
        port.enabled = true;
        port.universe = 4;
        let table = ports_table(&[port], |p| p == 2);
        assert!(table.contains("yes*"));
    }
}
