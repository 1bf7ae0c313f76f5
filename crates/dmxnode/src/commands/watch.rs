//! Live view: start the sync layer and print every change until Ctrl-C.
//!
//! Table and plain output print one human line per change; JSON output
//! prints one object per line, tagged by `kind`.

use std::fmt::Display;

use chrono::Local;
use owo_colors::{OwoColorize, Style};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use dmxnode_core::{
    ConnectionState, Controller, DeviceEvent, DmxTable, DomainSnapshot, EventLevel, NetworkState,
    SystemTelemetry, TransportMode,
};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output::{self, opt};

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum WatchLine<'a> {
    Connection { state: &'a ConnectionState },
    System { snapshot: &'a DomainSnapshot<SystemTelemetry> },
    Dmx { snapshot: &'a DomainSnapshot<DmxTable> },
    Network { snapshot: &'a DomainSnapshot<NetworkState> },
    Event { event: &'a DeviceEvent },
}

pub async fn handle(
    controller: &Controller,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let printer = Printer {
        format: global.output,
        color: output::should_color(global.color),
        quiet: global.quiet,
    };

    let mut system = controller.system();
    let mut dmx = controller.dmx_ports();
    let mut network = controller.network();
    let mut connection = controller.subscribe_connection();
    let mut events = controller.events();
    let state_changes = !args.events_only;

    controller.start().await;
    let initial = *connection.borrow_and_update();
    printer.emit(&WatchLine::Connection { state: &initial })?;

    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    let result = loop {
        tokio::select! {
            biased;

            _ = &mut interrupt => {
                debug!("interrupted");
                break Ok(());
            }

            changed = connection.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let state = *connection.borrow_and_update();
                if let Err(e) = printer.emit(&WatchLine::Connection { state: &state }) {
                    break Err(e);
                }
            }

            event = events.recv() => match event {
                Ok(event) => {
                    if let Err(e) = printer.emit(&WatchLine::Event { event: &event }) {
                        break Err(e);
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event stream lagged"),
                Err(RecvError::Closed) => break Ok(()),
            },

            Some(snapshot) = system.changed(), if state_changes => {
                if let Err(e) = printer.emit(&WatchLine::System { snapshot: &snapshot }) {
                    break Err(e);
                }
            }

            Some(snapshot) = dmx.changed(), if state_changes => {
                if let Err(e) = printer.emit(&WatchLine::Dmx { snapshot: &snapshot }) {
                    break Err(e);
                }
            }

            Some(snapshot) = network.changed(), if state_changes => {
                if let Err(e) = printer.emit(&WatchLine::Network { snapshot: &snapshot }) {
                    break Err(e);
                }
            }
        }
    };

    controller.shutdown().await;
    result
}

// ── Rendering ────────────────────────────────────────────────────────

struct Printer {
    format: OutputFormat,
    color: bool,
    quiet: bool,
}

impl Printer {
    fn emit(&self, line: &WatchLine<'_>) -> Result<(), CliError> {
        let text = match self.format {
            OutputFormat::Json | OutputFormat::JsonCompact => output::render_json(line, true)?,
            OutputFormat::Yaml => format!("---\n{}", output::render_yaml(line)?.trim_end()),
            OutputFormat::Table | OutputFormat::Plain => {
                format!("{} {}", Local::now().format("%H:%M:%S"), self.human(line))
            }
        };
        output::print_output(&text, self.quiet);
        Ok(())
    }

    fn paint(&self, text: impl Display, style: Style) -> String {
        if self.color {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }

    fn label(&self, name: &str) -> String {
        self.paint(format!("{name:<8}"), Style::new().bold())
    }

    fn human(&self, line: &WatchLine<'_>) -> String {
        match line {
            WatchLine::Connection { state } => {
                let (text, style) = match (state.reachable, state.mode) {
                    (false, _) | (_, TransportMode::Disconnected) => {
                        ("offline", Style::new().red())
                    }
                    (true, TransportMode::Connecting) => ("connecting", Style::new().yellow()),
                    (true, TransportMode::Push) => ("live (push)", Style::new().green()),
                    (true, TransportMode::Polling) => ("polling", Style::new().yellow()),
                };
                format!("{} {}", self.label("link"), self.paint(text, style))
            }
            WatchLine::System { snapshot } => self.with_error(
                "system",
                snapshot.error.as_deref(),
                snapshot.value.as_ref().map(system_summary),
            ),
            WatchLine::Dmx { snapshot } => self.with_error(
                "dmx",
                snapshot.error.as_deref(),
                snapshot.value.as_ref().map(dmx_summary),
            ),
            WatchLine::Network { snapshot } => self.with_error(
                "network",
                snapshot.error.as_deref(),
                snapshot.value.as_ref().map(network_summary),
            ),
            WatchLine::Event { event } => {
                let style = match event.level {
                    EventLevel::Info => Style::new().cyan(),
                    EventLevel::Warn => Style::new().yellow(),
                    EventLevel::Error => Style::new().red(),
                };
                format!(
                    "{} {} {}",
                    self.label("event"),
                    self.paint(format!("[{}]", event.level), style),
                    event.code
                )
            }
        }
    }

    fn with_error(&self, name: &str, error: Option<&str>, summary: Option<String>) -> String {
        let mut out = format!("{} {}", self.label(name), summary.unwrap_or_else(|| "-".into()));
        if let Some(error) = error {
            out.push_str("  ");
            out.push_str(&self.paint(format!("error: {error}"), Style::new().red()));
        }
        out
    }
}

fn system_summary(s: &SystemTelemetry) -> String {
    format!(
        "cpu {}  heap {}  uptime {}",
        opt(s.cpu_load.map(|c| format!("{c:.1}%"))),
        opt(s.free_heap.map(bytesize::ByteSize)),
        opt(s.uptime.map(|secs| humantime::format_duration(std::time::Duration::from_secs(secs))))
    )
}

fn dmx_summary(table: &DmxTable) -> String {
    table
        .ports()
        .map(|p| {
            format!(
                "{}{}:u{} {} {}fps",
                p.port,
                if table.is_dirty(p.port) { "*" } else { "" },
                p.universe,
                if p.enabled { "on" } else { "off" },
                opt(p.fps.map(|f| format!("{f:.0}")))
            )
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

fn network_summary(n: &NetworkState) -> String {
    format!(
        "eth {} {}  wifi {} {}",
        if n.eth_up { "up" } else { "down" },
        opt(n.eth_ip.as_deref()),
        if n.wifi_up { "up" } else { "down" },
        opt(n.wifi_ip.as_deref())
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn printer(format: OutputFormat) -> Printer {
        Printer {
            format,
            color: false,
            quiet: false,
        }
    }

    #[test]
    fn connection_lines_name_the_transport() {
        let p = printer(OutputFormat::Plain);
        let push = ConnectionState {
            reachable: true,
            mode: TransportMode::Push,
        };
        let offline = ConnectionState::default();
        assert_eq!(
            p.human(&WatchLine::Connection { state: &push }),
            "link     live (push)"
        );
        assert_eq!(
            p.human(&WatchLine::Connection { state: &offline }),
            "link     offline"
        );
    }

    #[test]
    fn errors_are_shown_next_to_the_last_good_value() {
        let p = printer(OutputFormat::Plain);
        let snapshot = DomainSnapshot {
            value: Some(NetworkState {
                eth_up: true,
                eth_ip: Some("10.0.0.5".into()),
                ..NetworkState::default()
            }),
            last_updated_at: None,
            error: Some("timed out".into()),
        };
        let line = p.human(&WatchLine::Network {
            snapshot: &snapshot,
        });
        assert_eq!(line, "network  eth up 10.0.0.5  wifi down -  error: timed out");
    }

    #[test]
    fn json_lines_are_tagged() {
        let event = DeviceEvent {
            code: "dmx.overrun".into(),
            level: EventLevel::Warn,
            received_at: Utc::now(),
        };
        let json = output::render_json(&WatchLine::Event { event: &event }, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["kind"], "event");
        assert_eq!(value["event"]["code"], "dmx.overrun");
        assert_eq!(value["event"]["level"], "warn");
    }
}
