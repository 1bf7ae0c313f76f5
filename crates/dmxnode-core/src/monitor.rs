// ── Connection monitor ──
//
// Reachability plus transport mode, published on a `watch` channel.
// The poll tasks and the CLI both observe it; the controller drives it.

use serde::Serialize;
use strum::Display;
use tokio::sync::watch;
use tracing::info;

/// How device state is currently arriving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransportMode {
    /// Device unreachable; nothing runs.
    #[default]
    Disconnected,
    /// Reachable, first push attempt pending.
    Connecting,
    /// Push session open; polling suppressed.
    Push,
    /// Reachable without a push session.
    Polling,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionState {
    pub reachable: bool,
    pub mode: TransportMode,
}

impl ConnectionState {
    /// Poll tasks run only in this state.
    pub fn polls_active(&self) -> bool {
        self.reachable && self.mode == TransportMode::Polling
    }
}

/// Inputs that move the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorInput {
    Reachable(bool),
    PushOpened,
    /// A push attempt failed, an open session dropped or was closed locally.
    PushLost,
}

/// Pure transition function.
pub fn transition(
    current: ConnectionState,
    input: MonitorInput,
    push_enabled: bool,
) -> ConnectionState {
    match input {
        MonitorInput::Reachable(false) => ConnectionState {
            reachable: false,
            mode: TransportMode::Disconnected,
        },
        MonitorInput::Reachable(true) if current.reachable => current,
        MonitorInput::Reachable(true) => ConnectionState {
            reachable: true,
            mode: if push_enabled {
                TransportMode::Connecting
            } else {
                TransportMode::Polling
            },
        },
        MonitorInput::PushOpened if current.reachable => ConnectionState {
            reachable: true,
            mode: TransportMode::Push,
        },
        MonitorInput::PushLost if current.reachable => ConnectionState {
            reachable: true,
            mode: TransportMode::Polling,
        },
        MonitorInput::PushOpened | MonitorInput::PushLost => current,
    }
}

pub struct ConnectionMonitor {
    tx: watch::Sender<ConnectionState>,
    push_enabled: bool,
}

impl ConnectionMonitor {
    pub fn new(push_enabled: bool) -> Self {
        let (tx, _) = watch::channel(ConnectionState::default());
        Self { tx, push_enabled }
    }

    pub fn state(&self) -> ConnectionState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.tx.subscribe()
    }

    /// Feed one input. Returns `true` if the state changed.
    pub fn apply(&self, input: MonitorInput) -> bool {
        let push_enabled = self.push_enabled;
        self.tx.send_if_modified(|state| {
            let next = transition(*state, input, push_enabled);
            if next == *state {
                return false;
            }
            info!(
                from = %state.mode,
                to = %next.mode,
                reachable = next.reachable,
                "transport mode changed"
            );
            *state = next;
            true
        })
    }
}
