// ── Push transport manager ──
//
// Owns at most one live status session. A session run loops
//
//   Connecting -> Open -> Idle -> (backoff) -> Connecting ...
//   Connecting -> Idle -> (backoff) -> Connecting ...
//
// until it is cancelled. Frames and lifecycle changes go upward on an
// mpsc channel tagged with the run id, so the controller can ignore
// stragglers from a run that has since been replaced.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::future::BoxFuture;
use secrecy::ExposeSecret;
use serde::Serialize;
use strum::Display;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use dmxnode_api::{DeviceClient, FrameStream, websocket};

use crate::config::ReconnectConfig;
use crate::monitor::ConnectionState;

// ── Connector seam ───────────────────────────────────────────────────

/// Opens one status session.
pub trait PushConnector: Send + Sync + 'static {
    fn connect(&self) -> BoxFuture<'static, Result<FrameStream, dmxnode_api::Error>>;
}

/// The real connector: `/ws/status` on the client's device.
pub struct WebSocketConnector {
    client: DeviceClient,
}

impl WebSocketConnector {
    pub fn new(client: DeviceClient) -> Self {
        Self { client }
    }
}

impl PushConnector for WebSocketConnector {
    fn connect(&self) -> BoxFuture<'static, Result<FrameStream, dmxnode_api::Error>> {
        let url = self.client.endpoint().ws_url().clone();
        let timeout = self.client.request_timeout();
        let token = self.client.bearer_token();
        Box::pin(async move {
            let bearer = token.as_ref().map(ExposeSecret::expose_secret);
            websocket::connect(&url, timeout, bearer).await
        })
    }
}

// ── Backoff ──────────────────────────────────────────────────────────

/// Reconnect delay tracker.
///
/// [`advance`](Self::advance) hands out the current delay and then grows
/// it, so after `n` consecutive failures `current()` is
/// `min(initial * multiplier^n, max)`.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: ReconnectConfig,
    current: Duration,
}

impl Backoff {
    pub fn new(config: ReconnectConfig) -> Self {
        let current = config.initial_delay;
        Self { config, current }
    }

    pub fn current(&self) -> Duration {
        self.current
    }

    /// Delay to wait before the next attempt; grows the one after it.
    pub fn advance(&mut self) -> Duration {
        let delay = self.current;
        let grown = Duration::from_secs_f64(delay.as_secs_f64() * self.config.multiplier);
        self.current = grown.min(self.config.max_delay);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.config.initial_delay;
    }
}

// ── Session state and events ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PushState {
    #[default]
    Idle,
    Connecting,
    Open,
    Closing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEvent {
    Connected { run: u64 },
    Disconnected { run: u64 },
    Frame { run: u64, text: String },
}

// ── Manager ──────────────────────────────────────────────────────────

struct Session {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

struct PushInner {
    connector: Arc<dyn PushConnector>,
    enabled: bool,
    backoff: Mutex<Backoff>,
    state: watch::Sender<PushState>,
    events: mpsc::Sender<PushEvent>,
    connection: watch::Receiver<ConnectionState>,
    session: Mutex<Option<Session>>,
    run: AtomicU64,
    cancel: CancellationToken,
}

/// Handle to the push transport. Cheap to clone.
#[derive(Clone)]
pub struct PushManager {
    inner: Arc<PushInner>,
}

impl PushManager {
    /// `connection` gates [`connect`](Self::connect) on reachability;
    /// `cancel` is the parent token every session derives from.
    pub fn new(
        connector: Arc<dyn PushConnector>,
        reconnect: ReconnectConfig,
        enabled: bool,
        connection: watch::Receiver<ConnectionState>,
        events: mpsc::Sender<PushEvent>,
        cancel: CancellationToken,
    ) -> Self {
        let (state, _) = watch::channel(PushState::Idle);
        Self {
            inner: Arc::new(PushInner {
                connector,
                enabled,
                backoff: Mutex::new(Backoff::new(reconnect)),
                state,
                events,
                connection,
                session: Mutex::new(None),
                run: AtomicU64::new(0),
                cancel,
            }),
        }
    }

    pub fn state(&self) -> PushState {
        *self.inner.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<PushState> {
        self.inner.state.subscribe()
    }

    /// Id of the run whose events are current. Bumped by every
    /// `connect()` and `disconnect()`.
    pub fn current_run(&self) -> u64 {
        self.inner.run.load(Ordering::SeqCst)
    }

    pub async fn current_delay(&self) -> Duration {
        self.inner.backoff.lock().await.current()
    }

    /// Start a session run. No-op when disabled, unreachable, or a run
    /// is already live (connecting, open, or waiting to retry).
    /// Returns `true` if a run was started.
    pub async fn connect(&self) -> bool {
        if !self.inner.enabled {
            debug!("push disabled, not connecting");
            return false;
        }
        if !self.inner.connection.borrow().reachable {
            debug!("device unreachable, not connecting");
            return false;
        }

        let mut session = self.inner.session.lock().await;
        if session.as_ref().is_some_and(|s| !s.handle.is_finished()) {
            return false;
        }

        let run = self.inner.run.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = self.inner.cancel.child_token();
        let handle = tokio::spawn(run_session(
            Arc::clone(&self.inner),
            run,
            cancel.clone(),
        ));
        *session = Some(Session { cancel, handle });
        true
    }

    /// Cancel any pending retry and close the live session. Idempotent.
    /// Returns `true` if a run was stopped.
    pub async fn disconnect(&self) -> bool {
        let Some(session) = self.inner.session.lock().await.take() else {
            return false;
        };
        self.inner.run.fetch_add(1, Ordering::SeqCst);
        session.cancel.cancel();
        if let Err(e) = session.handle.await {
            warn!(error = %e, "push session task failed");
        }
        self.inner.state.send_replace(PushState::Idle);
        true
    }

    /// Drop the current session, reset the backoff and start over.
    pub async fn reconnect(&self) -> bool {
        self.disconnect().await;
        self.inner.backoff.lock().await.reset();
        self.connect().await
    }
}

async fn run_session(inner: Arc<PushInner>, run: u64, cancel: CancellationToken) {
    let mut attempt: u32 = 0;
    loop {
        attempt = attempt.saturating_add(1);
        inner.state.send_replace(PushState::Connecting);
        debug!(run, attempt, "opening status session");

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                inner.state.send_replace(PushState::Idle);
                return;
            }
            result = inner.connector.connect() => result,
        };

        match result {
            Ok(mut frames) => {
                attempt = 0;
                inner.backoff.lock().await.reset();
                inner.state.send_replace(PushState::Open);
                info!(run, "push session open");
                if inner.events.send(PushEvent::Connected { run }).await.is_err() {
                    return;
                }

                let closed_locally = loop {
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => break true,
                        frame = frames.next() => match frame {
                            Some(Ok(text)) => {
                                if inner.events.send(PushEvent::Frame { run, text }).await.is_err() {
                                    return;
                                }
                            }
                            Some(Err(e)) => {
                                warn!(run, error = %e, "push session dropped");
                                break false;
                            }
                            None => {
                                info!(run, "push session closed by device");
                                break false;
                            }
                        },
                    }
                };

                if closed_locally {
                    inner.state.send_replace(PushState::Closing);
                    drop(frames);
                    inner.state.send_replace(PushState::Idle);
                    // The consumer may already be gone during shutdown.
                    let _ = inner.events.try_send(PushEvent::Disconnected { run });
                    return;
                }
                inner.state.send_replace(PushState::Idle);
            }
            Err(e) => {
                inner.state.send_replace(PushState::Idle);
                warn!(run, attempt, error = %e, "push connect failed");
            }
        }

        if inner.events.send(PushEvent::Disconnected { run }).await.is_err() {
            return;
        }

        let delay = inner.backoff.lock().await.advance();
        debug!(
            run,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "scheduling push reconnect"
        );
        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            () = tokio::time::sleep(delay) => {}
        }
    }
}
