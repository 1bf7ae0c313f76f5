// ── Controller ──
//
// The one context object for a device. Owns the domain stores, the
// connection monitor, the push manager and the per-domain poll tasks,
// and wires them together:
//
//   reachability ──> monitor ──> push manager ──> push events ──> stores
//                          └───> poll tasks ───────────────────> stores

use std::pin::Pin;
use std::sync::Arc;

use strum::IntoEnumIterator;
use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use dmxnode_api::{DeviceClient, TokenStore};

use crate::config::ControllerConfig;
use crate::error::CoreError;
use crate::model::{DeviceEvent, Domain, NetworkState, SystemTelemetry};
use crate::monitor::{ConnectionMonitor, ConnectionState, MonitorInput};
use crate::normalize::WireMessage;
use crate::poll::{PollSource, PollTask, RestPollSource, sleep_opt};
use crate::push::{PushConnector, PushEvent, PushManager, PushState, WebSocketConnector};
use crate::store::{DmxTable, DomainStores, DomainUpdate};
use crate::stream::SnapshotStream;

const PUSH_EVENT_CHANNEL_SIZE: usize = 256;
const DEVICE_EVENT_CHANNEL_SIZE: usize = 64;

/// Handle to the sync layer for one device.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Nothing runs until
/// [`start()`](Self::start); [`shutdown()`](Self::shutdown) stops every
/// background task.
#[derive(Clone)]
pub struct Controller {
    pub(crate) inner: Arc<ControllerInner>,
}

pub(crate) struct ControllerInner {
    pub(crate) config: ControllerConfig,
    pub(crate) client: DeviceClient,
    pub(crate) stores: Arc<DomainStores>,
    monitor: Arc<ConnectionMonitor>,
    push: PushManager,
    pub(crate) source: Arc<dyn PollSource>,
    events: broadcast::Sender<DeviceEvent>,
    reachable: watch::Sender<bool>,
    push_events: Mutex<Option<mpsc::Receiver<PushEvent>>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Controller {
    /// Build a controller talking to the configured device over REST and
    /// the status socket. The bearer token is seeded from `token_store`.
    pub fn new(config: ControllerConfig, token_store: Arc<dyn TokenStore>) -> Result<Self, CoreError> {
        let client = DeviceClient::new(config.endpoint.clone(), &config.transport(), token_store)?;
        let connector = Arc::new(WebSocketConnector::new(client.clone()));
        let source = Arc::new(RestPollSource::new(client.clone()));
        Ok(Self::with_parts(config, client, connector, source))
    }

    /// Build a controller from explicit collaborators.
    pub fn with_parts(
        config: ControllerConfig,
        client: DeviceClient,
        connector: Arc<dyn PushConnector>,
        source: Arc<dyn PollSource>,
    ) -> Self {
        let push_enabled = config.sync.push_enabled;
        let monitor = Arc::new(ConnectionMonitor::new(push_enabled));
        let cancel = CancellationToken::new();
        let (push_tx, push_rx) = mpsc::channel(PUSH_EVENT_CHANNEL_SIZE);
        let push = PushManager::new(
            connector,
            config.sync.reconnect.clone(),
            push_enabled,
            monitor.subscribe(),
            push_tx,
            cancel.child_token(),
        );
        let (events, _) = broadcast::channel(DEVICE_EVENT_CHANNEL_SIZE);
        let (reachable, _) = watch::channel(true);

        Self {
            inner: Arc::new(ControllerInner {
                config,
                client,
                stores: Arc::new(DomainStores::new()),
                monitor,
                push,
                source,
                events,
                reachable,
                push_events: Mutex::new(Some(push_rx)),
                cancel,
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &DeviceClient {
        &self.inner.client
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Spawn the background tasks. A second call is a no-op.
    pub async fn start(&self) {
        let Some(push_rx) = self.inner.push_events.lock().await.take() else {
            debug!("controller already started");
            return;
        };
        let cancel = &self.inner.cancel;
        let mut handles = self.inner.task_handles.lock().await;

        handles.push(tokio::spawn(push_event_task(
            self.clone(),
            push_rx,
            cancel.child_token(),
        )));
        handles.push(tokio::spawn(reachability_task(
            self.clone(),
            self.inner.reachable.subscribe(),
            cancel.child_token(),
        )));

        let sync = &self.inner.config.sync;
        for domain in Domain::iter() {
            let task = PollTask::new(
                domain,
                sync.poll.clone(),
                sync.request_timeout,
                Arc::clone(&self.inner.source),
                Arc::clone(&self.inner.stores),
                self.inner.monitor.subscribe(),
            );
            handles.push(tokio::spawn(task.run(cancel.child_token())));
        }

        info!(
            device = %self.inner.config.endpoint.base_url(),
            push = sync.push_enabled,
            "sync started"
        );
    }

    /// Stop every background task and close the push session.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        self.inner.push.disconnect().await;

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "background task failed");
            }
        }
        info!("sync stopped");
    }

    /// Report platform connectivity. Going offline tears down push and
    /// pauses polling at once; coming online starts a push attempt after
    /// the debounce window.
    pub fn set_reachable(&self, reachable: bool) {
        self.inner.reachable.send_if_modified(|current| {
            if *current == reachable {
                return false;
            }
            *current = reachable;
            true
        });
    }

    /// Drop the live push session and open a fresh one with the backoff
    /// reset. Leaving `Push` resumes polling until the new session opens.
    pub async fn reconnect_push(&self) -> bool {
        self.inner.monitor.apply(MonitorInput::PushLost);
        self.inner.push.reconnect().await
    }

    // ── Observation ──────────────────────────────────────────────────

    pub fn stores(&self) -> &Arc<DomainStores> {
        &self.inner.stores
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.inner.monitor.state()
    }

    pub fn subscribe_connection(&self) -> watch::Receiver<ConnectionState> {
        self.inner.monitor.subscribe()
    }

    pub fn push_state(&self) -> PushState {
        self.inner.push.state()
    }

    pub fn subscribe_push_state(&self) -> watch::Receiver<PushState> {
        self.inner.push.subscribe_state()
    }

    /// Device notifications (`system.event`). Not stored; late
    /// subscribers miss earlier events.
    pub fn events(&self) -> broadcast::Receiver<DeviceEvent> {
        self.inner.events.subscribe()
    }

    pub fn system(&self) -> SnapshotStream<SystemTelemetry> {
        self.inner.stores.system.subscribe()
    }

    pub fn dmx_ports(&self) -> SnapshotStream<DmxTable> {
        self.inner.stores.dmx.subscribe()
    }

    pub fn network(&self) -> SnapshotStream<NetworkState> {
        self.inner.stores.network.subscribe()
    }

    /// Route one canonical update: events are broadcast, the rest stored.
    pub(crate) fn apply_update(&self, update: DomainUpdate) {
        match update {
            DomainUpdate::Event(event) => {
                debug!(code = %event.code, level = %event.level, "device event");
                // No subscribers is fine.
                let _ = self.inner.events.send(event);
            }
            other => {
                self.inner.stores.apply(other);
            }
        }
    }

    fn handle_frame(&self, text: &str) {
        match WireMessage::decode(text) {
            Ok(message) => {
                for update in message.into_updates() {
                    self.apply_update(update);
                }
            }
            Err(e) => warn!(error = %e, "dropping push frame"),
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Consume push lifecycle and frames. Events from a superseded run are
/// dropped; a locally closed session is accounted for by whoever closed it.
async fn push_event_task(
    controller: Controller,
    mut rx: mpsc::Receiver<PushEvent>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            event = rx.recv() => match event {
                Some(event) => event,
                None => return,
            },
        };

        let current = controller.inner.push.current_run();
        match event {
            PushEvent::Connected { run } if run == current => {
                controller.inner.monitor.apply(MonitorInput::PushOpened);
            }
            PushEvent::Disconnected { run } if run == current => {
                controller.inner.monitor.apply(MonitorInput::PushLost);
            }
            PushEvent::Frame { run, text } if run == current => {
                debug!(run, len = text.len(), "push frame");
                controller.handle_frame(&text);
            }
            PushEvent::Connected { run }
            | PushEvent::Disconnected { run }
            | PushEvent::Frame { run, .. } => {
                debug!(run, current, "ignoring event from superseded push run");
            }
        }
    }
}

/// Drive the monitor from reachability reports and debounce push attempts.
async fn reachability_task(
    controller: Controller,
    mut rx: watch::Receiver<bool>,
    cancel: CancellationToken,
) {
    let inner = &controller.inner;
    let push_enabled = inner.config.sync.push_enabled;
    let debounce_for = inner.config.sync.reachability_debounce;
    let mut debounce: Option<Pin<Box<Sleep>>> = None;

    let mut reachable = *rx.borrow_and_update();
    loop {
        if reachable {
            if inner.monitor.apply(MonitorInput::Reachable(true)) && push_enabled {
                debounce = Some(Box::pin(tokio::time::sleep(debounce_for)));
            }
        } else {
            debounce = None;
            inner.monitor.apply(MonitorInput::Reachable(false));
            inner.push.disconnect().await;
        }

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                changed = rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    reachable = *rx.borrow_and_update();
                    break;
                }
                () = sleep_opt(&mut debounce) => {
                    debounce = None;
                    inner.push.connect().await;
                }
            }
        }
    }
}
