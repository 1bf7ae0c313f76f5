#![allow(clippy::unwrap_used)]
// End-to-end sync scenarios on tokio's paused clock, with a scripted
// push connector and poll source standing in for the device.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use pretty_assertions::assert_eq;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_stream::wrappers::ReceiverStream;

use dmxnode_api::models::DmxPortStatus;
use dmxnode_api::{DeviceClient, DeviceEndpoint, FrameStream, MemoryTokenStore};
use dmxnode_core::{
    Controller, ControllerConfig, CoreError, Domain, DomainUpdate, EventLevel, NetworkState,
    PollSource, PortEdit, PushConnector, PushState, SystemTelemetry, TransportMode,
};

// ── Fakes ───────────────────────────────────────────────────────────

type FrameSender = mpsc::Sender<Result<String, dmxnode_api::Error>>;

/// Push connector that fails unless an open session has been queued.
/// With `stall` set, a failing attempt first hangs for that long.
#[derive(Default)]
struct ScriptedPush {
    sessions: Mutex<VecDeque<mpsc::Receiver<Result<String, dmxnode_api::Error>>>>,
    attempts: Mutex<Vec<Instant>>,
    stall: Mutex<Option<Duration>>,
}

impl ScriptedPush {
    fn queue_session(&self) -> FrameSender {
        let (tx, rx) = mpsc::channel(16);
        self.sessions.lock().unwrap().push_back(rx);
        tx
    }

    fn attempts(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }

    fn attempt_times_ms(&self, start: Instant) -> Vec<u128> {
        self.attempts
            .lock()
            .unwrap()
            .iter()
            .map(|t| (*t - start).as_millis())
            .collect()
    }
}

impl PushConnector for ScriptedPush {
    fn connect(&self) -> BoxFuture<'static, Result<FrameStream, dmxnode_api::Error>> {
        self.attempts.lock().unwrap().push(Instant::now());
        let next = self.sessions.lock().unwrap().pop_front();
        let stall = *self.stall.lock().unwrap();
        Box::pin(async move {
            match next {
                Some(rx) => {
                    let stream: FrameStream = Box::pin(ReceiverStream::new(rx));
                    Ok(stream)
                }
                None => {
                    if let Some(stall) = stall {
                        tokio::time::sleep(stall).await;
                    }
                    Err(dmxnode_api::Error::WebSocketConnect(
                        "connection refused".into(),
                    ))
                }
            }
        })
    }
}

/// Poll source answering instantly and recording when each domain was hit.
/// Fetches for `failing` always error.
#[derive(Default)]
struct RecordingSource {
    calls: Mutex<HashMap<Domain, Vec<Instant>>>,
    failing: Option<Domain>,
}

impl RecordingSource {
    fn count(&self, domain: Domain) -> usize {
        self.calls.lock().unwrap().get(&domain).map_or(0, Vec::len)
    }

    fn total(&self) -> usize {
        self.calls.lock().unwrap().values().map(Vec::len).sum()
    }

    fn times_ms(&self, domain: Domain, start: Instant) -> Vec<u128> {
        self.calls
            .lock()
            .unwrap()
            .get(&domain)
            .map(|v| v.iter().map(|t| (*t - start).as_millis()).collect())
            .unwrap_or_default()
    }
}

impl PollSource for RecordingSource {
    fn fetch(&self, domain: Domain) -> BoxFuture<'static, Result<DomainUpdate, CoreError>> {
        self.calls
            .lock()
            .unwrap()
            .entry(domain)
            .or_default()
            .push(Instant::now());
        let fails = self.failing == Some(domain);
        Box::pin(async move {
            if fails {
                return Err(CoreError::Timeout { timeout_ms: 5_000 });
            }
            Ok(match domain {
                Domain::System => DomainUpdate::System(SystemTelemetry {
                    uptime: Some(1),
                    ..SystemTelemetry::default()
                }),
                Domain::DmxPorts => DomainUpdate::DmxPorts(vec![DmxPortStatus {
                    port: 0,
                    universe: Some(1),
                    enabled: Some(true),
                    ..DmxPortStatus::default()
                }]),
                Domain::Network => DomainUpdate::Network(NetworkState {
                    eth_up: true,
                    ..NetworkState::default()
                }),
            })
        })
    }
}

fn controller(push: &Arc<ScriptedPush>, source: &Arc<RecordingSource>) -> Controller {
    let endpoint = DeviceEndpoint::parse("192.0.2.10").unwrap();
    let client = DeviceClient::with_client(
        reqwest::Client::new(),
        endpoint.clone(),
        Arc::new(MemoryTokenStore::new()),
    )
    .unwrap();
    Controller::with_parts(
        ControllerConfig::new(endpoint),
        client,
        Arc::clone(push) as Arc<dyn PushConnector>,
        Arc::clone(source) as Arc<dyn PollSource>,
    )
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

const SNAPSHOT: &str = r#"{"type":"SNAPSHOT","payload":{"uptime":120,"cpu_load":8.5,"dmx":[{"port":0,"universe":1,"enabled":true,"fps":30}]}}"#;

// ── Scenarios ───────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn push_available_snapshot_then_delta() {
    let push = Arc::new(ScriptedPush::default());
    let frames = push.queue_session();
    let source = Arc::new(RecordingSource::default());
    let ctrl = controller(&push, &source);

    ctrl.start().await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(ctrl.connection_state().mode, TransportMode::Push);
    assert_eq!(ctrl.push_state(), PushState::Open);

    frames.send(Ok(SNAPSHOT.into())).await.unwrap();
    settle().await;
    let table = ctrl.stores().dmx.value().unwrap();
    assert_eq!(table.len(), 1);
    let port = table.get(0).unwrap();
    assert_eq!((port.universe, port.enabled, port.fps), (1, true, Some(30.0)));
    assert_eq!(ctrl.stores().system.value().unwrap().uptime, Some(120));

    frames
        .send(Ok(r#"{"type":"dmx.port_status","ts":5,"data":{"port":0,"fps":45}}"#.into()))
        .await
        .unwrap();
    settle().await;
    let port = ctrl.stores().dmx.value().unwrap().get(0).cloned().unwrap();
    assert_eq!((port.universe, port.enabled, port.fps), (1, true, Some(45.0)));

    assert_eq!(source.total(), 0, "no poll while push is open");
    ctrl.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn push_unavailable_dmx_polls_every_500ms() {
    let push = Arc::new(ScriptedPush::default());
    let source = Arc::new(RecordingSource::default());
    let ctrl = controller(&push, &source);
    let start = Instant::now();

    ctrl.start().await;
    tokio::time::sleep(Duration::from_millis(2_700)).await;

    // Debounce, then 1000 ms and 1500 ms backoff.
    assert_eq!(push.attempt_times_ms(start), vec![100, 1_100, 2_600]);
    assert_eq!(
        source.times_ms(Domain::DmxPorts, start),
        vec![100, 600, 1_100, 1_600, 2_100, 2_600]
    );
    assert_eq!(ctrl.connection_state().mode, TransportMode::Polling);
    assert!(ctrl.stores().dmx.get().is_loaded());
    ctrl.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn system_failures_do_not_delay_dmx_polls() {
    let push = Arc::new(ScriptedPush::default());
    let source = Arc::new(RecordingSource {
        failing: Some(Domain::System),
        ..RecordingSource::default()
    });
    let ctrl = controller(&push, &source);
    let start = Instant::now();

    ctrl.start().await;
    tokio::time::sleep(Duration::from_millis(2_700)).await;

    assert_eq!(
        source.times_ms(Domain::DmxPorts, start),
        vec![100, 600, 1_100, 1_600, 2_100, 2_600]
    );
    assert!(source.count(Domain::System) >= 1);
    let system = ctrl.stores().system.get();
    assert!(system.value.is_none());
    assert!(system.error.is_some());
    assert!(ctrl.stores().dmx.get().is_loaded());
    assert!(ctrl.stores().dmx.get().error.is_none());
    ctrl.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn reconnect_resumes_polling_while_the_new_session_is_pending() {
    let push = Arc::new(ScriptedPush::default());
    let _frames = push.queue_session();
    let source = Arc::new(RecordingSource::default());
    let ctrl = controller(&push, &source);

    ctrl.start().await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(ctrl.connection_state().mode, TransportMode::Push);
    assert_eq!(source.total(), 0);

    *push.stall.lock().unwrap() = Some(Duration::from_secs(4));
    assert!(ctrl.reconnect_push().await);
    settle().await;
    assert_eq!(ctrl.connection_state().mode, TransportMode::Polling);
    assert_eq!(ctrl.push_state(), PushState::Connecting);
    assert_eq!(source.count(Domain::System), 1);
    assert_eq!(source.count(Domain::DmxPorts), 1);
    assert_eq!(source.count(Domain::Network), 1);

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(ctrl.push_state(), PushState::Connecting, "handshake still pending");
    assert!(source.count(Domain::DmxPorts) >= 6);
    ctrl.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn offline_suspends_everything_and_online_tries_push_first() {
    let push = Arc::new(ScriptedPush::default());
    let source = Arc::new(RecordingSource::default());
    let ctrl = controller(&push, &source);

    ctrl.start().await;
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert_eq!(ctrl.connection_state().mode, TransportMode::Polling);

    ctrl.set_reachable(false);
    settle().await;
    assert_eq!(ctrl.connection_state().mode, TransportMode::Disconnected);
    let attempts = push.attempts();
    let polls = source.total();

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(push.attempts(), attempts, "no reconnect while offline");
    assert_eq!(source.total(), polls, "no poll while offline");

    let frames = push.queue_session();
    ctrl.set_reachable(true);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(ctrl.connection_state().mode, TransportMode::Connecting);
    assert_eq!(push.attempts(), attempts, "attempt waits for the debounce");

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(push.attempts(), attempts + 1);
    assert_eq!(ctrl.connection_state().mode, TransportMode::Push);
    assert_eq!(source.total(), polls, "push came up, polling never engaged");

    // Device closes the session: every domain polls at once.
    drop(frames);
    settle().await;
    assert_eq!(ctrl.connection_state().mode, TransportMode::Polling);
    assert_eq!(source.total(), polls + 3);
    ctrl.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn flap_inside_debounce_cancels_the_attempt() {
    let push = Arc::new(ScriptedPush::default());
    let source = Arc::new(RecordingSource::default());
    let ctrl = controller(&push, &source);

    ctrl.set_reachable(false);
    ctrl.start().await;
    settle().await;

    ctrl.set_reachable(true);
    tokio::time::sleep(Duration::from_millis(40)).await;
    ctrl.set_reachable(false);
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(push.attempts(), 0);
    assert_eq!(source.total(), 0);
    ctrl.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn dirty_port_keeps_local_values_until_discarded() {
    let push = Arc::new(ScriptedPush::default());
    let frames = push.queue_session();
    let source = Arc::new(RecordingSource::default());
    let ctrl = controller(&push, &source);

    ctrl.start().await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    frames.send(Ok(SNAPSHOT.into())).await.unwrap();
    settle().await;

    ctrl.begin_edit(0).unwrap();
    ctrl.edit_port(
        0,
        &PortEdit {
            universe: Some(7),
            enabled: Some(false),
            ..PortEdit::default()
        },
    )
    .unwrap();
    assert!(ctrl.is_dirty(0));

    let update = r#"{"type":"SNAPSHOT","payload":{"dmx":[{"port":0,"universe":1,"enabled":true,"fps":50,"activity_counter":9}]}}"#;
    frames.send(Ok(update.into())).await.unwrap();
    settle().await;
    let port = ctrl.stores().dmx.value().unwrap().get(0).cloned().unwrap();
    assert_eq!((port.universe, port.enabled), (7, false));
    assert_eq!((port.fps, port.activity_counter), (Some(50.0), Some(9)));

    ctrl.discard_edit(0).unwrap();
    frames.send(Ok(update.into())).await.unwrap();
    settle().await;
    let port = ctrl.stores().dmx.value().unwrap().get(0).cloned().unwrap();
    assert_eq!((port.universe, port.enabled), (1, true));
    ctrl.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn malformed_frames_are_dropped_and_events_broadcast() {
    let push = Arc::new(ScriptedPush::default());
    let frames = push.queue_session();
    let source = Arc::new(RecordingSource::default());
    let ctrl = controller(&push, &source);
    let mut events = ctrl.events();

    ctrl.start().await;
    tokio::time::sleep(Duration::from_millis(150)).await;

    frames.send(Ok("{not json".into())).await.unwrap();
    frames.send(Ok(r#"{"type":"mystery"}"#.into())).await.unwrap();
    frames
        .send(Ok(r#"{"type":"system.event","data":{"code":"DMX_OVERRUN","level":"warn"}}"#.into()))
        .await
        .unwrap();
    settle().await;

    let event = events.try_recv().unwrap();
    assert_eq!(event.code, "DMX_OVERRUN");
    assert_eq!(event.level, EventLevel::Warn);
    assert_eq!(ctrl.connection_state().mode, TransportMode::Push, "session survives bad frames");
    ctrl.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn push_disabled_polls_directly() {
    let push = Arc::new(ScriptedPush::default());
    let source = Arc::new(RecordingSource::default());
    let endpoint = DeviceEndpoint::parse("192.0.2.10").unwrap();
    let client = DeviceClient::with_client(
        reqwest::Client::new(),
        endpoint.clone(),
        Arc::new(MemoryTokenStore::new()),
    )
    .unwrap();
    let mut config = ControllerConfig::new(endpoint);
    config.sync.push_enabled = false;
    let ctrl = Controller::with_parts(
        config,
        client,
        Arc::clone(&push) as Arc<dyn PushConnector>,
        Arc::clone(&source) as Arc<dyn PollSource>,
    );

    ctrl.start().await;
    settle().await;
    assert_eq!(ctrl.connection_state().mode, TransportMode::Polling);
    assert_eq!(source.count(Domain::System), 1);
    assert_eq!(source.count(Domain::DmxPorts), 1);
    assert_eq!(source.count(Domain::Network), 1);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(push.attempts(), 0);
    ctrl.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_every_timer() {
    let push = Arc::new(ScriptedPush::default());
    let source = Arc::new(RecordingSource::default());
    let ctrl = controller(&push, &source);

    ctrl.start().await;
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    ctrl.shutdown().await;

    let attempts = push.attempts();
    let polls = source.total();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(push.attempts(), attempts);
    assert_eq!(source.total(), polls);
    assert_eq!(ctrl.push_state(), PushState::Idle);
}

#[tokio::test(start_paused = true)]
async fn refresh_records_errors_on_the_snapshot() {
    struct Failing;
    impl PollSource for Failing {
        fn fetch(&self, _: Domain) -> BoxFuture<'static, Result<DomainUpdate, CoreError>> {
            Box::pin(async {
                Err(CoreError::ConnectionFailed {
                    reason: "refused".into(),
                })
            })
        }
    }

    let endpoint = DeviceEndpoint::parse("192.0.2.10").unwrap();
    let client = DeviceClient::with_client(
        reqwest::Client::new(),
        endpoint.clone(),
        Arc::new(MemoryTokenStore::new()),
    )
    .unwrap();
    let ctrl = Controller::with_parts(
        ControllerConfig::new(endpoint),
        client,
        Arc::new(ScriptedPush::default()),
        Arc::new(Failing),
    );

    let err = ctrl.refresh(Domain::Network).await.unwrap_err();
    assert!(matches!(err, CoreError::ConnectionFailed { .. }));
    let snap = ctrl.stores().network.get();
    assert!(snap.value.is_none());
    assert!(snap.error.unwrap().contains("refused"));
}
