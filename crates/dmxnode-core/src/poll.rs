// ── Poll scheduler ──
//
// One task per domain. A task sleeps until the connection monitor says
// `Polling`, then fetches immediately and on every interval tick. A
// failed fetch schedules one extra retry on a doubling, capped delay.
// Every dispatch carries a generation; a result older than the newest
// applied one is dropped. Leaving `Polling` aborts in-flight fetches.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tokio::time::{MissedTickBehavior, Sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use dmxnode_api::DeviceClient;

use crate::config::PollConfig;
use crate::error::CoreError;
use crate::model::Domain;
use crate::monitor::ConnectionState;
use crate::store::{DomainStores, DomainUpdate};

// ── Source seam ──────────────────────────────────────────────────────

/// Fetches the full current state of one domain.
pub trait PollSource: Send + Sync + 'static {
    fn fetch(&self, domain: Domain) -> BoxFuture<'static, Result<DomainUpdate, CoreError>>;
}

/// The real source: the device REST API.
pub struct RestPollSource {
    client: DeviceClient,
}

impl RestPollSource {
    pub fn new(client: DeviceClient) -> Self {
        Self { client }
    }
}

impl PollSource for RestPollSource {
    fn fetch(&self, domain: Domain) -> BoxFuture<'static, Result<DomainUpdate, CoreError>> {
        let client = self.client.clone();
        Box::pin(async move {
            let update = match domain {
                Domain::System => DomainUpdate::System(client.system_info().await?.into()),
                Domain::DmxPorts => DomainUpdate::DmxPorts(client.dmx_status().await?),
                Domain::Network => DomainUpdate::Network(client.network_status().await?),
            };
            Ok(update)
        })
    }
}

// ── Task ─────────────────────────────────────────────────────────────

type FetchOutcome = (u64, Result<Result<DomainUpdate, CoreError>, tokio::time::error::Elapsed>);

pub(crate) struct PollTask {
    domain: Domain,
    interval: Duration,
    poll: PollConfig,
    timeout: Duration,
    source: Arc<dyn PollSource>,
    stores: Arc<DomainStores>,
    connection: watch::Receiver<ConnectionState>,
    retry_count: u32,
    generation: u64,
    applied: u64,
}

impl PollTask {
    pub(crate) fn new(
        domain: Domain,
        poll: PollConfig,
        timeout: Duration,
        source: Arc<dyn PollSource>,
        stores: Arc<DomainStores>,
        connection: watch::Receiver<ConnectionState>,
    ) -> Self {
        Self {
            domain,
            interval: poll.interval(domain),
            poll,
            timeout,
            source,
            stores,
            connection,
            retry_count: 0,
            generation: 0,
            applied: 0,
        }
    }

    pub(crate) async fn run(mut self, cancel: CancellationToken) {
        loop {
            while !self.connection.borrow_and_update().polls_active() {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return,
                    changed = self.connection.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                }
            }

            debug!(domain = %self.domain, "polling resumed");
            if !self.run_active(&cancel).await {
                return;
            }
            debug!(domain = %self.domain, "polling suspended");
        }
    }

    /// Poll until suspended (`true`) or shut down (`false`).
    async fn run_active(&mut self, cancel: &CancellationToken) -> bool {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut retry: Option<Pin<Box<Sleep>>> = None;
        let mut in_flight: JoinSet<FetchOutcome> = JoinSet::new();

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    in_flight.abort_all();
                    return false;
                }
                changed = self.connection.changed() => {
                    if changed.is_err() {
                        in_flight.abort_all();
                        return false;
                    }
                    if !self.connection.borrow_and_update().polls_active() {
                        in_flight.abort_all();
                        return true;
                    }
                }
                Some(joined) = in_flight.join_next() => {
                    self.complete(joined, &mut retry);
                }
                _ = ticker.tick() => self.dispatch(&mut in_flight),
                () = sleep_opt(&mut retry) => {
                    retry = None;
                    self.dispatch(&mut in_flight);
                }
            }
        }
    }

    fn dispatch(&mut self, in_flight: &mut JoinSet<FetchOutcome>) {
        self.generation += 1;
        let generation = self.generation;
        let fetch = self.source.fetch(self.domain);
        let timeout = self.timeout;
        debug!(domain = %self.domain, generation, "poll");
        in_flight.spawn(async move { (generation, tokio::time::timeout(timeout, fetch).await) });
    }

    fn complete(
        &mut self,
        joined: Result<FetchOutcome, JoinError>,
        retry: &mut Option<Pin<Box<Sleep>>>,
    ) {
        // Aborted fetches surface as JoinErrors.
        let Ok((generation, outcome)) = joined else {
            return;
        };
        if generation <= self.applied {
            debug!(domain = %self.domain, generation, applied = self.applied, "discarding stale poll result");
            return;
        }
        self.applied = generation;

        let result = outcome.unwrap_or_else(|_| {
            Err(CoreError::Timeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            })
        });

        match result {
            Ok(update) => {
                self.retry_count = 0;
                *retry = None;
                self.stores.apply(update);
            }
            Err(e) => {
                self.retry_count = self.retry_count.saturating_add(1);
                let delay = self.poll.retry_delay(self.retry_count);
                warn!(
                    domain = %self.domain,
                    attempt = self.retry_count,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %e,
                    "poll failed"
                );
                self.stores.set_error(self.domain, &e.to_string());
                *retry = Some(Box::pin(tokio::time::sleep(delay)));
            }
        }
    }
}

/// Wait on an optional timer; pending forever when unset.
pub(crate) async fn sleep_opt(slot: &mut Option<Pin<Box<Sleep>>>) {
    match slot {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}
