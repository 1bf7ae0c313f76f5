// ── Runtime configuration ──
//
// These types describe *how* to talk to a device and how the sync layer
// paces itself. They never touch disk; `dmxnode-config` builds them from
// profiles.

use std::time::Duration;

use dmxnode_api::{DeviceEndpoint, TlsMode, TransportConfig};

use crate::model::Domain;

/// Reconnection policy for the status push channel.
///
/// After each failed attempt or remote close the retry is scheduled with
/// the current delay, which then grows by `multiplier` up to `max_delay`.
/// A successful handshake resets it to `initial_delay`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_millis(10_000),
            multiplier: 1.5,
        }
    }
}

/// Poll pacing per domain plus the error-retry curve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    pub system_interval: Duration,
    pub dmx_interval: Duration,
    pub network_interval: Duration,
    /// Extra retry after a failure: `min(retry_base * 2^retries, retry_max)`.
    pub retry_base: Duration,
    pub retry_max: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            system_interval: Duration::from_millis(1_000),
            dmx_interval: Duration::from_millis(500),
            network_interval: Duration::from_millis(2_000),
            retry_base: Duration::from_millis(1_000),
            retry_max: Duration::from_millis(10_000),
        }
    }
}

impl PollConfig {
    pub fn interval(&self, domain: Domain) -> Duration {
        match domain {
            Domain::System => self.system_interval,
            Domain::DmxPorts => self.dmx_interval,
            Domain::Network => self.network_interval,
        }
    }

    /// Delay before the one-off retry after the `retry_count`-th consecutive failure.
    pub fn retry_delay(&self, retry_count: u32) -> Duration {
        let factor = 2u32.checked_pow(retry_count).unwrap_or(u32::MAX);
        self.retry_base
            .checked_mul(factor)
            .map_or(self.retry_max, |d| d.min(self.retry_max))
    }
}

/// Knobs for the synchronization layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// When `false` the push channel is never attempted and a reachable
    /// device is polled directly.
    pub push_enabled: bool,
    pub reconnect: ReconnectConfig,
    pub poll: PollConfig,
    /// Bound on every REST fetch and on the WebSocket handshake.
    pub request_timeout: Duration,
    /// Bound on firmware uploads.
    pub upload_timeout: Duration,
    /// Delay between regaining reachability and the next push attempt.
    pub reachability_debounce: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        let transport = TransportConfig::default();
        Self {
            push_enabled: true,
            reconnect: ReconnectConfig::default(),
            poll: PollConfig::default(),
            request_timeout: transport.timeout,
            upload_timeout: transport.upload_timeout,
            reachability_debounce: Duration::from_millis(100),
        }
    }
}

/// Everything needed to build a [`Controller`](crate::Controller) for one device.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub endpoint: DeviceEndpoint,
    pub tls: TlsMode,
    pub sync: SyncConfig,
}

impl ControllerConfig {
    pub fn new(endpoint: DeviceEndpoint) -> Self {
        Self {
            endpoint,
            tls: TlsMode::default(),
            sync: SyncConfig::default(),
        }
    }

    /// Transport settings for the REST client.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone(),
            timeout: self.sync.request_timeout,
            upload_timeout: self.sync.upload_timeout,
        }
    }
}
