// DMX endpoints

use tracing::debug;

use crate::client::DeviceClient;
use crate::error::Error;
use crate::models::{Ack, DmxConfig, DmxPortStatus, DmxStatusResponse};

impl DeviceClient {
    /// Current state of every output port.
    ///
    /// `GET /api/dmx/status` (bare list or `{ports: [...]}`)
    pub async fn dmx_status(&self) -> Result<Vec<DmxPortStatus>, Error> {
        debug!("fetching dmx status");
        let resp: DmxStatusResponse = self.get("dmx/status").await?;
        Ok(resp.into_ports())
    }

    /// Apply port configuration. Ports not listed keep their settings.
    ///
    /// `POST /api/dmx/config`
    pub async fn set_dmx_config(&self, config: &DmxConfig) -> Result<Ack, Error> {
        debug!(ports = config.ports.len(), "saving dmx config");
        let ack: Option<Ack> = self.post("dmx/config", config).await?;
        Ok(ack.unwrap_or_default())
    }
}
