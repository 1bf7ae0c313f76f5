// Network endpoints

use tracing::debug;

use crate::client::DeviceClient;
use crate::error::Error;
use crate::models::{Ack, NetworkConfig, NetworkStatus};

impl DeviceClient {
    /// Link state and addresses of both interfaces.
    ///
    /// `GET /api/network/status`
    pub async fn network_status(&self) -> Result<NetworkStatus, Error> {
        debug!("fetching network status");
        self.get("network/status").await
    }

    /// Apply network configuration. The device may drop the connection
    /// while it brings interfaces back up.
    ///
    /// `POST /api/network/config`
    pub async fn set_network_config(&self, config: &NetworkConfig) -> Result<Ack, Error> {
        debug!("saving network config");
        let ack: Option<Ack> = self.post("network/config", config).await?;
        Ok(ack.unwrap_or_default())
    }
}
