// Configuration export / import

use tracing::debug;

use crate::client::DeviceClient;
use crate::error::Error;
use crate::models::{Ack, DeviceConfigFile};

impl DeviceClient {
    /// Download the full device configuration document.
    ///
    /// `GET /api/file/export`
    pub async fn export_config(&self) -> Result<DeviceConfigFile, Error> {
        debug!("exporting configuration");
        self.get("file/export").await
    }

    /// Upload a configuration document previously produced by
    /// [`export_config`](Self::export_config).
    ///
    /// `POST /api/file/import`
    pub async fn import_config(&self, config: &DeviceConfigFile) -> Result<Ack, Error> {
        debug!(ports = config.ports.len(), "importing configuration");
        let ack: Option<Ack> = self.post("file/import", config).await?;
        Ok(ack.unwrap_or_default())
    }
}
