// System endpoints
//
// Telemetry, reboot, factory reset and firmware upload.

use std::path::Path;

use serde_json::json;
use tracing::{debug, info};

use crate::client::DeviceClient;
use crate::error::Error;
use crate::models::{Ack, SystemInfo};

/// Multipart field name the OTA handler expects.
pub const FIRMWARE_FIELD: &str = "firmware";

impl DeviceClient {
    /// Get device identity and telemetry.
    ///
    /// `GET /api/sys/info`
    pub async fn system_info(&self) -> Result<SystemInfo, Error> {
        debug!("fetching system info");
        self.get("sys/info").await
    }

    /// Restart the device. The connection drops shortly after the ack.
    ///
    /// `POST /api/sys/reboot`
    pub async fn reboot(&self) -> Result<Ack, Error> {
        info!("requesting reboot");
        let ack: Option<Ack> = self.post("sys/reboot", &json!({})).await?;
        Ok(ack.unwrap_or_default())
    }

    /// Erase stored configuration and restart.
    ///
    /// `POST /api/sys/factory`
    pub async fn factory_reset(&self) -> Result<Ack, Error> {
        info!("requesting factory reset");
        let ack: Option<Ack> = self.post("sys/factory", &json!({})).await?;
        Ok(ack.unwrap_or_default())
    }

    /// Upload a firmware image as multipart form data.
    ///
    /// `POST /api/sys/ota` with part `firmware`. Uses the upload deadline
    /// rather than the request deadline.
    pub async fn upload_firmware(&self, file_name: &str, image: Vec<u8>) -> Result<Ack, Error> {
        info!(file_name, bytes = image.len(), "uploading firmware");
        let part = reqwest::multipart::Part::bytes(image)
            .file_name(file_name.to_owned())
            .mime_str("application/octet-stream")?;
        let form = reqwest::multipart::Form::new().part(FIRMWARE_FIELD, part);

        let builder = self
            .authorize(self.http().post(self.url("sys/ota")))
            .multipart(form);
        let ack: Option<Ack> = self.send(builder, self.upload_timeout()).await?;
        Ok(ack.unwrap_or_default())
    }

    /// Read a firmware image from disk and upload it.
    pub async fn upload_firmware_file(&self, path: &Path) -> Result<Ack, Error> {
        let image = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("firmware.bin")
            .to_owned();
        self.upload_firmware(&name, image).await
    }
}
