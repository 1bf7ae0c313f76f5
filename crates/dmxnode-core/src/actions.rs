// ── User actions ──
//
// One-shot operations a user triggers. Each validates first, then talks
// to the device; failures go back to the caller and never touch the
// background sync.

use std::path::Path;

use secrecy::SecretString;
use tracing::{info, warn};

use dmxnode_api::models::{Ack, DeviceConfigFile, LoginResponse, NetworkConfig};

use crate::controller::Controller;
use crate::error::CoreError;
use crate::model::Domain;
use crate::validate::{validate_admin_password, validate_config_file, validate_network_config};

impl Controller {
    /// Save Ethernet / Wi-Fi settings. The device usually applies them on
    /// its next reboot.
    pub async fn save_network_config(&self, config: &NetworkConfig) -> Result<Ack, CoreError> {
        validate_network_config(config)?;
        let ack = self.inner.client.set_network_config(config).await?;
        info!("network config saved");
        Ok(ack)
    }

    pub async fn reboot(&self) -> Result<Ack, CoreError> {
        let ack = self.inner.client.reboot().await?;
        info!("reboot requested");
        Ok(ack)
    }

    pub async fn factory_reset(&self) -> Result<Ack, CoreError> {
        let ack = self.inner.client.factory_reset().await?;
        warn!("factory reset requested");
        Ok(ack)
    }

    /// Exchange the admin password for a bearer token. The token is kept by
    /// the client's token store; an open push session picks it up on its
    /// next reconnect.
    pub async fn login(&self, password: &SecretString) -> Result<LoginResponse, CoreError> {
        validate_admin_password(password)?;
        Ok(self.inner.client.login(password).await?)
    }

    pub fn logout(&self) -> Result<(), CoreError> {
        Ok(self.inner.client.logout()?)
    }

    pub async fn set_password(&self, password: &SecretString) -> Result<Ack, CoreError> {
        validate_admin_password(password)?;
        let ack = self.inner.client.set_password(password).await?;
        info!("admin password changed");
        Ok(ack)
    }

    pub async fn export_config(&self) -> Result<DeviceConfigFile, CoreError> {
        Ok(self.inner.client.export_config().await?)
    }

    pub async fn import_config(&self, file: &DeviceConfigFile) -> Result<Ack, CoreError> {
        validate_config_file(file)?;
        let ack = self.inner.client.import_config(file).await?;
        info!(ports = file.ports.len(), "config imported");
        Ok(ack)
    }

    /// Upload a firmware image from disk. Uses the long upload deadline.
    pub async fn upload_firmware(&self, path: &Path) -> Result<Ack, CoreError> {
        let size = tokio::fs::metadata(path).await?.len();
        if size == 0 {
            return Err(CoreError::validation("firmware", "image file is empty"));
        }
        let ack = self.inner.client.upload_firmware_file(path).await?;
        info!(bytes = size, "firmware upload accepted");
        Ok(ack)
    }

    /// Fetch `domain` now, regardless of transport mode. A failure is
    /// recorded on the domain snapshot and returned.
    pub async fn refresh(&self, domain: Domain) -> Result<(), CoreError> {
        let timeout = self.inner.config.sync.request_timeout;
        let fetch = self.inner.source.fetch(domain);
        let result = match tokio::time::timeout(timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(CoreError::Timeout {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        };
        match result {
            Ok(update) => {
                self.inner.stores.apply(update);
                Ok(())
            }
            Err(e) => {
                self.inner.stores.set_error(domain, &e.to_string());
                Err(e)
            }
        }
    }
}
