// ── Edit arbitration ──
//
// A port under local edit is dirty: merges from push or poll leave its
// editable fields alone until the edit is committed or discarded.

use tracing::{debug, info, warn};

use dmxnode_api::models::{Ack, DmxConfig};

use crate::controller::Controller;
use crate::error::CoreError;
use crate::model::{Domain, PortEdit};
use crate::validate::{validate_port, validate_port_config, validate_port_edit};

impl Controller {
    /// Mark `port` as being edited.
    pub fn begin_edit(&self, port: u8) -> Result<(), CoreError> {
        validate_port(port)?;
        if self.inner.stores.begin_edit(port) {
            debug!(port, "edit started");
        }
        Ok(())
    }

    /// Apply local values to `port` and mark it dirty.
    pub fn edit_port(&self, port: u8, edit: &PortEdit) -> Result<(), CoreError> {
        validate_port(port)?;
        validate_port_edit(edit)?;
        self.inner.stores.edit_port(port, edit);
        Ok(())
    }

    /// Drop the dirty mark without saving. The next snapshot overwrites
    /// the local values.
    pub fn discard_edit(&self, port: u8) -> Result<(), CoreError> {
        validate_port(port)?;
        if self.inner.stores.clear_dirty(port) {
            debug!(port, "edit discarded");
        }
        Ok(())
    }

    pub fn is_dirty(&self, port: u8) -> bool {
        self.inner.stores.is_dirty(port)
    }

    /// Save the local values of `port` to the device.
    ///
    /// On success the dirty mark is cleared so the next snapshot is
    /// accepted. On failure the port stays dirty with the local values
    /// intact and the error is returned.
    pub async fn commit_edit(&self, port: u8) -> Result<Ack, CoreError> {
        validate_port(port)?;
        let local = self
            .inner
            .stores
            .dmx
            .value()
            .and_then(|table| table.get(port).cloned())
            .ok_or_else(|| CoreError::validation("port", format!("port {port} has no state yet")))?;
        validate_port_config(&local)?;

        let config = DmxConfig {
            ports: vec![local.to_config()],
        };
        let ack = self.inner.client.set_dmx_config(&config).await?;
        self.inner.stores.clear_dirty(port);
        if let Some(warning) = &ack.warning {
            warn!(port, warning = %warning, "device accepted port config with a warning");
        }
        info!(port, universe = local.universe, enabled = local.enabled, "port saved");
        Ok(ack)
    }

    /// Edit and commit in one step. When the device refuses the save the
    /// DMX state is refreshed before the error is returned, so read-only
    /// fields reflect the device while the edit stays for a retry.
    pub async fn save_port(&self, port: u8, edit: &PortEdit) -> Result<Ack, CoreError> {
        self.edit_port(port, edit)?;
        match self.commit_edit(port).await {
            Ok(ack) => Ok(ack),
            Err(e @ CoreError::Validation { .. }) => Err(e),
            Err(e) => {
                if let Err(refresh) = self.refresh(Domain::DmxPorts).await {
                    debug!(error = %refresh, "refresh after failed save also failed");
                }
                Err(e)
            }
        }
    }
}
