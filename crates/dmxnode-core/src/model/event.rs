use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EventLevel {
    #[default]
    Info,
    #[serde(alias = "warning")]
    Warn,
    Error,
}

/// A notification pushed by the device. Broadcast to subscribers, not stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEvent {
    pub code: String,
    pub level: EventLevel,
    pub received_at: DateTime<Utc>,
}
