//! Shared configuration for dmxnode tools.
//!
//! TOML profiles (file + `DMXNODE_*` environment), bearer-token
//! persistence in the system keyring, and translation to
//! `dmxnode_core::ControllerConfig`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dmxnode_api::{DeviceEndpoint, MemoryTokenStore, TlsMode, TokenStore};
use dmxnode_core::ControllerConfig;

const KEYRING_SERVICE: &str = "dmxnode";
const ENV_PREFIX: &str = "DMXNODE_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found in config")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named device profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Use the status socket; `false` polls only.
    #[serde(default = "default_push")]
    pub push: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout_ms: default_timeout_ms(),
            push: default_push(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout_ms() -> u64 {
    5_000
}
fn default_push() -> bool {
    true
}

/// A named device profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Device address: `192.168.4.1`, `node.local:8080` or a full URL.
    pub address: String,

    /// Path to a custom CA certificate for `https` devices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Accept self-signed certificates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_timeout_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push: Option<bool>,

    #[serde(default, skip_serializing_if = "PollOverrides::is_empty")]
    pub poll: PollOverrides,
}

/// Per-domain poll interval overrides, in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PollOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dmx_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_ms: Option<u64>,
}

impl PollOverrides {
    pub fn is_empty(&self) -> bool {
        self.system_ms.is_none() && self.dmx_ms.is_none() && self.network_ms.is_none()
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("tech", "dmxnode", "dmxnode").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("dmxnode");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Loading / saving ────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path`, layered over defaults and under `DMXNODE_*` env vars.
///
/// Nested keys use a double underscore: `DMXNODE_DEFAULTS__TIMEOUT_MS=2000`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Profile resolution ──────────────────────────────────────────────

/// Pick the named profile, else the configured default.
pub fn resolve_profile<'a>(
    cfg: &'a Config,
    name: Option<&str>,
) -> Result<(String, &'a Profile), ConfigError> {
    let name = name
        .map(str::to_owned)
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into());
    cfg.profiles
        .get(&name)
        .map(|p| (name.clone(), p))
        .ok_or(ConfigError::UnknownProfile { name })
}

fn millis(field: &str, ms: u64) -> Result<Duration, ConfigError> {
    if ms == 0 {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(Duration::from_millis(ms))
}

/// Build a `ControllerConfig` from a profile and the global defaults.
pub fn profile_to_controller_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<ControllerConfig, ConfigError> {
    let endpoint =
        DeviceEndpoint::parse(&profile.address).map_err(|e| ConfigError::Validation {
            field: "address".into(),
            reason: e.to_string(),
        })?;

    let mut config = ControllerConfig::new(endpoint);
    config.tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    let sync = &mut config.sync;
    sync.request_timeout = millis("timeout_ms", profile.timeout_ms.unwrap_or(defaults.timeout_ms))?;
    if let Some(secs) = profile.upload_timeout_secs {
        sync.upload_timeout = millis("upload_timeout_secs", secs.saturating_mul(1_000))?;
    }
    sync.push_enabled = profile.push.unwrap_or(defaults.push);
    if let Some(ms) = profile.poll.system_ms {
        sync.poll.system_interval = millis("poll.system_ms", ms)?;
    }
    if let Some(ms) = profile.poll.dmx_ms {
        sync.poll.dmx_interval = millis("poll.dmx_ms", ms)?;
    }
    if let Some(ms) = profile.poll.network_ms {
        sync.poll.network_interval = millis("poll.network_ms", ms)?;
    }
    Ok(config)
}

// ── Token persistence ───────────────────────────────────────────────

/// Bearer token kept in the system keyring, one entry per profile.
pub struct KeyringTokenStore {
    entry: keyring::Entry,
}

impl KeyringTokenStore {
    pub fn new(profile_name: &str) -> Result<Self, ConfigError> {
        let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/token"))?;
        Ok(Self { entry })
    }
}

fn store_error(err: &keyring::Error) -> dmxnode_api::Error {
    dmxnode_api::Error::TokenStore(err.to_string())
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<Option<SecretString>, dmxnode_api::Error> {
        match self.entry.get_password() {
            Ok(token) => Ok(Some(SecretString::from(token))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(store_error(&e)),
        }
    }

    fn save(&self, token: &SecretString) -> Result<(), dmxnode_api::Error> {
        self.entry
            .set_password(token.expose_secret())
            .map_err(|e| store_error(&e))
    }

    fn clear(&self) -> Result<(), dmxnode_api::Error> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(store_error(&e)),
        }
    }
}

/// The keyring store for `profile_name`, or a process-local store when
/// no keyring is usable (headless CI, containers).
pub fn token_store(profile_name: &str) -> Arc<dyn TokenStore> {
    match KeyringTokenStore::new(profile_name) {
        Ok(store) if store.load().is_ok() => Arc::new(store),
        _ => Arc::new(MemoryTokenStore::new()),
    }
}
