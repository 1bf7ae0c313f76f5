//! CLI configuration: thin wrapper around `dmxnode_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (`--address`, `--insecure`, `--timeout-ms`).

pub use dmxnode_config::{
    Config, Profile, config_path, load_config, profile_to_controller_config, save_config,
};

use dmxnode_core::ControllerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Translate the active profile plus global flags into a `ControllerConfig`.
///
/// Returns the profile name too; the token store is keyed by it. With no
/// matching profile, `--address` alone is enough.
pub fn resolve(global: &GlobalOpts, config: &Config) -> Result<(String, ControllerConfig), CliError> {
    let name = active_profile_name(global, config);

    let mut profile = match config.profiles.get(&name) {
        Some(profile) => profile.clone(),
        None if global.address.is_some() => Profile::default(),
        None if global.profile.is_some() => {
            let mut names: Vec<_> = config.profiles.keys().cloned().collect();
            names.sort();
            return Err(CliError::ProfileNotFound {
                name,
                available: if names.is_empty() {
                    "(none)".into()
                } else {
                    names.join(", ")
                },
            });
        }
        None => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    if let Some(ref address) = global.address {
        profile.address.clone_from(address);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(ms) = global.timeout_ms {
        profile.timeout_ms = Some(ms);
    }

    let controller_config = profile_to_controller_config(&profile, &config.defaults)?;
    Ok((name, controller_config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use clap::Parser;

    use dmxnode_api::TlsMode;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["dmxnode"];
        argv.extend_from_slice(args);
        argv.push("status");
        Cli::try_parse_from(argv).unwrap().global
    }

    fn config_with(name: &str, address: &str) -> Config {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            name.into(),
            Profile {
                address: address.into(),
                ..Profile::default()
            },
        );
        cfg
    }

    #[test]
    fn flags_override_the_profile() {
        let cfg = config_with("default", "192.168.4.1");
        let (name, resolved) = resolve(
            &global(&["--address", "10.0.0.9", "-k", "--timeout-ms", "750"]),
            &cfg,
        )
        .unwrap();
        assert_eq!(name, "default");
        assert_eq!(resolved.endpoint.base_url().host_str(), Some("10.0.0.9"));
        assert!(matches!(resolved.tls, TlsMode::DangerAcceptInvalid));
        assert_eq!(resolved.sync.request_timeout, Duration::from_millis(750));
    }

    #[test]
    fn address_flag_works_without_a_profile() {
        let (_, resolved) = resolve(&global(&["-a", "node.local"]), &Config::default()).unwrap();
        assert_eq!(resolved.endpoint.base_url().host_str(), Some("node.local"));
    }

    #[test]
    fn missing_profile_lists_the_available_ones() {
        let cfg = config_with("stage", "192.168.4.1");
        let err = resolve(&global(&["-p", "booth"]), &cfg).unwrap_err();
        match err {
            CliError::ProfileNotFound { name, available } => {
                assert_eq!(name, "booth");
                assert_eq!(available, "stage");
            }
            other => panic!("expected ProfileNotFound, got {other:?}"),
        }
    }

    #[test]
    fn nothing_configured_is_no_config() {
        let err = resolve(&global(&[]), &Config::default()).unwrap_err();
        assert!(matches!(err, CliError::NoConfig { .. }));
    }
}
