//! Config subcommand handlers.

use std::path::PathBuf;

use dialoguer::{Confirm, Input};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Profile};
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global),

        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let out = match global.output {
                OutputFormat::Table | OutputFormat::Plain => {
                    toml::to_string_pretty(&cfg).map_err(|e| CliError::Config {
                        message: e.to_string(),
                    })?
                }
                format => output::render_single(format, &cfg, |_| String::new(), |_| String::new())?,
            };
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config()?;
            let name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(name.clone()).or_default();
            set_profile_key(profile, &key, &value)?;
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Set {key} = {value} on profile '{name}'");
            }
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            let default = cfg.default_profile.clone().unwrap_or_default();
            let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
            names.sort();
            let lines: Vec<String> = names
                .iter()
                .map(|name| {
                    let marker = if *name == default { "*" } else { " " };
                    match global.output {
                        OutputFormat::Plain => name.clone(),
                        _ => format!("{marker} {name:<16} {}", cfg.profiles[name].address),
                    }
                })
                .collect();
            output::print_output(&lines.join("\n"), global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;
            if !cfg.profiles.contains_key(&name) {
                let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
                names.sort();
                return Err(CliError::ProfileNotFound {
                    name,
                    available: names.join(", "),
                });
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Default profile set to '{name}'");
            }
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), false);
            Ok(())
        }
    }
}

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config().unwrap_or_default();

    let name: String = Input::new()
        .with_prompt("Profile name")
        .default(global.profile.clone().unwrap_or_else(|| "default".into()))
        .interact_text()
        .map_err(prompt_err)?;

    let address: String = Input::new()
        .with_prompt("Device address (IP, hostname or URL)")
        .default(global.address.clone().unwrap_or_else(|| "192.168.4.1".into()))
        .interact_text()
        .map_err(prompt_err)?;

    let push = Confirm::new()
        .with_prompt("Use the live status channel (recommended)?")
        .default(true)
        .interact()
        .map_err(prompt_err)?;

    let profile = Profile {
        address,
        push: (!push).then_some(false),
        insecure: global.insecure.then_some(true),
        ..Profile::default()
    };
    // Fail now rather than on the first command.
    config::profile_to_controller_config(&profile, &cfg.defaults)?;

    cfg.profiles.insert(name.clone(), profile);
    if cfg.default_profile.is_none() || cfg.profiles.len() == 1 {
        cfg.default_profile = Some(name.clone());
    }
    config::save_config(&cfg)?;

    if !global.quiet {
        eprintln!(
            "Profile '{name}' saved to {}",
            config::config_path().display()
        );
    }
    Ok(())
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, CliError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| CliError::validation(key, e.to_string()))
}

/// Set one profile key from its string form. An empty value unsets
/// optional keys.
fn set_profile_key(profile: &mut Profile, key: &str, value: &str) -> Result<(), CliError> {
    let unset = value.is_empty();
    match key {
        "address" => profile.address = value.to_owned(),
        "ca_cert" => profile.ca_cert = (!unset).then(|| PathBuf::from(value)),
        "insecure" => profile.insecure = if unset { None } else { Some(parse(key, value)?) },
        "push" => profile.push = if unset { None } else { Some(parse(key, value)?) },
        "timeout_ms" => profile.timeout_ms = if unset { None } else { Some(parse(key, value)?) },
        "upload_timeout_secs" => {
            profile.upload_timeout_secs = if unset { None } else { Some(parse(key, value)?) };
        }
        "poll.system_ms" => {
            profile.poll.system_ms = if unset { None } else { Some(parse(key, value)?) };
        }
        "poll.dmx_ms" => profile.poll.dmx_ms = if unset { None } else { Some(parse(key, value)?) },
        "poll.network_ms" => {
            profile.poll.network_ms = if unset { None } else { Some(parse(key, value)?) };
        }
        other => {
            return Err(CliError::validation(
                "key",
                format!(
                    "unknown key '{other}'; expected address, ca_cert, insecure, push, timeout_ms, \
                     upload_timeout_secs or poll.{{system,dmx,network}}_ms"
                ),
            ));
        }
    }
    Ok(())
}
