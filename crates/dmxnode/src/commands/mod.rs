//! Command dispatch: bridges CLI args -> controller calls -> output formatting.

pub mod auth;
pub mod config_cmd;
pub mod file;
pub mod network;
pub mod port;
pub mod status;
pub mod system;
pub mod util;
pub mod watch;

use dmxnode_core::Controller;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a device-bound command to its handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Watch(args) => watch::handle(controller, &args, global).await,
        Command::Status(args) => status::handle(controller, &args, global).await,
        Command::Port(args) => port::handle(controller, args, global).await,
        Command::Network(args) => network::handle(controller, args, global).await,
        Command::Login => auth::login(controller, global).await,
        Command::Logout => auth::logout(controller, global),
        Command::SetPassword => auth::set_password(controller, global).await,
        Command::Reboot => system::reboot(controller, global).await,
        Command::FactoryReset => system::factory_reset(controller, global).await,
        Command::Ota(args) => system::ota(controller, &args, global).await,
        Command::Export(args) => file::export(controller, &args, global).await,
        Command::Import(args) => file::import(controller, &args, global).await,
        // Config and Completions are handled before a controller exists
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
