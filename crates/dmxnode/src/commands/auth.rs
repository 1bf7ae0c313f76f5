//! Login, logout and admin password handlers.

use std::time::Duration;

use secrecy::ExposeSecret;

use dmxnode_core::Controller;

use crate::cli::GlobalOpts;
use crate::error::CliError;

use super::util;

pub async fn login(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let password = util::prompt_secret("Admin password: ")?;
    let session = controller.login(&password).await?;
    if !global.quiet {
        match session.expires_seconds {
            Some(secs) => eprintln!(
                "Logged in; session expires in {}",
                humantime::format_duration(Duration::from_secs(secs))
            ),
            None => eprintln!("Logged in"),
        }
    }
    Ok(())
}

pub fn logout(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    controller.logout()?;
    if !global.quiet {
        eprintln!("Session token removed");
    }
    Ok(())
}

pub async fn set_password(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let first = util::prompt_secret("New admin password: ")?;
    let second = util::prompt_secret("Repeat password: ")?;
    if first.expose_secret() != second.expose_secret() {
        return Err(CliError::validation("password", "the passwords do not match"));
    }
    controller.set_password(&first).await?;
    if !global.quiet {
        eprintln!("Admin password changed");
    }
    Ok(())
}
