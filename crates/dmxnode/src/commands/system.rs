//! Reboot, factory reset and firmware upload handlers.

use std::time::Duration;

use bytesize::ByteSize;
use indicatif::{ProgressBar, ProgressStyle};

use dmxnode_core::Controller;

use crate::cli::{GlobalOpts, OtaArgs};
use crate::error::CliError;

use super::util;

pub async fn reboot(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    if !util::confirm("Reboot the device? DMX output stops until it is back.", "reboot", global.yes)? {
        return Ok(());
    }
    controller.reboot().await?;
    if !global.quiet {
        eprintln!("Reboot initiated");
    }
    Ok(())
}

pub async fn factory_reset(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    if !util::confirm(
        "Erase every setting on the device, including network config and the admin password?",
        "factory-reset",
        global.yes,
    )? {
        return Ok(());
    }
    controller.factory_reset().await?;
    if !global.quiet {
        eprintln!("Factory reset initiated; the device will come back with default settings");
    }
    Ok(())
}

pub async fn ota(controller: &Controller, args: &OtaArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let size = std::fs::metadata(&args.image)?.len();
    let prompt = format!(
        "Flash {} ({}) to the device? It reboots when the upload completes.",
        args.image.display(),
        ByteSize(size)
    );
    if !util::confirm(&prompt, "ota", global.yes)? {
        return Ok(());
    }

    let spinner = if global.quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        bar
    };
    spinner.set_message(format!("Uploading {}", ByteSize(size)));

    let result = controller.upload_firmware(&args.image).await;
    spinner.finish_and_clear();
    result?;

    if !global.quiet {
        eprintln!("Firmware accepted; the device is rebooting");
    }
    Ok(())
}
