//! Configuration file export / import.

use dmxnode_api::models::DeviceConfigFile;
use dmxnode_core::Controller;

use crate::cli::{ExportArgs, GlobalOpts, ImportArgs};
use crate::error::CliError;
use crate::output;

use super::util;

/// Export always writes JSON; the file is meant to go back through `import`.
pub async fn export(
    controller: &Controller,
    args: &ExportArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let file = controller.export_config().await?;
    let json = output::render_json(&file, false)?;
    match args.file {
        Some(ref path) => {
            std::fs::write(path, format!("{json}\n"))?;
            if !global.quiet {
                eprintln!(
                    "Exported {} port(s) to {}",
                    file.ports.len(),
                    path.display()
                );
            }
        }
        None => output::print_output(&json, false),
    }
    Ok(())
}

pub async fn import(
    controller: &Controller,
    args: &ImportArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let file: DeviceConfigFile = util::read_json_file(&args.file)?;
    let prompt = format!(
        "Replace the device configuration with {} ({} port(s))?",
        args.file.display(),
        file.ports.len()
    );
    if !util::confirm(&prompt, "import", global.yes)? {
        return Ok(());
    }
    let ack = controller.import_config(&file).await?;
    if !global.quiet {
        eprintln!("Configuration imported");
        if let Some(warning) = ack.warning {
            eprintln!("Warning: {warning}");
        }
    }
    Ok(())
}
