//! `dfp action`: run a named action on a module's family.

use std::str::FromStr;

use dfp_core::{Controller, ControllerConfig, Module};

use crate::cli::ActionArgs;
use crate::error::CliError;

pub async fn handle(config: ControllerConfig, args: ActionArgs) -> Result<(), CliError> {
    let module = Module::from_str(&args.module)
        .map_err(|_| CliError::UnknownModule { name: args.module.clone() })?;
    let controller = Controller::new(config)?;

    controller.module(module).action(&args.name).await?;
    eprintln!("Action '{}' sent to {}", args.name, module.family());
    Ok(())
}
