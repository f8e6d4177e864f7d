//! Command dispatch: loads config, builds the controller, runs a handler.

pub mod action;
pub mod config_cmd;
pub mod status;
pub mod tank;
pub mod watch;

use std::path::PathBuf;

use dfp_config::Config;
use dfp_core::{ControllerConfig, TlsVerification};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a device-bound command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = load(global)?;
    let controller_config = controller_config(&cfg, global)?;

    match cmd {
        Command::Status(args) => status::handle(controller_config, args, global).await,
        Command::Action(args) => action::handle(controller_config, args).await,
        Command::Tank(args) => tank::handle(controller_config, args, global).await,
        Command::Watch(args) => watch::handle(&cfg, controller_config, args, global).await,
        // Config is handled before dispatch
        Command::Config(_) => Ok(()),
    }
}

pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(dfp_config::config_path)
}

pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(dfp_config::load_config(&config_file(global))?)
}

/// Device section plus CLI flag overrides.
fn controller_config(cfg: &Config, global: &GlobalOpts) -> Result<ControllerConfig, CliError> {
    let mut config = dfp_config::to_controller_config(cfg)?;
    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    Ok(config)
}
