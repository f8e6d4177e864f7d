//! Config command handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            println!("{}", super::config_file(global).display());
            Ok(())
        }
        ConfigCommand::Show => {
            let cfg = super::load(global)?;
            print!("{}", dfp_config::render_config(&cfg)?);
            Ok(())
        }
    }
}
