//! `dfp tank`: one attribute of a named tank.

use dfp_core::{Controller, ControllerConfig};

use crate::cli::{GlobalOpts, TankArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    config: ControllerConfig,
    args: TankArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let controller = Controller::new(config)?;
    let value = controller.tank_status(&args.name, &args.item).await?;
    println!("{}", output::render_value(global.output, &value)?);
    Ok(())
}
