//! `dfp status`: one attribute of one module.

use dfp_core::{Controller, ControllerConfig};

use crate::cli::{GlobalOpts, StatusArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    config: ControllerConfig,
    args: StatusArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let controller = Controller::new(config)?;

    let value = if args.live {
        controller.status_named(&args.module, &args.item, false).await?
    } else {
        // One cache pass, then read through the cache like an entity would.
        let module = controller.register_module(&args.module).await?;
        controller.refresh_once().await?;
        controller.status(module, &args.item, true).await?
    };

    println!("{}", output::render_value(global.output, &value)?);
    Ok(())
}
