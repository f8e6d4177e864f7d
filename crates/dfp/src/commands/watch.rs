//! `dfp watch`: background refresh plus periodic entity updates.

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use dfp_config::Config;
use dfp_core::{Controller, ControllerConfig, Entity, EntityState, Registry};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    cfg: &Config,
    config: ControllerConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut entities = dfp_config::build_entities(cfg)?;
    if entities.is_empty() {
        return Err(CliError::Validation {
            field: "sensors/binary_sensors/switches".into(),
            reason: "no entities configured".into(),
        });
    }

    let registry = Registry::new();
    let controller = registry.controller(config)?;
    for entity in &entities {
        entity.attach(&controller).await;
    }
    controller.start().await;
    info!(entities = entities.len(), "watching");

    let every = Duration::from_secs(args.every.max(1));
    let result = run_until(
        &controller,
        &mut entities,
        every,
        global.output,
        tokio::signal::ctrl_c(),
    )
    .await;

    info!("shutting down");
    registry.shutdown_all().await;
    result
}

/// Update and print entities every `every` until `stop` resolves or
/// rendering fails. Never shuts the controller down itself.
async fn run_until<F>(
    controller: &Controller,
    entities: &mut [Entity],
    every: Duration,
    format: OutputFormat,
    stop: F,
) -> Result<(), CliError>
where
    F: Future<Output = std::io::Result<()>>,
{
    tokio::pin!(stop);
    let mut ticker = tokio::time::interval(every);

    loop {
        tokio::select! {
            biased;
            signal = &mut stop => {
                if let Err(e) = signal {
                    warn!(error = %e, "could not listen for ctrl-c, stopping");
                }
                return Ok(());
            }
            _ = ticker.tick() => {
                for entity in entities.iter_mut() {
                    entity.update(controller).await;
                }
                let states: Vec<EntityState> = entities.iter().map(Entity::state).collect();
                let rendered = output::render_states(format, &states)?;
                println!("── {} ──", chrono::Local::now().format("%H:%M:%S"));
                println!("{rendered}");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use dfp_core::{Module, Sensor};

    use super::*;

    fn controller(registry: &Registry) -> Controller {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"
[device]
resource = "http://127.0.0.1:9"
username = "admin"
password = "pw"
"#,
        )
        .unwrap();
        let cfg = dfp_config::load_config(file.path()).unwrap();
        registry
            .controller(dfp_config::to_controller_config(&cfg).unwrap())
            .unwrap()
    }

    #[tokio::test]
    async fn stop_signal_ends_loop_and_registry_still_shuts_down() {
        let registry = Registry::new();
        let controller = controller(&registry);
        controller.start().await;

        let mut entities = vec![Entity::Sensor(Sensor::new("Temp", Module::Dfp, "temp"))];
        let result = run_until(
            &controller,
            &mut entities,
            Duration::from_secs(60),
            OutputFormat::Plain,
            std::future::ready(Ok(())),
        )
        .await;
        assert!(result.is_ok());

        registry.shutdown_all().await;
        assert!(controller.is_shut_down());
    }

    #[tokio::test]
    async fn signal_listener_failure_stops_cleanly() {
        let registry = Registry::new();
        let controller = controller(&registry);

        let mut entities = Vec::new();
        let result = run_until(
            &controller,
            &mut entities,
            Duration::from_secs(60),
            OutputFormat::Json,
            std::future::ready(Err(std::io::Error::other("no signal handler"))),
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn pending_stop_keeps_ticking() {
        let registry = Registry::new();
        let controller = controller(&registry);

        let mut entities = Vec::new();
        let stop = async {
            tokio::time::sleep(Duration::from_millis(250)).await;
            Ok(())
        };
        let started = tokio::time::Instant::now();
        run_until(
            &controller,
            &mut entities,
            Duration::from_millis(50),
            OutputFormat::Plain,
            stop,
        )
        .await
        .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(250));
    }
}
