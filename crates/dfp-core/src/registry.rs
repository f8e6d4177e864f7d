// ── Controller registry ──
//
// One controller per (URL, username, password) for the lifetime of the
// registry. Built once by the surrounding wiring and passed by reference
// to every consumer; `shutdown_all` stops every background task.

use dashmap::DashMap;
use tracing::debug;

use crate::config::ControllerConfig;
use crate::controller::Controller;
use crate::error::CoreError;

/// Lookup key without the secret; the password is compared on hit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ConnectionKey {
    url: String,
    username: String,
}

#[derive(Default)]
pub struct Registry {
    controllers: DashMap<ConnectionKey, Vec<Controller>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the controller for this identity, creating it on first use.
    ///
    /// Tuning fields of later configs (interval, timeout) are ignored when
    /// an existing controller is returned.
    pub fn controller(&self, config: ControllerConfig) -> Result<Controller, CoreError> {
        let credentials = config.credentials()?;
        let key = ConnectionKey {
            url: credentials.base_url().to_string(),
            username: credentials.username().to_owned(),
        };

        if let Some(slot) = self.controllers.get(&key) {
            if let Some(existing) = slot
                .iter()
                .find(|c| c.credentials().same_identity(&credentials))
            {
                return Ok(existing.clone());
            }
        }

        // Build before touching the map so a rejected config leaves no slot.
        let controller = Controller::from_credentials(config, credentials)?;

        let mut slot = self.controllers.entry(key).or_default();
        if let Some(existing) = slot
            .iter()
            .find(|c| c.credentials().same_identity(controller.credentials()))
        {
            return Ok(existing.clone());
        }
        debug!(url = %controller.credentials().base_url(), "controller created");
        slot.push(controller.clone());
        Ok(controller)
    }

    pub fn len(&self) -> usize {
        self.controllers.iter().map(|slot| slot.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop every controller's background refresh.
    pub async fn shutdown_all(&self) {
        let controllers: Vec<Controller> = self
            .controllers
            .iter()
            .flat_map(|slot| slot.value().clone())
            .collect();

        for controller in controllers {
            controller.shutdown().await;
        }
    }
}
