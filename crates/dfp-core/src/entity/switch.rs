use serde_json::Value;
use tracing::{error, info, warn};

use dfp_api::Module;

use super::{EntityState, Throttle, truthy};
use crate::controller::Controller;
use crate::error::CoreError;

/// Config value that disables a state item or a turn-off action.
const NONE: &str = "none";

/// What an update did about a desired/observed mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Observed state matched the desired state.
    InSync,
    /// A corrective command was sent to restore the desired state.
    Corrected,
    /// The observed state was adopted as the new desired state.
    Adopted,
}

/// A switch driven by family actions, with an optional state item.
///
/// `is_on` is the desired state. With `ensure` set (the default), a device
/// that drifts away from it is pushed back with one corrective command per
/// update; without it the switch simply follows the device. A switch with
/// no turn-off action cannot push the device off, so it adopts an observed
/// "on" even when ensuring.
#[derive(Debug)]
pub struct Switch {
    name: String,
    module: Module,
    state_item: Option<String>,
    turn_on_action: String,
    turn_off_action: Option<String>,
    ensure: bool,
    is_on: bool,
    available: bool,
    throttle: Throttle,
}

impl Switch {
    /// `state` and `turn_off_action` accept `"none"` to disable polling
    /// and turning off respectively.
    pub fn new(
        name: impl Into<String>,
        module: Module,
        state: &str,
        turn_on_action: impl Into<String>,
        turn_off_action: &str,
    ) -> Self {
        Self {
            name: name.into(),
            module,
            state_item: (state != NONE).then(|| state.to_owned()),
            turn_on_action: turn_on_action.into(),
            turn_off_action: (turn_off_action != NONE).then(|| turn_off_action.to_owned()),
            ensure: true,
            is_on: false,
            available: true,
            throttle: Throttle::default(),
        }
    }

    pub fn with_ensure(mut self, ensure: bool) -> Self {
        self.ensure = ensure;
        self
    }

    /// Seed the desired state without sending a command.
    pub fn with_desired_state(mut self, on: bool) -> Self {
        self.is_on = on;
        self
    }

    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module(&self) -> Module {
        self.module
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }

    pub fn ensure(&self) -> bool {
        self.ensure
    }

    pub fn available(&self) -> bool {
        self.available
    }

    pub async fn turn_on(&mut self, controller: &Controller) -> Result<(), CoreError> {
        controller
            .action(self.module.family(), &self.turn_on_action)
            .await?;
        self.is_on = true;
        Ok(())
    }

    /// No-op when the switch has no turn-off action.
    pub async fn turn_off(&mut self, controller: &Controller) -> Result<(), CoreError> {
        let Some(action) = self.turn_off_action.as_deref() else {
            return Ok(());
        };
        controller.action(self.module.family(), action).await?;
        self.is_on = false;
        Ok(())
    }

    /// Poll the state item and apply the ensure policy.
    ///
    /// Returns `None` when the update was throttled, disabled, or failed.
    pub async fn update(&mut self, controller: &Controller) -> Option<Reconciliation> {
        let item = self.state_item.clone()?;
        if !self.throttle.ready() {
            return None;
        }

        let observed = match controller.status(self.module, &item, true).await {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    entity = %self.name,
                    module = %self.module,
                    item = %item,
                    error = %e,
                    "switch update failed"
                );
                self.available = false;
                return None;
            }
        };

        let Some(observed) = truthy(&observed) else {
            warn!(entity = %self.name, value = %observed, "value is not an on/off state");
            self.available = false;
            return None;
        };

        let outcome = self.reconcile(controller, observed).await;
        self.available = controller.is_available();
        Some(outcome)
    }

    async fn reconcile(&mut self, controller: &Controller, observed: bool) -> Reconciliation {
        if observed == self.is_on {
            return Reconciliation::InSync;
        }

        let can_correct = self.is_on || self.turn_off_action.is_some();
        if !self.ensure || !can_correct {
            info!(entity = %self.name, observed, "updating switch to observed state");
            self.is_on = observed;
            return Reconciliation::Adopted;
        }

        info!(
            entity = %self.name,
            desired = self.is_on,
            observed,
            "reconciling with desired state"
        );
        let result = if self.is_on {
            self.turn_on(controller).await
        } else {
            self.turn_off(controller).await
        };
        if let Err(e) = result {
            error!(entity = %self.name, error = %e, "corrective command failed");
        }
        Reconciliation::Corrected
    }

    pub fn state(&self) -> EntityState {
        EntityState {
            name: self.name.clone(),
            kind: "switch",
            value: Some(Value::Bool(self.is_on)),
            unit: None,
            available: self.available,
        }
    }
}
