use serde_json::Value;
use tracing::warn;

use dfp_api::Module;

use super::{EntityState, Throttle, ValueTemplate, truthy};
use crate::controller::Controller;

/// A read-only value mirrored from one module attribute.
#[derive(Debug)]
pub struct Sensor {
    name: String,
    module: Module,
    item: String,
    unit: Option<String>,
    template: Option<ValueTemplate>,
    value: Option<Value>,
    available: bool,
    throttle: Throttle,
}

impl Sensor {
    pub fn new(name: impl Into<String>, module: Module, item: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module,
            item: item.into(),
            unit: None,
            template: None,
            value: None,
            available: false,
            throttle: Throttle::default(),
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = throttle;
        self
    }

    /// Render each fetched value through `template` before storing it.
    pub fn with_template(mut self, template: ValueTemplate) -> Self {
        self.template = Some(template);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module(&self) -> Module {
        self.module
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn available(&self) -> bool {
        self.available
    }

    pub async fn update(&mut self, controller: &Controller) {
        if !self.throttle.ready() {
            return;
        }
        match controller.status(self.module, &self.item, true).await {
            Ok(value) => {
                let value = match &self.template {
                    Some(template) => template.render(&value),
                    None => value,
                };
                self.value = Some(value);
                self.available = controller.is_available();
            }
            Err(e) => {
                warn!(
                    entity = %self.name,
                    module = %self.module,
                    item = %self.item,
                    error = %e,
                    "sensor update failed"
                );
                self.available = false;
            }
        }
    }

    pub fn state(&self) -> EntityState {
        EntityState {
            name: self.name.clone(),
            kind: "sensor",
            value: self.value.clone(),
            unit: self.unit.clone(),
            available: self.available,
        }
    }
}

/// An on/off value mirrored from one module attribute.
#[derive(Debug)]
pub struct BinarySensor {
    name: String,
    module: Module,
    item: String,
    template: Option<ValueTemplate>,
    is_on: Option<bool>,
    available: bool,
    throttle: Throttle,
}

impl BinarySensor {
    pub fn new(name: impl Into<String>, module: Module, item: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module,
            item: item.into(),
            template: None,
            is_on: None,
            available: false,
            throttle: Throttle::default(),
        }
    }

    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = throttle;
        self
    }

    /// Render each fetched value through `template` before storing it.
    pub fn with_template(mut self, template: ValueTemplate) -> Self {
        self.template = Some(template);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module(&self) -> Module {
        self.module
    }

    pub fn is_on(&self) -> Option<bool> {
        self.is_on
    }

    pub fn available(&self) -> bool {
        self.available
    }

    pub async fn update(&mut self, controller: &Controller) {
        if !self.throttle.ready() {
            return;
        }
        match controller.status(self.module, &self.item, true).await {
            Ok(raw) => {
                let value = match &self.template {
                    Some(template) => template.render(&raw),
                    None => raw,
                };
                match truthy(&value) {
                    Some(on) => {
                        self.is_on = Some(on);
                        self.available = controller.is_available();
                    }
                    None => {
                        warn!(entity = %self.name, %value, "value is not an on/off state");
                        self.available = false;
                    }
                }
            }
            Err(e) => {
                warn!(
                    entity = %self.name,
                    module = %self.module,
                    item = %self.item,
                    error = %e,
                    "binary sensor update failed"
                );
                self.available = false;
            }
        }
    }

    pub fn state(&self) -> EntityState {
        EntityState {
            name: self.name.clone(),
            kind: "binary_sensor",
            value: self.is_on.map(Value::Bool),
            unit: None,
            available: self.available,
        }
    }
}
