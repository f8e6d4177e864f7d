// ── Entity adapters ──
//
// Host-facing sensors and switches that poll a `Controller` on a fixed
// throttle. Each entity is unavailable whenever the controller's last
// refresh failed or its own last update failed.

mod sensor;
mod switch;
mod template;

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::time::Instant;

use crate::controller::Controller;

pub use sensor::{BinarySensor, Sensor};
pub use switch::{Reconciliation, Switch};
pub use template::ValueTemplate;

/// Minimum spacing between two polls of the same entity.
pub const MIN_TIME_BETWEEN_UPDATES: Duration = Duration::from_secs(1);

/// Rate limiter for entity polling. The first call always passes.
#[derive(Debug, Clone)]
pub struct Throttle {
    min_interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    /// `true` if enough time has passed; records the call when it does.
    pub fn ready(&mut self) -> bool {
        let now = Instant::now();
        let due = self
            .last
            .is_none_or(|last| now.duration_since(last) >= self.min_interval);
        if due {
            self.last = Some(now);
        }
        due
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(MIN_TIME_BETWEEN_UPDATES)
    }
}

/// Point-in-time view of an entity, for display or export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityState {
    pub name: String,
    pub kind: &'static str,
    pub value: Option<Value>,
    pub unit: Option<String>,
    pub available: bool,
}

/// Any entity the host can poll.
#[derive(Debug)]
pub enum Entity {
    Sensor(Sensor),
    BinarySensor(BinarySensor),
    Switch(Switch),
}

impl Entity {
    pub fn name(&self) -> &str {
        match self {
            Self::Sensor(s) => s.name(),
            Self::BinarySensor(s) => s.name(),
            Self::Switch(s) => s.name(),
        }
    }

    /// Make sure the controller's refresh loop covers this entity's module.
    pub async fn attach(&self, controller: &Controller) {
        let module = match self {
            Self::Sensor(s) => s.module(),
            Self::BinarySensor(s) => s.module(),
            Self::Switch(s) => s.module(),
        };
        controller.register(module).await;
    }

    pub async fn update(&mut self, controller: &Controller) {
        match self {
            Self::Sensor(s) => s.update(controller).await,
            Self::BinarySensor(s) => s.update(controller).await,
            Self::Switch(s) => {
                s.update(controller).await;
            }
        }
    }

    pub fn state(&self) -> EntityState {
        match self {
            Self::Sensor(s) => s.state(),
            Self::BinarySensor(s) => s.state(),
            Self::Switch(s) => s.state(),
        }
    }
}

/// `"garden"`, `"water temp"` → `"Garden Water Temp"`.
pub fn display_name(location: &str, name: &str) -> String {
    format!("{} {}", title_case(location), title_case(name))
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Interpret a device value as an on/off state.
pub fn truthy(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "on" | "true" | "1" | "open" => Some(true),
            "off" | "false" | "0" | "closed" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
