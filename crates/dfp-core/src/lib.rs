// dfp-core: Cached, self-refreshing view of a token-protected device.

pub mod config;
pub mod controller;
pub mod entity;
pub mod error;
pub mod registry;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ControllerConfig, TlsVerification};
pub use controller::{Controller, ModuleHandle};
pub use entity::{
    BinarySensor, Entity, EntityState, Reconciliation, Sensor, Switch, Throttle, ValueTemplate,
};
pub use error::{CoreError, ErrorKind};
pub use registry::Registry;
pub use store::{CacheStore, Cached, RefreshState};

pub use dfp_api::{Attributes, Family, Module};
