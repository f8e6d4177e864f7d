//! Shared configuration for dfp tools.
//!
//! One TOML file describes a device connection plus the sensors, binary
//! sensors and switches to expose. This crate loads it (file + `DFP_`
//! environment overrides), resolves the password (env var, keyring,
//! plaintext), and translates it into `dfp_core` types.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use dfp_core::entity::display_name;
use dfp_core::{
    BinarySensor, ControllerConfig, Entity, Module, Sensor, Switch, TlsVerification, ValueTemplate,
};

/// Keyring service name; the account is the device username.
pub const KEYRING_SERVICE: &str = "dfp";

/// Placeholder that disables a switch's state item or turn-off action.
pub const NONE: &str = "none";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for user '{username}'")]
    NoCredentials { username: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceSection,

    #[serde(default)]
    pub sensors: BTreeMap<String, SensorSpec>,

    #[serde(default)]
    pub binary_sensors: BTreeMap<String, BinarySensorSpec>,

    #[serde(default)]
    pub switches: BTreeMap<String, SwitchSpec>,
}

/// The device connection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceSection {
    /// Location name, prefixed to every entity name.
    #[serde(default)]
    pub name: String,

    /// Device base URL (e.g., "http://192.168.1.20").
    #[serde(default)]
    pub resource: String,

    #[serde(default)]
    pub username: String,

    /// Plaintext password; prefer `password_env` or the keyring.
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    #[serde(default = "default_cache_interval_ms")]
    pub cache_interval_ms: u64,

    #[serde(default = "default_failure_backoff_secs")]
    pub failure_backoff_secs: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    #[serde(default)]
    pub insecure: bool,
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            name: String::new(),
            resource: String::new(),
            username: String::new(),
            password: None,
            password_env: None,
            cache_interval_ms: default_cache_interval_ms(),
            failure_backoff_secs: default_failure_backoff_secs(),
            timeout_secs: default_timeout_secs(),
            ca_cert: None,
            insecure: false,
        }
    }
}

fn default_cache_interval_ms() -> u64 {
    1000
}
fn default_failure_backoff_secs() -> u64 {
    30
}
fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SensorSpec {
    pub name: String,
    pub module: String,
    /// Attribute to mirror.
    pub state: String,
    pub unit_of_measurement: Option<String>,
    /// Template rendered over the raw attribute, bound as `value`.
    pub value_template: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BinarySensorSpec {
    pub name: String,
    pub module: String,
    pub state: String,
    pub value_template: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SwitchSpec {
    pub name: String,
    pub module: String,
    pub turn_on_action: String,
    #[serde(default = "default_none")]
    pub turn_off_action: String,
    /// Attribute carrying the on/off state, or `"none"`.
    #[serde(default = "default_none")]
    pub state: String,
    /// Push the device back to the desired state when it drifts.
    #[serde(default = "default_true")]
    pub ensure: bool,
}

fn default_none() -> String {
    NONE.into()
}

fn default_true() -> bool {
    true
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "dfp", "dfp").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("dfp");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from `path`, with `DFP_` environment overrides.
///
/// Nested keys use a double underscore: `DFP_DEVICE__RESOURCE`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("DFP_").split("__"));

    let config: Config = figment.extract()?;
    debug!(
        path = %path.display(),
        sensors = config.sensors.len(),
        switches = config.switches.len(),
        "config loaded"
    );
    Ok(config)
}

/// Render the config as TOML with the plaintext password masked.
pub fn render_config(cfg: &Config) -> Result<String, ConfigError> {
    let mut redacted = cfg.clone();
    if redacted.device.password.is_some() {
        redacted.device.password = Some("********".into());
    }
    Ok(toml::to_string_pretty(&redacted)?)
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the device password: `password_env` → keyring → plaintext.
pub fn resolve_password(device: &DeviceSection) -> Result<SecretString, ConfigError> {
    resolve_password_with(
        device,
        |var| std::env::var(var).ok(),
        |user| {
            keyring::Entry::new(KEYRING_SERVICE, user)
                .and_then(|entry| entry.get_password())
                .ok()
        },
    )
}

fn resolve_password_with(
    device: &DeviceSection,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Configured env var
    if let Some(pw) = device.password_env.as_deref().and_then(&env) {
        return Ok(SecretString::from(pw));
    }

    // 2. System keyring
    if !device.username.is_empty() {
        if let Some(pw) = keyring(&device.username) {
            return Ok(SecretString::from(pw));
        }
    }

    // 3. Plaintext in config
    if let Some(ref pw) = device.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        username: device.username.clone(),
    })
}

// ── Translation to core types ───────────────────────────────────────

/// Build a `ControllerConfig` from the device section.
pub fn to_controller_config(cfg: &Config) -> Result<ControllerConfig, ConfigError> {
    let password = resolve_password(&cfg.device)?;
    controller_config_with_password(&cfg.device, password)
}

fn controller_config_with_password(
    device: &DeviceSection,
    password: SecretString,
) -> Result<ControllerConfig, ConfigError> {
    if device.resource.is_empty() {
        return Err(invalid("device.resource", "must not be empty"));
    }
    url::Url::parse(&device.resource).map_err(|e| {
        invalid("device.resource", format!("invalid URL '{}': {e}", device.resource))
    })?;
    if device.username.is_empty() {
        return Err(invalid("device.username", "must not be empty"));
    }
    if device.cache_interval_ms == 0 {
        return Err(invalid("device.cache_interval_ms", "must be greater than zero"));
    }
    if device.timeout_secs == 0 {
        return Err(invalid("device.timeout_secs", "must be greater than zero"));
    }

    let tls = if device.insecure {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = device.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let mut config = ControllerConfig::new(&device.resource, &device.username, password)
        .with_cache_interval(Duration::from_millis(device.cache_interval_ms))
        .with_failure_backoff(Duration::from_secs(device.failure_backoff_secs))
        .with_timeout(Duration::from_secs(device.timeout_secs));
    config.tls = tls;
    Ok(config)
}

/// Build every configured entity, in config order per kind.
pub fn build_entities(cfg: &Config) -> Result<Vec<Entity>, ConfigError> {
    let location = &cfg.device.name;
    let mut entities = Vec::new();

    for (key, spec) in &cfg.sensors {
        let module = parse_module(&format!("sensors.{key}.module"), &spec.module)?;
        require(&format!("sensors.{key}.state"), &spec.state)?;
        let mut sensor = Sensor::new(display_name(location, &spec.name), module, &spec.state);
        if let Some(ref unit) = spec.unit_of_measurement {
            sensor = sensor.with_unit(unit);
        }
        if let Some(ref source) = spec.value_template {
            sensor = sensor.with_template(template(&format!("sensors.{key}"), source)?);
        }
        entities.push(Entity::Sensor(sensor));
    }

    for (key, spec) in &cfg.binary_sensors {
        let module = parse_module(&format!("binary_sensors.{key}.module"), &spec.module)?;
        require(&format!("binary_sensors.{key}.state"), &spec.state)?;
        let mut sensor = BinarySensor::new(display_name(location, &spec.name), module, &spec.state);
        if let Some(ref source) = spec.value_template {
            sensor = sensor.with_template(template(&format!("binary_sensors.{key}"), source)?);
        }
        entities.push(Entity::BinarySensor(sensor));
    }

    for (key, spec) in &cfg.switches {
        let module = parse_module(&format!("switches.{key}.module"), &spec.module)?;
        require(&format!("switches.{key}.turn_on_action"), &spec.turn_on_action)?;
        require(&format!("switches.{key}.turn_off_action"), &spec.turn_off_action)?;
        require(&format!("switches.{key}.state"), &spec.state)?;
        let switch = Switch::new(
            display_name(location, &spec.name),
            module,
            &spec.state,
            &spec.turn_on_action,
            &spec.turn_off_action,
        )
        .with_ensure(spec.ensure);
        entities.push(Entity::Switch(switch));
    }

    Ok(entities)
}

fn parse_module(field: &str, name: &str) -> Result<Module, ConfigError> {
    Module::from_str(name).map_err(|_| {
        invalid(field, format!("unknown module '{name}' (expected dfp, dfpIO, tfp or tfpIO)"))
    })
}

fn template(prefix: &str, source: &str) -> Result<ValueTemplate, ConfigError> {
    ValueTemplate::new(source)
        .map_err(|e| invalid(format!("{prefix}.value_template"), e.to_string()))
}

fn require(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(invalid(field, "must not be empty"));
    }
    Ok(())
}
