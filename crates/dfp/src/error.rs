//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use dfp_config::ConfigError;
use dfp_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to device at {url}")]
    #[diagnostic(
        code(dfp::connection_failed),
        help(
            "Check that the device is powered and reachable.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(dfp::timeout),
        help("Raise device.timeout_secs or check the device's responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed")]
    #[diagnostic(
        code(dfp::auth_failed),
        help("Verify device.username and the password ({message}).")
    )]
    AuthFailed { message: String },

    #[error("No password configured for user '{username}'")]
    #[diagnostic(
        code(dfp::no_credentials),
        help(
            "Set device.password_env to an environment variable holding the password,\n\
             store it in the system keyring under service 'dfp', or set device.password."
        )
    )]
    NoCredentials { username: String },

    // ── Lookup ───────────────────────────────────────────────────────
    #[error("{what} '{identifier}' not found")]
    #[diagnostic(code(dfp::not_found))]
    NotFound { what: String, identifier: String },

    #[error("Unknown module '{name}'")]
    #[diagnostic(code(dfp::unknown_module), help("Modules are: dfp, dfpIO, tfp, tfpIO"))]
    UnknownModule { name: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Device API error: {message}")]
    #[diagnostic(code(dfp::api_error))]
    Api { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(dfp::validation))]
    Validation { field: String, reason: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(dfp::no_config),
        help("Expected at: {path}\nPass --config PATH or set DFP_CONFIG.")
    )]
    NoConfig { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(dfp::config))]
    Config { message: String },

    // ── Serialization ────────────────────────────────────────────────
    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(dfp::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::UnknownModule { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::NoConfig { .. } | Self::Config { .. } => {
                exit_code::USAGE
            }
            Self::Api { .. } | Self::Json(_) => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Config { message } => CliError::Config { message },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::ConnectionFailed { url, reason } => {
                CliError::ConnectionFailed { url, reason }
            }
            CoreError::Timeout => CliError::Timeout,
            CoreError::Api { message, status: _ } => CliError::Api { message },
            CoreError::UnknownModule { name } => CliError::UnknownModule { name },
            CoreError::ModuleNotRegistered { module } => CliError::NotFound {
                what: "registered module".into(),
                identifier: module.to_string(),
            },
            CoreError::ItemNotFound { source_name, item } => CliError::NotFound {
                what: format!("item in {source_name}"),
                identifier: item,
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound { path } => CliError::NoConfig {
                path: path.display().to_string(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { username } => CliError::NoCredentials { username },
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}
