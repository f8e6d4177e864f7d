// ── Core error types ──
//
// Domain errors from dfp-core. Consumers see four kinds of failure
// (configuration, authentication, transport, lookup) rather than raw HTTP
// details. The `From<dfp_api::Error>` impl does the translation.

use thiserror::Error;

use dfp_api::Module;

/// Coarse classification used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad construction parameters. Fatal, never retried.
    Configuration,
    /// Login failed or the token was refused.
    Authentication,
    /// Network failure, timeout, unexpected status or malformed payload.
    Transport,
    /// Requested module or item is not there.
    Lookup,
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Transport ────────────────────────────────────────────────────
    #[error("Cannot connect to device at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Device request timed out")]
    Timeout,

    #[error("Device API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Lookup ───────────────────────────────────────────────────────
    #[error("Unknown module '{name}'")]
    UnknownModule { name: String },

    #[error("Module {module} is not registered")]
    ModuleNotRegistered { module: Module },

    #[error("Item '{item}' not found in {source_name}")]
    ItemNotFound { source_name: String, item: String },
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } => ErrorKind::Configuration,
            Self::AuthenticationFailed { .. } => ErrorKind::Authentication,
            Self::ConnectionFailed { .. } | Self::Timeout | Self::Api { .. } => {
                ErrorKind::Transport
            }
            Self::UnknownModule { .. }
            | Self::ModuleNotRegistered { .. }
            | Self::ItemNotFound { .. } => ErrorKind::Lookup,
        }
    }

    pub(crate) fn item_not_found(source_name: impl ToString, item: &str) -> Self {
        Self::ItemNotFound {
            source_name: source_name.to_string(),
            item: item.to_owned(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<dfp_api::Error> for CoreError {
    fn from(err: dfp_api::Error) -> Self {
        match err {
            dfp_api::Error::MissingParameter { field } => CoreError::Config {
                message: format!("{field} must not be empty"),
            },
            dfp_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            dfp_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            dfp_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(|u| u.to_string())
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            dfp_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            dfp_api::Error::Status { status, body } => CoreError::Api {
                message: format!("HTTP {status}: {body}"),
                status: Some(status),
            },
            dfp_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("malformed response: {message}"),
                status: None,
            },
        }
    }
}
