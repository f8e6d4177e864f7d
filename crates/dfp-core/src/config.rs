// ── Runtime connection configuration ──
//
// These types describe *how* to reach one device and how often to refresh
// its cache. They carry credential data but never touch disk; the config
// crate or the caller builds a `ControllerConfig` and hands it in.

use std::time::Duration;

use dfp_api::transport::{TlsMode, TransportConfig};
use dfp_api::{Credentials, TOKEN_LEASE};
use secrecy::SecretString;

use crate::error::CoreError;

pub const DEFAULT_CACHE_INTERVAL: Duration = Duration::from_millis(1000);
pub const DEFAULT_FAILURE_BACKOFF: Duration = Duration::from_secs(30);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for one device connection.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Device base URL (e.g., `http://192.168.1.20`).
    pub url: String,
    pub username: String,
    pub password: SecretString,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Delay between refresh passes after a successful pass.
    pub cache_interval: Duration,
    /// Delay after a failed pass, instead of `cache_interval`.
    pub failure_backoff: Duration,
    /// Lifetime trusted for a freshly acquired token.
    pub token_lease: Duration,
}

impl ControllerConfig {
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: SecretString,
    ) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password,
            tls: TlsVerification::default(),
            timeout: DEFAULT_TIMEOUT,
            cache_interval: DEFAULT_CACHE_INTERVAL,
            failure_backoff: DEFAULT_FAILURE_BACKOFF,
            token_lease: TOKEN_LEASE,
        }
    }

    pub fn with_cache_interval(mut self, interval: Duration) -> Self {
        self.cache_interval = interval;
        self
    }

    pub fn with_failure_backoff(mut self, backoff: Duration) -> Self {
        self.failure_backoff = backoff;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_token_lease(mut self, lease: Duration) -> Self {
        self.token_lease = lease;
        self
    }

    /// Validate and build the connection identity.
    pub fn credentials(&self) -> Result<Credentials, CoreError> {
        Ok(Credentials::new(&self.url, &self.username, self.password.clone())?)
    }

    /// Reject values the refresh loop cannot run with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.cache_interval.is_zero() {
            return Err(CoreError::Config {
                message: "cache interval must be greater than zero".into(),
            });
        }
        if self.timeout.is_zero() {
            return Err(CoreError::Config {
                message: "request timeout must be greater than zero".into(),
            });
        }
        Ok(())
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: tls_to_transport(&self.tls),
            timeout: self.timeout,
            token_lease: self.token_lease,
        }
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
