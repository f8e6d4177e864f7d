use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::Error;

/// How long the device honours a token issued by `/token-auth`.
pub const TOKEN_LEASE: Duration = Duration::from_secs(5 * 60 * 60);

/// Connection identity for one device: where it lives and who logs in.
///
/// Immutable after construction. Empty values are rejected up front so a
/// misconfigured device fails at startup instead of on the first poll.
#[derive(Debug, Clone)]
pub struct Credentials {
    base_url: Url,
    username: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(base_url: &str, username: &str, password: SecretString) -> Result<Self, Error> {
        if base_url.trim().is_empty() {
            return Err(Error::MissingParameter { field: "url" });
        }
        if username.is_empty() {
            return Err(Error::MissingParameter { field: "username" });
        }
        if password.expose_secret().is_empty() {
            return Err(Error::MissingParameter { field: "password" });
        }

        let base_url = Url::parse(base_url.trim())?;

        Ok(Self {
            base_url,
            username: username.to_owned(),
            password,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }

    /// `true` when both credential sets address the same device as the
    /// same user with the same password.
    pub fn same_identity(&self, other: &Self) -> bool {
        self.base_url == other.base_url
            && self.username == other.username
            && self.password.expose_secret() == other.password.expose_secret()
    }
}

/// A bearer token and the instant after which it must be renewed.
#[derive(Debug, Clone)]
pub struct Token {
    value: SecretString,
    expires_at: DateTime<Utc>,
}

impl Token {
    pub fn new(value: SecretString, lease: Duration) -> Self {
        let lease = chrono::Duration::from_std(lease).unwrap_or(chrono::Duration::MAX);
        let expires_at = Utc::now()
            .checked_add_signed(lease)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self { value, expires_at }
    }

    pub fn value(&self) -> &SecretString {
        &self.value
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}
