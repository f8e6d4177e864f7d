// Token-authenticated session
//
// Owns the credentials and the current bearer token. Every authenticated
// request goes through `send`, which renews the token first when it is
// missing or past its lease. Renewal is serialized by the token mutex so
// concurrent callers never log in twice for the same expiry.

use std::time::Duration;

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};
use url::Url;

use crate::auth::{Credentials, Token};
use crate::error::Error;
use crate::transport::TransportConfig;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

/// Authenticated transport for one device.
pub struct Session {
    http: reqwest::Client,
    credentials: Credentials,
    lease: Duration,
    token: Mutex<Option<Token>>,
}

impl Session {
    /// Create a session whose HTTP client is built from `transport`.
    ///
    /// No network traffic happens here; the first authenticated call
    /// performs the initial login.
    pub fn new(credentials: Credentials, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, credentials, transport.token_lease))
    }

    /// Create a session around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, credentials: Credentials, lease: Duration) -> Self {
        Self {
            http,
            credentials,
            lease,
            token: Mutex::new(None),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Whether a token is held and still inside its lease.
    pub async fn has_valid_token(&self) -> bool {
        self.token
            .lock()
            .await
            .as_ref()
            .is_some_and(|t| !t.is_expired())
    }

    /// Log in with the stored credentials and keep the returned token.
    ///
    /// On failure the previously held token (if any) stays in place.
    pub async fn acquire_token(&self) -> Result<(), Error> {
        let mut slot = self.token.lock().await;
        let token = self.login().await?;
        *slot = Some(token);
        Ok(())
    }

    /// `POST {base}/token-auth` with `{username, password}`.
    async fn login(&self) -> Result<Token, Error> {
        let url = self.url("token-auth")?;
        debug!("logging in at {}", url);

        let body = json!({
            "username": self.credentials.username(),
            "password": self.credentials.password().expose_secret(),
        });

        let resp = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {body}"),
            });
        }

        let text = resp.text().await.map_err(Error::Transport)?;
        let parsed: TokenResponse =
            serde_json::from_str(&text).map_err(|e| Error::Authentication {
                message: format!("login response carried no token: {e}"),
            })?;

        debug!("login successful");
        Ok(Token::new(SecretString::from(parsed.token), self.lease))
    }

    /// Return the bearer to attach, renewing first if needed.
    ///
    /// A failed renewal is logged and the stale token is still handed
    /// out, so a token the device still honours survives an auth-server
    /// hiccup. With no token at all the request goes out bare and the
    /// device rejects it.
    async fn bearer(&self) -> Option<SecretString> {
        let mut slot = self.token.lock().await;

        let needs_renewal = slot.as_ref().is_none_or(Token::is_expired);
        if needs_renewal {
            match self.login().await {
                Ok(token) => *slot = Some(token),
                Err(e) => {
                    error!(error = %e, "token renewal failed");
                    if slot.is_some() {
                        warn!("retrying with the previous token");
                    }
                }
            }
        }

        slot.as_ref().map(|t| t.value().clone())
    }

    /// Build a full URL: `{base}/{path}`.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.credentials.base_url().as_str().trim_end_matches('/');
        let full = format!("{}/{}", base, path.trim_start_matches('/'));
        Ok(Url::parse(&full)?)
    }

    /// Send an authenticated request and return the successful response.
    ///
    /// 401/403 map to [`Error::Authentication`]; any other non-2xx status
    /// maps to [`Error::Status`] with the body preserved.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, Error> {
        let url = self.url(path)?;
        let bearer = self.bearer().await;

        debug!("{} {}", method, url);

        let mut req = self.http.request(method, url);
        if let Some(ref token) = bearer {
            req = req.bearer_auth(token.expose_secret());
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(Error::Transport)?;
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::Authentication {
                message: format!("device rejected bearer token (HTTP {status})"),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(resp)
    }

    /// Authenticated GET decoded as JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let resp = self.send(Method::GET, path, None).await?;
        let body = resp.text().await.map_err(Error::Transport)?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}
