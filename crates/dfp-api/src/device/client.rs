// Device HTTP client
//
// Wraps a `Session` with envelope unwrapping. Endpoint methods live in
// sibling files as inherent impls to keep this module about transport.

use reqwest::Method;

use crate::auth::Credentials;
use crate::device::models::{Attributes, DataEnvelope};
use crate::error::Error;
use crate::session::Session;
use crate::transport::TransportConfig;

/// HTTP client for one token-protected device.
pub struct DeviceClient {
    session: Session,
}

impl DeviceClient {
    /// Create a client from credentials and a `TransportConfig`.
    pub fn new(credentials: Credentials, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            session: Session::new(credentials, transport)?,
        })
    }

    /// The underlying session (for explicit token management).
    pub fn session(&self) -> &Session {
        &self.session
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// GET a path and unwrap `data.attributes`.
    pub(crate) async fn get_attributes(&self, path: &str) -> Result<Attributes, Error> {
        let envelope: DataEnvelope = self.session.get_json(path).await?;
        Ok(envelope.data.attributes)
    }

    /// POST a bodiless command and return the raw response text.
    pub(crate) async fn post_command(&self, path: &str) -> Result<String, Error> {
        let resp = self.session.send(Method::POST, path, None).await?;
        resp.text().await.map_err(Error::Transport)
    }
}
