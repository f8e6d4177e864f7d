// Device status and command endpoints
//
// Module reads, tank reads and action dispatch.

use tracing::{debug, info};

use crate::device::client::DeviceClient;
use crate::device::models::{Attributes, Family, Module};
use crate::error::Error;

impl DeviceClient {
    /// Fetch the full attribute set of a module.
    ///
    /// `GET /api/{family}` or `GET /api/{family}/io`
    pub async fn fetch_module(&self, module: Module) -> Result<Attributes, Error> {
        debug!(%module, "fetching module attributes");
        self.get_attributes(&module.path()).await
    }

    /// Fetch the attributes of a named tank.
    ///
    /// `GET /api/tanks/{name}`
    pub async fn fetch_tank(&self, name: &str) -> Result<Attributes, Error> {
        if name.is_empty() {
            return Err(Error::MissingParameter { field: "tank name" });
        }
        debug!(tank = name, "fetching tank attributes");
        self.get_attributes(&format!("api/tanks/{name}")).await
    }

    /// Run a named action on a family.
    ///
    /// `POST /api/{family}/action/{name}`. The response body carries no
    /// state; it is logged and returned for diagnostics only.
    pub async fn run_action(&self, family: Family, action: &str) -> Result<String, Error> {
        if action.is_empty() {
            return Err(Error::MissingParameter { field: "action" });
        }
        let path = format!("api/{}/action/{action}", family.segment());
        let body = self.post_command(&path).await?;
        info!(%family, action, response = %body, "action dispatched");
        Ok(body)
    }
}
