// ── Controller facade ──
//
// Full lifecycle for one device connection: authenticated client, module
// cache, background refresh and the read/action surface used by entities.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use dfp_api::{Credentials, DeviceClient, Family, Module};

use crate::config::ControllerConfig;
use crate::error::CoreError;
use crate::store::refresh::refresh_task;
use crate::store::{CacheStore, Cached, RefreshState};

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. One controller exists per
/// device identity; see [`Registry`](crate::Registry) for sharing.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    client: DeviceClient,
    store: CacheStore,
    available: watch::Sender<bool>,
    refresh_state: watch::Sender<RefreshState>,
    cancel: CancellationToken,
    task_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Controller {
    /// Create a controller from configuration. Validates eagerly but does
    /// NOT touch the network; call [`start()`](Self::start) to begin
    /// background refresh.
    pub fn new(config: ControllerConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let credentials = config.credentials()?;
        Self::from_credentials(config, credentials)
    }

    pub(crate) fn from_credentials(
        config: ControllerConfig,
        credentials: Credentials,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let client = DeviceClient::new(credentials, &config.transport())?;
        let (available, _) = watch::channel(false);
        let (refresh_state, _) = watch::channel(RefreshState::Idle);

        Ok(Self {
            inner: Arc::new(ControllerInner {
                config,
                client,
                store: CacheStore::new(),
                available,
                refresh_state,
                cancel: CancellationToken::new(),
                task_handle: Mutex::new(None),
            }),
        })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    pub fn credentials(&self) -> &Credentials {
        self.inner.client.session().credentials()
    }

    pub fn client(&self) -> &DeviceClient {
        &self.inner.client
    }

    pub fn store(&self) -> &CacheStore {
        &self.inner.store
    }

    // ── Registration ─────────────────────────────────────────────

    /// Start tracking a module by name. Unknown names are a
    /// configuration error.
    pub async fn register_module(&self, name: &str) -> Result<Module, CoreError> {
        let module = self.inner.store.register_module(name).await?;
        debug!(%module, "module registered");
        Ok(module)
    }

    /// Start tracking a module. Idempotent.
    pub async fn register(&self, module: Module) {
        if self.inner.store.register(module).await {
            debug!(%module, "module registered");
        }
    }

    /// Bound accessor for one module.
    pub fn module(&self, module: Module) -> ModuleHandle<'_> {
        ModuleHandle {
            controller: self,
            module,
        }
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Read `item` from a module.
    ///
    /// With `use_cache` and a populated cache entry the cached value is
    /// returned. Otherwise the full attribute set is fetched live. Either
    /// way a missing item is a lookup error.
    pub async fn status(
        &self,
        module: Module,
        item: &str,
        use_cache: bool,
    ) -> Result<Value, CoreError> {
        if use_cache {
            match self.inner.store.read(module, item).await {
                Ok(Cached::Value(value)) => return Ok(value),
                Ok(Cached::Pending) | Err(CoreError::ModuleNotRegistered { .. }) => {
                    debug!(%module, item, "cache not populated, reading live");
                }
                Err(e) => return Err(e),
            }
        }
        self.live_status(module, item).await
    }

    /// Read `item` from a module by name.
    pub async fn status_named(
        &self,
        module: &str,
        item: &str,
        use_cache: bool,
    ) -> Result<Value, CoreError> {
        let module = module
            .parse::<Module>()
            .map_err(|_| CoreError::UnknownModule {
                name: module.to_owned(),
            })?;
        self.status(module, item, use_cache).await
    }

    /// Fetch a module live and return `item` from the fresh payload.
    pub async fn live_status(&self, module: Module, item: &str) -> Result<Value, CoreError> {
        let mut attributes = self.inner.client.fetch_module(module).await?;
        attributes
            .remove(item)
            .ok_or_else(|| CoreError::item_not_found(module, item))
    }

    /// Read `item` from a named tank. Tanks are never cached; a tank the
    /// device does not know is a lookup error.
    pub async fn tank_status(&self, name: &str, item: &str) -> Result<Value, CoreError> {
        let mut attributes = self
            .inner
            .client
            .fetch_tank(name)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    CoreError::item_not_found("tanks", name)
                } else {
                    e.into()
                }
            })?;
        attributes
            .remove(item)
            .ok_or_else(|| CoreError::item_not_found(format!("tank {name}"), item))
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Dispatch a named action on a family.
    ///
    /// The cache is not touched; the next refresh pass picks up whatever
    /// state the action produced.
    pub async fn action(&self, family: Family, name: &str) -> Result<(), CoreError> {
        if name.is_empty() {
            return Err(CoreError::Config {
                message: "action name must not be empty".into(),
            });
        }
        self.inner.client.run_action(family, name).await?;
        Ok(())
    }

    // ── Availability ─────────────────────────────────────────────

    /// Whether the most recent refresh pass succeeded.
    pub fn is_available(&self) -> bool {
        *self.inner.available.borrow()
    }

    /// Subscribe to availability changes.
    pub fn availability(&self) -> watch::Receiver<bool> {
        self.inner.available.subscribe()
    }

    /// Subscribe to refresh loop state changes.
    pub fn refresh_state(&self) -> watch::Receiver<RefreshState> {
        self.inner.refresh_state.subscribe()
    }

    // ── Refresh lifecycle ────────────────────────────────────────

    /// Run exactly one refresh pass over all registered modules.
    ///
    /// On success every module is replaced and the device is marked
    /// available. On failure nothing is replaced, the device is marked
    /// unavailable, and the error is returned. A pass with nothing
    /// registered changes nothing.
    pub async fn refresh_once(&self) -> Result<(), CoreError> {
        let inner = &self.inner;
        inner.refresh_state.send_replace(RefreshState::Fetching);

        let client = &inner.client;
        let result = inner
            .store
            .refresh_all(|module| async move {
                client.fetch_module(module).await.map_err(|e| {
                    warn!(
                        %module,
                        role = module.role(),
                        transient = e.is_transient(),
                        error = %e,
                        "module fetch failed"
                    );
                    CoreError::from(e)
                })
            })
            .await;

        match result {
            Ok(0) => {
                inner.refresh_state.send_replace(RefreshState::Idle);
                Ok(())
            }
            Ok(modules) => {
                if !inner.available.send_replace(true) {
                    info!("device available");
                }
                inner.refresh_state.send_replace(RefreshState::Available);
                debug!(modules, "refresh pass committed");
                Ok(())
            }
            Err(e) => {
                if inner.available.send_replace(false) {
                    warn!(error = %e, "device unavailable");
                }
                inner.refresh_state.send_replace(RefreshState::Unavailable);
                Err(e)
            }
        }
    }

    /// Spawn the background refresh task. Idempotent; must be called
    /// from within a Tokio runtime.
    pub async fn start(&self) {
        let mut handle = self.inner.task_handle.lock().await;
        if handle.is_some() {
            return;
        }
        if self.inner.cancel.is_cancelled() {
            warn!("controller already shut down, not starting refresh");
            return;
        }

        let config = &self.inner.config;
        *handle = Some(tokio::spawn(refresh_task(
            self.clone(),
            config.cache_interval,
            config.failure_backoff,
            self.inner.cancel.clone(),
        )));
        info!(url = %self.credentials().base_url(), "background refresh started");
    }

    /// Stop the background task and wait for it to exit. The controller
    /// keeps serving cached and live reads but never refreshes again.
    ///
    /// A pass cut short by the cancel leaves the refresh state at
    /// `Stopped`, never at `Fetching`.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        if let Some(handle) = self.inner.task_handle.lock().await.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "refresh task ended abnormally");
            }
        }
        self.inner.refresh_state.send_replace(RefreshState::Stopped);
        debug!("controller shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }
}

// ── ModuleHandle ─────────────────────────────────────────────────

/// Per-module accessor: status/IO reads and family action dispatch.
#[derive(Clone, Copy)]
pub struct ModuleHandle<'a> {
    controller: &'a Controller,
    module: Module,
}

impl ModuleHandle<'_> {
    pub fn module(&self) -> Module {
        self.module
    }

    pub async fn status(&self, item: &str, use_cache: bool) -> Result<Value, CoreError> {
        self.controller.status(self.module, item, use_cache).await
    }

    /// Cache-only read; never goes to the network.
    pub async fn read(&self, item: &str) -> Result<Cached, CoreError> {
        self.controller.store().read(self.module, item).await
    }

    pub async fn action(&self, name: &str) -> Result<(), CoreError> {
        self.controller.action(self.module.family(), name).await
    }
}
