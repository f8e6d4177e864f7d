// ── Module attribute cache ──
//
// A single async RwLock guards the whole map. Readers take short read
// guards; the refresh pass takes the write guard for its entire
// fetch-and-swap so every module flips to the new snapshot together.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde_json::Value;
use tokio::sync::RwLock;

use dfp_api::{Attributes, Module};

use crate::error::CoreError;

/// Result of a cache lookup for a registered module.
#[derive(Debug, Clone, PartialEq)]
pub enum Cached {
    /// The module is registered but no refresh pass has filled it yet.
    Pending,
    /// The last fetched value of the item.
    Value(Value),
}

/// Latest attribute snapshot per registered module.
///
/// An empty map means "registered, not yet populated". Entries are
/// created by registration and never removed.
#[derive(Debug, Default)]
pub struct CacheStore {
    entries: RwLock<BTreeMap<Module, Attributes>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module by name. Unknown names are a configuration error.
    pub async fn register_module(&self, name: &str) -> Result<Module, CoreError> {
        let module = Module::from_str(name).map_err(|_| CoreError::Config {
            message: format!(
                "unknown module '{name}' (expected dfp, dfpIO, tfp or tfpIO)"
            ),
        })?;
        self.register(module).await;
        Ok(module)
    }

    /// Add an empty placeholder for `module`. Returns `true` if it was new.
    pub async fn register(&self, module: Module) -> bool {
        let mut entries = self.entries.write().await;
        if entries.contains_key(&module) {
            return false;
        }
        entries.insert(module, Attributes::new());
        true
    }

    pub async fn is_registered(&self, module: Module) -> bool {
        self.entries.read().await.contains_key(&module)
    }

    /// Registered modules in stable order.
    pub async fn modules(&self) -> Vec<Module> {
        self.entries.read().await.keys().copied().collect()
    }

    /// Look up the cached value of `item`.
    ///
    /// Fails if the module is not registered, or if the module has data
    /// but `item` is not part of it. A module still waiting for its first
    /// refresh yields [`Cached::Pending`].
    pub async fn read(&self, module: Module, item: &str) -> Result<Cached, CoreError> {
        let entries = self.entries.read().await;
        let attributes = entries
            .get(&module)
            .ok_or(CoreError::ModuleNotRegistered { module })?;

        if attributes.is_empty() {
            return Ok(Cached::Pending);
        }

        attributes
            .get(item)
            .cloned()
            .map(Cached::Value)
            .ok_or_else(|| CoreError::item_not_found(module, item))
    }

    /// Look up by module name, for callers holding unparsed input.
    pub async fn read_named(&self, module: &str, item: &str) -> Result<Cached, CoreError> {
        let module = Module::from_str(module).map_err(|_| CoreError::UnknownModule {
            name: module.to_owned(),
        })?;
        self.read(module, item).await
    }

    /// Full copy of a module's current snapshot.
    pub async fn snapshot(&self, module: Module) -> Option<Attributes> {
        self.entries.read().await.get(&module).cloned()
    }

    /// Run one all-or-nothing refresh over every registered module.
    ///
    /// The write guard is held for the whole pass. Results are staged and
    /// committed only if every fetch succeeds; on the first error nothing
    /// is replaced and the previous snapshot stays visible. Returns the
    /// number of modules replaced (0 when nothing is registered).
    pub(crate) async fn refresh_all<F, Fut>(&self, mut fetch: F) -> Result<usize, CoreError>
    where
        F: FnMut(Module) -> Fut,
        Fut: Future<Output = Result<Attributes, CoreError>>,
    {
        let mut entries = self.entries.write().await;
        let modules: Vec<Module> = entries.keys().copied().collect();

        let mut staged = Vec::with_capacity(modules.len());
        for module in modules {
            let attributes = fetch(module).await?;
            staged.push((module, attributes));
        }

        let replaced = staged.len();
        for (module, attributes) in staged {
            entries.insert(module, attributes);
        }
        Ok(replaced)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;

    fn attrs(value: Value) -> Attributes {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn registered_module_reads_pending() {
        let store = CacheStore::new();
        for name in ["dfp", "dfpIO", "tfp", "tfpIO", "primary-status"] {
            let module = store.register_module(name).await.unwrap();
            assert_eq!(store.read(module, "anything").await.unwrap(), Cached::Pending);
        }
    }

    #[tokio::test]
    async fn register_is_idempotent() {
        let store = CacheStore::new();
        assert!(store.register(Module::Dfp).await);
        assert!(!store.register(Module::Dfp).await);
        assert_eq!(store.modules().await, vec![Module::Dfp]);
    }

    #[tokio::test]
    async fn unknown_module_names_are_rejected() {
        let store = CacheStore::new();

        let err = store.register_module("tank").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = store.read_named("tank", "level").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);
    }

    #[tokio::test]
    async fn unregistered_module_read_fails() {
        let store = CacheStore::new();
        let err = store.read(Module::Tfp, "temp").await.unwrap_err();
        assert!(matches!(err, CoreError::ModuleNotRegistered { module: Module::Tfp }));
    }

    #[tokio::test]
    async fn refresh_replaces_every_module() {
        let store = CacheStore::new();
        store.register(Module::Dfp).await;
        store.register(Module::DfpIo).await;

        let replaced = store
            .refresh_all(|module| async move {
                Ok(match module {
                    Module::Dfp => attrs(json!({ "temp": 42 })),
                    _ => attrs(json!({ "relay": true })),
                })
            })
            .await
            .unwrap();

        assert_eq!(replaced, 2);
        assert_eq!(store.read(Module::Dfp, "temp").await.unwrap(), Cached::Value(json!(42)));
        assert_eq!(
            store.read(Module::DfpIo, "relay").await.unwrap(),
            Cached::Value(json!(true))
        );
    }

    #[tokio::test]
    async fn refresh_replaces_instead_of_merging() {
        let store = CacheStore::new();
        store.register(Module::Dfp).await;

        store
            .refresh_all(|_| async { Ok(attrs(json!({ "temp": 1, "old": 0 }))) })
            .await
            .unwrap();
        store
            .refresh_all(|_| async { Ok(attrs(json!({ "temp": 2 }))) })
            .await
            .unwrap();

        assert_eq!(store.snapshot(Module::Dfp).await.unwrap(), attrs(json!({ "temp": 2 })));
        let err = store.read(Module::Dfp, "old").await.unwrap_err();
        assert!(matches!(err, CoreError::ItemNotFound { .. }));
    }

    #[tokio::test]
    async fn failed_pass_commits_nothing() {
        let store = CacheStore::new();
        store.register(Module::Dfp).await;
        store.register(Module::Tfp).await;

        store
            .refresh_all(|_| async { Ok(attrs(json!({ "temp": 1 }))) })
            .await
            .unwrap();

        let result = store
            .refresh_all(|module| async move {
                match module {
                    Module::Dfp => Ok(attrs(json!({ "temp": 2 }))),
                    _ => Err(CoreError::Timeout),
                }
            })
            .await;

        assert!(matches!(result, Err(CoreError::Timeout)));
        assert_eq!(store.read(Module::Dfp, "temp").await.unwrap(), Cached::Value(json!(1)));
        assert_eq!(store.read(Module::Tfp, "temp").await.unwrap(), Cached::Value(json!(1)));
    }

    #[tokio::test]
    async fn empty_store_refresh_is_noop() {
        let store = CacheStore::new();
        let replaced = store
            .refresh_all(|_| async { Err(CoreError::Timeout) })
            .await
            .unwrap();
        assert_eq!(replaced, 0);
    }
}
