//! Build-once ownership of the search handler registry.
//!
//! [`SearchHandlerManager`] builds the registry lazily on first use. Callers
//! racing the first build block until it completes and then share the same
//! `Arc`. [`refresh`](SearchHandlerManager::refresh) builds a replacement
//! under a lock and swaps it in; readers holding the previous registry keep
//! using it until they drop it.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use tracing::info;

use super::{FieldRegistrationSource, SearchHandlerRegistry};
use crate::config::RegistryConfig;
use crate::error::RegistryError;

/// Shares one built [`SearchHandlerRegistry`] across threads.
pub struct SearchHandlerManager {
    source: Arc<dyn FieldRegistrationSource>,
    config: RegistryConfig,
    current: RwLock<Arc<OnceCell<Arc<SearchHandlerRegistry>>>>,
    refresh_lock: Mutex<()>,
}

impl SearchHandlerManager {
    /// Creates a manager. Nothing is built until the first lookup.
    pub fn new(source: Arc<dyn FieldRegistrationSource>, config: RegistryConfig) -> Self {
        Self {
            source,
            config,
            current: RwLock::new(Arc::new(OnceCell::new())),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Returns the built registry, building it on first call.
    ///
    /// A failed build is not cached; the next call retries.
    pub fn registry(&self) -> Result<Arc<SearchHandlerRegistry>, RegistryError> {
        let cell = Arc::clone(&*self.current.read());
        cell.get_or_try_init(|| self.build()).map(Arc::clone)
    }

    /// Returns `true` once a registry has been built.
    pub fn is_built(&self) -> bool {
        self.current.read().get().is_some()
    }

    /// Builds a fresh registry and makes it current.
    ///
    /// Refreshes are serialized. On failure the current registry is kept.
    pub fn refresh(&self) -> Result<Arc<SearchHandlerRegistry>, RegistryError> {
        let _guard = self.refresh_lock.lock();
        let registry = self.build()?;

        let cell = OnceCell::with_value(Arc::clone(&registry));
        *self.current.write() = Arc::new(cell);

        info!("Search handler registry refreshed");
        Ok(registry)
    }

    /// Returns the configuration used for builds.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn build(&self) -> Result<Arc<SearchHandlerRegistry>, RegistryError> {
        let registry = SearchHandlerRegistry::build(self.source.as_ref(), &self.config)?;
        info!(
            searchers = registry.get_all_searchers().len(),
            clause_names = registry.get_jql_clause_names_all().len(),
            "Built search handler registry"
        );
        Ok(Arc::new(registry))
    }
}

impl std::fmt::Debug for SearchHandlerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchHandlerManager")
            .field("built", &self.is_built())
            .field("config", &self.config)
            .finish()
    }
}
