//! Owner of the store, the record locks and the registered resource types.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::lock::{InMemoryLockManager, LockManager};
use crate::repository::{Repository, ResourceType};
use crate::resources;
use crate::store::{InMemoryStore, ResourceStore};
use crate::warnings::WarningLog;

/// Entry point: hands out per-type [`Repository`] views over one shared
/// store.
///
/// ```
/// use commerce_mock_store::{Context, Engine};
/// use serde_json::json;
///
/// let engine = Engine::new().unwrap();
/// let carts = engine.repository("cart").unwrap();
/// let cart = carts.create(&Context::new("demo"), &json!({ "currency": "EUR" })).unwrap();
/// assert_eq!(cart.version(), 1);
/// ```
pub struct Engine<S: ResourceStore = InMemoryStore, L: LockManager = InMemoryLockManager> {
    store: S,
    locks: L,
    config: StoreConfig,
    warnings: Arc<WarningLog>,
    types: HashMap<&'static str, ResourceType>,
}

impl Engine {
    /// In-memory engine with the built-in resource types and default limits.
    pub fn new() -> Result<Self> {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Result<Self> {
        let mut engine = Self::empty(InMemoryStore::new(), InMemoryLockManager::new(), config)?;
        for resource_type in resources::default_types()? {
            engine.register(resource_type)?;
        }
        Ok(engine)
    }
}

impl<S: ResourceStore, L: LockManager> Engine<S, L> {
    /// An engine with no resource types registered.
    pub fn empty(store: S, locks: L, config: StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            locks,
            config,
            warnings: Arc::new(WarningLog::new()),
            types: HashMap::new(),
        })
    }

    /// Share an existing warning log.
    pub fn with_warnings(mut self, warnings: Arc<WarningLog>) -> Self {
        self.warnings = warnings;
        self
    }

    /// Add a resource type. Type ids must be unique.
    pub fn register(&mut self, resource_type: ResourceType) -> Result<()> {
        let type_id = resource_type.type_id();
        if self.types.contains_key(type_id) {
            return Err(StoreError::Configuration(format!(
                "resource type '{}' is already registered",
                type_id
            )));
        }
        debug!(type_id, "registered resource type");
        self.types.insert(type_id, resource_type);
        Ok(())
    }

    pub fn repository(&self, type_id: &str) -> Result<Repository<'_, S, L>> {
        let resource_type = self.types.get(type_id).ok_or_else(|| {
            StoreError::invalid_input(format!("unknown resource type '{}'", type_id))
        })?;
        Ok(Repository::new(
            &self.store,
            &self.locks,
            &self.config,
            &self.warnings,
            resource_type,
        ))
    }

    /// Registered type ids, sorted.
    pub fn resource_types(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.types.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn locks(&self) -> &L {
        &self.locks
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn warnings(&self) -> &Arc<WarningLog> {
        &self.warnings
    }

    /// Drop all data, idle record locks and emitted warnings.
    pub fn reset(&self) -> Result<()> {
        self.store.clear()?;
        self.locks.clear()?;
        self.warnings.reset();
        Ok(())
    }
}
