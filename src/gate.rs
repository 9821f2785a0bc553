//! Persistence gate - decides whether the relational store is in use
//!
//! The gate is an explicit context object. It owns the configuration and
//! lazily opens the one shared store on first use; the outcome (handle or
//! "unavailable") is cached for the gate's lifetime.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use crate::config::{self, EavbaseConfig, RELATIONAL_MODE};
use crate::guard;
use crate::storage::EavStore;

pub struct PersistenceGate {
    config: EavbaseConfig,
    handle: OnceLock<Option<Arc<EavStore>>>,
}

impl PersistenceGate {
    pub fn new(config: EavbaseConfig) -> Self {
        Self {
            config,
            handle: OnceLock::new(),
        }
    }

    /// Gate with an already-open store, bypassing the on-disk path
    pub fn with_store(config: EavbaseConfig, store: Arc<EavStore>) -> Self {
        let gate = Self::new(config);
        let _ = gate.handle.set(Some(store));
        gate
    }

    pub fn config(&self) -> &EavbaseConfig {
        &self.config
    }

    /// True iff the configured persistence mode selects the relational backend
    pub fn is_persistence_enabled(&self) -> bool {
        self.config.persistence.as_deref() == Some(RELATIONAL_MODE)
    }

    /// Path of the shared store file
    pub fn database_path(&self) -> PathBuf {
        config::database_path_in(&self.config.base_dir(), self.config.store_name())
    }

    /// The shared store handle, or `None` when persistence is disabled or
    /// the store cannot be opened
    pub fn database_handle(&self) -> Option<Arc<EavStore>> {
        if !self.is_persistence_enabled() {
            return None;
        }
        self.handle.get_or_init(|| self.open_store()).clone()
    }

    /// The handle, but only if it also passes the version guard
    pub fn active_store(&self) -> Option<Arc<EavStore>> {
        let store = self.database_handle()?;
        if guard::is_compatible(&store) {
            Some(store)
        } else {
            None
        }
    }

    fn open_store(&self) -> Option<Arc<EavStore>> {
        let path = self.database_path();
        if let Err(e) = config::ensure_db_dir(&path) {
            tracing::warn!("Persistence unavailable, cannot create {}: {}", path.display(), e);
            return None;
        }
        match EavStore::open(&path) {
            Ok(store) => {
                tracing::debug!("Opened store at {}", path.display());
                Some(Arc::new(store))
            }
            Err(e) => {
                tracing::warn!("Persistence unavailable, cannot open {}: {}", path.display(), e);
                None
            }
        }
    }
}

impl std::fmt::Debug for PersistenceGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceGate")
            .field("config", &self.config)
            .field("opened", &self.handle.get().map(Option::is_some))
            .finish()
    }
}
