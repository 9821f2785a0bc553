//! Entities - property bags with a representation fixed at construction
//!
//! Calling code works against [`BaseObject`] and never needs to know whether
//! an entity lives in memory or proxies a record in the store.

use std::collections::HashMap;
use std::sync::Arc;
use serde_json::Value;
use crate::{Error, Result};
use crate::gate::PersistenceGate;
use crate::namespace::{ClassIdentity, TableNamespace};
use crate::query::{self, PredicateSet};
use crate::storage::{sqlite, EavStore, RecordId};

/// Parameter access shared by every entity representation
pub trait BaseObject {
    fn class(&self) -> &ClassIdentity;

    /// Backing record id, `None` for in-memory objects
    fn id(&self) -> Option<RecordId>;

    fn get_param(&self, key: &str) -> Result<Option<Value>>;

    fn set_param(&mut self, key: &str, value: Value) -> Result<()>;

    /// Names of all set parameters, sorted
    fn param_keys(&self) -> Result<Vec<String>>;

    fn is_persistent(&self) -> bool {
        self.id().is_some()
    }

    fn set_params<I, K>(&mut self, params: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
        Self: Sized,
    {
        for (key, value) in params {
            self.set_param(key.as_ref(), value)?;
        }
        Ok(())
    }
}

/// Plain in-memory property bag
#[derive(Debug, Clone)]
pub struct MemoryObject {
    class: ClassIdentity,
    params: HashMap<String, Value>,
}

impl MemoryObject {
    pub fn new(class: ClassIdentity) -> Self {
        Self {
            class,
            params: HashMap::new(),
        }
    }
}

impl BaseObject for MemoryObject {
    fn class(&self) -> &ClassIdentity {
        &self.class
    }

    fn id(&self) -> Option<RecordId> {
        None
    }

    fn get_param(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.params.get(key).cloned())
    }

    fn set_param(&mut self, key: &str, value: Value) -> Result<()> {
        self.params.insert(key.to_string(), value);
        Ok(())
    }

    fn param_keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<_> = self.params.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

/// Property bag proxying one record of the class's EAV tables
///
/// Reads and writes go straight to the store; nothing is cached.
#[derive(Debug, Clone)]
pub struct PersistentObject {
    store: Arc<EavStore>,
    class: ClassIdentity,
    tables: TableNamespace,
    id: RecordId,
}

impl PersistentObject {
    /// Allocate a fresh record
    fn create(store: Arc<EavStore>, class: &ClassIdentity) -> Result<Self> {
        let tables = TableNamespace::for_class(class);
        store.ensure_tables(&tables)?;
        let id = store.create_record(&tables)?;
        tracing::debug!("Allocated record {} in {}", id, tables.records);
        Ok(Self { store, class: class.clone(), tables, id })
    }

    /// Wrap an existing record
    fn attach(store: Arc<EavStore>, class: &ClassIdentity, id: RecordId) -> Self {
        let tables = TableNamespace::for_class(class);
        Self { store, class: class.clone(), tables, id }
    }

    pub fn record_id(&self) -> RecordId {
        self.id
    }

    pub fn tables(&self) -> &TableNamespace {
        &self.tables
    }
}

impl BaseObject for PersistentObject {
    fn class(&self) -> &ClassIdentity {
        &self.class
    }

    fn id(&self) -> Option<RecordId> {
        Some(self.id)
    }

    fn get_param(&self, key: &str) -> Result<Option<Value>> {
        self.store.get_property(&self.tables, self.id, key)
    }

    fn set_param(&mut self, key: &str, value: Value) -> Result<()> {
        self.store.set_property(&self.tables, self.id, key, &value)
    }

    fn param_keys(&self) -> Result<Vec<String>> {
        self.store.property_keys(&self.tables, self.id)
    }
}

/// An entity in one of its two representations
#[derive(Debug, Clone)]
pub enum Entity {
    Memory(MemoryObject),
    Persistent(PersistentObject),
}

impl Entity {
    /// All parameters as a map
    pub fn params(&self) -> Result<HashMap<String, Value>> {
        let mut params = HashMap::new();
        for key in self.param_keys()? {
            if let Some(value) = self.get_param(&key)? {
                params.insert(key, value);
            }
        }
        Ok(params)
    }
}

impl BaseObject for Entity {
    fn class(&self) -> &ClassIdentity {
        match self {
            Entity::Memory(obj) => obj.class(),
            Entity::Persistent(obj) => obj.class(),
        }
    }

    fn id(&self) -> Option<RecordId> {
        match self {
            Entity::Memory(obj) => obj.id(),
            Entity::Persistent(obj) => obj.id(),
        }
    }

    fn get_param(&self, key: &str) -> Result<Option<Value>> {
        match self {
            Entity::Memory(obj) => obj.get_param(key),
            Entity::Persistent(obj) => obj.get_param(key),
        }
    }

    fn set_param(&mut self, key: &str, value: Value) -> Result<()> {
        match self {
            Entity::Memory(obj) => obj.set_param(key, value),
            Entity::Persistent(obj) => obj.set_param(key, value),
        }
    }

    fn param_keys(&self) -> Result<Vec<String>> {
        match self {
            Entity::Memory(obj) => obj.param_keys(),
            Entity::Persistent(obj) => obj.param_keys(),
        }
    }
}

/// Builds entities, choosing the representation once per entity
pub struct EntityFactory<'a> {
    gate: &'a PersistenceGate,
}

impl<'a> EntityFactory<'a> {
    pub fn new(gate: &'a PersistenceGate) -> Self {
        Self { gate }
    }

    /// New entity: a fresh record when the store is active, in-memory otherwise
    pub fn construct_uninitialized(&self, class: &ClassIdentity) -> Result<Entity> {
        match self.gate.active_store() {
            Some(store) => Ok(Entity::Persistent(PersistentObject::create(store, class)?)),
            None => {
                tracing::debug!("Constructing in-memory {}", class);
                Ok(Entity::Memory(MemoryObject::new(class.clone())))
            }
        }
    }

    /// New entity that must be persistent; no in-memory fallback
    pub fn construct_persistent(&self, class: &ClassIdentity) -> Result<Entity> {
        let store = self
            .gate
            .active_store()
            .ok_or_else(|| Error::PersistenceRequired(class.to_string()))?;
        Ok(Entity::Persistent(PersistentObject::create(store, class)?))
    }

    /// Existing record by id
    ///
    /// `Ok(None)` when persistence is inactive, [`Error::RecordNotFound`] when
    /// the store is active but the record does not exist.
    pub fn load(&self, class: &ClassIdentity, id: RecordId) -> Result<Option<Entity>> {
        let Some(store) = self.gate.active_store() else {
            return Ok(None);
        };
        let tables = TableNamespace::for_class(class);
        if !store.table_exists(&tables.records)? {
            return Err(Error::RecordNotFound(id));
        }
        sqlite::require_record(&store, &tables, id)?;
        Ok(Some(Entity::Persistent(PersistentObject::attach(store, class, id))))
    }

    /// Entities proxying every record that matches all predicates
    ///
    /// `Ok(None)` under the same conditions as [`query::select_ids`].
    pub fn select_by_params(&self, class: &ClassIdentity, predicates: &PredicateSet) -> Result<Option<Vec<Entity>>> {
        let Some(store) = self.gate.active_store() else {
            tracing::debug!("select_by_params({}): persistence inactive", class);
            return Ok(None);
        };
        let ids = query::select_ids_in(&store, class, predicates)?;

        let entities = ids
            .into_iter()
            .map(|id| Entity::Persistent(PersistentObject::attach(Arc::clone(&store), class, id)))
            .collect();
        Ok(Some(entities))
    }
}
