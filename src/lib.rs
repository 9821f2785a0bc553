//! # eavbase - Dual-mode property-bag objects
//!
//! Base objects are simple key/value property bags. When the configured
//! persistence mode selects the relational backend, the same objects are
//! transparently backed by rows in an entity-attribute-value (EAV) table
//! pair inside one shared SQLite store.
//!
//! eavbase provides:
//! - A persistence gate deciding, from configuration, whether the store is used
//! - A schema-version guard that must pass before the store is touched
//! - Deterministic, collision-free class to table-name mapping
//! - A query builder compiling key=value conjunctions into parameterized self-joins
//! - An entity factory choosing the representation once, at construction

pub mod config;
pub mod entity;
pub mod gate;
pub mod guard;
pub mod namespace;
pub mod query;
pub mod storage;
pub mod ui;

// Re-exports for convenient access
pub use config::EavbaseConfig;
pub use entity::{BaseObject, Entity, EntityFactory, MemoryObject, PersistentObject};
pub use gate::PersistenceGate;
pub use namespace::{ClassIdentity, TableBase, TableNamespace};
pub use query::{Predicate, PredicateSet, SelectIds};
pub use storage::{EavStore, RecordId};

/// Result type alias for eavbase operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for eavbase operations
///
/// Soft conditions (persistence disabled, incompatible schema, missing
/// tables, unreachable store) never show up here; they degrade to `None`,
/// in-memory fallback or empty results.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid class identity: {0}")]
    InvalidClass(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Value codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Persistence required for {0} but the store is unavailable")]
    PersistenceRequired(String),

    #[error("Record not found: {0}")]
    RecordNotFound(RecordId),
}
