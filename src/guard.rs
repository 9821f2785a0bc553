//! Schema version guard
//!
//! A soft gate: a store whose version marker is missing, unreadable or
//! different from [`SCHEMA_VERSION`] is treated as if persistence were off.

use crate::storage::EavStore;
pub use crate::storage::schema::SCHEMA_VERSION;

/// Check that the store's version marker matches this build.
pub fn is_compatible(store: &EavStore) -> bool {
    match store.schema_version() {
        Ok(Some(version)) if version == SCHEMA_VERSION => true,
        Ok(Some(version)) => {
            tracing::debug!("store schema version {} != expected {}", version, SCHEMA_VERSION);
            false
        }
        Ok(None) => {
            tracing::debug!("store has no schema version marker");
            false
        }
        Err(e) => {
            tracing::debug!("failed to read schema version: {}", e);
            false
        }
    }
}
