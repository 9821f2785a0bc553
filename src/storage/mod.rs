//! Storage Layer - SQLite-backed EAV engine
//!
//! One shared store holds, per class:
//! - a records table: `<recs>(id)`
//! - a properties table: `<props>(id, key, value)`
//!
//! plus a single `eavbase_meta(version)` table carrying the schema version marker.

pub mod codec;
pub mod schema;
pub mod sqlite;

pub use codec::{freeze, thaw};
pub use sqlite::{EavStore, RecordId, StoreStats};
