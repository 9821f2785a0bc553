//! SQLite storage implementation

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use serde_json::Value;
use crate::{Result, Error};
use crate::namespace::TableNamespace;
use super::{codec, schema};

/// Opaque record identifier, unique within one records table
pub type RecordId = i64;

/// SQLite-backed EAV engine shared by every class
///
/// The connection sits behind a mutex only so one handle can be shared
/// between threads; no transactions are opened on the caller's behalf.
pub struct EavStore {
    conn: Mutex<Connection>,
}

impl EavStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn: Mutex::new(conn) };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn: Mutex::new(conn) };
        store.initialize_schema()?;
        Ok(store)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create the metadata table and stamp a brand-new store with [`schema::SCHEMA_VERSION`].
    ///
    /// An existing marker is left alone, even when it differs. A store that
    /// already holds tables but no marker stays unmarked; the version guard
    /// decides what to do with either.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn();
        let foreign_tables: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' \
             AND name <> 'eavbase_meta' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\'",
            [],
            |row| row.get(0),
        )?;
        conn.execute(schema::CREATE_META_TABLE, [])?;
        let existing: Option<i64> = conn
            .query_row("SELECT version FROM eavbase_meta LIMIT 1", [], |row| row.get(0))
            .optional()?;
        if existing.is_none() && foreign_tables == 0 {
            conn.execute(
                "INSERT INTO eavbase_meta (version) VALUES (?1)",
                params![schema::SCHEMA_VERSION],
            )?;
        }
        Ok(())
    }

    // ========== Metadata Operations ==========

    /// Read the store's version marker
    pub fn schema_version(&self) -> Result<Option<i64>> {
        self.conn()
            .query_row("SELECT version FROM eavbase_meta LIMIT 1", [], |row| row.get(0))
            .optional()
            .map_err(Into::into)
    }

    /// Overwrite the version marker
    pub fn set_schema_version(&self, version: i64) -> Result<()> {
        self.conn().execute("UPDATE eavbase_meta SET version = ?1", [version])?;
        Ok(())
    }

    /// Check whether a table exists in the store
    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Create a class's records and properties tables if missing
    pub fn ensure_tables(&self, ns: &TableNamespace) -> Result<()> {
        let conn = self.conn();
        for stmt in schema::class_schema_statements(&ns.records, &ns.properties) {
            conn.execute(&stmt, [])?;
        }
        Ok(())
    }

    // ========== Record Operations ==========

    /// Allocate a fresh record id in the class's records table
    pub fn create_record(&self, ns: &TableNamespace) -> Result<RecordId> {
        let conn = self.conn();
        conn.execute(&format!(r#"INSERT INTO "{}" DEFAULT VALUES"#, ns.records), [])?;
        Ok(conn.last_insert_rowid())
    }

    /// Check whether a record id exists
    pub fn record_exists(&self, ns: &TableNamespace, id: RecordId) -> Result<bool> {
        let found: Option<i64> = self
            .conn()
            .query_row(
                &format!(r#"SELECT id FROM "{}" WHERE id = ?1"#, ns.records),
                [id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// All record ids of a class
    pub fn record_ids(&self, ns: &TableNamespace) -> Result<Vec<RecordId>> {
        self.query_ids(&format!(r#"SELECT id FROM "{}""#, ns.records), &[])
    }

    /// Run an id-returning statement with positional text bindings
    pub fn query_ids(&self, sql: &str, bindings: &[String]) -> Result<Vec<RecordId>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(sql)?;
        let ids = stmt
            .query_map(params_from_iter(bindings.iter()), |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<RecordId>>>()?;
        Ok(ids)
    }

    // ========== Property Operations ==========

    /// Get a property value, or `None` if the record has no such key
    ///
    /// With duplicate `(id, key)` rows the most recently written one wins.
    pub fn get_property(&self, ns: &TableNamespace, id: RecordId, key: &str) -> Result<Option<Value>> {
        let frozen: Option<String> = self
            .conn()
            .query_row(
                &format!(
                    r#"SELECT value FROM "{}" WHERE id = ?1 AND key = ?2 ORDER BY rowid DESC LIMIT 1"#,
                    ns.properties
                ),
                params![id, key],
                |row| row.get(0),
            )
            .optional()?;
        frozen.map(|f| codec::thaw(&f)).transpose()
    }

    /// Set a property value, replacing any previous value for the key
    pub fn set_property(&self, ns: &TableNamespace, id: RecordId, key: &str, value: &Value) -> Result<()> {
        let frozen = codec::freeze(value)?;
        let conn = self.conn();
        conn.execute(
            &format!(r#"DELETE FROM "{}" WHERE id = ?1 AND key = ?2"#, ns.properties),
            params![id, key],
        )?;
        conn.execute(
            &format!(r#"INSERT INTO "{}" (id, key, value) VALUES (?1, ?2, ?3)"#, ns.properties),
            params![id, key, frozen],
        )?;
        Ok(())
    }

    /// Distinct property keys of a record, sorted
    pub fn property_keys(&self, ns: &TableNamespace, id: RecordId) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            r#"SELECT DISTINCT key FROM "{}" WHERE id = ?1 ORDER BY key"#,
            ns.properties
        ))?;
        let keys = stmt
            .query_map([id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
    }

    /// Insert a raw property row without replacing existing ones
    ///
    /// Bypasses the one-row-per-key behavior of [`EavStore::set_property`];
    /// used for importing data and for exercising duplicate-row handling.
    pub fn append_property(&self, ns: &TableNamespace, id: RecordId, key: &str, value: &Value) -> Result<()> {
        let frozen = codec::freeze(value)?;
        self.conn().execute(
            &format!(r#"INSERT INTO "{}" (id, key, value) VALUES (?1, ?2, ?3)"#, ns.properties),
            params![id, key, frozen],
        )?;
        Ok(())
    }

    // ========== Statistics ==========

    /// Get store statistics
    pub fn stats(&self) -> Result<StoreStats> {
        let version = self.schema_version()?;
        let conn = self.conn();
        let count_like = |pattern: &str| -> Result<usize> {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name LIKE ?1 ESCAPE '\\'",
                [pattern],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        };
        Ok(StoreStats {
            version,
            records_tables: count_like("%\\_\\_recs")?,
            properties_tables: count_like("%\\_\\_props")?,
        })
    }
}

impl std::fmt::Debug for EavStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EavStore").finish_non_exhaustive()
    }
}

/// Look up a record and fail if it is absent
pub fn require_record(store: &EavStore, ns: &TableNamespace, id: RecordId) -> Result<()> {
    if store.record_exists(ns, id)? {
        Ok(())
    } else {
        Err(Error::RecordNotFound(id))
    }
}

/// Store statistics
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub version: Option<i64>,
    pub records_tables: usize,
    pub properties_tables: usize,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Store Statistics:")?;
        match self.version {
            Some(v) => writeln!(f, "  Schema version: {}", v)?,
            None => writeln!(f, "  Schema version: (missing)")?,
        }
        writeln!(f, "  Records tables: {}", self.records_tables)?;
        writeln!(f, "  Properties tables: {}", self.properties_tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::ClassIdentity;
    use serde_json::json;

    fn widget_ns() -> TableNamespace {
        TableNamespace::for_class(&ClassIdentity::new("shop", "Widget"))
    }

    #[test]
    fn test_fresh_store_is_stamped() {
        let store = EavStore::open_in_memory().unwrap();
        assert_eq!(store.schema_version().unwrap(), Some(schema::SCHEMA_VERSION));
    }

    #[test]
    fn test_reopen_keeps_foreign_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        {
            let store = EavStore::open(&path).unwrap();
            store.set_schema_version(99).unwrap();
        }
        let store = EavStore::open(&path).unwrap();
        assert_eq!(store.schema_version().unwrap(), Some(99));
    }

    #[test]
    fn test_existing_store_without_marker_stays_unmarked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE eavbase__repo__Package__recs (id INTEGER PRIMARY KEY);
                 INSERT INTO eavbase__repo__Package__recs (id) VALUES (7);",
            )
            .unwrap();
        }
        let store = EavStore::open(&path).unwrap();
        assert_eq!(store.schema_version().unwrap(), None);
    }

    #[test]
    fn test_tables_created_on_demand() {
        let store = EavStore::open_in_memory().unwrap();
        let ns = widget_ns();
        assert!(!store.table_exists(&ns.records).unwrap());
        store.ensure_tables(&ns).unwrap();
        assert!(store.table_exists(&ns.records).unwrap());
        assert!(store.table_exists(&ns.properties).unwrap());
        // idempotent
        store.ensure_tables(&ns).unwrap();
    }

    #[test]
    fn test_property_crud() {
        let store = EavStore::open_in_memory().unwrap();
        let ns = widget_ns();
        store.ensure_tables(&ns).unwrap();

        let id = store.create_record(&ns).unwrap();
        assert!(store.record_exists(&ns, id).unwrap());
        assert!(store.get_property(&ns, id, "name").unwrap().is_none());

        store.set_property(&ns, id, "name", &json!("foo")).unwrap();
        store.set_property(&ns, id, "name", &json!("bar")).unwrap();
        store.set_property(&ns, id, "size", &json!(3)).unwrap();

        assert_eq!(store.get_property(&ns, id, "name").unwrap(), Some(json!("bar")));
        assert_eq!(store.property_keys(&ns, id).unwrap(), vec!["name", "size"]);
    }

    #[test]
    fn test_record_ids_and_require() {
        let store = EavStore::open_in_memory().unwrap();
        let ns = widget_ns();
        store.ensure_tables(&ns).unwrap();
        let a = store.create_record(&ns).unwrap();
        let b = store.create_record(&ns).unwrap();

        let mut ids = store.record_ids(&ns).unwrap();
        ids.sort();
        assert_eq!(ids, vec![a, b]);

        assert!(require_record(&store, &ns, a).is_ok());
        assert!(matches!(require_record(&store, &ns, b + 100), Err(Error::RecordNotFound(_))));
    }

    #[test]
    fn test_stats_counts_class_tables() {
        let store = EavStore::open_in_memory().unwrap();
        store.ensure_tables(&widget_ns()).unwrap();
        store
            .ensure_tables(&TableNamespace::for_class(&ClassIdentity::new("shop", "Order")))
            .unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.records_tables, 2);
        assert_eq!(stats.properties_tables, 2);
    }
}
