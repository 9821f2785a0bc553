//! Database schema definitions

/// Schema version this build reads and writes.
pub const SCHEMA_VERSION: i64 = 1;

/// SQL to create the metadata table holding the version marker
pub const CREATE_META_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS eavbase_meta (
    version INTEGER NOT NULL
)
"#;

/// SQL to create a class's records table. Table names are produced by
/// `namespace::table_name` and are always plain identifiers.
pub fn create_records_table(table: &str) -> String {
    format!(
        r#"CREATE TABLE IF NOT EXISTS "{table}" (
    id INTEGER PRIMARY KEY AUTOINCREMENT
)"#
    )
}

/// SQL to create a class's properties table
///
/// `(id, key)` is deliberately not unique; duplicate keys on one record are
/// tolerated by readers.
pub fn create_properties_table(table: &str) -> String {
    format!(
        r#"CREATE TABLE IF NOT EXISTS "{table}" (
    id INTEGER NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL
)"#
    )
}

/// SQL to create the lookup indexes for a properties table
pub fn create_properties_indexes(table: &str) -> Vec<String> {
    vec![
        format!(r#"CREATE INDEX IF NOT EXISTS "{table}_id" ON "{table}"(id)"#),
        format!(r#"CREATE INDEX IF NOT EXISTS "{table}_kv" ON "{table}"(key, value)"#),
    ]
}

/// All statements needed to make a class's table pair usable
pub fn class_schema_statements(records: &str, properties: &str) -> Vec<String> {
    let mut stmts = vec![create_records_table(records), create_properties_table(properties)];
    stmts.extend(create_properties_indexes(properties));
    stmts
}
