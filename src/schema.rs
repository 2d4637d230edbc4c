use rusqlite::Connection;

use crate::errors::EavIndexError;

pub const ENTITY_TABLE: &str = "catalog_entity";
pub const ATTRIBUTE_TABLE: &str = "eav_attribute";
pub const STORE_TABLE: &str = "store";
pub const DECIMAL_VALUE_TABLE: &str = "eav_decimal_value";
pub const INT_VALUE_TABLE: &str = "eav_int_value";

pub const DECIMAL_INDEX_TABLE: &str = "catalog_index_eav_decimal";
pub const DECIMAL_SCRATCH_TABLE: &str = "catalog_index_eav_decimal_idx";
pub const SOURCE_INDEX_TABLE: &str = "catalog_index_eav_source";
pub const SOURCE_SCRATCH_TABLE: &str = "catalog_index_eav_source_idx";

/// Identifies the canonical entity table and its identifier column.
///
/// The identifier is not assumed to be a fixed physical column; deployments
/// that key entities by a link field supply their own metadata value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityMetadata {
    pub entity_table: String,
    pub identifier_field: String,
}

impl Default for EntityMetadata {
    fn default() -> Self {
        Self {
            entity_table: ENTITY_TABLE.to_string(),
            identifier_field: "entity_id".to_string(),
        }
    }
}

/// Declared column set for one index-table role.
///
/// The synchronizer works from these descriptors instead of introspecting
/// table schemas at run time; every index table role shares the layout
/// declared here unless a caller supplies its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexTableLayout {
    pub columns: &'static [&'static str],
    pub key_columns: &'static [&'static str],
}

pub const EAV_INDEX_LAYOUT: IndexTableLayout = IndexTableLayout {
    columns: &["entity_id", "attribute_id", "store_id", "value"],
    key_columns: &["entity_id", "attribute_id", "store_id"],
};

pub fn ensure_schema(conn: &Connection) -> Result<(), EavIndexError> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;
        CREATE TABLE IF NOT EXISTS catalog_entity (
            entity_id INTEGER PRIMARY KEY AUTOINCREMENT,
            sku       TEXT NOT NULL,
            type_id   TEXT NOT NULL DEFAULT 'simple'
        );
        CREATE TABLE IF NOT EXISTS store (
            store_id INTEGER PRIMARY KEY,
            code     TEXT NOT NULL UNIQUE
        );
        INSERT OR IGNORE INTO store(store_id, code) VALUES (0, 'admin');
        CREATE TABLE IF NOT EXISTS eav_attribute (
            attribute_id   INTEGER PRIMARY KEY AUTOINCREMENT,
            attribute_code TEXT NOT NULL UNIQUE,
            backend_type   TEXT NOT NULL,
            frontend_input TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS eav_decimal_value (
            entity_id    INTEGER NOT NULL,
            attribute_id INTEGER NOT NULL,
            store_id     INTEGER NOT NULL DEFAULT 0,
            value        REAL,
            PRIMARY KEY (entity_id, attribute_id, store_id)
        );
        CREATE TABLE IF NOT EXISTS eav_int_value (
            entity_id    INTEGER NOT NULL,
            attribute_id INTEGER NOT NULL,
            store_id     INTEGER NOT NULL DEFAULT 0,
            value        INTEGER,
            PRIMARY KEY (entity_id, attribute_id, store_id)
        );
        CREATE TABLE IF NOT EXISTS catalog_index_eav_decimal_idx (
            entity_id    INTEGER NOT NULL,
            attribute_id INTEGER NOT NULL,
            store_id     INTEGER NOT NULL,
            value        REAL,
            PRIMARY KEY (entity_id, attribute_id, store_id)
        );
        CREATE TABLE IF NOT EXISTS catalog_index_eav_decimal (
            entity_id    INTEGER NOT NULL,
            attribute_id INTEGER NOT NULL,
            store_id     INTEGER NOT NULL,
            value        REAL NOT NULL,
            PRIMARY KEY (entity_id, attribute_id, store_id)
        );
        CREATE TABLE IF NOT EXISTS catalog_index_eav_decimal_replica (
            entity_id    INTEGER NOT NULL,
            attribute_id INTEGER NOT NULL,
            store_id     INTEGER NOT NULL,
            value        REAL NOT NULL,
            PRIMARY KEY (entity_id, attribute_id, store_id)
        );
        CREATE TABLE IF NOT EXISTS catalog_index_eav_source_idx (
            entity_id    INTEGER NOT NULL,
            attribute_id INTEGER NOT NULL,
            store_id     INTEGER NOT NULL,
            value        INTEGER,
            PRIMARY KEY (entity_id, attribute_id, store_id)
        );
        CREATE TABLE IF NOT EXISTS catalog_index_eav_source (
            entity_id    INTEGER NOT NULL,
            attribute_id INTEGER NOT NULL,
            store_id     INTEGER NOT NULL,
            value        INTEGER NOT NULL,
            PRIMARY KEY (entity_id, attribute_id, store_id)
        );
        CREATE TABLE IF NOT EXISTS catalog_index_eav_source_replica (
            entity_id    INTEGER NOT NULL,
            attribute_id INTEGER NOT NULL,
            store_id     INTEGER NOT NULL,
            value        INTEGER NOT NULL,
            PRIMARY KEY (entity_id, attribute_id, store_id)
        );
        "#,
    )
    .map_err(|e| EavIndexError::schema(e.to_string()))?;
    Ok(())
}
