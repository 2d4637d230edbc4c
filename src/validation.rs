//! Advisory integrity checks over the live index and EAV value tables.

use serde::Serialize;

use crate::{errors::EavIndexError, metrics::InstrumentedConnection, schema::EntityMetadata};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IndexIntegrityReport {
    pub indexed_rows: i64,
    pub orphan_index_rows: i64,
    pub unknown_attribute_rows: i64,
    pub orphan_value_rows: i64,
}

impl IndexIntegrityReport {
    pub fn merge(&mut self, other: &IndexIntegrityReport) {
        self.indexed_rows += other.indexed_rows;
        self.orphan_index_rows += other.orphan_index_rows;
        self.unknown_attribute_rows += other.unknown_attribute_rows;
        self.orphan_value_rows += other.orphan_value_rows;
    }

    pub fn has_issues(&self) -> bool {
        self.orphan_index_rows > 0 || self.unknown_attribute_rows > 0 || self.orphan_value_rows > 0
    }
}

/// Inspect one live index table for rows referencing vanished entities or
/// unknown attributes. Never mutates.
pub fn validate_index_table(
    conn: &InstrumentedConnection<'_>,
    metadata: &EntityMetadata,
    index_table: &str,
) -> Result<IndexIntegrityReport, EavIndexError> {
    let mut report = IndexIntegrityReport {
        indexed_rows: query_single(conn, &format!("SELECT COUNT(*) FROM {index_table}"))?,
        ..IndexIntegrityReport::default()
    };
    report.orphan_index_rows = query_single(
        conn,
        &format!(
            "SELECT COUNT(*) FROM {index_table} i \
             LEFT JOIN {entity} e ON e.{id} = i.entity_id \
             WHERE e.{id} IS NULL",
            entity = metadata.entity_table,
            id = metadata.identifier_field,
        ),
    )?;
    report.unknown_attribute_rows = query_single(
        conn,
        &format!(
            "SELECT COUNT(*) FROM {index_table} i \
             LEFT JOIN eav_attribute a ON a.attribute_id = i.attribute_id \
             WHERE a.attribute_id IS NULL"
        ),
    )?;
    Ok(report)
}

/// Inspect one EAV value table for rows referencing vanished entities.
pub fn validate_value_table(
    conn: &InstrumentedConnection<'_>,
    metadata: &EntityMetadata,
    value_table: &str,
) -> Result<IndexIntegrityReport, EavIndexError> {
    let mut report = IndexIntegrityReport::default();
    report.orphan_value_rows = query_single(
        conn,
        &format!(
            "SELECT COUNT(*) FROM {value_table} v \
             LEFT JOIN {entity} e ON e.{id} = v.entity_id \
             WHERE e.{id} IS NULL",
            entity = metadata.entity_table,
            id = metadata.identifier_field,
        ),
    )?;
    Ok(report)
}

/// Combined report over the given live index tables and value tables.
pub fn validate_index_integrity(
    conn: &InstrumentedConnection<'_>,
    metadata: &EntityMetadata,
    index_tables: &[&str],
    value_tables: &[&str],
) -> Result<IndexIntegrityReport, EavIndexError> {
    let mut report = IndexIntegrityReport::default();
    for table in index_tables {
        report.merge(&validate_index_table(conn, metadata, table)?);
    }
    for table in value_tables {
        report.merge(&validate_value_table(conn, metadata, table)?);
    }
    Ok(report)
}

fn query_single(conn: &InstrumentedConnection<'_>, sql: &str) -> Result<i64, EavIndexError> {
    conn.query_row(sql, [], |row| row.get(0))
        .map_err(|e| EavIndexError::query(e.to_string()))
}
