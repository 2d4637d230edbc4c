//! Transactional copy of scratch-table rows into a shadow index table.

use crate::{errors::EavIndexError, metrics::InstrumentedConnection, schema::IndexTableLayout};

/// Columns the copy may touch: the destination's declared columns, minus
/// any the source does not declare. Source-only columns are dropped
/// silently; the schema declarations keep the two sets in a superset
/// relationship.
fn copy_columns(
    source: &IndexTableLayout,
    dest: &IndexTableLayout,
) -> Vec<&'static str> {
    dest.columns
        .iter()
        .copied()
        .filter(|column| source.columns.contains(column))
        .collect()
}

/// Copy every row of `source_table` into `dest_table` with
/// insert-or-update semantics, inside one transaction.
///
/// On any failure the transaction is rolled back and the original error
/// is returned unwrapped; the destination never holds a half-applied
/// copy. Returns the number of rows written.
pub fn sync_scratch_to_shadow(
    conn: &InstrumentedConnection<'_>,
    source_table: &str,
    source_layout: &IndexTableLayout,
    dest_table: &str,
    dest_layout: &IndexTableLayout,
) -> Result<usize, EavIndexError> {
    let columns = copy_columns(source_layout, dest_layout);
    if columns.is_empty() {
        return Err(EavIndexError::invalid_input(format!(
            "no shared columns between {source_table} and {dest_table}"
        )));
    }
    for key in dest_layout.key_columns {
        if !columns.contains(key) {
            return Err(EavIndexError::invalid_input(format!(
                "key column {key} of {dest_table} missing from {source_table}"
            )));
        }
    }
    let column_list = columns.join(", ");
    let key_list = dest_layout.key_columns.join(", ");
    let assignments: Vec<String> = columns
        .iter()
        .filter(|column| !dest_layout.key_columns.contains(*column))
        .map(|column| format!("{column} = excluded.{column}"))
        .collect();
    let upsert_clause = if assignments.is_empty() {
        "DO NOTHING".to_string()
    } else {
        format!("DO UPDATE SET {}", assignments.join(", "))
    };
    let copy_sql = format!(
        "INSERT INTO {dest_table} ({column_list}) \
         SELECT {column_list} FROM {source_table} WHERE TRUE \
         ON CONFLICT({key_list}) {upsert_clause}"
    );

    conn.execute("BEGIN IMMEDIATE", [])
        .map_err(|e| EavIndexError::query(e.to_string()))?;
    match conn.execute(&copy_sql, []) {
        Ok(written) => {
            conn.execute("COMMIT", [])
                .map_err(|e| EavIndexError::query(e.to_string()))?;
            Ok(written)
        }
        Err(err) => {
            let _ = conn.execute("ROLLBACK", []);
            Err(EavIndexError::query(err.to_string()))
        }
    }
}
