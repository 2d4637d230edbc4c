//! Shadow-table naming and the atomic live/shadow swap.

use parking_lot::Mutex;
use serde::Serialize;

use crate::{errors::EavIndexError, metrics::InstrumentedConnection};

pub const ADDITIONAL_TABLE_SUFFIX: &str = "_replica";

const OUTDATED_TABLE_SUFFIX: &str = "_outdated";

/// One completed swap, with the live row counts observed immediately
/// before and after. Readers can only ever have seen one of the two.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SwapEvent {
    pub table: String,
    pub rows_before: i64,
    pub rows_after: i64,
}

/// Derives shadow table names and performs the live/shadow swap.
///
/// After a swap the previous live table has become the new shadow, so the
/// next full run can truncate and refill it without further ceremony.
#[derive(Default)]
pub struct TableSwitcher {
    journal: Mutex<Vec<SwapEvent>>,
}

impl TableSwitcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shadow-table counterpart of a live table name. Single application
    /// only; the transform is not its own inverse.
    pub fn additional_table_name(&self, table: &str) -> String {
        format!("{table}{ADDITIONAL_TABLE_SUFFIX}")
    }

    /// Exchange each live table with its shadow counterpart.
    ///
    /// The renames for one table happen inside a single transaction, so
    /// concurrent readers observe either the fully-old or the fully-new
    /// contents, never a missing table or a mix.
    pub fn switch_tables(
        &self,
        conn: &InstrumentedConnection<'_>,
        tables: &[&str],
    ) -> Result<(), EavIndexError> {
        for &table in tables {
            let shadow = self.additional_table_name(table);
            let outdated = format!("{table}{OUTDATED_TABLE_SUFFIX}");
            let rows_before = count_rows(conn, table)?;
            conn.execute("BEGIN IMMEDIATE", [])
                .map_err(|e| EavIndexError::query(e.to_string()))?;
            let renames = [
                format!("ALTER TABLE {table} RENAME TO {outdated}"),
                format!("ALTER TABLE {shadow} RENAME TO {table}"),
                format!("ALTER TABLE {outdated} RENAME TO {shadow}"),
            ];
            for sql in &renames {
                if let Err(err) = conn.execute(sql, []) {
                    let _ = conn.execute("ROLLBACK", []);
                    return Err(EavIndexError::query(err.to_string()));
                }
            }
            conn.execute("COMMIT", [])
                .map_err(|e| EavIndexError::query(e.to_string()))?;
            let rows_after = count_rows(conn, table)?;
            self.journal.lock().push(SwapEvent {
                table: table.to_string(),
                rows_before,
                rows_after,
            });
        }
        Ok(())
    }

    /// Completed swaps, oldest first.
    pub fn journal(&self) -> Vec<SwapEvent> {
        self.journal.lock().clone()
    }

    pub fn clear_journal(&self) {
        self.journal.lock().clear();
    }
}

fn count_rows(conn: &InstrumentedConnection<'_>, table: &str) -> Result<i64, EavIndexError> {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })
    .map_err(|e| EavIndexError::query(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_additional_table_name() {
        let switcher = TableSwitcher::new();
        assert_eq!(
            switcher.additional_table_name("catalog_index_eav_decimal"),
            "catalog_index_eav_decimal_replica"
        );
    }
}
