//! Per-attribute-type reindexers. Each implementation recomputes index
//! rows for a supplied set of entity IDs into its own scratch table;
//! the orchestrator owns batching, synchronization, and table switching.

mod decimal;
mod source;

pub use decimal::DecimalIndexer;
pub use source::SourceIndexer;

use crate::{errors::EavIndexError, metrics::InstrumentedConnection, schema::IndexTableLayout};

pub trait EavIndexer {
    fn indexer_id(&self) -> &str;

    /// Live index table name; the shadow name is derived from it.
    fn main_table(&self) -> &str;

    /// Scratch table this indexer writes during `reindex_entities`.
    fn scratch_table(&self) -> &str;

    /// EAV value table the index rows are computed from.
    fn value_table(&self) -> &str;

    fn layout(&self) -> IndexTableLayout;

    /// Recompute index rows for `ids` into the scratch table.
    ///
    /// Must be idempotent under overlapping ID sets: rows for the given
    /// IDs are replaced wholesale, never accumulated.
    fn reindex_entities(
        &self,
        conn: &InstrumentedConnection<'_>,
        ids: &[i64],
    ) -> Result<(), EavIndexError>;
}

pub(crate) fn id_placeholders(count: usize) -> String {
    let mut placeholders = String::with_capacity(count * 2);
    for idx in 0..count {
        if idx > 0 {
            placeholders.push(',');
        }
        placeholders.push('?');
    }
    placeholders
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_placeholders() {
        assert_eq!(id_placeholders(0), "");
        assert_eq!(id_placeholders(1), "?");
        assert_eq!(id_placeholders(3), "?,?,?");
    }
}
