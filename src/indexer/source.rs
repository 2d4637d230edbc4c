use rusqlite::params_from_iter;

use crate::{
    errors::EavIndexError,
    metrics::InstrumentedConnection,
    schema::{
        EAV_INDEX_LAYOUT, INT_VALUE_TABLE, IndexTableLayout, SOURCE_INDEX_TABLE,
        SOURCE_SCRATCH_TABLE,
    },
};

use super::{EavIndexer, id_placeholders};

/// Reindexes select-backed attributes whose values come from an option
/// source (status, visibility, ...). Same store fan-out rules as the
/// decimal indexer; only attributes with a `select` frontend participate.
#[derive(Debug, Default)]
pub struct SourceIndexer;

impl SourceIndexer {
    pub fn new() -> Self {
        Self
    }
}

impl EavIndexer for SourceIndexer {
    fn indexer_id(&self) -> &str {
        "eav_source"
    }

    fn main_table(&self) -> &str {
        SOURCE_INDEX_TABLE
    }

    fn scratch_table(&self) -> &str {
        SOURCE_SCRATCH_TABLE
    }

    fn value_table(&self) -> &str {
        INT_VALUE_TABLE
    }

    fn layout(&self) -> IndexTableLayout {
        EAV_INDEX_LAYOUT
    }

    fn reindex_entities(
        &self,
        conn: &InstrumentedConnection<'_>,
        ids: &[i64],
    ) -> Result<(), EavIndexError> {
        if ids.is_empty() {
            return Ok(());
        }
        let placeholders = id_placeholders(ids.len());
        conn.execute(
            &format!("DELETE FROM {SOURCE_SCRATCH_TABLE} WHERE entity_id IN ({placeholders})"),
            params_from_iter(ids.iter()),
        )
        .map_err(|e| EavIndexError::query(e.to_string()))?;
        conn.execute(
            &format!(
                "INSERT INTO {SOURCE_SCRATCH_TABLE} (entity_id, attribute_id, store_id, value) \
                 SELECT v.entity_id, v.attribute_id, v.store_id, v.value \
                 FROM {INT_VALUE_TABLE} v \
                 JOIN eav_attribute a ON a.attribute_id = v.attribute_id \
                 WHERE a.frontend_input = 'select' AND v.value IS NOT NULL \
                   AND v.entity_id IN ({placeholders}) \
                 ON CONFLICT(entity_id, attribute_id, store_id) \
                 DO UPDATE SET value = excluded.value"
            ),
            params_from_iter(ids.iter()),
        )
        .map_err(|e| EavIndexError::query(e.to_string()))?;
        conn.execute(
            &format!(
                "INSERT INTO {SOURCE_SCRATCH_TABLE} (entity_id, attribute_id, store_id, value) \
                 SELECT d.entity_id, d.attribute_id, s.store_id, d.value \
                 FROM {INT_VALUE_TABLE} d \
                 JOIN eav_attribute a ON a.attribute_id = d.attribute_id \
                 CROSS JOIN store s \
                 WHERE a.frontend_input = 'select' AND d.store_id = 0 AND s.store_id <> 0 \
                   AND d.value IS NOT NULL AND d.entity_id IN ({placeholders}) \
                   AND NOT EXISTS (\
                       SELECT 1 FROM {INT_VALUE_TABLE} o \
                       WHERE o.entity_id = d.entity_id \
                         AND o.attribute_id = d.attribute_id \
                         AND o.store_id = s.store_id) \
                 ON CONFLICT(entity_id, attribute_id, store_id) DO NOTHING"
            ),
            params_from_iter(ids.iter()),
        )
        .map_err(|e| EavIndexError::query(e.to_string()))?;
        Ok(())
    }
}
