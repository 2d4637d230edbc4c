//! Batch planning for full reindex runs: estimate a safe rows-per-batch
//! value, partition the entity ID space into ranges, and resolve a range
//! into the concrete IDs it covers.

use rusqlite::params;

use crate::{
    config::BatchSettings, errors::EavIndexError, metrics::InstrumentedConnection,
    schema::EntityMetadata,
};

/// Estimated on-disk footprint of one materialized index row.
const INDEX_ROW_WIDTH_BYTES: usize = 40;

/// Inclusive ID range covering one batch.
///
/// Ranges partition the ID space observed at planning time: ordered,
/// non-overlapping, and jointly covering every entity ID. IDs inserted
/// after planning may fall outside every range and are picked up by the
/// next full run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchRange {
    pub from_id: i64,
    pub to_id: i64,
}

/// Select over the entity table used to resolve batch IDs.
///
/// The optional join exists because callers may scope the entity set via
/// attribute value tables, which fans out rows; the fetcher compensates
/// with DISTINCT.
#[derive(Clone, Debug)]
pub struct EntitySelect {
    table: String,
    id_column: String,
    join: Option<String>,
}

impl EntitySelect {
    pub fn new(metadata: &EntityMetadata) -> Self {
        Self {
            table: metadata.entity_table.clone(),
            id_column: metadata.identifier_field.clone(),
            join: None,
        }
    }

    pub fn with_join<T: Into<String>>(mut self, clause: T) -> Self {
        self.join = Some(clause.into());
        self
    }

    fn to_sql(&self) -> String {
        let join = self.join.as_deref().unwrap_or("");
        format!(
            "SELECT DISTINCT e.{id} FROM {table} AS e {join} \
             WHERE e.{id} BETWEEN ?1 AND ?2 ORDER BY e.{id}",
            id = self.id_column,
            table = self.table,
        )
    }
}

/// Compute the rows-per-batch bound for one indexer's source table.
///
/// The estimate divides the configured memory budget by the projected
/// per-entity index footprint (row width times the measured average
/// value-row fan-out of `value_table`), clamped to the configured range.
/// Never returns zero.
pub fn estimate_batch_size(
    conn: &InstrumentedConnection<'_>,
    metadata: &EntityMetadata,
    value_table: &str,
    settings: &BatchSettings,
) -> Result<usize, EavIndexError> {
    if let Some(rows) = settings.rows_per_batch {
        return Ok(rows.max(1));
    }
    let entity_count: i64 = conn
        .query_row(
            &format!("SELECT COUNT(*) FROM {}", metadata.entity_table),
            [],
            |row| row.get(0),
        )
        .map_err(|e| EavIndexError::query(e.to_string()))?;
    let value_count: i64 = conn
        .query_row(&format!("SELECT COUNT(*) FROM {}", value_table), [], |row| {
            row.get(0)
        })
        .map_err(|e| EavIndexError::query(e.to_string()))?;
    let fanout = if entity_count > 0 {
        (value_count as f64 / entity_count as f64).max(1.0)
    } else {
        1.0
    };
    let bytes_per_entity = (INDEX_ROW_WIDTH_BYTES as f64 * fanout).ceil() as usize;
    let estimated = settings.memory_budget_bytes / bytes_per_entity.max(1);
    Ok(estimated
        .min(settings.max_rows)
        .max(settings.min_rows)
        .max(1))
}

/// Partition the entity ID space into consecutive ranges of at most
/// `batch_size` IDs. An empty entity table yields an empty plan.
pub fn plan_batches(
    conn: &InstrumentedConnection<'_>,
    metadata: &EntityMetadata,
    batch_size: usize,
) -> Result<Vec<BatchRange>, EavIndexError> {
    if batch_size == 0 {
        return Err(EavIndexError::invalid_input("batch size must be positive"));
    }
    let bounds: (Option<i64>, Option<i64>) = conn
        .query_row(
            &format!(
                "SELECT MIN({id}), MAX({id}) FROM {table}",
                id = metadata.identifier_field,
                table = metadata.entity_table,
            ),
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(|e| EavIndexError::query(e.to_string()))?;
    let (min_id, max_id) = match bounds {
        (Some(min_id), Some(max_id)) => (min_id, max_id),
        _ => return Ok(Vec::new()),
    };
    let step = batch_size as i64;
    let mut ranges = Vec::new();
    let mut from_id = min_id;
    while from_id <= max_id {
        let to_id = from_id.saturating_add(step - 1).min(max_id);
        ranges.push(BatchRange { from_id, to_id });
        if to_id == i64::MAX {
            break;
        }
        from_id = to_id + 1;
    }
    Ok(ranges)
}

/// Resolve one batch range into the ordered, de-duplicated entity IDs it
/// contains. Rows deleted between planning and fetching simply shrink the
/// result; an empty batch is valid.
pub fn fetch_batch_ids(
    conn: &InstrumentedConnection<'_>,
    select: &EntitySelect,
    range: BatchRange,
) -> Result<Vec<i64>, EavIndexError> {
    let mut stmt = conn
        .prepare_cached(&select.to_sql())
        .map_err(|e| EavIndexError::query(e.to_string()))?;
    let rows = stmt
        .query_map(params![range.from_id, range.to_id], |row| row.get(0))
        .map_err(|e| EavIndexError::query(e.to_string()))?;
    let mut ids = Vec::new();
    for row in rows {
        ids.push(row.map_err(|e| EavIndexError::query(e.to_string()))?);
    }
    Ok(ids)
}
