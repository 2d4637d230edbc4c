//! Full-rebuild orchestration across the configured attribute indexers.

use crate::{
    batch::{EntitySelect, estimate_batch_size, fetch_batch_ids, plan_batches},
    engine::Engine,
    errors::EavIndexError,
    indexer::EavIndexer,
    metrics::InstrumentedConnection,
    schema::EntityMetadata,
    switch::TableSwitcher,
    sync::sync_scratch_to_shadow,
};

/// Rebuilds every configured attribute index from scratch.
///
/// Per indexer: truncate the shadow table, walk the entity ID space in
/// batches (fetch IDs, recompute index rows, fold them into the shadow
/// inside a transaction), then atomically swap shadow and live. A failure
/// aborts the run with a single wrapping error; switches already
/// committed for earlier indexers stand.
pub struct FullReindex {
    metadata: EntityMetadata,
    indexers: Vec<Box<dyn EavIndexer>>,
    switcher: TableSwitcher,
}

impl FullReindex {
    pub fn new(
        metadata: EntityMetadata,
        indexers: Vec<Box<dyn EavIndexer>>,
        switcher: TableSwitcher,
    ) -> Self {
        Self {
            metadata,
            indexers,
            switcher,
        }
    }

    /// The stock pipeline: decimal and source indexers over the default
    /// entity metadata.
    pub fn standard() -> Self {
        Self::new(
            EntityMetadata::default(),
            vec![
                Box::new(crate::indexer::DecimalIndexer::new()),
                Box::new(crate::indexer::SourceIndexer::new()),
            ],
            TableSwitcher::new(),
        )
    }

    pub fn switcher(&self) -> &TableSwitcher {
        &self.switcher
    }

    pub fn execute_full(&self, engine: &Engine) -> Result<(), EavIndexError> {
        self.execute(engine, None)
    }

    /// Run the full rebuild.
    ///
    /// `ids` is accepted for signature parity with partial reindex actions
    /// and is deliberately unused: a full rebuild always covers the entire
    /// entity space. When no store scope enables the indexer this is a
    /// pure no-op and issues no SQL.
    pub fn execute(&self, engine: &Engine, ids: Option<&[i64]>) -> Result<(), EavIndexError> {
        let _ = ids;
        if !engine.settings().eav_indexer_enabled() {
            return Ok(());
        }
        let conn = engine.connection();
        for indexer in &self.indexers {
            self.reindex_one(&conn, engine, indexer.as_ref())
                .map_err(|err| EavIndexError::indexer(indexer.indexer_id(), err))?;
        }
        Ok(())
    }

    fn reindex_one(
        &self,
        conn: &InstrumentedConnection<'_>,
        engine: &Engine,
        indexer: &dyn EavIndexer,
    ) -> Result<(), EavIndexError> {
        let shadow = self.switcher.additional_table_name(indexer.main_table());
        conn.execute(&format!("DELETE FROM {shadow}"), [])
            .map_err(|e| EavIndexError::query(e.to_string()))?;
        conn.execute(&format!("DELETE FROM {}", indexer.scratch_table()), [])
            .map_err(|e| EavIndexError::query(e.to_string()))?;
        let batch_size = estimate_batch_size(
            conn,
            &self.metadata,
            indexer.value_table(),
            &engine.settings().batch,
        )?;
        let select = EntitySelect::new(&self.metadata);
        let layout = indexer.layout();
        for range in plan_batches(conn, &self.metadata, batch_size)? {
            let batch_ids = fetch_batch_ids(conn, &select, range)?;
            if batch_ids.is_empty() {
                continue;
            }
            indexer.reindex_entities(conn, &batch_ids)?;
            sync_scratch_to_shadow(conn, indexer.scratch_table(), &layout, &shadow, &layout)?;
        }
        self.switcher.switch_tables(conn, &[indexer.main_table()])
    }
}
