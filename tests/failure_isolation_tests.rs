use eavindex::{
    DecimalIndexer, EavIndexError, EavIndexer, Engine, EntityMetadata, FullReindex,
    IndexTableLayout, InstrumentedConnection, ReindexSettings, TableSwitcher,
    schema::{EAV_INDEX_LAYOUT, INT_VALUE_TABLE, SOURCE_INDEX_TABLE, SOURCE_SCRATCH_TABLE},
};
use rusqlite::params;

/// Source-type indexer whose per-batch work always fails.
struct BrokenSourceIndexer;

impl EavIndexer for BrokenSourceIndexer {
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
        _conn: &InstrumentedConnection<'_>,
        _ids: &[i64],
    ) -> Result<(), EavIndexError> {
        Err(EavIndexError::query("simulated source backend failure"))
    }
}

fn seeded_engine() -> Engine {
    let engine = Engine::open_in_memory(ReindexSettings::default()).expect("engine");
    let conn = engine.raw_connection();
    conn.execute(
        "INSERT INTO eav_attribute(attribute_id, attribute_code, backend_type, frontend_input) \
         VALUES (1, 'price', 'decimal', 'price')",
        [],
    )
    .unwrap();
    for entity_id in 1..=3i64 {
        conn.execute(
            "INSERT INTO catalog_entity(entity_id, sku) VALUES (?1, ?2)",
            params![entity_id, format!("SKU-{entity_id}")],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO eav_decimal_value(entity_id, attribute_id, store_id, value) \
             VALUES (?1, 1, 0, ?2)",
            params![entity_id, entity_id as f64],
        )
        .unwrap();
    }
    // Marker row so the untouched live source table is distinguishable.
    conn.execute("INSERT INTO catalog_index_eav_source VALUES (99, 4, 0, 1)", [])
        .unwrap();
    engine
}

#[test]
fn test_second_indexer_failure_leaves_first_switch_committed() {
    let engine = seeded_engine();
    let action = FullReindex::new(
        EntityMetadata::default(),
        vec![Box::new(DecimalIndexer::new()), Box::new(BrokenSourceIndexer)],
        TableSwitcher::new(),
    );

    let err = action.execute_full(&engine).expect_err("second indexer fails");

    // One wrapping error, original message preserved and cause chained.
    match &err {
        EavIndexError::IndexerError {
            indexer,
            message,
            source,
        } => {
            assert_eq!(indexer, "eav_source");
            assert!(message.contains("simulated source backend failure"));
            assert!(matches!(**source, EavIndexError::QueryError(_)));
        }
        other => panic!("expected indexer error, got {other:?}"),
    }

    // First indexer's swap committed and stands.
    let journal = action.switcher().journal();
    assert_eq!(journal.len(), 1);
    assert_eq!(journal[0].table, "catalog_index_eav_decimal");
    let decimal_rows: i64 = engine
        .raw_connection()
        .query_row("SELECT COUNT(*) FROM catalog_index_eav_decimal", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(decimal_rows, 3);

    // Failed indexer's live table is untouched.
    let marker: i64 = engine
        .raw_connection()
        .query_row(
            "SELECT COUNT(*) FROM catalog_index_eav_source WHERE entity_id = 99",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(marker, 1);
}

#[test]
fn test_first_indexer_failure_skips_remaining_indexers() {
    let engine = seeded_engine();
    let action = FullReindex::new(
        EntityMetadata::default(),
        vec![Box::new(BrokenSourceIndexer), Box::new(DecimalIndexer::new())],
        TableSwitcher::new(),
    );
    assert!(action.execute_full(&engine).is_err());
    assert!(action.switcher().journal().is_empty());
    let decimal_rows: i64 = engine
        .raw_connection()
        .query_row("SELECT COUNT(*) FROM catalog_index_eav_decimal", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(decimal_rows, 0);
}
