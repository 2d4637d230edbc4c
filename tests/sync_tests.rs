use eavindex::{
    EavIndexError, Engine, IndexTableLayout, ReindexSettings, schema::EAV_INDEX_LAYOUT,
    sync::sync_scratch_to_shadow,
};
use rusqlite::params;

fn engine() -> Engine {
    Engine::open_in_memory(ReindexSettings::default()).expect("engine")
}

fn scratch_insert(engine: &Engine, entity_id: i64, value: Option<f64>) {
    engine
        .raw_connection()
        .execute(
            "INSERT INTO catalog_index_eav_decimal_idx(entity_id, attribute_id, store_id, value) \
             VALUES (?1, 1, 0, ?2)",
            params![entity_id, value],
        )
        .unwrap();
}

fn replica_count(engine: &Engine) -> i64 {
    engine
        .raw_connection()
        .query_row(
            "SELECT COUNT(*) FROM catalog_index_eav_decimal_replica",
            [],
            |row| row.get(0),
        )
        .unwrap()
}

#[test]
fn test_sync_copies_scratch_rows() {
    let engine = engine();
    scratch_insert(&engine, 1, Some(9.5));
    scratch_insert(&engine, 2, Some(3.25));
    let written = sync_scratch_to_shadow(
        &engine.connection(),
        "catalog_index_eav_decimal_idx",
        &EAV_INDEX_LAYOUT,
        "catalog_index_eav_decimal_replica",
        &EAV_INDEX_LAYOUT,
    )
    .expect("sync");
    assert_eq!(written, 2);
    assert_eq!(replica_count(&engine), 2);
}

#[test]
fn test_sync_upserts_on_repeat() {
    let engine = engine();
    scratch_insert(&engine, 1, Some(9.5));
    let conn = engine.connection();
    sync_scratch_to_shadow(
        &conn,
        "catalog_index_eav_decimal_idx",
        &EAV_INDEX_LAYOUT,
        "catalog_index_eav_decimal_replica",
        &EAV_INDEX_LAYOUT,
    )
    .expect("first sync");
    engine
        .raw_connection()
        .execute(
            "UPDATE catalog_index_eav_decimal_idx SET value = 11.0 WHERE entity_id = 1",
            [],
        )
        .unwrap();
    sync_scratch_to_shadow(
        &conn,
        "catalog_index_eav_decimal_idx",
        &EAV_INDEX_LAYOUT,
        "catalog_index_eav_decimal_replica",
        &EAV_INDEX_LAYOUT,
    )
    .expect("second sync");
    assert_eq!(replica_count(&engine), 1);
    let value: f64 = engine
        .raw_connection()
        .query_row(
            "SELECT value FROM catalog_index_eav_decimal_replica WHERE entity_id = 1",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(value, 11.0);
}

#[test]
fn test_sync_rolls_back_and_rethrows_original_error() {
    let engine = engine();
    engine
        .raw_connection()
        .execute(
            "INSERT INTO catalog_index_eav_decimal_replica\
             (entity_id, attribute_id, store_id, value) VALUES (50, 1, 0, 1.0)",
            [],
        )
        .unwrap();
    scratch_insert(&engine, 1, Some(2.0));
    // NULL violates the replica's NOT NULL value column mid-copy.
    scratch_insert(&engine, 2, None);
    engine.reset_metrics();

    let result = sync_scratch_to_shadow(
        &engine.connection(),
        "catalog_index_eav_decimal_idx",
        &EAV_INDEX_LAYOUT,
        "catalog_index_eav_decimal_replica",
        &EAV_INDEX_LAYOUT,
    );
    match result {
        Err(EavIndexError::QueryError(message)) => {
            assert!(message.contains("NOT NULL"), "unexpected message: {message}");
        }
        other => panic!("expected query error, got {other:?}"),
    }
    assert_eq!(replica_count(&engine), 1);
    let snapshot = engine.metrics_snapshot();
    assert_eq!(snapshot.tx_begin_count, 1);
    assert_eq!(snapshot.tx_rollback_count, 1);
    assert_eq!(snapshot.tx_commit_count, 0);
}

#[test]
fn test_sync_copies_only_destination_columns() {
    let engine = engine();
    engine
        .raw_connection()
        .execute_batch(
            "CREATE TABLE wide_idx (
                 entity_id    INTEGER NOT NULL,
                 attribute_id INTEGER NOT NULL,
                 store_id     INTEGER NOT NULL,
                 value        REAL,
                 provenance   TEXT,
                 PRIMARY KEY (entity_id, attribute_id, store_id)
             );
             INSERT INTO wide_idx VALUES (1, 1, 0, 4.5, 'loader');",
        )
        .unwrap();
    const WIDE_LAYOUT: IndexTableLayout = IndexTableLayout {
        columns: &["entity_id", "attribute_id", "store_id", "value", "provenance"],
        key_columns: &["entity_id", "attribute_id", "store_id"],
    };
    let written = sync_scratch_to_shadow(
        &engine.connection(),
        "wide_idx",
        &WIDE_LAYOUT,
        "catalog_index_eav_decimal_replica",
        &EAV_INDEX_LAYOUT,
    )
    .expect("sync");
    assert_eq!(written, 1);
    assert_eq!(replica_count(&engine), 1);
}

#[test]
fn test_sync_rejects_missing_key_column() {
    let engine = engine();
    const KEYLESS_LAYOUT: IndexTableLayout = IndexTableLayout {
        columns: &["entity_id", "attribute_id", "value"],
        key_columns: &["entity_id", "attribute_id"],
    };
    let result = sync_scratch_to_shadow(
        &engine.connection(),
        "catalog_index_eav_decimal_idx",
        &KEYLESS_LAYOUT,
        "catalog_index_eav_decimal_replica",
        &EAV_INDEX_LAYOUT,
    );
    assert!(matches!(result, Err(EavIndexError::InvalidInput(_))));
}
