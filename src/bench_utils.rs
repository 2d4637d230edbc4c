//! Deterministic catalog generation for benchmarks and heavier tests.

use ahash::AHashSet;
use rand::{Rng, SeedableRng, rngs::StdRng};
use rusqlite::params;

use crate::{engine::Engine, errors::EavIndexError};

#[derive(Clone, Debug)]
pub struct AttributeSpec {
    pub attribute_id: i64,
    pub code: &'static str,
    pub backend_type: &'static str,
    pub frontend_input: &'static str,
}

#[derive(Clone, Copy, Debug)]
pub struct DecimalValue {
    pub entity_id: i64,
    pub attribute_id: i64,
    pub store_id: i64,
    pub value: f64,
}

#[derive(Clone, Copy, Debug)]
pub struct IntValue {
    pub entity_id: i64,
    pub attribute_id: i64,
    pub store_id: i64,
    pub value: i64,
}

#[derive(Clone, Debug)]
pub struct CatalogDataset {
    pub entity_count: usize,
    pub store_ids: Vec<i64>,
    pub attributes: Vec<AttributeSpec>,
    pub decimal_values: Vec<DecimalValue>,
    pub int_values: Vec<IntValue>,
}

fn stock_attributes() -> Vec<AttributeSpec> {
    vec![
        AttributeSpec { attribute_id: 1, code: "price", backend_type: "decimal", frontend_input: "price" },
        AttributeSpec { attribute_id: 2, code: "weight", backend_type: "decimal", frontend_input: "text" },
        AttributeSpec { attribute_id: 3, code: "special_price", backend_type: "decimal", frontend_input: "price" },
        AttributeSpec { attribute_id: 4, code: "status", backend_type: "int", frontend_input: "select" },
        AttributeSpec { attribute_id: 5, code: "visibility", backend_type: "int", frontend_input: "select" },
        AttributeSpec { attribute_id: 6, code: "tax_class_id", backend_type: "int", frontend_input: "select" },
    ]
}

/// Generate a catalog with `entity_count` entities across `store_count`
/// stores (besides the default scope). Identical seeds produce identical
/// datasets.
pub fn generate_catalog(entity_count: usize, store_count: usize, seed: u64) -> CatalogDataset {
    assert!(entity_count > 0, "entity_count must be positive");
    let mut rng = StdRng::seed_from_u64(seed);
    let store_ids: Vec<i64> = (1..=store_count as i64).collect();
    let attributes = stock_attributes();

    let mut decimal_values = Vec::new();
    let mut int_values = Vec::new();
    for entity in 1..=entity_count as i64 {
        decimal_values.push(DecimalValue {
            entity_id: entity,
            attribute_id: 1,
            store_id: 0,
            value: (rng.gen_range(100..100_000) as f64) / 100.0,
        });
        if rng.gen_range(0..10) < 7 {
            decimal_values.push(DecimalValue {
                entity_id: entity,
                attribute_id: 2,
                store_id: 0,
                value: (rng.gen_range(1..5_000) as f64) / 10.0,
            });
        }
        int_values.push(IntValue {
            entity_id: entity,
            attribute_id: 4,
            store_id: 0,
            value: rng.gen_range(1..3),
        });
        int_values.push(IntValue {
            entity_id: entity,
            attribute_id: 5,
            store_id: 0,
            value: rng.gen_range(1..5),
        });
    }

    // Sparse store-scope overrides on price and status.
    if !store_ids.is_empty() {
        let mut seen: AHashSet<(i64, i64, i64)> = AHashSet::new();
        let override_count = entity_count * store_ids.len() / 4;
        while seen.len() < override_count {
            let entity = rng.gen_range(1..=entity_count as i64);
            let store = store_ids[rng.gen_range(0..store_ids.len())];
            let attribute = if rng.gen_range(0..2) == 0 { 1 } else { 4 };
            if !seen.insert((entity, attribute, store)) {
                continue;
            }
            if attribute == 1 {
                decimal_values.push(DecimalValue {
                    entity_id: entity,
                    attribute_id: 1,
                    store_id: store,
                    value: (rng.gen_range(100..100_000) as f64) / 100.0,
                });
            } else {
                int_values.push(IntValue {
                    entity_id: entity,
                    attribute_id: 4,
                    store_id: store,
                    value: rng.gen_range(1..3),
                });
            }
        }
    }

    CatalogDataset {
        entity_count,
        store_ids,
        attributes,
        decimal_values,
        int_values,
    }
}

/// Load a generated catalog into an engine's database.
pub fn load_catalog(engine: &Engine, dataset: &CatalogDataset) -> Result<(), EavIndexError> {
    let conn = engine.raw_connection();
    let load = || -> Result<(), rusqlite::Error> {
        conn.execute("BEGIN", [])?;
        for &store_id in &dataset.store_ids {
            conn.execute(
                "INSERT OR IGNORE INTO store(store_id, code) VALUES (?1, ?2)",
                params![store_id, format!("store_{store_id}")],
            )?;
        }
        for attribute in &dataset.attributes {
            conn.execute(
                "INSERT OR IGNORE INTO eav_attribute\
                 (attribute_id, attribute_code, backend_type, frontend_input) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    attribute.attribute_id,
                    attribute.code,
                    attribute.backend_type,
                    attribute.frontend_input,
                ],
            )?;
        }
        {
            let mut entity_stmt =
                conn.prepare_cached("INSERT INTO catalog_entity(entity_id, sku) VALUES (?1, ?2)")?;
            for entity in 1..=dataset.entity_count as i64 {
                entity_stmt.execute(params![entity, format!("SKU-{entity:06}")])?;
            }
            let mut decimal_stmt = conn.prepare_cached(
                "INSERT INTO eav_decimal_value(entity_id, attribute_id, store_id, value) \
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for row in &dataset.decimal_values {
                decimal_stmt.execute(params![
                    row.entity_id,
                    row.attribute_id,
                    row.store_id,
                    row.value
                ])?;
            }
            let mut int_stmt = conn.prepare_cached(
                "INSERT INTO eav_int_value(entity_id, attribute_id, store_id, value) \
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for row in &dataset.int_values {
                int_stmt.execute(params![
                    row.entity_id,
                    row.attribute_id,
                    row.store_id,
                    row.value
                ])?;
            }
        }
        conn.execute("COMMIT", [])?;
        Ok(())
    };
    load().map_err(|e| {
        let _ = conn.execute("ROLLBACK", []);
        EavIndexError::query(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_deterministic() {
        let first = generate_catalog(50, 2, 0xEA7);
        let second = generate_catalog(50, 2, 0xEA7);
        assert_eq!(first.decimal_values.len(), second.decimal_values.len());
        assert_eq!(first.int_values.len(), second.int_values.len());
        assert_eq!(
            first.decimal_values[0].value,
            second.decimal_values[0].value
        );
    }

    #[test]
    fn test_overrides_are_unique() {
        let dataset = generate_catalog(40, 3, 0x5EED);
        let mut seen = AHashSet::new();
        for row in &dataset.decimal_values {
            assert!(seen.insert((row.entity_id, row.attribute_id, row.store_id)));
        }
    }
}
