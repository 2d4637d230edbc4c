//! Configuration for reindex runs: the store-scoped enable flag, batch
//! sizing knobs, and SQLite PRAGMA settings applied at engine open.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::EavIndexError;

/// Batch sizing knobs consumed by the batch size estimator.
///
/// When `rows_per_batch` is set, estimation is bypassed and the value is
/// used directly (still clamped to at least one row). Otherwise the
/// estimator derives a batch size from `memory_budget_bytes` and the
/// measured value fan-out of the indexer's source table, clamped to
/// `[min_rows, max_rows]`.
///
/// # Default Configuration
///
/// ```rust
/// use eavindex::BatchSettings;
/// let batch = BatchSettings::default();
/// assert!(batch.rows_per_batch.is_none());
/// assert_eq!(batch.min_rows, 100);
/// assert_eq!(batch.max_rows, 50_000);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSettings {
    /// Fixed batch size override; bypasses estimation when set.
    pub rows_per_batch: Option<usize>,
    /// Approximate memory the index rows of one batch may occupy.
    pub memory_budget_bytes: usize,
    /// Lower clamp for the estimated batch size.
    pub min_rows: usize,
    /// Upper clamp for the estimated batch size.
    pub max_rows: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            rows_per_batch: None,
            memory_budget_bytes: 4 * 1024 * 1024,
            min_rows: 100,
            max_rows: 50_000,
        }
    }
}

/// Complete configuration for a reindex engine.
///
/// The enable flag is store-scoped: `store_overrides` wins for a store it
/// names, every other store inherits `default_enabled`. A full reindex run
/// consults the flag once per `execute` call and becomes a pure no-op when
/// no store scope enables the indexer.
///
/// # Examples
///
/// ```rust
/// use eavindex::ReindexSettings;
///
/// let settings = ReindexSettings::enabled().with_store_override(2, false);
/// assert!(settings.is_enabled_for_store(1));
/// assert!(!settings.is_enabled_for_store(2));
/// assert!(settings.eav_indexer_enabled());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReindexSettings {
    /// Enable flag inherited by stores without an explicit override.
    pub default_enabled: bool,
    /// Per-store enable overrides, keyed by store id.
    pub store_overrides: HashMap<i64, bool>,
    /// Batch sizing knobs.
    pub batch: BatchSettings,
    /// SQLite PRAGMA settings applied when the engine opens, e.g.
    /// `journal_mode = WAL` or `synchronous = NORMAL`.
    pub pragma_settings: HashMap<String, String>,
}

impl Default for ReindexSettings {
    fn default() -> Self {
        Self::enabled()
    }
}

impl ReindexSettings {
    /// Settings with the indexer enabled for every store.
    pub fn enabled() -> Self {
        Self {
            default_enabled: true,
            store_overrides: HashMap::new(),
            batch: BatchSettings::default(),
            pragma_settings: HashMap::new(),
        }
    }

    /// Settings with the indexer disabled for every store.
    pub fn disabled() -> Self {
        Self {
            default_enabled: false,
            ..Self::enabled()
        }
    }

    /// Parse settings from a JSON document.
    pub fn from_json(raw: &str) -> Result<Self, EavIndexError> {
        serde_json::from_str(raw).map_err(|e| EavIndexError::invalid_input(e.to_string()))
    }

    pub fn with_store_override(mut self, store_id: i64, enabled: bool) -> Self {
        self.store_overrides.insert(store_id, enabled);
        self
    }

    pub fn with_rows_per_batch(mut self, rows: usize) -> Self {
        self.batch.rows_per_batch = Some(rows);
        self
    }

    /// Resolved enable flag for one store scope.
    pub fn is_enabled_for_store(&self, store_id: i64) -> bool {
        self.store_overrides
            .get(&store_id)
            .copied()
            .unwrap_or(self.default_enabled)
    }

    /// Whether any store scope enables the indexer; the full action runs
    /// only when this holds.
    pub fn eav_indexer_enabled(&self) -> bool {
        self.default_enabled || self.store_overrides.values().any(|&enabled| enabled)
    }
}
