//! Batched EAV attribute-index rebuilds over SQLite, with shadow-table
//! writes and an atomic live/shadow swap so readers never observe a
//! half-built index.

pub mod batch;
pub mod bench_utils;
pub mod config;
pub mod engine;
pub mod errors;
pub mod full;
pub mod indexer;
pub mod metrics;
pub mod schema;
pub mod switch;
pub mod sync;
pub mod validation;

pub use crate::batch::{BatchRange, EntitySelect};
pub use crate::config::{BatchSettings, ReindexSettings};
pub use crate::engine::Engine;
pub use crate::errors::EavIndexError;
pub use crate::full::FullReindex;
pub use crate::indexer::{DecimalIndexer, EavIndexer, SourceIndexer};
pub use crate::metrics::{IndexMetrics, IndexMetricsSnapshot, InstrumentedConnection};
pub use crate::schema::{EntityMetadata, IndexTableLayout};
pub use crate::switch::{SwapEvent, TableSwitcher};
pub use crate::validation::{IndexIntegrityReport, validate_index_integrity};
