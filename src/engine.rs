use std::path::Path;

use rusqlite::Connection;

use crate::{
    config::ReindexSettings,
    errors::EavIndexError,
    metrics::{IndexMetrics, IndexMetricsSnapshot, InstrumentedConnection},
    schema::ensure_schema,
};

/// Owns the SQLite connection for one catalog database.
///
/// Opening ensures the schema exists and applies configured PRAGMA
/// settings; all reindex SQL is issued through [`Engine::connection`] so
/// statement counts land in the engine's metrics.
pub struct Engine {
    conn: Connection,
    metrics: IndexMetrics,
    settings: ReindexSettings,
}

impl Engine {
    pub fn open<P: AsRef<Path>>(path: P, settings: ReindexSettings) -> Result<Self, EavIndexError> {
        let conn = Connection::open(path).map_err(|e| EavIndexError::connection(e.to_string()))?;
        Self::from_connection(conn, settings)
    }

    pub fn open_in_memory(settings: ReindexSettings) -> Result<Self, EavIndexError> {
        let conn =
            Connection::open_in_memory().map_err(|e| EavIndexError::connection(e.to_string()))?;
        Self::from_connection(conn, settings)
    }

    fn from_connection(conn: Connection, settings: ReindexSettings) -> Result<Self, EavIndexError> {
        ensure_schema(&conn)?;
        for (key, value) in &settings.pragma_settings {
            let pragma_sql = format!("PRAGMA {} = {}", key, value);
            match conn.execute(&pragma_sql, []) {
                Ok(_) => {}
                // Some PRAGMAs return a result row; that is not a failure.
                Err(rusqlite::Error::ExecuteReturnedResults) => {}
                Err(e) => {
                    return Err(EavIndexError::connection(format!(
                        "PRAGMA {} = {}: {}",
                        key, value, e
                    )));
                }
            }
        }
        Ok(Self {
            conn,
            metrics: IndexMetrics::default(),
            settings,
        })
    }

    pub fn connection(&self) -> InstrumentedConnection<'_> {
        InstrumentedConnection::new(&self.conn, &self.metrics)
    }

    /// Direct access to the underlying connection, bypassing metrics.
    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn settings(&self) -> &ReindexSettings {
        &self.settings
    }

    pub fn metrics_snapshot(&self) -> IndexMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }
}
