use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

pub use instrumented::{InstrumentedCachedStatement, InstrumentedConnection};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexMetricsSnapshot {
    pub prepare_count: u64,
    pub execute_count: u64,
    pub tx_begin_count: u64,
    pub tx_commit_count: u64,
    pub tx_rollback_count: u64,
}

/// Statement and transaction counters for one engine.
///
/// Every statement routed through an [`InstrumentedConnection`] is counted,
/// so a snapshot of zero executes proves a code path issued no SQL at all.
#[derive(Default)]
pub struct IndexMetrics {
    prepares: AtomicU64,
    executes: AtomicU64,
    tx_begin: AtomicU64,
    tx_commit: AtomicU64,
    tx_rollback: AtomicU64,
}

impl IndexMetrics {
    pub fn snapshot(&self) -> IndexMetricsSnapshot {
        IndexMetricsSnapshot {
            prepare_count: self.prepares.load(Ordering::Relaxed),
            execute_count: self.executes.load(Ordering::Relaxed),
            tx_begin_count: self.tx_begin.load(Ordering::Relaxed),
            tx_commit_count: self.tx_commit.load(Ordering::Relaxed),
            tx_rollback_count: self.tx_rollback.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.prepares.store(0, Ordering::Relaxed);
        self.executes.store(0, Ordering::Relaxed);
        self.tx_begin.store(0, Ordering::Relaxed);
        self.tx_commit.store(0, Ordering::Relaxed);
        self.tx_rollback.store(0, Ordering::Relaxed);
    }

    pub fn record_prepare(&self) {
        self.prepares.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_execute(&self, sql: Option<&str>) {
        self.executes.fetch_add(1, Ordering::Relaxed);
        if let Some(keyword) = sql.and_then(leading_keyword) {
            if keyword.eq_ignore_ascii_case("BEGIN") {
                self.tx_begin.fetch_add(1, Ordering::Relaxed);
            } else if keyword.eq_ignore_ascii_case("COMMIT") {
                self.tx_commit.fetch_add(1, Ordering::Relaxed);
            } else if keyword.eq_ignore_ascii_case("ROLLBACK") {
                self.tx_rollback.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

fn leading_keyword(sql: &str) -> Option<&str> {
    let trimmed = sql.trim_start();
    if trimmed.is_empty() {
        return None;
    }
    let end = trimmed
        .find(|c: char| c.is_ascii_whitespace() || c == ';')
        .unwrap_or(trimmed.len());
    Some(&trimmed[..end])
}

mod instrumented {
    use rusqlite::{CachedStatement, Connection};

    use super::IndexMetrics;

    #[derive(Copy, Clone)]
    pub struct InstrumentedConnection<'a> {
        conn: &'a Connection,
        metrics: &'a IndexMetrics,
    }

    impl<'a> InstrumentedConnection<'a> {
        pub fn new(conn: &'a Connection, metrics: &'a IndexMetrics) -> Self {
            Self { conn, metrics }
        }

        pub fn execute<P>(&self, sql: &str, params: P) -> Result<usize, rusqlite::Error>
        where
            P: rusqlite::Params,
        {
            self.metrics.record_execute(Some(sql));
            self.conn.execute(sql, params)
        }

        pub fn prepare_cached<'b>(
            &'b self,
            sql: &str,
        ) -> Result<InstrumentedCachedStatement<'b>, rusqlite::Error> {
            self.metrics.record_prepare();
            Ok(InstrumentedCachedStatement {
                stmt: self.conn.prepare_cached(sql)?,
                metrics: self.metrics,
                sql: sql.to_string(),
            })
        }

        pub fn query_row<P, F, R>(&self, sql: &str, params: P, f: F) -> Result<R, rusqlite::Error>
        where
            P: rusqlite::Params,
            F: FnOnce(&rusqlite::Row<'_>) -> rusqlite::Result<R>,
        {
            self.metrics.record_prepare();
            self.metrics.record_execute(Some(sql));
            self.conn.query_row(sql, params, f)
        }
    }

    pub struct InstrumentedCachedStatement<'conn> {
        stmt: CachedStatement<'conn>,
        metrics: &'conn IndexMetrics,
        sql: String,
    }

    impl<'conn> InstrumentedCachedStatement<'conn> {
        pub fn execute<P>(&mut self, params: P) -> Result<usize, rusqlite::Error>
        where
            P: rusqlite::Params,
        {
            self.metrics.record_execute(Some(self.sql.as_str()));
            self.stmt.execute(params)
        }

        pub fn query_map<P, F, T>(
            &mut self,
            params: P,
            f: F,
        ) -> Result<rusqlite::MappedRows<'_, F>, rusqlite::Error>
        where
            P: rusqlite::Params,
            F: FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
        {
            self.metrics.record_execute(Some(self.sql.as_str()));
            self.stmt.query_map(params, f)
        }

        pub fn query_row<P, F, R>(&mut self, params: P, f: F) -> Result<R, rusqlite::Error>
        where
            P: rusqlite::Params,
            F: FnOnce(&rusqlite::Row<'_>) -> rusqlite::Result<R>,
        {
            self.metrics.record_execute(Some(self.sql.as_str()));
            self.stmt.query_row(params, f)
        }
    }
}
