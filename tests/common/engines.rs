//! Storage engine doubles.

use quarry::{QueryError, Result, StorageEngine, Value};
use quarry::core::RawRow;

/// Counts the statements that reach the wrapped engine.
#[derive(Debug)]
pub struct CountingEngine<S> {
    pub inner: S,
    pub queries: usize,
    pub writes: usize,
}

impl<S> CountingEngine<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            queries: 0,
            writes: 0,
        }
    }

    pub fn statements(&self) -> usize {
        self.queries + self.writes
    }
}

impl<S: StorageEngine> StorageEngine for CountingEngine<S> {
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<RawRow>> {
        self.queries += 1;
        self.inner.query(sql, params)
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize> {
        self.writes += 1;
        self.inner.execute(sql, params)
    }
}

/// An engine that fails on demand and otherwise returns nothing.
#[derive(Debug, Default)]
pub struct FailingEngine {
    pub fail_queries: bool,
    pub fail_writes: bool,
    pub calls: usize,
}

impl FailingEngine {
    pub fn queries() -> Self {
        Self {
            fail_queries: true,
            ..Self::default()
        }
    }

    pub fn writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }
}

impl StorageEngine for FailingEngine {
    fn query(&mut self, sql: &str, _: &[Value]) -> Result<Vec<RawRow>> {
        self.calls += 1;
        if self.fail_queries {
            return Err(QueryError::storage(format!("query rejected: {sql}")));
        }
        Ok(Vec::new())
    }

    fn execute(&mut self, sql: &str, _: &[Value]) -> Result<usize> {
        self.calls += 1;
        if self.fail_writes {
            return Err(QueryError::storage(format!("write rejected: {sql}")));
        }
        Ok(1)
    }
}
