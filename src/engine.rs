//! The storage-engine boundary.

use quarry_core::{RawRow, Result, Value};

/// Executes rendered SQL with positional parameters.
///
/// Engines report their own failures as
/// [`QueryError::StorageExecution`](quarry_core::QueryError::StorageExecution);
/// the persistence context propagates them unchanged.
pub trait StorageEngine {
    /// Runs a query and returns every row, columns in select order.
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<RawRow>>;

    /// Runs a statement and returns the number of affected rows.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize>;
}

impl<E: StorageEngine + ?Sized> StorageEngine for Box<E> {
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<RawRow>> {
        (**self).query(sql, params)
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize> {
        (**self).execute(sql, params)
    }
}
