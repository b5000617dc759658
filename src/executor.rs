//! Statement execution against a [`PersistenceContext`].

use quarry_core::{Executor, Projection, Result, Statement, ToSQL, materialize, quarry_trace_query};

use crate::context::PersistenceContext;
use crate::engine::StorageEngine;

impl<S: StorageEngine> Executor for PersistenceContext<S> {
    fn fetch<P: Projection>(&mut self, statement: Statement<P>) -> Result<Vec<P::Output>> {
        self.auto_flush()?;

        let (sql, params) = statement.to_sql().build();
        quarry_trace_query!(&sql, params.len());
        let rows = self.engine.query(&sql, &params)?;

        materialize(&statement, &rows, &mut self.identity)
    }
}
