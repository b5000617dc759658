//! Synchronous SQLite storage engine using [`rusqlite`].
//!
//! # Example
//!
//! ```no_run
//! use quarry::sample::{self, QMember};
//! use quarry::sqlite::SqliteEngine;
//! use quarry::{PersistenceContext, Query};
//!
//! fn main() -> quarry::Result<()> {
//!     let mut engine = SqliteEngine::open_in_memory()?;
//!     engine.create_tables(sample::tables())?;
//!     let mut ctx = PersistenceContext::new(engine);
//!     sample::seed(&mut ctx)?;
//!
//!     let m = QMember::member();
//!     let member1 = Query::select_from(&m)
//!         .r#where(m.username.eq("member1"))
//!         .fetch_single(&mut ctx)?;
//!     assert_eq!(member1.age(), 10);
//!     Ok(())
//! }
//! ```

use std::path::Path;

use quarry_core::{IntoRawRow, RawRow, Result, TableInfo, Value};
use rusqlite::{Connection, params_from_iter};

use crate::engine::StorageEngine;

/// A [`StorageEngine`] over one rusqlite [`Connection`].
#[derive(Debug)]
pub struct SqliteEngine {
    conn: Connection,
}

impl SqliteEngine {
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_connection(Connection::open(path)?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_connection(self) -> Connection {
        self.conn
    }

    /// Creates `table` if it does not exist.
    pub fn create_table(&mut self, table: &TableInfo) -> Result<()> {
        let sql = table.create_table_sql();
        quarry_core::quarry_trace_query!(&sql, 0);
        self.conn.execute(&sql, [])?;
        Ok(())
    }

    /// Creates every table, in order.
    pub fn create_tables<'t>(&mut self, tables: impl IntoIterator<Item = &'t TableInfo>) -> Result<()> {
        for table in tables {
            self.create_table(table)?;
        }
        Ok(())
    }
}

impl StorageEngine for SqliteEngine {
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<RawRow>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(params))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(row.to_raw_row()?);
        }
        Ok(out)
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize> {
        Ok(self.conn.execute(sql, params_from_iter(params))?)
    }
}
