//! # quarry
//!
//! A typed query builder over a persistence context, with inner and left
//! joins, ON filters, fetch joins and tuple projections.
//!
//! ## Quick Start
//!
//! ```rust
//! use quarry::prelude::*;
//! use quarry::sample::{self, QMember, QTeam};
//! use quarry::sqlite::SqliteEngine;
//!
//! # fn main() -> quarry::Result<()> {
//! let mut engine = SqliteEngine::open_in_memory()?;
//! engine.create_tables(sample::tables())?;
//! let mut ctx = PersistenceContext::new(engine);
//! sample::seed(&mut ctx)?;
//! ctx.flush()?;
//! ctx.clear();
//!
//! let (m, t) = (QMember::member(), QTeam::team());
//! let members = Query::select(&m)
//!     .from(&m)
//!     .inner_join(&m.team, &t)
//!     .fetch_join()
//!     .r#where(t.name.eq("teamA"))
//!     .fetch(&mut ctx)?;
//!
//! assert_eq!(members.len(), 2);
//! assert!(members.iter().all(|member| ctx.is_loaded(&**member, &m.team)));
//! # Ok(())
//! # }
//! ```
//!
//! ## Storage Engines
//!
//! | Engine | Driver   | Feature Flag |
//! |--------|----------|--------------|
//! | SQLite | rusqlite | `rusqlite`   |
//!
//! Other engines implement [`StorageEngine`].

#![cfg_attr(docsrs, feature(doc_cfg))]

mod context;
mod engine;
mod executor;
pub mod residency;
pub mod sample;

#[cfg(feature = "rusqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "rusqlite")))]
pub mod sqlite;

// =============================================================================
// Root-level exports
// =============================================================================

pub use context::{ContextConfig, FlushMode, PersistenceContext};
pub use engine::StorageEngine;
pub use residency::{Residency, ResidencyTracker, is_loaded};

/// Result type for quarry operations
pub use quarry_core::error::Result;

/// Error types
pub mod error {
    pub use quarry_core::error::QueryError;
}

pub use quarry_core::{
    Association, AssociationPath, Entity, EntityPath, Executor, Expr, Identity, Predicate, Query,
    QueryError, Statement, Tuple, Value,
};

/// Declares a query type; see [`quarry_core::impl_query_type`].
pub use quarry_core::impl_query_type;

// =============================================================================
// Core module - shared functionality
// =============================================================================

/// Engine-agnostic building blocks.
///
/// ```rust,ignore
/// use quarry::core::expr::{all_of, any_of};
/// use quarry::core::sql::ToSQL;
/// ```
pub mod core {
    pub use quarry_core::{
        builder, entity, error, executor, expr, identity, join, projection, row, sql, tuple, value,
    };

    pub use quarry_core::{
        ColumnInfo, FromValue, IdentityMap, IntoRawRow, Nullable, Numeric, RawRow, RowReader, SQL,
        SQLChunk, SelectItem, SelectList, SqlType, SqlValue, TableInfo, ToSQL, Token, TupleKey,
    };
}

/// Everything needed to declare entities and run queries.
pub mod prelude {
    pub use crate::context::{ContextConfig, FlushMode, PersistenceContext};
    pub use crate::engine::StorageEngine;
    pub use crate::residency::{Residency, ResidencyTracker};

    pub use quarry_core::{
        Association, AssociationPath, ColumnInfo, Entity, EntityPath, Executor, Expr, Identity,
        IntoExpr, Nullable, Order, OrderSpecifier, Predicate, Query, QueryError, Result,
        RowReader, SelectList, SqlType, TableInfo, Tuple, Value, all_of, any_of, impl_query_type,
    };
}
