//! Core building blocks for quarry: values, SQL assembly, typed expressions,
//! entity metadata, the identity map and the select statement builder.
//!
//! Storage engines and the persistence context live in the `quarry` crate;
//! everything here is engine-agnostic.

pub mod builder;
pub mod entity;
pub mod error;
pub mod executor;
pub mod expr;
pub mod identity;
pub mod join;
pub mod projection;
pub mod row;
pub mod sql;
pub mod tracing;
pub mod tuple;
pub mod value;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export key types and traits
pub use builder::{
    Expressions, FromClause, OrderSpecifiers, Predicates, Query, SelectBuilder, SelectFromSet,
    SelectInitial, Statement,
};
pub use entity::{
    Association, AssociationPath, ColumnInfo, Entity, EntityPath, EntitySource, Identity,
    TableInfo,
};
pub use error::{QueryError, Result};
pub use executor::{Executor, materialize};
pub use expr::{Expr, IntoExpr, Node, Order, OrderSpecifier, Predicate, all_of, any_of};
pub use identity::{EntityKey, IdentityMap};
pub use join::{FetchBinding, JoinClause, JoinType};
pub use projection::{Nullable, Projection, SelectItem, SelectList, Slot};
pub use row::{IntoRawRow, RawRow, RowReader, read_entity};
pub use sql::{SQL, SQLChunk, ToSQL, Token};
pub use tuple::{Tuple, TupleKey};
pub use value::{FromValue, Numeric, SqlType, SqlValue, Value};
