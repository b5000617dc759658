//! Entity metadata, identity and associations.
//!
//! Entities are plain structs implementing [`Entity`]. Query code refers to
//! them through aliased paths: an [`EntityPath`] names one occurrence of an
//! entity in a statement, an [`AssociationPath`] names a many-to-one
//! association reachable from such an occurrence.

use core::any::Any;
use core::fmt;
use core::marker::PhantomData;
use std::cell::OnceCell;
use std::rc::Rc;

use compact_str::CompactString;

use crate::error::{QueryError, Result};
use crate::expr::Expr;
use crate::projection::Nullable;
use crate::row::RowReader;
use crate::sql::{SQL, SQLChunk, Token};
use crate::value::{SqlType, SqlValue, Value};

// =============================================================================
// Table metadata
// =============================================================================

/// A non-identity column of an entity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub nullable: bool,
    /// Referenced `(table, column)` for foreign keys.
    pub references: Option<(&'static str, &'static str)>,
}

impl ColumnInfo {
    pub const fn new(name: &'static str, sql_type: SqlType) -> Self {
        Self {
            name,
            sql_type,
            nullable: false,
            references: None,
        }
    }

    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub const fn references(mut self, table: &'static str, column: &'static str) -> Self {
        self.references = Some((table, column));
        self
    }
}

/// Table layout of an entity: the identity column followed by `columns`.
///
/// Rows are always read and written in this order.
#[derive(Debug, PartialEq, Eq)]
pub struct TableInfo {
    pub name: &'static str,
    pub id_column: &'static str,
    pub columns: &'static [ColumnInfo],
}

impl TableInfo {
    /// Number of result columns an entity of this table occupies.
    pub const fn width(&self) -> usize {
        self.columns.len() + 1
    }

    /// Column names in row order, identity first.
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        core::iter::once(self.id_column).chain(self.columns.iter().map(|c| c.name))
    }

    /// Qualified column list for `alias`, in row order.
    pub fn select_columns(&self, alias: &CompactString) -> SQL {
        SQL::join(
            self.column_names()
                .map(|name| SQL::column(alias.clone(), name)),
            Token::COMMA,
        )
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for this table.
    pub fn create_table_sql(&self) -> String {
        let mut sql = format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" (\"{}\" INTEGER PRIMARY KEY",
            self.name, self.id_column
        );
        for column in self.columns {
            sql.push_str(&format!(", \"{}\" {}", column.name, column.sql_type.as_str()));
            if !column.nullable {
                sql.push_str(" NOT NULL");
            }
            if let Some((table, id)) = column.references {
                sql.push_str(&format!(" REFERENCES \"{table}\" (\"{id}\")"));
            }
        }
        sql.push(')');
        sql
    }

    /// `INSERT INTO "table" (id, columns...) VALUES (?, ...)`.
    pub fn insert_sql(&self, id: i64, values: Vec<Value>) -> Result<SQL> {
        if values.len() != self.columns.len() {
            return Err(QueryError::Mapping(format!(
                "table {} expects {} column values, got {}",
                self.name,
                self.columns.len(),
                values.len()
            )));
        }
        let names = SQL::join(self.column_names().map(SQL::ident), Token::COMMA);
        let params = SQL::param_list(core::iter::once(Value::Integer(id)).chain(values));
        Ok(SQL::from_iter([Token::INSERT, Token::INTO])
            .push(SQLChunk::ident(self.name))
            .append(names.parens())
            .push(Token::VALUES)
            .append(params.parens()))
    }
}

// =============================================================================
// Entity
// =============================================================================

/// A persistable record type.
///
/// `column_values` and `from_row` handle the non-identity columns in
/// [`TableInfo::columns`] order; the identity column is handled by the caller.
/// Equality of entities should compare [`Identity`] only.
pub trait Entity: Any + Sized {
    fn table() -> &'static TableInfo;

    fn identity(&self) -> &Identity;

    fn column_values(&self) -> Result<Vec<Value>>;

    fn from_row(row: &mut RowReader<'_>) -> Result<Self>;

    #[inline]
    fn id(&self) -> Option<i64> {
        self.identity().get()
    }
}

/// Entity identity, assigned once on first persist.
#[derive(Default)]
pub struct Identity(OnceCell<i64>);

impl Identity {
    pub const fn new() -> Self {
        Self(OnceCell::new())
    }

    #[inline]
    pub fn get(&self) -> Option<i64> {
        self.0.get().copied()
    }

    #[inline]
    pub fn is_assigned(&self) -> bool {
        self.0.get().is_some()
    }

    /// Assigns the identity. Fails if one is already assigned.
    pub fn assign(&self, id: i64) -> Result<()> {
        self.0.set(id).map_err(|_| {
            QueryError::Persistence(format!(
                "identity already assigned ({:?}), cannot reassign to {id}",
                self.get()
            ))
        })
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(id) => write!(f, "Identity({id})"),
            None => f.write_str("Identity(transient)"),
        }
    }
}

/// Identities compare equal when both are assigned and equal. A transient
/// identity only equals itself.
impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        match (self.get(), other.get()) {
            (Some(a), Some(b)) => a == b,
            _ => core::ptr::eq(self, other),
        }
    }
}

impl Eq for Identity {}

// =============================================================================
// Association
// =============================================================================

/// Many-to-one reference to another entity, loaded lazily by default.
///
/// The target is either resolved (materialized and shared from the identity
/// map) or unresolved (only the foreign identity is known). A resolved
/// association never goes back to unresolved.
pub struct Association<T> {
    id: Option<i64>,
    target: OnceCell<Rc<T>>,
}

impl<T: Entity> Association<T> {
    /// No target.
    pub const fn empty() -> Self {
        Self {
            id: None,
            target: OnceCell::new(),
        }
    }

    /// Reference to a known, materialized target.
    pub fn resolved(target: Rc<T>) -> Self {
        Self {
            id: target.id(),
            target: OnceCell::from(target),
        }
    }

    /// Reference to a target by identity only.
    pub const fn unresolved(id: i64) -> Self {
        Self {
            id: Some(id),
            target: OnceCell::new(),
        }
    }

    /// Identity of the target, if any.
    pub fn id(&self) -> Option<i64> {
        self.target.get().and_then(|t| t.id()).or(self.id)
    }

    /// Foreign identity to write; fails if the target was never persisted.
    pub fn foreign_key(&self) -> Result<Option<i64>> {
        match self.target.get() {
            Some(target) => target.id().map(Some).ok_or_else(|| {
                QueryError::Persistence(format!(
                    "association references a transient {}; persist it first",
                    T::table().name
                ))
            }),
            None => Ok(self.id),
        }
    }

    /// The target, if resolved. Never triggers a load.
    pub fn get(&self) -> Option<&Rc<T>> {
        self.target.get()
    }

    pub fn is_empty(&self) -> bool {
        self.id().is_none() && self.target.get().is_none()
    }

    /// True if there is nothing left to load.
    pub fn is_loaded(&self) -> bool {
        self.target.get().is_some() || self.is_empty()
    }

    /// Resolves the association to `target`.
    ///
    /// Resolving again with the instance already held is a no-op.
    pub fn resolve(&self, target: Rc<T>) -> Result<()> {
        if let (Some(expected), Some(actual)) = (self.id(), target.id())
            && expected != actual
        {
            return Err(QueryError::Persistence(format!(
                "association on {} expects identity {expected}, got {actual}",
                T::table().name
            )));
        }
        match self.target.get() {
            Some(existing) if Rc::ptr_eq(existing, &target) => Ok(()),
            Some(_) => Err(QueryError::Persistence(format!(
                "association on {} is already resolved to another instance",
                T::table().name
            ))),
            None => {
                let _ = self.target.set(target);
                Ok(())
            }
        }
    }
}

impl<T: Entity> Default for Association<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Entity> fmt::Debug for Association<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Association")
            .field("table", &T::table().name)
            .field("id", &self.id())
            .field("loaded", &self.target.get().is_some())
            .finish()
    }
}

// =============================================================================
// Paths
// =============================================================================

/// One aliased occurrence of entity `E` in a statement.
pub struct EntityPath<E> {
    alias: CompactString,
    marker: PhantomData<fn() -> E>,
}

impl<E: Entity> EntityPath<E> {
    pub fn new(alias: impl Into<CompactString>) -> Self {
        Self {
            alias: alias.into(),
            marker: PhantomData,
        }
    }

    #[inline]
    pub fn alias(&self) -> &CompactString {
        &self.alias
    }

    #[inline]
    pub fn table(&self) -> &'static TableInfo {
        E::table()
    }

    /// Identity column.
    pub fn id(&self) -> Expr<i64> {
        Expr::column(self.alias.clone(), E::table().id_column)
    }

    /// Typed column `name` of this occurrence.
    pub fn column<T: SqlValue>(&self, name: &'static str) -> Expr<T> {
        Expr::column(self.alias.clone(), name)
    }

    /// COUNT over the identity column, i.e. number of matched entities.
    pub fn count(&self) -> Expr<i64> {
        self.id().count()
    }

    /// Selects this entity with an unmatched left-join side read as `None`.
    pub fn nullable(&self) -> Nullable<Self> {
        Nullable::new(self.clone())
    }
}

impl<E> Clone for EntityPath<E> {
    fn clone(&self) -> Self {
        Self {
            alias: self.alias.clone(),
            marker: PhantomData,
        }
    }
}

impl<E: Entity> fmt::Debug for EntityPath<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} AS {}", E::table().name, self.alias)
    }
}

/// Anything that stands for an aliased entity in a query: an [`EntityPath`]
/// or a generated query type wrapping one.
pub trait EntitySource {
    type Entity: Entity;

    fn entity_path(&self) -> &EntityPath<Self::Entity>;
}

impl<E: Entity> EntitySource for EntityPath<E> {
    type Entity = E;

    fn entity_path(&self) -> &EntityPath<E> {
        self
    }
}

/// Many-to-one association from owner `S` (at alias `owner`) to target `T`.
pub struct AssociationPath<S, T> {
    owner: CompactString,
    name: &'static str,
    fk_column: &'static str,
    accessor: fn(&S) -> &Association<T>,
}

impl<S: Entity, T: Entity> AssociationPath<S, T> {
    pub fn new(
        owner: impl Into<CompactString>,
        name: &'static str,
        fk_column: &'static str,
        accessor: fn(&S) -> &Association<T>,
    ) -> Self {
        Self {
            owner: owner.into(),
            name,
            fk_column,
            accessor,
        }
    }

    #[inline]
    pub fn owner(&self) -> &CompactString {
        &self.owner
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn fk_column(&self) -> &'static str {
        self.fk_column
    }

    /// The association field on `owner`.
    #[inline]
    pub fn get<'a>(&self, owner: &'a S) -> &'a Association<T> {
        (self.accessor)(owner)
    }

    /// Foreign-key column on the owner alias.
    pub fn foreign_key(&self) -> Expr<i64> {
        Expr::column(self.owner.clone(), self.fk_column)
    }
}

impl<S, T> Clone for AssociationPath<S, T> {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner.clone(),
            name: self.name,
            fk_column: self.fk_column,
            accessor: self.accessor,
        }
    }
}

impl<S, T> fmt::Debug for AssociationPath<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.name)
    }
}

/// Wires a query type that wraps an [`EntityPath`] field into the query API:
/// entity source, deref to the path, projection and tuple lookup.
///
/// ```ignore
/// pub struct QTeam {
///     entity: EntityPath<Team>,
///     pub id: Expr<i64>,
///     pub name: Expr<String>,
/// }
///
/// impl_query_type!(QTeam => Team, entity);
/// ```
#[macro_export]
macro_rules! impl_query_type {
    ($query:ty => $entity:ty, $field:ident) => {
        impl $crate::EntitySource for $query {
            type Entity = $entity;

            fn entity_path(&self) -> &$crate::EntityPath<$entity> {
                &self.$field
            }
        }

        impl ::core::ops::Deref for $query {
            type Target = $crate::EntityPath<$entity>;

            fn deref(&self) -> &Self::Target {
                &self.$field
            }
        }

        impl<'q> $crate::Projection for &'q $query {
            type Output = ::std::rc::Rc<$entity>;

            fn select_items(&self) -> ::std::vec::Vec<$crate::SelectItem> {
                $crate::Projection::select_items(&self.$field)
            }

            fn decode(
                &self,
                items: &::std::sync::Arc<[$crate::SelectItem]>,
                slots: &mut ::std::vec::IntoIter<$crate::Slot>,
            ) -> $crate::Result<Self::Output> {
                $crate::Projection::decode(&self.$field, items, slots)
            }
        }

        impl $crate::TupleKey for $query {
            type Output = ::std::rc::Rc<$entity>;

            fn matches(&self, item: &$crate::SelectItem) -> bool {
                $crate::TupleKey::matches(&self.$field, item)
            }

            fn extract(&self, slot: &$crate::Slot) -> $crate::Result<Option<Self::Output>> {
                $crate::TupleKey::extract(&self.$field, slot)
            }
        }
    };
}
