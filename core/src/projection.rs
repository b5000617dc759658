//! Select lists and how their values come back out of a row.
//!
//! A [`Projection`] is what a statement selects: one expression, one entity,
//! a tuple of those, or a dynamic [`SelectList`]. It contributes
//! [`SelectItem`]s to the statement and decodes one output value per row from
//! the [`Slot`]s those items were read into.

use core::any::Any;
use core::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::vec;

use compact_str::CompactString;

use crate::entity::{Entity, EntityPath, TableInfo};
use crate::error::{QueryError, Result};
use crate::expr::{Expr, Node};
use crate::row::{RowReader, read_entity};
use crate::sql::{SQL, ToSQL};
use crate::tuple::Tuple;
use crate::value::{FromValue, SqlValue, Value};

/// Reads one entity out of a row, type-erased.
pub type ReadEntityFn = fn(&mut RowReader<'_>) -> Result<Option<Rc<dyn Any>>>;

// =============================================================================
// SelectItem
// =============================================================================

/// One entry of a select list.
#[derive(Clone)]
pub enum SelectItem {
    /// A single-column expression.
    Expr(Arc<Node>),
    /// Every column of the entity at `alias`.
    Entity {
        alias: CompactString,
        table: &'static TableInfo,
        read: ReadEntityFn,
    },
}

impl SelectItem {
    pub fn expr<T>(expr: &Expr<T>) -> Self {
        SelectItem::Expr(Arc::clone(expr.node()))
    }

    pub fn entity<E: Entity>(path: &EntityPath<E>) -> Self {
        SelectItem::Entity {
            alias: path.alias().clone(),
            table: E::table(),
            read: read_entity::<E>,
        }
    }

    /// Alias of the selected entity, if this item is one.
    pub fn entity_alias(&self) -> Option<&CompactString> {
        match self {
            SelectItem::Entity { alias, .. } => Some(alias),
            SelectItem::Expr(_) => None,
        }
    }

    /// Number of result columns the item occupies.
    pub fn width(&self) -> usize {
        match self {
            SelectItem::Expr(_) => 1,
            SelectItem::Entity { table, .. } => table.width(),
        }
    }

    /// Same expression, or same entity at the same alias.
    pub fn matches(&self, other: &SelectItem) -> bool {
        match (self, other) {
            (SelectItem::Expr(a), SelectItem::Expr(b)) => a == b,
            (
                SelectItem::Entity { alias: a, table: ta, .. },
                SelectItem::Entity { alias: b, table: tb, .. },
            ) => a == b && core::ptr::eq(*ta, *tb),
            _ => false,
        }
    }

    /// Reads this item's columns from `row`.
    pub fn read(&self, row: &mut RowReader<'_>) -> Result<Slot> {
        match self {
            SelectItem::Expr(_) => row.next_value().map(Slot::Value),
            SelectItem::Entity { read, .. } => read(row).map(Slot::Entity),
        }
    }
}

impl ToSQL for SelectItem {
    fn to_sql(&self) -> SQL {
        match self {
            SelectItem::Expr(node) => node.to_sql(),
            SelectItem::Entity { alias, table, .. } => table.select_columns(alias),
        }
    }
}

impl fmt::Debug for SelectItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectItem::Expr(node) => f.debug_tuple("Expr").field(node).finish(),
            SelectItem::Entity { alias, table, .. } => f
                .debug_struct("Entity")
                .field("alias", alias)
                .field("table", &table.name)
                .finish(),
        }
    }
}

impl<T> From<Expr<T>> for SelectItem {
    fn from(expr: Expr<T>) -> Self {
        SelectItem::Expr(expr.into_node())
    }
}

impl<T> From<&Expr<T>> for SelectItem {
    fn from(expr: &Expr<T>) -> Self {
        SelectItem::expr(expr)
    }
}

impl<E: Entity> From<&EntityPath<E>> for SelectItem {
    fn from(path: &EntityPath<E>) -> Self {
        SelectItem::entity(path)
    }
}

// =============================================================================
// Slot
// =============================================================================

/// The value read for one select item.
#[derive(Debug, Clone)]
pub enum Slot {
    Value(Value),
    /// `None` for the unmatched side of a left join.
    Entity(Option<Rc<dyn Any>>),
}

impl Slot {
    pub(crate) fn into_value(self) -> Result<Value> {
        match self {
            Slot::Value(value) => Ok(value),
            Slot::Entity(_) => Err(QueryError::Mapping(
                "expected a column value, found an entity".into(),
            )),
        }
    }

    pub(crate) fn entity<E: Entity>(&self) -> Result<Option<Rc<E>>> {
        match self {
            Slot::Entity(None) => Ok(None),
            Slot::Entity(Some(entity)) => Rc::clone(entity).downcast::<E>().map(Some).map_err(|_| {
                QueryError::Mapping(format!("selected entity is not a {}", E::table().name))
            }),
            Slot::Value(_) => Err(QueryError::Mapping(format!(
                "expected a {} entity, found a column value",
                E::table().name
            ))),
        }
    }
}

// =============================================================================
// Projection
// =============================================================================

/// A select list with a typed per-row output.
pub trait Projection {
    type Output;

    fn select_items(&self) -> Vec<SelectItem>;

    /// Builds one output from the slots of a row. `items` is the statement's
    /// full select list.
    fn decode(&self, items: &Arc<[SelectItem]>, slots: &mut vec::IntoIter<Slot>)
    -> Result<Self::Output>;
}

fn next_slot(slots: &mut vec::IntoIter<Slot>) -> Result<Slot> {
    slots
        .next()
        .ok_or_else(|| QueryError::Mapping("row has fewer select items than expected".into()))
}

impl<T: SqlValue> Projection for Expr<T> {
    type Output = T;

    fn select_items(&self) -> Vec<SelectItem> {
        vec![SelectItem::expr(self)]
    }

    fn decode(&self, _: &Arc<[SelectItem]>, slots: &mut vec::IntoIter<Slot>) -> Result<T> {
        T::from_value(next_slot(slots)?.into_value()?)
    }
}

impl<T: SqlValue> Projection for &Expr<T> {
    type Output = T;

    fn select_items(&self) -> Vec<SelectItem> {
        (**self).select_items()
    }

    fn decode(&self, items: &Arc<[SelectItem]>, slots: &mut vec::IntoIter<Slot>) -> Result<T> {
        (**self).decode(items, slots)
    }
}

impl<E: Entity> Projection for EntityPath<E> {
    type Output = Rc<E>;

    fn select_items(&self) -> Vec<SelectItem> {
        vec![SelectItem::entity(self)]
    }

    fn decode(&self, _: &Arc<[SelectItem]>, slots: &mut vec::IntoIter<Slot>) -> Result<Rc<E>> {
        next_slot(slots)?.entity::<E>()?.ok_or_else(|| {
            QueryError::Mapping(format!(
                "selected {} at alias {} is NULL",
                E::table().name,
                self.alias()
            ))
        })
    }
}

impl<E: Entity> Projection for &EntityPath<E> {
    type Output = Rc<E>;

    fn select_items(&self) -> Vec<SelectItem> {
        (**self).select_items()
    }

    fn decode(&self, items: &Arc<[SelectItem]>, slots: &mut vec::IntoIter<Slot>) -> Result<Rc<E>> {
        (**self).decode(items, slots)
    }
}

/// A single-item projection that reads SQL NULL as `None`.
///
/// Needed for aggregates over an empty set and for the right side of a left
/// join:
///
/// ```ignore
/// let oldest: Option<Option<i64>> = Query::select(m.age.max().nullable())
///     .from(&m)
///     .fetch_one(&mut ctx)?;
/// let teams: Vec<Option<Rc<Team>>> = Query::select(t.nullable())
///     .from(&m)
///     .left_join(&m.team, &t)
///     .fetch(&mut ctx)?;
/// ```
#[derive(Debug, Clone)]
pub struct Nullable<P>(P);

impl<P> Nullable<P> {
    pub fn new(inner: P) -> Self {
        Self(inner)
    }

    pub fn inner(&self) -> &P {
        &self.0
    }
}

impl<T: SqlValue> Projection for Nullable<Expr<T>> {
    type Output = Option<T>;

    fn select_items(&self) -> Vec<SelectItem> {
        self.0.select_items()
    }

    fn decode(&self, _: &Arc<[SelectItem]>, slots: &mut vec::IntoIter<Slot>) -> Result<Option<T>> {
        Option::<T>::from_value(next_slot(slots)?.into_value()?)
    }
}

impl<E: Entity> Projection for Nullable<EntityPath<E>> {
    type Output = Option<Rc<E>>;

    fn select_items(&self) -> Vec<SelectItem> {
        self.0.select_items()
    }

    fn decode(
        &self,
        _: &Arc<[SelectItem]>,
        slots: &mut vec::IntoIter<Slot>,
    ) -> Result<Option<Rc<E>>> {
        next_slot(slots)?.entity::<E>()
    }
}

macro_rules! impl_tuple_projection {
    ($($T:ident),+) => {
        impl<$($T: Projection),+> Projection for ($($T,)+) {
            type Output = Tuple;

            #[allow(non_snake_case)]
            fn select_items(&self) -> Vec<SelectItem> {
                let ($($T,)+) = self;
                let mut items = Vec::new();
                $(items.extend($T.select_items());)+
                items
            }

            fn decode(&self, items: &Arc<[SelectItem]>, slots: &mut vec::IntoIter<Slot>) -> Result<Tuple> {
                Ok(Tuple::new(Arc::clone(items), slots.collect()))
            }
        }
    };
}

impl_tuple_projection!(A, B);
impl_tuple_projection!(A, B, C);
impl_tuple_projection!(A, B, C, D);
impl_tuple_projection!(A, B, C, D, E);
impl_tuple_projection!(A, B, C, D, E, F);
impl_tuple_projection!(A, B, C, D, E, F, G);
impl_tuple_projection!(A, B, C, D, E, F, G, H);

/// A select list assembled at runtime, read back as [`Tuple`] rows.
#[derive(Debug, Clone, Default)]
pub struct SelectList(pub Vec<SelectItem>);

impl SelectList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, item: impl Into<SelectItem>) -> Self {
        self.0.push(item.into());
        self
    }
}

impl<I: Into<SelectItem>> FromIterator<I> for SelectList {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl Projection for SelectList {
    type Output = Tuple;

    fn select_items(&self) -> Vec<SelectItem> {
        self.0.clone()
    }

    fn decode(&self, items: &Arc<[SelectItem]>, slots: &mut vec::IntoIter<Slot>) -> Result<Tuple> {
        Ok(Tuple::new(Arc::clone(items), slots.collect()))
    }
}
