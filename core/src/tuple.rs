//! Tuple rows addressed by the expressions that selected them.
//!
//! ```ignore
//! let rows = Query::select((m.username.clone(), m.age.avg()))
//!     .from(&m)
//!     .group_by(&m.username)
//!     .fetch(&mut ctx)?;
//! let avg: Option<f64> = rows[0].get(&m.age.avg())?;
//! ```
//!
//! Lookup is structural: an expression built again the same way addresses the
//! same column. When an expression is selected twice, the first occurrence
//! wins; use [`Tuple::get_at`] for positional access.

use core::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::entity::{Entity, EntityPath};
use crate::error::{QueryError, Result};
use crate::expr::Expr;
use crate::projection::{SelectItem, Slot};
use crate::value::{FromValue, SqlValue};

/// Keys usable with [`Tuple::get`].
pub trait TupleKey {
    type Output;

    fn matches(&self, item: &SelectItem) -> bool;

    fn extract(&self, slot: &Slot) -> Result<Option<Self::Output>>;
}

impl<T: SqlValue> TupleKey for Expr<T> {
    type Output = T;

    fn matches(&self, item: &SelectItem) -> bool {
        matches!(item, SelectItem::Expr(node) if node == self.node())
    }

    fn extract(&self, slot: &Slot) -> Result<Option<T>> {
        Option::<T>::from_value(slot.clone().into_value()?)
    }
}

impl<E: Entity> TupleKey for EntityPath<E> {
    type Output = Rc<E>;

    fn matches(&self, item: &SelectItem) -> bool {
        matches!(
            item,
            SelectItem::Entity { alias, table, .. }
                if alias == self.alias() && core::ptr::eq(*table, E::table())
        )
    }

    fn extract(&self, slot: &Slot) -> Result<Option<Rc<E>>> {
        slot.entity::<E>()
    }
}

/// One result row of a multi-item select list.
#[derive(Clone)]
pub struct Tuple {
    items: Arc<[SelectItem]>,
    slots: Vec<Slot>,
}

impl Tuple {
    pub(crate) fn new(items: Arc<[SelectItem]>, slots: Vec<Slot>) -> Self {
        Self { items, slots }
    }

    /// Value of the select item `key`; `Ok(None)` for SQL NULL.
    ///
    /// Fails with a mapping error if `key` was not part of the select list.
    pub fn get<K: TupleKey>(&self, key: &K) -> Result<Option<K::Output>> {
        let index = self
            .items
            .iter()
            .position(|item| key.matches(item))
            .ok_or_else(|| {
                QueryError::Mapping("expression is not part of the select list".into())
            })?;
        self.slot(index).and_then(|slot| key.extract(slot))
    }

    /// Column value at `index`; `Ok(None)` for SQL NULL.
    pub fn get_at<T: FromValue>(&self, index: usize) -> Result<Option<T>> {
        Option::<T>::from_value(self.slot(index)?.clone().into_value()?)
    }

    /// Entity at `index`; `Ok(None)` for the unmatched side of a left join.
    pub fn entity_at<E: Entity>(&self, index: usize) -> Result<Option<Rc<E>>> {
        self.slot(index)?.entity::<E>()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn items(&self) -> &[SelectItem] {
        &self.items
    }

    fn slot(&self, index: usize) -> Result<&Slot> {
        self.slots.get(index).ok_or_else(|| {
            QueryError::Mapping(format!(
                "tuple has {} items, no item at {index}",
                self.slots.len()
            ))
        })
    }
}

impl fmt::Debug for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.slots).finish()
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, slot) in self.slots.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match slot {
                Slot::Value(value) => write!(f, "{value}")?,
                Slot::Entity(Some(_)) => {
                    let alias = self.items.get(i).and_then(SelectItem::entity_alias);
                    write!(f, "<{}>", alias.map_or("entity", |a| a.as_str()))?
                }
                Slot::Entity(None) => f.write_str("NULL")?,
            }
        }
        f.write_str("]")
    }
}
