//! Cursor-based reading of result rows.
//!
//! A storage engine hands back each row as a flat [`RawRow`]. Projections and
//! entities read it left to right through a [`RowReader`], which also
//! reconciles every entity it reads with the persistence context's
//! [`IdentityMap`]:
//!
//! ```text
//! | m.member_id | m.username | m.age | m.team_id | t.team_id | t.name |
//!   \______________ Member ______________/          \___ Team ___/
//! ```
//!
//! An entity whose identity is already resident is not rebuilt; its columns
//! are skipped and the resident instance is returned.

// Driver-specific raw row conversion
#[cfg(feature = "rusqlite")]
mod rusqlite;

use core::any::Any;
use std::rc::Rc;

use crate::entity::{Association, Entity};
use crate::error::{QueryError, Result};
use crate::identity::IdentityMap;
use crate::value::{FromValue, Value};

/// One result row as returned by a storage engine.
pub type RawRow = Vec<Value>;

/// Conversion of a driver row into a [`RawRow`].
pub trait IntoRawRow {
    fn to_raw_row(&self) -> Result<RawRow>;
}

/// Reads values from a row in order.
pub struct RowReader<'r> {
    values: &'r [Value],
    position: usize,
    identity: &'r mut IdentityMap,
}

impl<'r> RowReader<'r> {
    pub fn new(values: &'r [Value], identity: &'r mut IdentityMap) -> Self {
        Self {
            values,
            position: 0,
            identity,
        }
    }

    /// Index of the next column to read.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.values.len().saturating_sub(self.position)
    }

    pub fn next_value(&mut self) -> Result<Value> {
        let value = self.values.get(self.position).cloned().ok_or_else(|| {
            QueryError::Mapping(format!(
                "row has {} columns, tried to read column {}",
                self.values.len(),
                self.position + 1
            ))
        })?;
        self.position += 1;
        Ok(value)
    }

    /// Reads the next column as `T`.
    pub fn get<T: FromValue>(&mut self) -> Result<T> {
        T::from_value(self.next_value()?)
    }

    pub fn skip(&mut self, columns: usize) -> Result<()> {
        if columns > self.remaining() {
            return Err(QueryError::Mapping(format!(
                "row has {} columns, cannot skip {columns} from column {}",
                self.values.len(),
                self.position + 1
            )));
        }
        self.position += columns;
        Ok(())
    }

    /// Reads a foreign-key column as an association.
    ///
    /// If the target is already resident, the association starts out resolved.
    pub fn association<T: Entity>(&mut self) -> Result<Association<T>> {
        let Some(id) = self.get::<Option<i64>>()? else {
            return Ok(Association::empty());
        };
        Ok(match self.identity.get::<T>(id) {
            Some(target) => Association::resolved(target),
            None => Association::unresolved(id),
        })
    }

    /// Reads an entity occupying the next `E::table().width()` columns.
    ///
    /// A NULL identity (the unmatched side of a left join) reads as `None`.
    pub fn entity<E: Entity>(&mut self) -> Result<Option<Rc<E>>> {
        let table = E::table();
        let start = self.position;
        let Some(id) = self.get::<Option<i64>>()? else {
            self.skip(table.width() - 1)?;
            return Ok(None);
        };

        if let Some(resident) = self.identity.get::<E>(id) {
            crate::quarry_trace_context!("identity_hit", table = table.name, id = id);
            self.skip(table.width() - 1)?;
            return Ok(Some(resident));
        }

        let entity = E::from_row(self)?;
        let consumed = self.position - start;
        if consumed != table.width() {
            return Err(QueryError::Mapping(format!(
                "{} read {consumed} columns, table has {}",
                table.name,
                table.width()
            )));
        }
        entity.identity().assign(id)?;
        self.identity.insert(Rc::new(entity)).map(Some)
    }
}

/// Type-erased [`RowReader::entity`], stored in select items and fetch joins.
pub fn read_entity<E: Entity>(row: &mut RowReader<'_>) -> Result<Option<Rc<dyn Any>>> {
    Ok(row.entity::<E>()?.map(|e| e as Rc<dyn Any>))
}
