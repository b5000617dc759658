//! Statement execution and row materialization.

use core::any::Any;
use std::rc::Rc;

use compact_str::CompactString;

use crate::builder::Statement;
use crate::error::{QueryError, Result};
use crate::identity::IdentityMap;
use crate::projection::{Projection, SelectItem, Slot};
use crate::row::{RawRow, RowReader};

/// Runs statements against a persistence context.
pub trait Executor {
    /// Every matching row; empty if none match.
    fn fetch<P: Projection>(&mut self, statement: Statement<P>) -> Result<Vec<P::Output>>;

    /// The only matching row, or `None`.
    ///
    /// Fails with [`QueryError::NonUniqueResult`] when more than one row matches.
    fn fetch_one<P: Projection>(&mut self, statement: Statement<P>) -> Result<Option<P::Output>> {
        let mut rows = self.fetch(statement)?;
        match rows.len() {
            0 | 1 => Ok(rows.pop()),
            n => Err(QueryError::NonUniqueResult(n)),
        }
    }

    /// The first matching row, fetched with `LIMIT 1`.
    fn fetch_first<P: Projection>(
        &mut self,
        statement: Statement<P>,
    ) -> Result<Option<P::Output>> {
        Ok(self.fetch(statement.with_limit(1))?.into_iter().next())
    }

    /// The only matching row.
    ///
    /// Fails with [`QueryError::NoResult`] when nothing matches.
    fn fetch_single<P: Projection>(&mut self, statement: Statement<P>) -> Result<P::Output> {
        self.fetch_one(statement)?.ok_or(QueryError::NoResult)
    }
}

/// Turns raw rows into projection outputs.
///
/// Entities are reconciled with `identity`, and fetch-joined targets are
/// attached to their owners' associations.
pub fn materialize<P: Projection>(
    statement: &Statement<P>,
    rows: &[RawRow],
    identity: &mut IdentityMap,
) -> Result<Vec<P::Output>> {
    let items = statement.items();
    let fetches: Vec<_> = statement.fetch_joins().collect();
    let mut outputs = Vec::with_capacity(rows.len());

    for row in rows {
        let mut reader = RowReader::new(row, identity);

        let slots = items
            .iter()
            .map(|item| item.read(&mut reader))
            .collect::<Result<Vec<Slot>>>()?;

        let mut owners: Vec<(&CompactString, Rc<dyn Any>)> = items
            .iter()
            .zip(&slots)
            .filter_map(|(item, slot)| match (item, slot) {
                (SelectItem::Entity { alias, .. }, Slot::Entity(Some(entity))) => {
                    Some((alias, Rc::clone(entity)))
                }
                _ => None,
            })
            .collect();

        for join in &fetches {
            let target = join.binding.read_target(&mut reader)?;
            let owner = owners
                .iter()
                .find(|(alias, _)| **alias == join.owner)
                .map(|(_, owner)| Rc::clone(owner));
            if let (Some(owner), Some(target)) = (owner, target) {
                join.binding.attach(&owner, &target)?;
                crate::quarry_trace_context!(
                    "fetch_join",
                    path = format_args!("{}.{}", join.owner, join.association)
                );
                owners.push((&join.alias, target));
            }
        }

        if reader.remaining() != 0 {
            return Err(QueryError::Mapping(format!(
                "row has {} unread columns",
                reader.remaining()
            )));
        }

        let mut slots = slots.into_iter();
        outputs.push(statement.projection().decode(items, &mut slots)?);
    }
    Ok(outputs)
}
