//! Identity map: at most one managed instance per (table, identity).

use core::any::Any;
use core::fmt;
use std::rc::Rc;

use hashbrown::HashMap;

use crate::entity::Entity;
use crate::error::{QueryError, Result};

/// Key of a managed entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityKey {
    pub table: &'static str,
    pub id: i64,
}

impl EntityKey {
    pub fn of<E: Entity>(id: i64) -> Self {
        Self {
            table: E::table().name,
            id,
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.table, self.id)
    }
}

/// Managed entities of one persistence context, keyed by table and identity.
#[derive(Default)]
pub struct IdentityMap {
    entries: HashMap<EntityKey, Rc<dyn Any>>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The resident instance of `E` with identity `id`.
    pub fn get<E: Entity>(&self, id: i64) -> Option<Rc<E>> {
        let entry = self.entries.get(&EntityKey::of::<E>(id))?;
        Rc::clone(entry).downcast::<E>().ok()
    }

    /// Registers `entity`, returning the instance that is now resident.
    ///
    /// When an instance with the same identity is already resident, that
    /// instance is kept and returned.
    pub fn insert<E: Entity>(&mut self, entity: Rc<E>) -> Result<Rc<E>> {
        let id = entity.id().ok_or_else(|| {
            QueryError::Persistence(format!(
                "cannot register a {} without identity",
                E::table().name
            ))
        })?;
        let entry = self
            .entries
            .entry(EntityKey::of::<E>(id))
            .or_insert_with(|| entity as Rc<dyn Any>);
        Rc::clone(entry).downcast::<E>().map_err(|_| {
            QueryError::Mapping(format!(
                "identity map entry {} holds another type",
                EntityKey::of::<E>(id)
            ))
        })
    }

    pub fn contains(&self, key: &EntityKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evicts every instance. Previously handed out `Rc`s stay valid but are
    /// no longer managed.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl fmt::Debug for IdentityMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}
