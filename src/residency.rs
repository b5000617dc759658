//! Whether an association on a loaded entity is already materialized.
//!
//! Residency is answered from the association itself, so checking never
//! performs I/O and never resolves anything. An association becomes
//! [`Residency::Resolved`] when a fetch join attached its target, when the
//! target was already resident as the owner was read, or when it was loaded
//! through [`PersistenceContext::load`].

use quarry_core::{AssociationPath, Entity};

use crate::context::PersistenceContext;
use crate::engine::StorageEngine;

/// Residency state of one association on one entity reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Residency {
    /// The target has not been materialized; accessing it needs a load.
    Unresolved,
    /// The target is materialized, or there is no target.
    Resolved,
}

impl Residency {
    pub fn is_resolved(self) -> bool {
        self == Residency::Resolved
    }
}

/// Answers residency questions for entities a context handed out.
pub trait ResidencyTracker {
    fn residency<S: Entity, T: Entity>(&self, owner: &S, path: &AssociationPath<S, T>)
    -> Residency;

    /// `true` if `path` on `owner` can be read without a load.
    fn is_loaded<S: Entity, T: Entity>(&self, owner: &S, path: &AssociationPath<S, T>) -> bool {
        self.residency(owner, path).is_resolved()
    }
}

impl<E: StorageEngine> ResidencyTracker for PersistenceContext<E> {
    fn residency<S: Entity, T: Entity>(
        &self,
        owner: &S,
        path: &AssociationPath<S, T>,
    ) -> Residency {
        residency(owner, path)
    }
}

/// Residency of `path` on `owner`.
pub fn residency<S: Entity, T: Entity>(owner: &S, path: &AssociationPath<S, T>) -> Residency {
    if path.get(owner).is_loaded() {
        Residency::Resolved
    } else {
        Residency::Unresolved
    }
}

/// `true` if `path` on `owner` can be read without a load.
pub fn is_loaded<S: Entity, T: Entity>(owner: &S, path: &AssociationPath<S, T>) -> bool {
    residency(owner, path).is_resolved()
}
