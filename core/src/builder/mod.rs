//! Query statement builder.
//!
//! ```ignore
//! let m = QMember::member();
//! let t = QTeam::team();
//!
//! let members = Query::select_from(&m)
//!     .join(&m.team, &t)
//!     .fetch_join()
//!     .r#where((m.age.ge(10), t.name.eq("teamA")))
//!     .order_by(m.username.asc())
//!     .fetch(&mut ctx)?;
//! ```
//!
//! Builders are values: every call consumes the builder and returns the next
//! one, and [`SelectBuilder::build`] produces a [`Statement`] that the
//! [`Executor`](crate::Executor) consumes exactly once.

mod select;
mod statement;

pub use select::*;
pub use statement::*;

use std::sync::Arc;

use crate::entity::{EntityPath, EntitySource};
use crate::expr::{Expr, Node, OrderSpecifier};
use crate::projection::{Projection, SelectItem, SelectList};

/// Entry point for SELECT statements.
#[derive(Debug, Clone, Copy, Default)]
pub struct Query;

impl Query {
    /// Starts a statement selecting `projection`; `.from()` comes next.
    pub fn select<P: Projection>(projection: P) -> SelectBuilder<P, SelectInitial> {
        SelectBuilder::new(projection)
    }

    /// Selects the entity `source` from itself, i.e. `select(e).from(e)`.
    pub fn select_from<Q: EntitySource>(
        source: &Q,
    ) -> SelectBuilder<EntityPath<Q::Entity>, SelectFromSet> {
        let path = source.entity_path().clone();
        SelectBuilder::new(path).from(source)
    }

    /// Starts a statement over a select list assembled at runtime.
    pub fn select_list<I>(items: I) -> SelectBuilder<SelectList, SelectInitial>
    where
        I: IntoIterator,
        I::Item: Into<SelectItem>,
    {
        SelectBuilder::new(items.into_iter().collect())
    }
}

// =============================================================================
// Argument traits
// =============================================================================

/// One or more predicates, combined with implicit AND.
///
/// `Option` arguments contribute nothing when `None`, which keeps dynamic
/// queries flat:
///
/// ```ignore
/// .r#where((username.map(|u| m.username.eq(u)), age.map(|a| m.age.eq(a))))
/// ```
pub trait Predicates {
    fn into_predicates(self) -> Vec<Arc<Node>>;
}

impl Predicates for Expr<bool> {
    fn into_predicates(self) -> Vec<Arc<Node>> {
        vec![self.into_node()]
    }
}

impl Predicates for &Expr<bool> {
    fn into_predicates(self) -> Vec<Arc<Node>> {
        vec![Arc::clone(self.node())]
    }
}

impl<P: Predicates> Predicates for Option<P> {
    fn into_predicates(self) -> Vec<Arc<Node>> {
        self.map(Predicates::into_predicates).unwrap_or_default()
    }
}

impl<P: Predicates> Predicates for Vec<P> {
    fn into_predicates(self) -> Vec<Arc<Node>> {
        self.into_iter().flat_map(Predicates::into_predicates).collect()
    }
}

impl<P: Predicates, const N: usize> Predicates for [P; N] {
    fn into_predicates(self) -> Vec<Arc<Node>> {
        self.into_iter().flat_map(Predicates::into_predicates).collect()
    }
}

/// Expressions for `group_by`.
pub trait Expressions {
    fn into_nodes(self) -> Vec<Arc<Node>>;
}

impl<T> Expressions for Expr<T> {
    fn into_nodes(self) -> Vec<Arc<Node>> {
        vec![self.into_node()]
    }
}

impl<T> Expressions for &Expr<T> {
    fn into_nodes(self) -> Vec<Arc<Node>> {
        vec![Arc::clone(self.node())]
    }
}

impl<E: Expressions> Expressions for Vec<E> {
    fn into_nodes(self) -> Vec<Arc<Node>> {
        self.into_iter().flat_map(Expressions::into_nodes).collect()
    }
}

/// Sort specifiers for `order_by`.
pub trait OrderSpecifiers {
    fn into_specifiers(self) -> Vec<OrderSpecifier>;
}

impl OrderSpecifiers for OrderSpecifier {
    fn into_specifiers(self) -> Vec<OrderSpecifier> {
        vec![self]
    }
}

impl<O: OrderSpecifiers> OrderSpecifiers for Vec<O> {
    fn into_specifiers(self) -> Vec<OrderSpecifier> {
        self.into_iter()
            .flat_map(OrderSpecifiers::into_specifiers)
            .collect()
    }
}

impl<O: OrderSpecifiers, const N: usize> OrderSpecifiers for [O; N] {
    fn into_specifiers(self) -> Vec<OrderSpecifier> {
        self.into_iter()
            .flat_map(OrderSpecifiers::into_specifiers)
            .collect()
    }
}

macro_rules! impl_tuple_args {
    ($($T:ident),+) => {
        impl<$($T: Predicates),+> Predicates for ($($T,)+) {
            #[allow(non_snake_case)]
            fn into_predicates(self) -> Vec<Arc<Node>> {
                let ($($T,)+) = self;
                let mut nodes = Vec::new();
                $(nodes.extend($T.into_predicates());)+
                nodes
            }
        }

        impl<$($T: Expressions),+> Expressions for ($($T,)+) {
            #[allow(non_snake_case)]
            fn into_nodes(self) -> Vec<Arc<Node>> {
                let ($($T,)+) = self;
                let mut nodes = Vec::new();
                $(nodes.extend($T.into_nodes());)+
                nodes
            }
        }

        impl<$($T: OrderSpecifiers),+> OrderSpecifiers for ($($T,)+) {
            #[allow(non_snake_case)]
            fn into_specifiers(self) -> Vec<OrderSpecifier> {
                let ($($T,)+) = self;
                let mut specs = Vec::new();
                $(specs.extend($T.into_specifiers());)+
                specs
            }
        }
    };
}

impl_tuple_args!(A, B);
impl_tuple_args!(A, B, C);
impl_tuple_args!(A, B, C, D);
impl_tuple_args!(A, B, C, D, E);
impl_tuple_args!(A, B, C, D, E, F);
