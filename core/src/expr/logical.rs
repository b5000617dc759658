//! Boolean combinators.
//!
//! `and`/`or` chains are flattened, so `a.and(b).and(c)` and `a.and(b.and(c))`
//! build the same tree and render as one parenthesized group.

use core::ops::{BitAnd, BitOr, Not};
use std::sync::Arc;

use super::{Expr, IntoExpr, LogicalOp, Node, Predicate};

fn combine(op: LogicalOp, lhs: &Arc<Node>, rhs: Arc<Node>) -> Predicate {
    let mut operands = Vec::with_capacity(2);
    for node in [Arc::clone(lhs), rhs] {
        match &*node {
            Node::Logical {
                op: inner,
                operands: nested,
            } if *inner == op => operands.extend(nested.iter().cloned()),
            _ => operands.push(node),
        }
    }
    Expr::from_node(Node::Logical { op, operands })
}

impl Expr<bool> {
    /// Conjunction; true when both sides hold.
    pub fn and(&self, rhs: impl IntoExpr<bool>) -> Predicate {
        combine(LogicalOp::And, self.node(), rhs.into_expr().into_node())
    }

    /// Disjunction; true when either side holds.
    pub fn or(&self, rhs: impl IntoExpr<bool>) -> Predicate {
        combine(LogicalOp::Or, self.node(), rhs.into_expr().into_node())
    }

    /// Negation.
    #[allow(clippy::should_implement_trait)]
    pub fn not(&self) -> Predicate {
        Expr::from_node(Node::Not(Arc::clone(self.node())))
    }
}

/// Conjunction of all predicates, or `None` when the iterator is empty.
pub fn all_of<I>(predicates: I) -> Option<Predicate>
where
    I: IntoIterator,
    I::Item: IntoExpr<bool>,
{
    predicates
        .into_iter()
        .map(IntoExpr::into_expr)
        .reduce(|acc, p| acc.and(p))
}

/// Disjunction of all predicates, or `None` when the iterator is empty.
pub fn any_of<I>(predicates: I) -> Option<Predicate>
where
    I: IntoIterator,
    I::Item: IntoExpr<bool>,
{
    predicates
        .into_iter()
        .map(IntoExpr::into_expr)
        .reduce(|acc, p| acc.or(p))
}

// =============================================================================
// Operator sugar
// =============================================================================

impl<R: IntoExpr<bool>> BitAnd<R> for Expr<bool> {
    type Output = Predicate;

    fn bitand(self, rhs: R) -> Predicate {
        self.and(rhs)
    }
}

impl<R: IntoExpr<bool>> BitOr<R> for Expr<bool> {
    type Output = Predicate;

    fn bitor(self, rhs: R) -> Predicate {
        self.or(rhs)
    }
}

impl Not for Expr<bool> {
    type Output = Predicate;

    fn not(self) -> Predicate {
        Expr::not(&self)
    }
}
