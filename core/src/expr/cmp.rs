//! Comparison predicates.
//!
//! Both sides of a comparison share the value type `T`, so comparing an
//! integer column with text fails to compile:
//!
//! ```ignore
//! m.age.eq(10);          // Expr<bool>
//! m.age.between(10, 30); // Expr<bool>
//! m.age.eq("ten");       // compile error
//! ```

use std::sync::Arc;

use super::{CompareOp, Expr, IntoExpr, Node, Predicate};
use crate::value::Value;

// =============================================================================
// Internal Helper
// =============================================================================

fn compare<T>(lhs: &Expr<T>, op: CompareOp, rhs: Expr<T>) -> Predicate {
    Expr::from_node(Node::Compare {
        op,
        lhs: Arc::clone(lhs.node()),
        rhs: rhs.into_node(),
    })
}

// =============================================================================
// Comparisons
// =============================================================================

impl<T> Expr<T> {
    /// Equality comparison (`=`).
    pub fn eq(&self, rhs: impl IntoExpr<T>) -> Predicate {
        compare(self, CompareOp::Eq, rhs.into_expr())
    }

    /// Inequality comparison (`<>`).
    pub fn ne(&self, rhs: impl IntoExpr<T>) -> Predicate {
        compare(self, CompareOp::Ne, rhs.into_expr())
    }

    /// Less-than comparison (`<`).
    pub fn lt(&self, rhs: impl IntoExpr<T>) -> Predicate {
        compare(self, CompareOp::Lt, rhs.into_expr())
    }

    /// Less-than-or-equal comparison (`<=`).
    pub fn le(&self, rhs: impl IntoExpr<T>) -> Predicate {
        compare(self, CompareOp::Le, rhs.into_expr())
    }

    /// Greater-than comparison (`>`).
    pub fn gt(&self, rhs: impl IntoExpr<T>) -> Predicate {
        compare(self, CompareOp::Gt, rhs.into_expr())
    }

    /// Greater-than-or-equal comparison (`>=`).
    pub fn ge(&self, rhs: impl IntoExpr<T>) -> Predicate {
        compare(self, CompareOp::Ge, rhs.into_expr())
    }

    /// Inclusive range check: `self BETWEEN low AND high`.
    pub fn between(&self, low: impl IntoExpr<T>, high: impl IntoExpr<T>) -> Predicate {
        Expr::from_node(Node::Between {
            operand: Arc::clone(self.node()),
            low: low.into_expr().into_node(),
            high: high.into_expr().into_node(),
        })
    }

    /// Membership check: `self IN (items...)`.
    ///
    /// An empty list renders as a predicate that matches no row.
    pub fn in_list<I>(&self, items: I) -> Predicate
    where
        I: IntoIterator,
        I::Item: IntoExpr<T>,
    {
        Expr::from_node(Node::InList {
            operand: Arc::clone(self.node()),
            items: items
                .into_iter()
                .map(|item| item.into_expr().into_node())
                .collect(),
        })
    }

    pub fn is_null(&self) -> Predicate {
        Expr::from_node(Node::NullCheck {
            operand: Arc::clone(self.node()),
            negated: false,
        })
    }

    pub fn is_not_null(&self) -> Predicate {
        Expr::from_node(Node::NullCheck {
            operand: Arc::clone(self.node()),
            negated: true,
        })
    }
}

// =============================================================================
// Text patterns
// =============================================================================

impl Expr<String> {
    /// SQL `LIKE` with a caller-supplied pattern.
    pub fn like(&self, pattern: impl IntoExpr<String>) -> Predicate {
        compare(self, CompareOp::Like, pattern.into_expr())
    }

    /// `LIKE '%needle%'`, with wildcards in `needle` matched literally.
    pub fn contains(&self, needle: &str) -> Predicate {
        self.like_literal(format!("%{}%", escape_like(needle)))
    }

    /// `LIKE 'prefix%'`
    pub fn starts_with(&self, prefix: &str) -> Predicate {
        self.like_literal(format!("{}%", escape_like(prefix)))
    }

    /// `LIKE '%suffix'`
    pub fn ends_with(&self, suffix: &str) -> Predicate {
        self.like_literal(format!("%{}", escape_like(suffix)))
    }

    fn like_literal(&self, pattern: String) -> Predicate {
        compare(
            self,
            CompareOp::LikeEscaped,
            Expr::from_node(Node::Literal(Value::Text(pattern))),
        )
    }
}

/// Escapes `\`, `%` and `_` so `text` matches only itself under `ESCAPE '\'`.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
