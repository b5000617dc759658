//! Aggregate functions.
//!
//! - `count`, `count_distinct`, `max`, `min`: any value type
//! - `sum`: numeric types, same value type as the operand
//! - `avg`: numeric types, always `f64`

use std::sync::Arc;

use super::{AggregateFunc, Expr, Node};
use crate::value::{Numeric, SqlValue};

fn aggregate<T, U>(expr: &Expr<T>, func: AggregateFunc, distinct: bool) -> Expr<U> {
    Expr::from_node(Node::Aggregate {
        func,
        distinct,
        operand: Arc::clone(expr.node()),
    })
}

impl<T: SqlValue> Expr<T> {
    /// COUNT(expr) - counts non-null values.
    ///
    /// ```ignore
    /// let total = m.id.count();
    /// // Generates: COUNT("m"."member_id")
    /// ```
    pub fn count(&self) -> Expr<i64> {
        aggregate(self, AggregateFunc::Count, false)
    }

    /// COUNT(DISTINCT expr) - counts distinct non-null values.
    pub fn count_distinct(&self) -> Expr<i64> {
        aggregate(self, AggregateFunc::Count, true)
    }

    /// MAX(expr)
    pub fn max(&self) -> Expr<T> {
        aggregate(self, AggregateFunc::Max, false)
    }

    /// MIN(expr)
    pub fn min(&self) -> Expr<T> {
        aggregate(self, AggregateFunc::Min, false)
    }
}

impl<T: Numeric> Expr<T> {
    /// SUM(expr)
    pub fn sum(&self) -> Expr<T> {
        aggregate(self, AggregateFunc::Sum, false)
    }

    /// AVG(expr) - always produces a real, even over integer columns.
    pub fn avg(&self) -> Expr<f64> {
        aggregate(self, AggregateFunc::Avg, false)
    }
}
