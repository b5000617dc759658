//! Typed, immutable expression trees.
//!
//! An [`Expr<T>`] is a handle to a shared [`Node`] tree, tagged with the Rust
//! type `T` the expression evaluates to. Expressions are pure data: nothing is
//! evaluated until a statement containing them is executed. Every combinator
//! returns a new tree and leaves its inputs untouched.
//!
//! ```ignore
//! let m = QMember::member();
//! let adult_in_team_a = m.age.ge(18).and(m.username.starts_with("member"));
//! let oldest = m.age.max();
//! ```

mod agg;
mod cmp;
mod logical;
mod math;
mod order;

pub use logical::{all_of, any_of};
pub use order::{Order, OrderSpecifier};

use core::fmt;
use core::marker::PhantomData;
use std::sync::Arc;

use compact_str::CompactString;

use crate::projection::Nullable;
use crate::sql::{SQL, SQLChunk, ToSQL, Token};
use crate::value::{SqlValue, Value};

// =============================================================================
// Operators
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    /// `LIKE` over a pattern whose literal part escapes `%` and `_` with `\`.
    LikeEscaped,
}

impl CompareOp {
    const fn token(self) -> Token {
        match self {
            CompareOp::Eq => Token::EQ,
            CompareOp::Ne => Token::NE,
            CompareOp::Lt => Token::LT,
            CompareOp::Le => Token::LE,
            CompareOp::Gt => Token::GT,
            CompareOp::Ge => Token::GE,
            CompareOp::Like | CompareOp::LikeEscaped => Token::LIKE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithmeticOp {
    const fn token(self) -> Token {
        match self {
            ArithmeticOp::Add => Token::PLUS,
            ArithmeticOp::Sub => Token::MINUS,
            ArithmeticOp::Mul => Token::STAR,
            ArithmeticOp::Div => Token::SLASH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    const fn token(self) -> Token {
        match self {
            LogicalOp::And => Token::AND,
            LogicalOp::Or => Token::OR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunc {
    Count,
    Sum,
    Avg,
    Max,
    Min,
}

impl AggregateFunc {
    pub const fn name(self) -> &'static str {
        match self {
            AggregateFunc::Count => "COUNT",
            AggregateFunc::Sum => "SUM",
            AggregateFunc::Avg => "AVG",
            AggregateFunc::Max => "MAX",
            AggregateFunc::Min => "MIN",
        }
    }
}

// =============================================================================
// Node
// =============================================================================

/// Untyped expression tree node.
///
/// Equality is structural: two independently built trees describing the same
/// expression compare equal. Tuple rows rely on this to look columns up by
/// the expression that selected them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    Column {
        qualifier: CompactString,
        name: &'static str,
    },
    Literal(Value),
    Compare {
        op: CompareOp,
        lhs: Arc<Node>,
        rhs: Arc<Node>,
    },
    Between {
        operand: Arc<Node>,
        low: Arc<Node>,
        high: Arc<Node>,
    },
    InList {
        operand: Arc<Node>,
        items: Vec<Arc<Node>>,
    },
    NullCheck {
        operand: Arc<Node>,
        negated: bool,
    },
    Arithmetic {
        op: ArithmeticOp,
        lhs: Arc<Node>,
        rhs: Arc<Node>,
    },
    Logical {
        op: LogicalOp,
        operands: Vec<Arc<Node>>,
    },
    Not(Arc<Node>),
    Aggregate {
        func: AggregateFunc,
        distinct: bool,
        operand: Arc<Node>,
    },
}

impl Node {
    /// True for nodes that evaluate to a boolean.
    pub const fn is_predicate(&self) -> bool {
        matches!(
            self,
            Node::Compare { .. }
                | Node::Between { .. }
                | Node::InList { .. }
                | Node::NullCheck { .. }
                | Node::Logical { .. }
                | Node::Not(_)
        )
    }

    /// True if an aggregate function appears anywhere in the tree.
    pub fn contains_aggregate(&self) -> bool {
        match self {
            Node::Aggregate { .. } => true,
            Node::Column { .. } | Node::Literal(_) => false,
            Node::Compare { lhs, rhs, .. } | Node::Arithmetic { lhs, rhs, .. } => {
                lhs.contains_aggregate() || rhs.contains_aggregate()
            }
            Node::Between { operand, low, high } => {
                operand.contains_aggregate() || low.contains_aggregate() || high.contains_aggregate()
            }
            Node::InList { operand, items } => {
                operand.contains_aggregate() || items.iter().any(|i| i.contains_aggregate())
            }
            Node::NullCheck { operand, .. } | Node::Not(operand) => operand.contains_aggregate(),
            Node::Logical { operands, .. } => operands.iter().any(|o| o.contains_aggregate()),
        }
    }

    /// Calls `f` with the qualifier and name of every column in the tree.
    pub fn visit_columns(&self, f: &mut impl FnMut(&CompactString, &'static str)) {
        match self {
            Node::Column { qualifier, name } => f(qualifier, *name),
            Node::Literal(_) => {}
            Node::Compare { lhs, rhs, .. } | Node::Arithmetic { lhs, rhs, .. } => {
                lhs.visit_columns(f);
                rhs.visit_columns(f);
            }
            Node::Between { operand, low, high } => {
                operand.visit_columns(f);
                low.visit_columns(f);
                high.visit_columns(f);
            }
            Node::InList { operand, items } => {
                operand.visit_columns(f);
                items.iter().for_each(|i| i.visit_columns(f));
            }
            Node::NullCheck { operand, .. } | Node::Not(operand) => operand.visit_columns(f),
            Node::Aggregate { operand, .. } => operand.visit_columns(f),
            Node::Logical { operands, .. } => operands.iter().for_each(|o| o.visit_columns(f)),
        }
    }

    /// Renders the node as an operand of a comparison, parenthesizing nested predicates.
    fn operand_sql(&self) -> SQL {
        if self.is_predicate() && !matches!(self, Node::Logical { .. }) {
            self.to_sql().parens()
        } else {
            self.to_sql()
        }
    }
}

impl ToSQL for Node {
    fn to_sql(&self) -> SQL {
        match self {
            Node::Column { qualifier, name } => SQL::column(qualifier.clone(), *name),
            Node::Literal(value) => SQL::param(value.clone()),
            Node::Compare { op, lhs, rhs } => {
                let sql = lhs
                    .operand_sql()
                    .push(op.token())
                    .append(rhs.operand_sql());
                match op {
                    CompareOp::LikeEscaped => sql
                        .push(Token::ESCAPE)
                        .push(SQLChunk::raw_static("'\\'")),
                    _ => sql,
                }
            }
            Node::Between { operand, low, high } => operand
                .operand_sql()
                .push(Token::BETWEEN)
                .append(low.operand_sql())
                .push(Token::AND)
                .append(high.operand_sql()),
            Node::InList { operand, items } => {
                if items.is_empty() {
                    // IN () is not valid SQL; an empty list matches nothing
                    return SQL::raw("1 = 0");
                }
                operand
                    .operand_sql()
                    .push(Token::IN)
                    .append(SQL::join(items.iter().map(|i| i.operand_sql()), Token::COMMA).parens())
            }
            Node::NullCheck { operand, negated } => {
                let sql = operand.operand_sql().push(Token::IS);
                let sql = if *negated { sql.push(Token::NOT) } else { sql };
                sql.push(Token::NULL)
            }
            Node::Arithmetic { op, lhs, rhs } => lhs
                .operand_sql()
                .push(op.token())
                .append(rhs.operand_sql())
                .parens(),
            Node::Logical { op, operands } => {
                SQL::join(operands.iter().map(|o| o.to_sql()), op.token()).parens()
            }
            Node::Not(operand) => SQL::token(Token::NOT).append(operand.to_sql().parens()),
            Node::Aggregate {
                func,
                distinct,
                operand,
            } => {
                let args = if *distinct {
                    SQL::token(Token::DISTINCT).append(operand.to_sql())
                } else {
                    operand.to_sql()
                };
                SQL::func(func.name(), args)
            }
        }
    }
}

// =============================================================================
// Expr<T>
// =============================================================================

/// Typed expression evaluating to `T`.
pub struct Expr<T> {
    node: Arc<Node>,
    marker: PhantomData<fn() -> T>,
}

/// Boolean expression, usable in `where`, `on` and `having`.
pub type Predicate = Expr<bool>;

impl<T> Expr<T> {
    #[inline]
    pub fn from_node(node: Node) -> Self {
        Self::from_arc(Arc::new(node))
    }

    #[inline]
    pub fn from_arc(node: Arc<Node>) -> Self {
        Self {
            node,
            marker: PhantomData,
        }
    }

    #[inline]
    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    #[inline]
    pub fn into_node(self) -> Arc<Node> {
        self.node
    }

    /// Structural equality with another expression of any type.
    pub fn same_as<U>(&self, other: &Expr<U>) -> bool {
        Arc::ptr_eq(&self.node, &other.node) || self.node == other.node
    }
}

impl<T: SqlValue> Expr<T> {
    /// Column `name` of the entity aliased `qualifier`.
    pub fn column(qualifier: impl Into<CompactString>, name: &'static str) -> Self {
        Self::from_node(Node::Column {
            qualifier: qualifier.into(),
            name,
        })
    }

    /// Bound parameter holding `value`.
    pub fn literal(value: T) -> Self {
        Self::from_node(Node::Literal(value.into()))
    }

    /// Selects this expression with SQL NULL read back as `None`.
    pub fn nullable(&self) -> Nullable<Self> {
        Nullable::new(self.clone())
    }
}

impl<T> Clone for Expr<T> {
    fn clone(&self) -> Self {
        Self::from_arc(Arc::clone(&self.node))
    }
}

impl<T> fmt::Debug for Expr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Expr").field(&self.node).finish()
    }
}

impl<T> fmt::Display for Expr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.node.to_sql().sql())
    }
}

impl<T> ToSQL for Expr<T> {
    fn to_sql(&self) -> SQL {
        self.node.to_sql()
    }
}

// =============================================================================
// IntoExpr
// =============================================================================

/// Values that can stand on the right-hand side of an operator over `Expr<T>`.
pub trait IntoExpr<T> {
    fn into_expr(self) -> Expr<T>;
}

impl<T> IntoExpr<T> for Expr<T> {
    #[inline]
    fn into_expr(self) -> Expr<T> {
        self
    }
}

impl<T> IntoExpr<T> for &Expr<T> {
    #[inline]
    fn into_expr(self) -> Expr<T> {
        self.clone()
    }
}

macro_rules! impl_into_expr_literal {
    ($($source:ty => $target:ty),* $(,)?) => {
        $(
            impl IntoExpr<$target> for $source {
                #[inline]
                fn into_expr(self) -> Expr<$target> {
                    Expr::from_node(Node::Literal(Value::from(self)))
                }
            }
        )*
    };
}

impl_into_expr_literal!(
    i64 => i64,
    i32 => i64,
    f64 => f64,
    bool => bool,
    &str => String,
    String => String,
);

impl IntoExpr<String> for &String {
    #[inline]
    fn into_expr(self) -> Expr<String> {
        Expr::from_node(Node::Literal(Value::Text(self.clone())))
    }
}
