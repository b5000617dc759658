use std::sync::Arc;

use super::{Expr, Node};
use crate::sql::{SQL, ToSQL, Token};

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

/// An expression with a sort direction, used by `order_by`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderSpecifier {
    pub node: Arc<Node>,
    pub order: Order,
}

impl OrderSpecifier {
    pub fn new<T>(expr: &Expr<T>, order: Order) -> Self {
        Self {
            node: Arc::clone(expr.node()),
            order,
        }
    }
}

impl ToSQL for OrderSpecifier {
    fn to_sql(&self) -> SQL {
        let token = match self.order {
            Order::Asc => Token::ASC,
            Order::Desc => Token::DESC,
        };
        self.node.to_sql().push(token)
    }
}

impl<T> Expr<T> {
    pub fn asc(&self) -> OrderSpecifier {
        OrderSpecifier::new(self, Order::Asc)
    }

    pub fn desc(&self) -> OrderSpecifier {
        OrderSpecifier::new(self, Order::Desc)
    }
}
