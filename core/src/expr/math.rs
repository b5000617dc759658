//! Arithmetic over numeric expressions.
//!
//! ```ignore
//! let next_year = m.age.clone() + 1;
//! // Generates: ("m"."age" + ?)
//! ```

use core::ops::{Add, Div, Mul, Sub};

use super::{ArithmeticOp, Expr, IntoExpr, Node};
use crate::value::Numeric;

fn arithmetic<T>(lhs: Expr<T>, op: ArithmeticOp, rhs: Expr<T>) -> Expr<T> {
    Expr::from_node(Node::Arithmetic {
        op,
        lhs: lhs.into_node(),
        rhs: rhs.into_node(),
    })
}

macro_rules! impl_arithmetic {
    ($($trait:ident :: $method:ident => $op:ident),* $(,)?) => {
        $(
            impl<T: Numeric, R: IntoExpr<T>> $trait<R> for Expr<T> {
                type Output = Expr<T>;

                fn $method(self, rhs: R) -> Expr<T> {
                    arithmetic(self, ArithmeticOp::$op, rhs.into_expr())
                }
            }

            impl<T: Numeric, R: IntoExpr<T>> $trait<R> for &Expr<T> {
                type Output = Expr<T>;

                fn $method(self, rhs: R) -> Expr<T> {
                    arithmetic(self.clone(), ArithmeticOp::$op, rhs.into_expr())
                }
            }
        )*
    };
}

impl_arithmetic!(
    Add::add => Add,
    Sub::sub => Sub,
    Mul::mul => Mul,
    Div::div => Div,
);
