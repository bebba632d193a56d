//! Constant folding of additions.
//!
//! Folding is applied lazily, each time an addition is compiled, and never
//! mutates the tree: folded nodes are new values, untouched subtrees stay
//! borrowed. Only additions whose two operands fold to number literals are
//! combined, so the result depends on how the parser associated the chain:
//!
//! ```text
//! 1 + 2 + x    ((1 + 2) + x)  ->  3 + x
//! x + 1 + 2    ((x + 1) + 2)  ->  unchanged
//! 1 + (2 + 3)                 ->  6
//! ```

use std::borrow::Cow;

use crate::ast::{BinaryExpression, BinaryOperator, Expression};

/// Folds literal additions in `expr`.
pub fn fold_constants(expr: &Expression) -> Cow<'_, Expression> {
    let bin = match expr {
        Expression::Binary(bin) if bin.operator == BinaryOperator::Add => bin,
        _ => return Cow::Borrowed(expr),
    };

    let left = fold_constants(&bin.left);
    let right = fold_constants(&bin.right);

    if let (Some(l), Some(r)) = (left.as_number(), right.as_number()) {
        return Cow::Owned(Expression::number(l + r));
    }
    if matches!((&left, &right), (Cow::Borrowed(_), Cow::Borrowed(_))) {
        return Cow::Borrowed(expr);
    }
    Cow::Owned(Expression::Binary(BinaryExpression {
        operator: BinaryOperator::Add,
        left: Box::new(left.into_owned()),
        right: Box::new(right.into_owned()),
    }))
}
