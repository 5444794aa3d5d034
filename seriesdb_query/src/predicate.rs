//! Validation and evaluation of `DROP SERIES ... WHERE` conditions.
//!
//! Validation is a pure pre-check over the whole command: the condition may
//! reference tags only, and a single offending reference rejects the
//! command before any series is deleted, independent of which measurements
//! the `FROM` clause ends up matching.

use std::collections::BTreeSet;

use seriesdb_catalog::series::TagSet;

use crate::statement::{BinaryOp, Expr, Literal};
use crate::{Error, Result};

/// Reject conditions that compare against `time` or against anything that
/// is not a known tag key of the target database.
pub fn validate_condition(expr: &Expr, tag_keys: &BTreeSet<&str>) -> Result<()> {
    match expr {
        Expr::VarRef(name) => {
            if name == "time" {
                Err(Error::DropSeriesTimePredicate)
            } else if !tag_keys.contains(name.as_str()) {
                Err(Error::DropSeriesFieldPredicate)
            } else {
                Ok(())
            }
        }
        Expr::Binary { lhs, rhs, .. } => {
            validate_condition(lhs, tag_keys)?;
            validate_condition(rhs, tag_keys)
        }
        Expr::Call { args, .. } => args
            .iter()
            .try_for_each(|arg| validate_condition(arg, tag_keys)),
        Expr::Literal(_) => Ok(()),
    }
}

/// Evaluate a validated condition against one series' tag set. A tag the
/// series does not carry compares as the empty string.
pub fn eval_condition(expr: &Expr, tags: &TagSet) -> bool {
    match expr {
        Expr::Binary {
            op: BinaryOp::And,
            lhs,
            rhs,
        } => eval_condition(lhs, tags) && eval_condition(rhs, tags),
        Expr::Binary {
            op: BinaryOp::Or,
            lhs,
            rhs,
        } => eval_condition(lhs, tags) || eval_condition(rhs, tags),
        Expr::Binary { op, lhs, rhs } => match tag_comparison(lhs, rhs, tags) {
            Some((value, literal)) => match op {
                BinaryOp::Eq => value == literal,
                BinaryOp::NotEq => value != literal,
                _ => false,
            },
            None => false,
        },
        _ => false,
    }
}

/// Resolve a `tag = 'literal'` comparison in either operand order.
fn tag_comparison<'a>(lhs: &'a Expr, rhs: &'a Expr, tags: &'a TagSet) -> Option<(&'a str, &'a str)> {
    let (name, literal) = match (lhs, rhs) {
        (Expr::VarRef(name), Expr::Literal(Literal::String(s))) => (name, s),
        (Expr::Literal(Literal::String(s)), Expr::VarRef(name)) => (name, s),
        _ => return None,
    };
    let value = tags.get(name).map(String::as_str).unwrap_or("");
    Some((value, literal.as_str()))
}
