//! Evaluation of WHERE clause predicates against stored rows.
//!
//! Cells are untyped text, so a comparison is chosen from the literal:
//! `NULL` first, then quoted strings, then booleans, then numbers. Numeric
//! comparison falls back to comparing text when either side does not parse.

use std::cmp::Ordering;

use crate::ast::{Comparison, Condition, Literal};
use crate::error::DbResult;
use crate::model::{Row, Table, NULL};

impl Condition {
    pub fn evaluate(&self, table: &Table, row: &Row) -> DbResult<bool> {
        match self {
            Condition::Equals(c) => c.equals(table, row),
            Condition::NotEquals(c) => Ok(!c.equals(table, row)?),
            Condition::GreaterThan(c) => c.ordered(table, row, Ordering::Greater),
            Condition::LessThan(c) => c.ordered(table, row, Ordering::Less),
            Condition::GreaterOrEqual(c) => {
                Ok(c.ordered(table, row, Ordering::Greater)? || c.equals(table, row)?)
            }
            Condition::LessOrEqual(c) => {
                Ok(c.ordered(table, row, Ordering::Less)? || c.equals(table, row)?)
            }
            Condition::Like(c) => c.like(table, row),
            Condition::And(left, right) => {
                Ok(left.evaluate(table, row)? && right.evaluate(table, row)?)
            }
            Condition::Or(left, right) => {
                Ok(left.evaluate(table, row)? || right.evaluate(table, row)?)
            }
        }
    }
}

impl Comparison {
    fn stored<'r>(&self, table: &Table, row: &'r Row) -> DbResult<Option<&'r str>> {
        let index = table.require_column(&self.attribute)?;
        Ok(row.cell(index))
    }

    fn equals(&self, table: &Table, row: &Row) -> DbResult<bool> {
        let stored = self.stored(table, row)?;
        if self.value == Literal::Null {
            return Ok(stored.is_none());
        }
        // a null cell reads as the text NULL for every other literal
        let stored = stored.unwrap_or(NULL);
        let matched = match &self.value {
            Literal::Text(text) => stored == text,
            Literal::Boolean(b) => stored.eq_ignore_ascii_case(bool_text(*b)),
            Literal::Number(n) => compare_numeric(stored, n) == Some(Ordering::Equal),
            Literal::Null => false,
        };
        Ok(matched)
    }

    /// True when the stored value compares as `wanted` against the literal.
    fn ordered(&self, table: &Table, row: &Row, wanted: Ordering) -> DbResult<bool> {
        let stored = match self.stored(table, row)? {
            Some(stored) => stored,
            None => return Ok(false),
        };
        let matched = match &self.value {
            Literal::Null => false,
            Literal::Text(text) => stored.cmp(text.as_str()) == wanted,
            // TRUE > FALSE
            Literal::Boolean(b) => match wanted {
                Ordering::Greater => !*b && stored.eq_ignore_ascii_case("TRUE"),
                Ordering::Less => *b && stored.eq_ignore_ascii_case("FALSE"),
                Ordering::Equal => stored.eq_ignore_ascii_case(bool_text(*b)),
            },
            Literal::Number(n) => compare_numeric(stored, n) == Some(wanted),
        };
        Ok(matched)
    }

    /// Substring containment; no wildcard expansion.
    fn like(&self, table: &Table, row: &Row) -> DbResult<bool> {
        let stored = match self.stored(table, row)? {
            Some(stored) => stored,
            None => return Ok(false),
        };
        let pattern = match &self.value {
            Literal::Null => return Ok(false),
            Literal::Text(text) | Literal::Number(text) => text.as_str(),
            Literal::Boolean(b) => bool_text(*b),
        };
        Ok(stored.contains(pattern))
    }
}

fn bool_text(value: bool) -> &'static str {
    if value {
        "TRUE"
    } else {
        "FALSE"
    }
}

/// Compares as floats when either side has a decimal point, otherwise as
/// integers. `None` only for comparisons involving NaN.
fn compare_numeric(stored: &str, literal: &str) -> Option<Ordering> {
    if stored.contains('.') || literal.contains('.') {
        if let (Ok(a), Ok(b)) = (stored.parse::<f64>(), literal.parse::<f64>()) {
            return a.partial_cmp(&b);
        }
    } else if let (Ok(a), Ok(b)) = (stored.parse::<i64>(), literal.parse::<i64>()) {
        return Some(a.cmp(&b));
    }
    Some(stored.cmp(literal))
}
