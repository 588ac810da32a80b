//! Row mutations.
//!
//! Appends go to the end of the file. Deletes and updates read every row,
//! decide in memory and rewrite the file through
//! [`TableFile::rewrite`], which validates all rows before writing.

use std::fmt;

use tabula_common::{TabulaError, TabulaResult};
use tabula_storage::{Row, TableFile};
use tracing::debug;

/// Predicate operator for [`delete_where`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// Exact string equality.
    Equals,
    /// Numeric comparison: `field > value`, both parsed as floats.
    GreaterThan,
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparator::Equals => write!(f, "="),
            Comparator::GreaterThan => write!(f, ">"),
        }
    }
}

/// A compiled `column <cmp> value` predicate.
struct Predicate<'a> {
    index: usize,
    value: &'a str,
    threshold: Option<f64>,
}

impl<'a> Predicate<'a> {
    fn new(index: usize, value: &'a str, cmp: Comparator) -> TabulaResult<Self> {
        let threshold = match cmp {
            Comparator::Equals => None,
            Comparator::GreaterThan => Some(parse_number(value)?),
        };
        Ok(Self {
            index,
            value,
            threshold,
        })
    }

    fn matches(&self, row: &Row) -> TabulaResult<bool> {
        let Some(field) = row.get(self.index) else {
            return Ok(false);
        };
        match self.threshold {
            None => Ok(field == self.value),
            Some(threshold) => Ok(parse_number(field)? > threshold),
        }
    }
}

fn parse_number(text: &str) -> TabulaResult<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| TabulaError::type_mismatch("number", text))
}

/// Appends one row. Values are validated against the schema first.
pub fn append_row<S: AsRef<str>>(table: &TableFile, values: &[S]) -> TabulaResult<()> {
    table.append_row(values)?;
    debug!(table = table.name(), "appended row");
    Ok(())
}

/// Deletes rows where `key_column <cmp> value` and returns how many.
///
/// With [`Comparator::GreaterThan`], a value or field that is not a number
/// fails with a type mismatch and the file is left unchanged.
pub fn delete_where(
    table: &TableFile,
    key_column: &str,
    value: &str,
    cmp: Comparator,
) -> TabulaResult<usize> {
    let schema = table.require_schema()?;
    let predicate = Predicate::new(schema.index_of(key_column)?, value, cmp)?;

    let mut kept = Vec::new();
    let mut deleted = 0;
    for row in table.scan()?.rows()? {
        let row = row?;
        if predicate.matches(&row)? {
            deleted += 1;
        } else {
            kept.push(row);
        }
    }

    table.rewrite(&schema, kept)?;
    debug!(table = table.name(), %cmp, deleted, "deleted rows");
    Ok(deleted)
}

/// Sets `target_column` to `new_value` on rows where `key_column` equals
/// `value`, and returns how many rows matched.
///
/// The new value is validated against the target column's type; an invalid
/// value leaves the file unchanged.
pub fn update_where(
    table: &TableFile,
    key_column: &str,
    value: &str,
    target_column: &str,
    new_value: &str,
) -> TabulaResult<usize> {
    let schema = table.require_schema()?;
    let predicate = Predicate::new(schema.index_of(key_column)?, value, Comparator::Equals)?;
    let target = schema.index_of(target_column)?;

    let mut rows = Vec::new();
    let mut updated = 0;
    for row in table.scan()?.rows()? {
        let mut row = row?;
        if predicate.matches(&row)? {
            row.set(target, new_value);
            updated += 1;
        }
        rows.push(row);
    }

    table.rewrite(&schema, rows)?;
    debug!(table = table.name(), column = target_column, updated, "updated rows");
    Ok(updated)
}
