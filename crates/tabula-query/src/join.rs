//! Two-table nested-loop join.
//!
//! ```text
//! for l in left:            (one pass)
//!     for r in right:       (re-scanned per left row)
//!         if l[lk] == r[rk]: emit l ++ r
//!     if no match and LEFT OUTER: emit l ++ ["", ...]
//! ```
//!
//! The first emitted row is the combined header: the `label type` fields of
//! the left table followed by those of the right table. Key comparison is
//! exact string equality on the stored text.

use std::fmt;

use tabula_common::TabulaResult;
use tabula_storage::{Row, TableFile};
use tracing::debug;

/// Join flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinMode {
    /// Only matching pairs.
    #[default]
    Inner,
    /// Matching pairs, plus unmatched left rows padded with empty fields.
    LeftOuter,
}

impl fmt::Display for JoinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinMode::Inner => write!(f, "INNER"),
            JoinMode::LeftOuter => write!(f, "LEFT OUTER"),
        }
    }
}

/// One side of a join: a table name and its key column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    /// Table name.
    pub table: String,
    /// Key column label.
    pub key: String,
}

impl JoinSpec {
    /// Creates a join side.
    pub fn new(table: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            key: key.into(),
        }
    }
}

/// Joins `left` and `right` on `left_key = right_key`.
///
/// Output order is left-major, then right file order within each left row.
pub fn nested_loop_join(
    left: &TableFile,
    left_key: &str,
    right: &TableFile,
    right_key: &str,
    mode: JoinMode,
) -> TabulaResult<Vec<Row>> {
    let left_schema = left.require_schema()?;
    let right_schema = right.require_schema()?;
    let lk = left_schema.index_of(left_key)?;
    let rk = right_schema.index_of(right_key)?;
    let width = left_schema.len() + right_schema.len();

    let mut out = vec![left_schema.header_row().concat(&right_schema.header_row())];
    let right_scan = right.scan()?;

    for left_row in left.scan()?.rows()? {
        let left_row = left_row?;
        let mut matched = false;

        for right_row in right_scan.rows()? {
            let right_row = right_row?;
            if let (Some(l), Some(r)) = (left_row.get(lk), right_row.get(rk)) {
                if l == r {
                    out.push(left_row.concat(&right_row));
                    matched = true;
                }
            }
        }

        if !matched && mode == JoinMode::LeftOuter {
            let padding = Row::empty(width.saturating_sub(left_row.len()));
            out.push(left_row.concat(&padding));
        }
    }

    debug!(
        left = left.name(),
        right = right.name(),
        %mode,
        rows = out.len() - 1,
        "joined tables"
    );
    Ok(out)
}
