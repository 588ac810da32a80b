//! Table scans.

use tabula_common::TabulaResult;
use tabula_storage::{Row, TableFile, TableScan};
use tracing::debug;

/// Returns a restartable scan over every data row of `table`.
///
/// Fails if the table file does not exist.
pub fn scan_all(table: &TableFile) -> TabulaResult<TableScan> {
    table.scan()
}

/// Scans `table`, keeping rows whose `key_column` field is **not** equal to
/// `value`, and projects `columns` in the order given.
///
/// The inequality is the operator's contract: callers asking for
/// `key = value` through this operator get every other row.
pub fn scan_filtered<S: AsRef<str>>(
    table: &TableFile,
    key_column: &str,
    value: &str,
    columns: &[S],
) -> TabulaResult<Vec<Row>> {
    let schema = table.require_schema()?;
    let key = schema.index_of(key_column)?;
    let projection = columns
        .iter()
        .map(|c| schema.index_of(c.as_ref()))
        .collect::<TabulaResult<Vec<_>>>()?;

    let mut out = Vec::new();
    for row in table.scan()?.rows()? {
        let row = row?;
        if row.get(key) != Some(value) {
            out.push(row.project(&projection));
        }
    }

    debug!(table = table.name(), key = key_column, rows = out.len(), "filtered scan");
    Ok(out)
}
