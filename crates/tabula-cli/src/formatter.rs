//! Output formatting for statement results.
//!
//! Supports `raw` output (fields joined with `|`, one row per line) and a
//! bordered `table` grid.

use std::fmt;
use std::str::FromStr;

use comfy_table::{Cell, ContentArrangement, Table};
use tabula_engine::Row;

use crate::dispatch::StatementResult;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Fields separated by `|`.
    #[default]
    Raw,
    /// Formatted table output.
    Table,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Raw => write!(f, "raw"),
            OutputFormat::Table => write!(f, "table"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(OutputFormat::Raw),
            "table" => Ok(OutputFormat::Table),
            other => Err(format!("unknown output format '{other}'")),
        }
    }
}

/// Formats a statement result according to the specified format.
pub fn format_result(result: &StatementResult, format: OutputFormat) -> String {
    match result {
        StatementResult::Ok(message) | StatementResult::Failed(message) => message.clone(),
        StatementResult::Rows { header, rows } => match format {
            OutputFormat::Raw => format_raw(header, rows),
            OutputFormat::Table => format_table(header, rows),
        },
    }
}

/// Formats rows as `|`-separated lines, header first.
fn format_raw(header: &Row, rows: &[Row]) -> String {
    std::iter::once(header)
        .chain(rows)
        .map(|row| row.values().join("|"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Formats rows as a table.
fn format_table(header: &Row, rows: &[Row]) -> String {
    let mut table = Table::new();

    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);

    if !header.is_empty() {
        table.set_header(header.values().iter().map(Cell::new));
    }

    for row in rows {
        table.add_row(row.values().iter().map(Cell::new));
    }

    format!(
        "{table}\n({} row{})",
        rows.len(),
        if rows.len() == 1 { "" } else { "s" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_result() -> StatementResult {
        StatementResult::Rows {
            header: Row::from(vec!["pid int", "name varchar(20)"]),
            rows: vec![Row::from(vec!["1", "Gizmo"]), Row::from(vec!["2", ""])],
        }
    }

    #[test]
    fn test_format_raw() {
        let output = format_result(&make_test_result(), OutputFormat::Raw);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines, ["pid int|name varchar(20)", "1|Gizmo", "2|"]);
    }

    #[test]
    fn test_format_table() {
        let output = format_result(&make_test_result(), OutputFormat::Table);
        assert!(output.contains("pid int"));
        assert!(output.contains("Gizmo"));
        assert!(output.ends_with("(2 rows)"));
    }

    #[test]
    fn test_format_message() {
        let result = StatementResult::Ok("Database db_1 created.".into());
        assert_eq!(format_result(&result, OutputFormat::Table), "Database db_1 created.");
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("RAW".parse::<OutputFormat>().unwrap(), OutputFormat::Raw);
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert!("json".parse::<OutputFormat>().is_err());
    }
}
