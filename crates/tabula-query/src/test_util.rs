//! Fixtures shared by the unit tests of this crate.

use std::fs;

use tabula_storage::TableFile;
use tempfile::TempDir;

/// Writes a table file with the given header and rows.
pub fn table(tmp: &TempDir, name: &str, header: &str, rows: &[&str]) -> TableFile {
    let path = tmp.path().join(format!("{name}.txt"));
    let mut content = header.to_string();
    for row in rows {
        content.push('\n');
        content.push_str(row);
    }
    fs::write(&path, content).unwrap();
    TableFile::new(name, path)
}

/// Reads every data row as joined text, for compact assertions.
pub fn rows(file: &TableFile) -> Vec<String> {
    file.scan()
        .unwrap()
        .collect_rows()
        .unwrap()
        .into_iter()
        .map(|r| r.values().join(","))
        .collect()
}
