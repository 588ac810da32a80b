//! Table files.
//!
//! [`TableRef`] resolves a table name to its paths inside a database
//! directory. [`TableFile`] reads and writes one concrete file, which is
//! either the live table or its shadow copy. [`TableScan`] is a restartable
//! handle over the data rows of a file.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tabula_common::constants::{LINE_SEPARATOR, LOCK_SUFFIX, SHADOW_SUFFIX, TABLE_EXTENSION};
use tabula_common::{ObjectKind, TabulaError, TabulaResult};
use tracing::debug;

use crate::row::{decode_row, Row};
use crate::schema::{Column, Schema};

/// A table inside a database directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    db_dir: PathBuf,
    name: String,
}

impl TableRef {
    /// Creates a reference to table `name` in `db_dir`.
    ///
    /// The name is lower-cased.
    pub fn new(db_dir: impl Into<PathBuf>, name: &str) -> Self {
        Self {
            db_dir: db_dir.into(),
            name: name.to_lowercase(),
        }
    }

    /// Recognizes a shadow file name (`<table>_cache.txt`) in `db_dir`.
    pub fn from_shadow_file_name(db_dir: &Path, file_name: &str) -> Option<Self> {
        let name = file_name
            .strip_suffix(TABLE_EXTENSION)?
            .strip_suffix('.')?
            .strip_suffix(SHADOW_SUFFIX)?;
        if name.is_empty() {
            return None;
        }
        Some(Self::new(db_dir, name))
    }

    /// Returns the normalized table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the database directory.
    pub fn db_dir(&self) -> &Path {
        &self.db_dir
    }

    /// Returns the path of the live table file.
    pub fn path(&self) -> PathBuf {
        self.db_dir
            .join(format!("{}.{}", self.name, TABLE_EXTENSION))
    }

    /// Returns the path of the shadow copy.
    pub fn shadow_path(&self) -> PathBuf {
        self.db_dir
            .join(format!("{}{}.{}", self.name, SHADOW_SUFFIX, TABLE_EXTENSION))
    }

    /// Returns the path of the lock marker.
    pub fn lock_path(&self) -> PathBuf {
        self.db_dir.join(format!("{}{}", self.name, LOCK_SUFFIX))
    }

    /// Returns true if the live table file exists.
    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    /// Returns a handle on the live table file.
    pub fn live(&self) -> TableFile {
        TableFile::new(self.name.clone(), self.path())
    }

    /// Returns a handle on the shadow copy.
    pub fn shadow(&self) -> TableFile {
        TableFile::new(self.name.clone(), self.shadow_path())
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// One table file on disk.
#[derive(Debug, Clone)]
pub struct TableFile {
    name: String,
    path: PathBuf,
}

impl TableFile {
    /// Creates a handle; the file need not exist.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Returns the table name used in errors.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the file exists.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn ensure_exists(&self) -> TabulaResult<()> {
        if self.exists() {
            Ok(())
        } else {
            Err(TabulaError::not_found(ObjectKind::Table, &self.name))
        }
    }

    fn lines(&self) -> TabulaResult<LineReader> {
        self.ensure_exists()?;
        Ok(LineReader::new(File::open(&self.path)?))
    }

    /// Reads the schema.
    ///
    /// Returns `None` if the file exists but has no header yet.
    pub fn read_schema(&self) -> TabulaResult<Option<Schema>> {
        match self.lines()?.next() {
            Some(line) => {
                let line = line?;
                if line.is_empty() {
                    Ok(None)
                } else {
                    Schema::parse_header(&line).map(Some)
                }
            }
            None => Ok(None),
        }
    }

    /// Reads the schema, failing if the table has no columns.
    pub fn require_schema(&self) -> TabulaResult<Schema> {
        self.read_schema()?.ok_or_else(|| {
            TabulaError::schema_violation(format!("table '{}' has no columns", self.name))
        })
    }

    /// Returns true if the file holds at least one data row.
    pub fn has_rows(&self) -> TabulaResult<bool> {
        let mut lines = self.lines()?;
        match lines.next() {
            Some(header) => {
                header?;
                Ok(lines.next().is_some())
            }
            None => Ok(false),
        }
    }

    /// Appends a column to the header.
    ///
    /// Fails if the label is already present. Columns can only be added
    /// while the table holds no data rows, so every row keeps one field per
    /// column.
    pub fn append_column(&self, column: Column) -> TabulaResult<()> {
        let mut schema = self.read_schema()?.unwrap_or_default();
        schema.push(column.clone())?;

        if self.has_rows()? {
            return Err(TabulaError::TableNotEmpty {
                table: self.name.clone(),
            });
        }

        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(column.header_segment().as_bytes())?;
        debug!(table = %self.name, column = %column, "appended column");
        Ok(())
    }

    /// Encodes `values` against the current schema and appends the row.
    pub fn append_row<S: AsRef<str>>(&self, values: &[S]) -> TabulaResult<()> {
        let schema = self.require_schema()?;
        let line = schema.encode_row(values)?;
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        write!(file, "{LINE_SEPARATOR}{line}")?;
        Ok(())
    }

    /// Replaces the data rows, keeping the header.
    ///
    /// Every row is encoded before the file is touched, so a row that no
    /// longer validates leaves the file unchanged.
    pub fn rewrite<I>(&self, schema: &Schema, rows: I) -> TabulaResult<usize>
    where
        I: IntoIterator<Item = Row>,
    {
        self.ensure_exists()?;
        let mut content = schema.header_line();
        let mut count = 0;
        for row in rows {
            let line = schema.encode_row(row.values())?;
            content.push(LINE_SEPARATOR);
            content.push_str(&line);
            count += 1;
        }
        fs::write(&self.path, content)?;
        debug!(table = %self.name, rows = count, path = %self.path.display(), "rewrote table");
        Ok(count)
    }

    /// Returns a restartable scan over the data rows.
    pub fn scan(&self) -> TabulaResult<TableScan> {
        self.ensure_exists()?;
        Ok(TableScan { file: self.clone() })
    }
}

/// Restartable scan over the data rows of a table file.
///
/// Each call to [`TableScan::rows`] reopens the file and yields rows in file
/// order, header excluded.
#[derive(Debug, Clone)]
pub struct TableScan {
    file: TableFile,
}

impl TableScan {
    /// Returns the table name.
    pub fn table(&self) -> &str {
        self.file.name()
    }

    /// Reads the schema of the scanned file.
    pub fn schema(&self) -> TabulaResult<Option<Schema>> {
        self.file.read_schema()
    }

    /// Starts a new pass over the data rows.
    pub fn rows(&self) -> TabulaResult<RowIter> {
        let mut lines = self.file.lines()?;
        if let Some(header) = lines.next() {
            header?;
        }
        Ok(RowIter { lines })
    }

    /// Reads every data row.
    pub fn collect_rows(&self) -> TabulaResult<Vec<Row>> {
        self.rows()?.collect()
    }
}

/// Lazy iterator over the data rows of one scan pass.
#[derive(Debug)]
pub struct RowIter {
    lines: LineReader,
}

impl Iterator for RowIter {
    type Item = TabulaResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines
            .next()
            .map(|line| line.map(|l| decode_row(&l)).map_err(TabulaError::from))
    }
}

/// Splits a file on line separators, keeping a final empty line.
///
/// Rows are appended as `"\n" + row`, so a file ending in a separator means
/// the last row is a single empty field.
#[derive(Debug)]
struct LineReader {
    reader: BufReader<File>,
    buf: String,
    follows: bool,
    done: bool,
}

impl LineReader {
    fn new(file: File) -> Self {
        Self {
            reader: BufReader::new(file),
            buf: String::new(),
            follows: false,
            done: false,
        }
    }
}

impl Iterator for LineReader {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.buf.clear();
        match self.reader.read_line(&mut self.buf) {
            Ok(0) => {
                self.done = true;
                if self.follows {
                    Some(Ok(String::new()))
                } else {
                    None
                }
            }
            Ok(_) => {
                self.follows = self.buf.ends_with(LINE_SEPARATOR);
                if self.follows {
                    self.buf.pop();
                }
                Some(Ok(std::mem::take(&mut self.buf)))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;
    use tempfile::TempDir;

    fn table_with_header(tmp: &TempDir, header: &str) -> TableRef {
        let table = TableRef::new(tmp.path(), "Product");
        fs::write(table.path(), header).unwrap();
        table
    }

    #[test]
    fn test_paths() {
        let table = TableRef::new("/db/shop", "Product");
        assert_eq!(table.name(), "product");
        assert_eq!(table.path(), PathBuf::from("/db/shop/product.txt"));
        assert_eq!(table.shadow_path(), PathBuf::from("/db/shop/product_cache.txt"));
        assert_eq!(table.lock_path(), PathBuf::from("/db/shop/product_lock"));
    }

    #[test]
    fn test_from_shadow_file_name() {
        let dir = Path::new("/db/shop");
        let table = TableRef::from_shadow_file_name(dir, "product_cache.txt").unwrap();
        assert_eq!(table.name(), "product");
        assert!(TableRef::from_shadow_file_name(dir, "product.txt").is_none());
        assert!(TableRef::from_shadow_file_name(dir, "product_lock").is_none());
        assert!(TableRef::from_shadow_file_name(dir, "_cache.txt").is_none());
    }

    #[test]
    fn test_read_schema_missing_table() {
        let tmp = TempDir::new().unwrap();
        let table = TableRef::new(tmp.path(), "nope");
        let err = table.live().read_schema().unwrap_err();
        assert!(err.is_not_found(ObjectKind::Table));
    }

    #[test]
    fn test_read_schema_empty_file() {
        let tmp = TempDir::new().unwrap();
        let table = table_with_header(&tmp, "");
        assert!(table.live().read_schema().unwrap().is_none());
    }

    #[test]
    fn test_append_column() {
        let tmp = TempDir::new().unwrap();
        let table = table_with_header(&tmp, "");
        let file = table.live();

        file.append_column(Column::new("id", ColumnType::Int).unwrap())
            .unwrap();
        file.append_column(Column::new("name", ColumnType::Varchar(8)).unwrap())
            .unwrap();

        let content = fs::read_to_string(table.path()).unwrap();
        assert_eq!(content, "id int\tname varchar(8)\t");

        let dup = file.append_column(Column::new("id", ColumnType::Float).unwrap());
        assert!(dup.is_err());
        assert_eq!(fs::read_to_string(table.path()).unwrap(), content);
    }

    #[test]
    fn test_append_column_rejected_with_rows() {
        let tmp = TempDir::new().unwrap();
        let table = table_with_header(&tmp, "id int\t\n1");
        let err = table
            .live()
            .append_column(Column::new("name", ColumnType::Varchar(8)).unwrap())
            .unwrap_err();
        assert_eq!(err.code(), tabula_common::ErrorCode::TableNotEmpty);
        assert_eq!(fs::read_to_string(table.path()).unwrap(), "id int\t\n1");
    }

    #[test]
    fn test_append_and_scan() {
        let tmp = TempDir::new().unwrap();
        let table = table_with_header(&tmp, "id int\tname varchar(8)\t");
        let file = table.live();

        file.append_row(&["1", "a"]).unwrap();
        file.append_row(&["2", "b"]).unwrap();
        assert!(file.append_row(&["x", "c"]).is_err());

        let content = fs::read_to_string(table.path()).unwrap();
        assert_eq!(content, "id int\tname varchar(8)\t\n1\ta\n2\tb");

        let scan = file.scan().unwrap();
        let rows = scan.collect_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].values(), &["2", "b"]);

        // restartable
        assert_eq!(scan.rows().unwrap().count(), 2);
    }

    #[test]
    fn test_append_row_without_header() {
        let tmp = TempDir::new().unwrap();
        let table = table_with_header(&tmp, "");
        let err = table.live().append_row(&["1"]).unwrap_err();
        assert_eq!(err.code(), tabula_common::ErrorCode::SchemaViolation);
    }

    #[test]
    fn test_trailing_empty_row_survives() {
        let tmp = TempDir::new().unwrap();
        let table = table_with_header(&tmp, "note varchar(4)\t");
        let file = table.live();
        file.append_row(&["x"]).unwrap();
        file.append_row(&[""]).unwrap();

        let rows = file.scan().unwrap().collect_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].values(), &[""]);
    }

    #[test]
    fn test_rewrite_keeps_header() {
        let tmp = TempDir::new().unwrap();
        let header = "id int\tname varchar(8)\t";
        let table = table_with_header(&tmp, &format!("{header}\n1\ta\n2\tb"));
        let file = table.live();
        let schema = file.require_schema().unwrap();

        let kept = vec![Row::from(vec!["2", "b"])];
        assert_eq!(file.rewrite(&schema, kept).unwrap(), 1);
        assert_eq!(
            fs::read_to_string(table.path()).unwrap(),
            format!("{header}\n2\tb")
        );

        assert_eq!(file.rewrite(&schema, Vec::new()).unwrap(), 0);
        assert_eq!(fs::read_to_string(table.path()).unwrap(), header);
    }

    #[test]
    fn test_rewrite_invalid_row_leaves_file() {
        let tmp = TempDir::new().unwrap();
        let original = "id int\t\n1\n2";
        let table = table_with_header(&tmp, original);
        let file = table.live();
        let schema = file.require_schema().unwrap();

        let rows = vec![Row::from(vec!["3"]), Row::from(vec!["oops"])];
        assert!(file.rewrite(&schema, rows).is_err());
        assert_eq!(fs::read_to_string(table.path()).unwrap(), original);
    }

    #[test]
    fn test_header_only_table_has_no_rows() {
        let tmp = TempDir::new().unwrap();
        let table = table_with_header(&tmp, "id int\t");
        assert!(!table.live().has_rows().unwrap());
        assert_eq!(table.live().scan().unwrap().rows().unwrap().count(), 0);
    }
}
