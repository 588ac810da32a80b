//! Database and table catalog.
//!
//! The catalog owns the root directory and the "current database" pointer.
//! Every table operation is resolved relative to that pointer.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use tabula_common::constants::{LOCK_SUFFIX, SHADOW_SUFFIX};
use tabula_common::{ObjectKind, TabulaError, TabulaResult};
use tracing::info;

use crate::schema::{Column, Schema};
use crate::table::TableRef;

/// Catalog of databases under one root directory.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Root directory; one sub-directory per database.
    root: PathBuf,
    /// Currently selected database (normalized name).
    current: Option<String>,
}

impl Catalog {
    /// Creates a catalog over `root`. No database is selected.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            current: None,
        }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the selected database name.
    pub fn current_database(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Returns the directory of the selected database.
    pub fn current_dir(&self) -> TabulaResult<PathBuf> {
        self.current
            .as_ref()
            .map(|name| self.root.join(name))
            .ok_or(TabulaError::NoDatabaseSelected)
    }

    fn database_dir(&self, name: &str) -> TabulaResult<(String, PathBuf)> {
        let name = normalize_name(name)?;
        let dir = self.root.join(&name);
        Ok((name, dir))
    }

    /// Creates a database directory, including missing parents.
    pub fn create_database(&self, name: &str) -> TabulaResult<()> {
        let (name, dir) = self.database_dir(name)?;
        if dir.exists() {
            return Err(TabulaError::already_exists(ObjectKind::Database, name));
        }
        fs::create_dir_all(&dir)?;
        info!(database = %name, "created database");
        Ok(())
    }

    /// Removes an empty database directory.
    ///
    /// Dropping the selected database clears the selection.
    pub fn drop_database(&mut self, name: &str) -> TabulaResult<()> {
        let (name, dir) = self.database_dir(name)?;
        if !dir.is_dir() {
            return Err(TabulaError::not_found(ObjectKind::Database, name));
        }
        if fs::read_dir(&dir)?.next().is_some() {
            return Err(TabulaError::DatabaseNotEmpty { name });
        }
        fs::remove_dir(&dir)?;

        if self.current.as_deref() == Some(name.as_str()) {
            self.current = None;
        }
        info!(database = %name, "dropped database");
        Ok(())
    }

    /// Selects the current database. Leaves the pointer unchanged on failure.
    pub fn select_database(&mut self, name: &str) -> TabulaResult<()> {
        let (name, dir) = self.database_dir(name)?;
        if !dir.is_dir() {
            return Err(TabulaError::not_found(ObjectKind::Database, name));
        }
        info!(database = %name, "using database");
        self.current = Some(name);
        Ok(())
    }

    /// Resolves a table of the selected database. The file need not exist.
    pub fn table(&self, name: &str) -> TabulaResult<TableRef> {
        let dir = self.current_dir()?;
        let name = normalize_name(name)?;
        if name.ends_with(SHADOW_SUFFIX) || name.ends_with(LOCK_SUFFIX) {
            return Err(TabulaError::invalid_argument(format!(
                "table name '{name}' uses a reserved suffix"
            )));
        }
        Ok(TableRef::new(dir, &name))
    }

    /// Resolves a table that must exist.
    pub fn existing_table(&self, name: &str) -> TabulaResult<TableRef> {
        let table = self.table(name)?;
        if !table.exists() {
            return Err(TabulaError::not_found(ObjectKind::Table, table.name()));
        }
        Ok(table)
    }

    /// Creates an empty table file (no header).
    pub fn create_table(&self, name: &str) -> TabulaResult<TableRef> {
        let table = self.table(name)?;
        if table.exists() {
            return Err(TabulaError::already_exists(ObjectKind::Table, table.name()));
        }
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(table.path())?;
        info!(table = %table, "created table");
        Ok(table)
    }

    /// Deletes a table file.
    pub fn drop_table(&self, name: &str) -> TabulaResult<()> {
        let table = self.existing_table(name)?;
        fs::remove_file(table.path())?;
        info!(table = %table, "dropped table");
        Ok(())
    }

    /// Appends a column definition to a table header.
    ///
    /// `column_type` is a type name such as `int`, `float` or `varchar(20)`.
    pub fn add_column(&self, table: &str, label: &str, column_type: &str) -> TabulaResult<()> {
        let table = self.existing_table(table)?;
        let column = Column::new(label, column_type.parse()?)?;
        table.live().append_column(column)
    }

    /// Reads a table's schema; `None` if it has no header yet.
    pub fn read_schema(&self, table: &str) -> TabulaResult<Option<Schema>> {
        let table = self.existing_table(table)?;
        table.live().read_schema()
    }
}

/// Lower-cases a database or table name and rejects path-like names.
fn normalize_name(name: &str) -> TabulaResult<String> {
    let name = name.trim().to_lowercase();
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_whitespace)
    {
        return Err(TabulaError::invalid_argument(format!(
            "invalid name '{name}'"
        )));
    }
    Ok(name)
}
