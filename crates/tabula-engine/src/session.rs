//! Client sessions.
//!
//! A session carries the connection-level state: the selected database and
//! the transaction. Reads always go to the live table. Writes go to the live
//! table outside a transaction and to the table's shadow copy inside one;
//! the shadow replaces the live file at commit.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tabula_common::{TabulaError, TabulaResult};
use tabula_query::{self as query, Comparator, JoinMode, JoinSpec};
use tabula_storage::{Catalog, Column, Row, Schema, TableFile, TableScan};
use tabula_txn::{LockTable, TransactionManager, TransactionState};
use tracing::{debug, info};

/// Unique session identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    /// Creates a new session ID.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the numeric ID.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session_{}", self.0)
    }
}

/// A database session.
pub struct Session {
    id: SessionId,
    catalog: Catalog,
    txn: TransactionManager,
}

impl Session {
    pub(crate) fn new(id: SessionId, root: &Path, locks: Arc<dyn LockTable>) -> Self {
        debug!(session = %id, "session opened");
        Self {
            id,
            catalog: Catalog::new(root),
            txn: TransactionManager::new(locks),
        }
    }

    /// Returns the session ID.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Returns the selected database, if any.
    pub fn current_database(&self) -> Option<&str> {
        self.catalog.current_database()
    }

    /// Returns the transaction state.
    pub fn transaction_state(&self) -> TransactionState {
        self.txn.state()
    }

    /// Returns true while a transaction is open.
    pub fn in_transaction(&self) -> bool {
        self.txn.is_active()
    }

    /// Returns true if a lock conflict occurred since the last begin.
    pub fn is_aborted(&self) -> bool {
        self.txn.is_aborted()
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Creates a database.
    pub fn create_database(&self, name: &str) -> TabulaResult<()> {
        self.catalog.create_database(name)
    }

    /// Drops an empty database.
    pub fn drop_database(&mut self, name: &str) -> TabulaResult<()> {
        self.catalog.drop_database(name)
    }

    /// Selects the current database.
    pub fn select_database(&mut self, name: &str) -> TabulaResult<()> {
        self.catalog.select_database(name)
    }

    /// Creates an empty table in the current database.
    pub fn create_table(&self, name: &str) -> TabulaResult<()> {
        self.catalog.create_table(name).map(|_| ())
    }

    /// Drops a table of the current database.
    pub fn drop_table(&self, name: &str) -> TabulaResult<()> {
        self.catalog.drop_table(name)
    }

    /// Appends a column to a table's header.
    ///
    /// A table this transaction has locked gets the column in its shadow
    /// copy, so commit keeps it. A table locked by anyone else is refused.
    pub fn add_column(&self, table: &str, label: &str, column_type: &str) -> TabulaResult<()> {
        let table = self.catalog.existing_table(table)?;
        let column = Column::new(label, column_type.parse()?)?;

        if self.txn.is_active() && self.txn.holds(&table) {
            if self.txn.is_aborted() {
                return Err(TabulaError::TransactionAborted);
            }
            table.shadow().append_column(column)
        } else if self.txn.lock_table().is_held(&table)? {
            debug!(session = %self.id, table = %table, "schema change refused, table locked");
            Err(TabulaError::lock_conflict(table.name()))
        } else {
            table.live().append_column(column)
        }
    }

    /// Reads a table's schema; `None` while the table has no columns.
    pub fn read_schema(&self, table: &str) -> TabulaResult<Option<Schema>> {
        self.catalog.read_schema(table)
    }

    // =========================================================================
    // Scans
    // =========================================================================

    /// Scans every row of a table.
    pub fn scan_all(&self, table: &str) -> TabulaResult<TableScan> {
        let table = self.catalog.existing_table(table)?;
        query::scan_all(&table.live())
    }

    /// Scans rows whose `key` field differs from `value`, projecting
    /// `columns`.
    pub fn scan_filtered<S: AsRef<str>>(
        &self,
        table: &str,
        key: &str,
        value: &str,
        columns: &[S],
    ) -> TabulaResult<Vec<Row>> {
        let table = self.catalog.existing_table(table)?;
        query::scan_filtered(&table.live(), key, value, columns)
    }

    /// Joins two tables. The first row is the combined header.
    pub fn join(&self, left: &JoinSpec, right: &JoinSpec, mode: JoinMode) -> TabulaResult<Vec<Row>> {
        let left_table = self.catalog.existing_table(&left.table)?;
        let right_table = self.catalog.existing_table(&right.table)?;
        query::nested_loop_join(
            &left_table.live(),
            &left.key,
            &right_table.live(),
            &right.key,
            mode,
        )
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Appends a row.
    pub fn append_row<S: AsRef<str>>(&mut self, table: &str, values: &[S]) -> TabulaResult<()> {
        let target = self.write_target(table)?;
        query::append_row(&target, values)
    }

    /// Deletes rows matching `key <cmp> value`. Returns the number removed.
    pub fn delete_where(
        &mut self,
        table: &str,
        key: &str,
        value: &str,
        cmp: Comparator,
    ) -> TabulaResult<usize> {
        let target = self.write_target(table)?;
        query::delete_where(&target, key, value, cmp)
    }

    /// Sets `column` to `new_value` where `key` equals `value`. Returns the
    /// number of rows modified.
    pub fn update_where(
        &mut self,
        table: &str,
        key: &str,
        value: &str,
        column: &str,
        new_value: &str,
    ) -> TabulaResult<usize> {
        let target = self.write_target(table)?;
        query::update_where(&target, key, value, column, new_value)
    }

    /// Resolves the file a write to `table` goes to.
    fn write_target(&mut self, table: &str) -> TabulaResult<TableFile> {
        let table = self.catalog.existing_table(table)?;
        if self.txn.is_active() {
            self.txn.prepare_write(&table)
        } else {
            Ok(table.live())
        }
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Opens a transaction. See [`TransactionManager::begin`].
    pub fn begin_transaction(&mut self) {
        info!(session = %self.id, "begin transaction");
        self.txn.begin();
    }

    /// Commits the open transaction.
    ///
    /// Covers every database written in this transaction as well as the
    /// current one. Returns the number of tables persisted.
    pub fn commit_transaction(&mut self) -> TabulaResult<usize> {
        let dir = self.catalog.current_dir().ok();
        let persisted = self.txn.commit(dir.as_deref())?;
        info!(session = %self.id, tables = persisted, "commit");
        Ok(persisted)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("database", &self.catalog.current_database())
            .field("txn", &self.txn)
            .finish()
    }
}
