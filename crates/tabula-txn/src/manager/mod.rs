//! Transaction manager for one session.
//!
//! The manager owns the session's transaction flags (`active`, `aborted`)
//! and the set of tables it locked since the last `begin`. Lock state
//! itself lives in the shared [`LockTable`].
//!
//! # Write path
//!
//! ```text
//! prepare_write(t)
//!   ├─ t not locked by us? ── acquire lock ── conflict ─▶ aborted = true, LockConflict
//!   ├─ shadow missing?     ── copy t.txt ─▶ t_cache.txt
//!   └─ return handle on t_cache.txt
//! ```
//!
//! # Commit
//!
//! Commit visits every database directory holding a table locked in this
//! scope, plus the session's current database. Each shadow file found there
//! is copied over its live table, deleted, and its lock released, one table
//! at a time. A failure stops the commit and is reported; tables persisted
//! before it stay persisted.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tabula_common::{ObjectKind, TabulaError, TabulaResult};
use tabula_storage::{TableFile, TableRef};
use tracing::{debug, info, warn};

use crate::lock::LockTable;

/// The state of a session's transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// No transaction; writes go to live tables.
    Idle,
    /// A transaction is open; writes go to shadow tables.
    Active,
}

impl TransactionState {
    /// Returns true if a transaction is open.
    pub fn is_active(&self) -> bool {
        *self == TransactionState::Active
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionState::Idle => write!(f, "Idle"),
            TransactionState::Active => write!(f, "Active"),
        }
    }
}

/// Per-session transaction coordinator.
pub struct TransactionManager {
    /// Shared lock table.
    locks: Arc<dyn LockTable>,
    /// Current state.
    state: TransactionState,
    /// Set by a lock conflict, cleared by `begin`.
    aborted: bool,
    /// Tables locked by this session since the last `begin`.
    held: HashSet<TableRef>,
}

impl TransactionManager {
    /// Creates an idle manager over a lock table.
    pub fn new(locks: Arc<dyn LockTable>) -> Self {
        Self {
            locks,
            state: TransactionState::Idle,
            aborted: false,
            held: HashSet::new(),
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Returns true if a transaction is open.
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Returns true if a conflict happened since the last `begin`.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Returns true if this session locked `table` since the last `begin`.
    pub fn holds(&self, table: &TableRef) -> bool {
        self.held.contains(table)
    }

    /// Returns the shared lock table.
    pub fn lock_table(&self) -> &Arc<dyn LockTable> {
        &self.locks
    }

    /// Opens a transaction.
    ///
    /// Calling `begin` while active starts a fresh scope: the conflict flag
    /// is cleared and locks taken earlier are no longer counted as ours.
    /// Nothing on disk is rolled back.
    pub fn begin(&mut self) {
        if self.is_active() {
            debug!(
                held = self.held.len(),
                "begin while active; previous locks stay on disk"
            );
        }
        self.state = TransactionState::Active;
        self.aborted = false;
        self.held.clear();
        debug!("transaction started");
    }

    /// Takes the lock on `table`.
    ///
    /// A conflict marks the transaction aborted.
    pub fn acquire_lock(&mut self, table: &TableRef) -> TabulaResult<()> {
        if self.locks.try_acquire(table)? {
            debug!(table = %table, "lock acquired");
            self.held.insert(table.clone());
            Ok(())
        } else {
            warn!(table = %table, "lock conflict, transaction aborted");
            self.aborted = true;
            Err(TabulaError::lock_conflict(table.name()))
        }
    }

    /// Releases the lock on `table`.
    pub fn release_lock(&mut self, table: &TableRef) -> TabulaResult<()> {
        if self.locks.release(table)? {
            debug!(table = %table, "lock released");
            self.held.remove(table);
            Ok(())
        } else {
            Err(TabulaError::not_found(ObjectKind::Lock, table.name()))
        }
    }

    /// Copies `table` to its shadow path unless the shadow already exists.
    ///
    /// Returns true if a copy was made, false if the shadow was already
    /// prepared.
    pub fn ensure_shadow(&self, table: &TableRef) -> TabulaResult<bool> {
        if table.shadow_path().exists() {
            return Ok(false);
        }
        if !table.exists() {
            return Err(TabulaError::not_found(ObjectKind::Table, table.name()));
        }
        fs::copy(table.path(), table.shadow_path())?;
        debug!(table = %table, "shadow prepared");
        Ok(true)
    }

    /// Prepares a transactional write and returns the file to write to.
    ///
    /// The lock is taken on the first write to a table in this scope, before
    /// its shadow is created.
    pub fn prepare_write(&mut self, table: &TableRef) -> TabulaResult<TableFile> {
        if !self.is_active() {
            return Err(TabulaError::NoActiveTransaction);
        }
        if self.aborted {
            return Err(TabulaError::TransactionAborted);
        }
        if !table.exists() {
            return Err(TabulaError::not_found(ObjectKind::Table, table.name()));
        }
        if !self.holds(table) {
            self.acquire_lock(table)?;
        }
        self.ensure_shadow(table)?;
        Ok(table.shadow())
    }

    /// Persists the shadow tables and closes the transaction.
    ///
    /// Shadows are collected from the directory of every held table and from
    /// `current`, the session's selected database, so a database switch
    /// after a write does not strand its shadow. Returns the number of
    /// tables persisted. On failure the transaction stays active and tables
    /// persisted so far stay persisted.
    pub fn commit(&mut self, current: Option<&Path>) -> TabulaResult<usize> {
        if self.aborted {
            return Err(TabulaError::TransactionAborted);
        }
        if !self.is_active() {
            return Err(TabulaError::NoActiveTransaction);
        }

        let mut dirs: BTreeSet<PathBuf> = self
            .held
            .iter()
            .map(|table| table.db_dir().to_path_buf())
            .collect();
        dirs.extend(current.map(Path::to_path_buf));

        let mut shadows = Vec::new();
        for dir in &dirs {
            shadows.extend(shadow_tables(dir)?);
        }

        let mut persisted = 0;
        for table in &shadows {
            if let Err(e) = self.persist(table) {
                warn!(table = %table, persisted, error = %e, "commit stopped");
                return Err(TabulaError::CommitFailed {
                    table: table.name().to_string(),
                    source: Box::new(e),
                });
            }
            persisted += 1;
        }

        self.state = TransactionState::Idle;
        self.held.clear();
        info!(tables = persisted, "transaction committed");
        Ok(persisted)
    }

    fn persist(&mut self, table: &TableRef) -> TabulaResult<()> {
        fs::copy(table.shadow_path(), table.path())?;
        fs::remove_file(table.shadow_path())?;
        self.release_lock(table)
    }
}

impl fmt::Debug for TransactionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionManager")
            .field("state", &self.state)
            .field("aborted", &self.aborted)
            .field("held", &self.held.len())
            .field("backend", &self.locks.backend())
            .finish()
    }
}

/// Lists the shadow tables of a database directory, ordered by name.
fn shadow_tables(db_dir: &Path) -> TabulaResult<Vec<TableRef>> {
    let mut tables = Vec::new();
    for entry in fs::read_dir(db_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        if let Some(table) = file_name
            .to_str()
            .and_then(|name| TableRef::from_shadow_file_name(db_dir, name))
        {
            tables.push(table);
        }
    }
    tables.sort_by(|a, b| a.name().cmp(b.name()));
    Ok(tables)
}
