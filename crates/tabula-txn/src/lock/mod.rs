//! Table locks.
//!
//! A lock is exclusive and non-reentrant: acquiring a lock that is already
//! held fails, whoever holds it, and a lock stays held until it is
//! explicitly released. Locks are advisory; nothing stops a writer that
//! does not ask for one.
//!
//! Two backends are provided:
//!
//! ```text
//! FileLockTable     databases/<db>/<table>_lock exists  <=> held
//! MemoryLockTable   lock path is in a mutex-guarded set  <=> held
//! ```

use std::collections::HashSet;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tabula_common::{LockBackend, TabulaResult};
use tabula_storage::TableRef;

/// Exclusive per-table locks.
pub trait LockTable: Send + Sync + fmt::Debug {
    /// Takes the lock. Returns false if it is already held.
    fn try_acquire(&self, table: &TableRef) -> TabulaResult<bool>;

    /// Releases the lock. Returns false if it was not held.
    fn release(&self, table: &TableRef) -> TabulaResult<bool>;

    /// Returns true if the lock is currently held.
    fn is_held(&self, table: &TableRef) -> TabulaResult<bool>;

    /// Returns which backend this is.
    fn backend(&self) -> LockBackend;
}

/// Creates the lock table for a configured backend.
pub fn lock_table_for(backend: LockBackend) -> Arc<dyn LockTable> {
    match backend {
        LockBackend::File => Arc::new(FileLockTable::new()),
        LockBackend::Memory => Arc::new(MemoryLockTable::new()),
    }
}

/// Locks represented by empty marker files next to the table.
///
/// The marker is created with `create_new`, so two processes racing for
/// the same table cannot both succeed.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLockTable;

impl FileLockTable {
    /// Creates a file-backed lock table.
    pub fn new() -> Self {
        Self
    }
}

impl LockTable for FileLockTable {
    fn try_acquire(&self, table: &TableRef) -> TabulaResult<bool> {
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(table.lock_path())
        {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn release(&self, table: &TableRef) -> TabulaResult<bool> {
        match fs::remove_file(table.lock_path()) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn is_held(&self, table: &TableRef) -> TabulaResult<bool> {
        Ok(table.lock_path().exists())
    }

    fn backend(&self) -> LockBackend {
        LockBackend::File
    }
}

/// Locks kept in memory, shared by every session of one database handle.
#[derive(Default)]
pub struct MemoryLockTable {
    held: Mutex<HashSet<PathBuf>>,
}

impl MemoryLockTable {
    /// Creates an empty in-memory lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of held locks.
    pub fn len(&self) -> usize {
        self.held.lock().len()
    }

    /// Returns true if no lock is held.
    pub fn is_empty(&self) -> bool {
        self.held.lock().is_empty()
    }
}

impl LockTable for MemoryLockTable {
    fn try_acquire(&self, table: &TableRef) -> TabulaResult<bool> {
        Ok(self.held.lock().insert(table.lock_path()))
    }

    fn release(&self, table: &TableRef) -> TabulaResult<bool> {
        Ok(self.held.lock().remove(&table.lock_path()))
    }

    fn is_held(&self, table: &TableRef) -> TabulaResult<bool> {
        Ok(self.held.lock().contains(&table.lock_path()))
    }

    fn backend(&self) -> LockBackend {
        LockBackend::Memory
    }
}

impl fmt::Debug for MemoryLockTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryLockTable")
            .field("held", &self.len())
            .finish()
    }
}
