//! # tabula-txn
//!
//! Transaction support for Tabula.
//!
//! A transaction never writes a live table. Its first write to a table
//! locks the table and copies it to a shadow file; later writes go to the
//! shadow. Commit copies every shadow over its live table, deletes the
//! shadow and releases the lock.
//!
//! ```text
//! ┌──────┐  begin()  ┌────────┐  commit() ok   ┌──────┐
//! │ Idle │──────────▶│ Active │───────────────▶│ Idle │
//! └──────┘           └────────┘                └──────┘
//!                      │    ▲
//!                      └────┘ commit() failed: nothing changes
//! ```
//!
//! # Example Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use tabula_txn::{FileLockTable, TransactionManager};
//!
//! let mut tm = TransactionManager::new(Arc::new(FileLockTable::new()));
//! tm.begin();
//! let shadow = tm.prepare_write(&table)?;
//! shadow.append_row(&["1", "a"])?;
//! tm.commit(Some(table.db_dir()))?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Table lock implementations.
///
/// This module provides:
/// - [`lock::LockTable`]: exclusive, non-reentrant, explicitly released locks
/// - [`lock::FileLockTable`]: marker files shared between processes
/// - [`lock::MemoryLockTable`]: an in-process lock set
pub mod lock;

/// Transaction lifecycle management.
///
/// This module provides:
/// - [`manager::TransactionManager`]: per-session transaction state
/// - [`manager::TransactionState`]: `Idle` or `Active`
pub mod manager;

pub use lock::{lock_table_for, FileLockTable, LockTable, MemoryLockTable};
pub use manager::{TransactionManager, TransactionState};
