//! # tabula-engine
//!
//! The operation surface of Tabula. A [`Database`] owns the configuration
//! and the lock table; each [`Session`] owns a catalog pointer and its own
//! transaction state.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Database                          │
//! │     EngineConfig          Arc<dyn LockTable> (shared)    │
//! │            │                          │                  │
//! │     ┌──────┴──────┐            ┌──────┴──────┐           │
//! │     ▼             ▼            ▼             ▼           │
//! │  Session 1     Session 2    (one TransactionManager      │
//! │  Catalog       Catalog       per session)                │
//! └──────────────────────────────────────────────────────────┘
//!            │
//!            ▼
//!   reads:  live table file
//!   writes: live file, or the shadow copy while a transaction is open
//! ```
//!
//! # Example
//!
//! ```no_run
//! use tabula_common::EngineConfig;
//! use tabula_engine::Database;
//!
//! # fn main() -> tabula_common::TabulaResult<()> {
//! let db = Database::open(EngineConfig::default())?;
//! let mut session = db.session();
//!
//! session.create_database("shop")?;
//! session.select_database("shop")?;
//! session.create_table("product")?;
//! session.add_column("product", "pid", "int")?;
//! session.add_column("product", "name", "varchar(20)")?;
//! session.append_row("product", &["1", "Gizmo"])?;
//!
//! for row in session.scan_all("product")?.rows()? {
//!     println!("{}", row?.values().join("|"));
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod database;
mod session;

pub use database::Database;
pub use session::{Session, SessionId};

pub use tabula_query::{Comparator, JoinMode, JoinSpec};
pub use tabula_storage::{Column, ColumnType, Row, Schema, TableScan};
pub use tabula_txn::TransactionState;
