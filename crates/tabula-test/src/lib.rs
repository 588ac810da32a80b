//! # tabula-test
//!
//! Integration tests for Tabula.
//!
//! This crate contains:
//! - End-to-end tests over the engine API
//! - Script-driven tests through the shell's dispatcher
//!
//! The helpers here set up a throwaway root directory per test.

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::path::Path;

use tabula_common::{EngineConfig, LockBackend};
use tabula_engine::{Database, Session};
use tempfile::TempDir;

/// A database root in a temporary directory, removed on drop.
pub struct TestDb {
    dir: TempDir,
    db: Database,
}

impl TestDb {
    /// Opens a fresh root with file-backed locks.
    pub fn new() -> Self {
        Self::with_backend(LockBackend::File)
    }

    /// Opens a fresh root with the given lock backend.
    pub fn with_backend(backend: LockBackend) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let config = EngineConfig::for_testing(dir.path()).with_lock_backend(backend);
        let db = Database::open(config).expect("failed to open database");
        Self { dir, db }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Returns the database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Opens a new session with nothing selected.
    pub fn session(&self) -> Session {
        self.db.session()
    }

    /// Opens a new session with `database` created (if needed) and selected.
    pub fn session_in(&self, database: &str) -> Session {
        let mut session = self.db.session();
        if !self.root().join(database).exists() {
            session
                .create_database(database)
                .expect("failed to create database");
        }
        session
            .select_database(database)
            .expect("failed to select database");
        session
    }
}

impl Default for TestDb {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates `table` in the session's database with `columns` given as
/// `(label, type)` pairs.
pub fn create_table(session: &Session, table: &str, columns: &[(&str, &str)]) {
    session.create_table(table).expect("failed to create table");
    for (label, column_type) in columns {
        session
            .add_column(table, label, column_type)
            .expect("failed to add column");
    }
}

/// Returns every data row of `table`, fields joined with `,`.
pub fn rows(session: &Session, table: &str) -> Vec<String> {
    session
        .scan_all(table)
        .expect("failed to scan")
        .collect_rows()
        .expect("failed to read rows")
        .into_iter()
        .map(|row| row.values().join(","))
        .collect()
}

/// Runs a script and returns everything it printed.
pub fn run_script(session: &mut Session, script: &str) -> String {
    let mut format = tabula_cli::OutputFormat::Raw;
    let mut out = Vec::new();
    tabula_cli::run_script(session, script, &mut format, &mut out).expect("script failed");
    String::from_utf8(out).expect("output is not UTF-8")
}
