//! Top-level database handle.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tabula_common::{EngineConfig, TabulaResult};
use tabula_txn::{lock_table_for, LockTable};
use tracing::info;

use crate::session::{Session, SessionId};

/// The database handle: configuration plus the lock table shared by every
/// session it creates.
///
/// Two sessions of one `Database` behave like two cooperating processes:
/// they see the same files and contend for the same locks, but each has its
/// own current database and transaction state.
pub struct Database {
    config: EngineConfig,
    locks: Arc<dyn LockTable>,
    next_session_id: AtomicU64,
}

impl Database {
    /// Opens a database with the given configuration.
    ///
    /// The root directory is created if missing.
    pub fn open(config: EngineConfig) -> TabulaResult<Self> {
        config.validate()?;
        fs::create_dir_all(&config.root_dir)?;

        let locks = lock_table_for(config.lock_backend);
        info!(
            root = %config.root_dir.display(),
            locks = ?config.lock_backend,
            "opened database root"
        );

        Ok(Self {
            config,
            locks,
            next_session_id: AtomicU64::new(1),
        })
    }

    /// Opens a database rooted at `root` with default settings.
    pub fn open_at(root: impl AsRef<Path>) -> TabulaResult<Self> {
        Self::open(EngineConfig::with_root_dir(root.as_ref()))
    }

    /// Creates a new session. No database is selected and no transaction is
    /// open.
    pub fn session(&self) -> Session {
        let id = SessionId::new(self.next_session_id.fetch_add(1, Ordering::Relaxed));
        Session::new(id, &self.config.root_dir, Arc::clone(&self.locks))
    }

    /// Returns the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.config.root_dir
    }

    /// Returns the shared lock table.
    pub fn lock_table(&self) -> &Arc<dyn LockTable> {
        &self.locks
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("root", &self.config.root_dir)
            .field("locks", &self.locks.backend())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_common::{ErrorCode, LockBackend};
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("data").join("databases");
        let db = Database::open_at(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(db.root(), root.as_path());
        assert_eq!(db.lock_table().backend(), LockBackend::File);
    }

    #[test]
    fn test_open_rejects_file_root() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("plain");
        fs::write(&file, "").unwrap();
        let err = Database::open_at(&file).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
    }

    #[test]
    fn test_sessions_get_distinct_ids() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(
            EngineConfig::for_testing(tmp.path()).with_lock_backend(LockBackend::Memory),
        )
        .unwrap();
        let a = db.session();
        let b = db.session();
        assert_ne!(a.id(), b.id());
        assert_eq!(db.config().lock_backend, LockBackend::Memory);
    }
}
