//! Engine configuration structures.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::DEFAULT_ROOT_DIR;
use crate::error::{TabulaError, TabulaResult};

/// Backing mechanism for table locks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockBackend {
    /// Marker files next to the table (`<table>_lock`). Visible to every
    /// process sharing the root directory.
    #[default]
    File,
    /// In-process lock set. Only sessions of the same `Database` see it.
    Memory,
}

/// Main engine configuration.
///
/// # Example
///
/// ```rust
/// use tabula_common::config::{EngineConfig, LockBackend};
///
/// let config = EngineConfig::default();
/// assert_eq!(config.root_dir.to_str(), Some("databases"));
/// assert_eq!(config.lock_backend, LockBackend::File);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory holding one sub-directory per database.
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,

    /// How table locks are represented.
    #[serde(default)]
    pub lock_backend: LockBackend,
}

fn default_root_dir() -> PathBuf {
    PathBuf::from(DEFAULT_ROOT_DIR)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            lock_backend: LockBackend::default(),
        }
    }
}

impl EngineConfig {
    /// Creates a configuration rooted at the given directory.
    #[must_use]
    pub fn with_root_dir(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Default::default()
        }
    }

    /// Sets the lock backend.
    #[must_use]
    pub fn with_lock_backend(mut self, backend: LockBackend) -> Self {
        self.lock_backend = backend;
        self
    }

    /// Creates a configuration for tests, rooted at a scratch directory.
    #[must_use]
    pub fn for_testing(root_dir: impl Into<PathBuf>) -> Self {
        Self::with_root_dir(root_dir)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> TabulaResult<()> {
        if self.root_dir.as_os_str().is_empty() {
            return Err(TabulaError::invalid_argument("root_dir must not be empty"));
        }

        if self.root_dir.is_file() {
            return Err(TabulaError::invalid_argument(format!(
                "root_dir {} is a file",
                self.root_dir.display()
            )));
        }

        Ok(())
    }
}
