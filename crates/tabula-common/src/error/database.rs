//! Database error types.
//!
//! Every failure the engine can report to its caller is one variant of
//! [`TabulaError`]. No error crosses the core boundary as a panic.

use std::fmt;
use thiserror::Error;

/// Error codes for categorizing errors.
///
/// These codes can be used for programmatic error handling and
/// are stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // General errors (0x0000 - 0x00FF)
    /// Invalid argument provided.
    InvalidArgument = 0x0001,

    // I/O errors (0x0100 - 0x01FF)
    /// General I/O error.
    Io = 0x0100,

    // Catalog errors (0x0200 - 0x02FF)
    /// Database, table, column or lock absent when required.
    NotFound = 0x0200,
    /// Create on an existing object.
    AlreadyExists = 0x0201,
    /// Table operation issued before any database was selected.
    NoDatabaseSelected = 0x0202,
    /// Drop of a database directory that still holds tables.
    DatabaseNotEmpty = 0x0203,

    // Schema errors (0x0300 - 0x03FF)
    /// Duplicate column, bad value, oversized varchar, unknown type.
    SchemaViolation = 0x0300,
    /// Value could not be interpreted as the type a comparison needs.
    TypeMismatch = 0x0301,
    /// Column added to a table that already has data rows.
    TableNotEmpty = 0x0302,

    // Transaction errors (0x0400 - 0x04FF)
    /// Table lock already held.
    LockConflict = 0x0400,
    /// Commit attempted after a conflict.
    TransactionAborted = 0x0401,
    /// Commit attempted with no open transaction.
    NoActiveTransaction = 0x0402,
    /// A persist step of commit failed.
    CommitFailed = 0x0403,
}

impl ErrorCode {
    /// Returns the numeric code.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match (*self as u16) >> 8 {
            0x00 => "General",
            0x01 => "I/O",
            0x02 => "Catalog",
            0x03 => "Schema",
            0x04 => "Transaction",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The kind of object a catalog error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// A database directory.
    Database,
    /// A table file.
    Table,
    /// A column of a table header.
    Column,
    /// A table lock marker.
    Lock,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Database => write!(f, "database"),
            ObjectKind::Table => write!(f, "table"),
            ObjectKind::Column => write!(f, "column"),
            ObjectKind::Lock => write!(f, "lock"),
        }
    }
}

/// The main error type for Tabula.
///
/// # Example
///
/// ```rust
/// use tabula_common::error::{ErrorCode, ObjectKind, TabulaError, TabulaResult};
///
/// fn find_table(name: &str) -> TabulaResult<()> {
///     Err(TabulaError::not_found(ObjectKind::Table, name))
/// }
///
/// let err = find_table("product").unwrap_err();
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// assert_eq!(err.to_string(), "table 'product' not found");
/// ```
#[derive(Debug, Error)]
pub enum TabulaError {
    // ==========================================================================
    // General Errors
    // ==========================================================================
    /// Invalid argument provided.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Error message.
        message: String,
    },

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// I/O error from the underlying filesystem.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    // ==========================================================================
    // Catalog Errors
    // ==========================================================================
    /// Object absent when required.
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// What kind of object was looked up.
        kind: ObjectKind,
        /// Its (normalized) name.
        name: String,
    },

    /// Object already exists.
    #[error("{kind} '{name}' already exists")]
    AlreadyExists {
        /// What kind of object was created.
        kind: ObjectKind,
        /// Its (normalized) name.
        name: String,
    },

    /// No current database.
    #[error("no database selected")]
    NoDatabaseSelected,

    /// The database directory still has entries.
    #[error("database '{name}' is not empty")]
    DatabaseNotEmpty {
        /// Database name.
        name: String,
    },

    // ==========================================================================
    // Schema Errors
    // ==========================================================================
    /// A value or column definition does not fit the table schema.
    #[error("schema violation: {message}")]
    SchemaViolation {
        /// Error message.
        message: String,
    },

    /// A comparison needed a type the stored value does not have.
    #[error("type mismatch: expected {expected}, got '{actual}'")]
    TypeMismatch {
        /// Expected type.
        expected: String,
        /// Offending text.
        actual: String,
    },

    /// Header change on a table that already holds rows.
    #[error("table '{table}' already has rows")]
    TableNotEmpty {
        /// Table name.
        table: String,
    },

    // ==========================================================================
    // Transaction Errors
    // ==========================================================================
    /// The table lock is held by another transaction.
    #[error("table '{table}' is locked by another transaction")]
    LockConflict {
        /// Table name.
        table: String,
    },

    /// A conflict happened since the last begin.
    #[error("transaction aborted after a lock conflict")]
    TransactionAborted,

    /// Commit without begin.
    #[error("no active transaction")]
    NoActiveTransaction,

    /// Persisting one shadow table failed; earlier tables may be persisted.
    #[error("commit failed while persisting table '{table}': {source}")]
    CommitFailed {
        /// Table whose persist step failed.
        table: String,
        /// Underlying cause.
        #[source]
        source: Box<TabulaError>,
    },
}

impl TabulaError {
    /// Returns the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            Self::Io { .. } => ErrorCode::Io,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::AlreadyExists { .. } => ErrorCode::AlreadyExists,
            Self::NoDatabaseSelected => ErrorCode::NoDatabaseSelected,
            Self::DatabaseNotEmpty { .. } => ErrorCode::DatabaseNotEmpty,
            Self::SchemaViolation { .. } => ErrorCode::SchemaViolation,
            Self::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            Self::TableNotEmpty { .. } => ErrorCode::TableNotEmpty,
            Self::LockConflict { .. } => ErrorCode::LockConflict,
            Self::TransactionAborted => ErrorCode::TransactionAborted,
            Self::NoActiveTransaction => ErrorCode::NoActiveTransaction,
            Self::CommitFailed { .. } => ErrorCode::CommitFailed,
        }
    }

    /// Returns true if this error came from transaction coordination.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::LockConflict { .. } | Self::TransactionAborted
        )
    }

    /// Returns true if the error reports a missing object of the given kind.
    #[must_use]
    pub fn is_not_found(&self, kind: ObjectKind) -> bool {
        matches!(self, Self::NotFound { kind: k, .. } if *k == kind)
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(kind: ObjectKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Creates an already-exists error.
    #[must_use]
    pub fn already_exists(kind: ObjectKind, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            name: name.into(),
        }
    }

    /// Creates a schema violation error.
    #[must_use]
    pub fn schema_violation(message: impl Into<String>) -> Self {
        Self::SchemaViolation {
            message: message.into(),
        }
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a lock conflict error.
    #[must_use]
    pub fn lock_conflict(table: impl Into<String>) -> Self {
        Self::LockConflict {
            table: table.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            TabulaError::not_found(ObjectKind::Database, "d").code(),
            ErrorCode::NotFound
        );
        assert_eq!(
            TabulaError::schema_violation("x").code(),
            ErrorCode::SchemaViolation
        );
        assert_eq!(TabulaError::TransactionAborted.code(), ErrorCode::TransactionAborted);
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(ErrorCode::Io.category(), "I/O");
        assert_eq!(ErrorCode::AlreadyExists.category(), "Catalog");
        assert_eq!(ErrorCode::TypeMismatch.category(), "Schema");
        assert_eq!(ErrorCode::TableNotEmpty.category(), "Schema");
        assert_eq!(ErrorCode::InvalidArgument.as_u16(), 0x0001);
        assert_eq!(ErrorCode::InvalidArgument.category(), "General");
        assert_eq!(ErrorCode::LockConflict.category(), "Transaction");
    }

    #[test]
    fn test_error_display() {
        let err = TabulaError::already_exists(ObjectKind::Table, "product");
        assert_eq!(err.to_string(), "table 'product' already exists");

        let err = TabulaError::lock_conflict("product");
        assert!(err.to_string().contains("locked"));
        assert!(err.is_conflict());
    }

    #[test]
    fn test_commit_failed_keeps_source() {
        let err = TabulaError::CommitFailed {
            table: "t".into(),
            source: Box::new(TabulaError::not_found(ObjectKind::Lock, "t")),
        };
        assert_eq!(err.code(), ErrorCode::CommitFailed);
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("lock 't' not found"));
    }

    #[test]
    fn test_is_not_found() {
        let err = TabulaError::not_found(ObjectKind::Column, "price");
        assert!(err.is_not_found(ObjectKind::Column));
        assert!(!err.is_not_found(ObjectKind::Table));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        let err: TabulaError = io.into();
        assert_eq!(err.code(), ErrorCode::Io);
    }
}
