//! Layout and file-format constants.
//!
//! Every database is a directory under the root, every table a text file
//! inside it. The names below are part of the on-disk contract shared with
//! other processes that coordinate over the same root.

/// Default root directory holding all databases.
pub const DEFAULT_ROOT_DIR: &str = "databases";

/// Extension of table files (`<table>.txt`).
pub const TABLE_EXTENSION: &str = "txt";

/// Suffix appended to a table name for its transactional shadow copy
/// (`<table>_cache.txt`).
pub const SHADOW_SUFFIX: &str = "_cache";

/// Suffix appended to a table name for its lock marker (`<table>_lock`).
pub const LOCK_SUFFIX: &str = "_lock";

/// Separator between fields of a row and between header segments.
pub const FIELD_SEPARATOR: char = '\t';

/// Separator between a column label and its type inside a header segment.
pub const LABEL_TYPE_SEPARATOR: char = ' ';

/// Separator between lines of a table file.
pub const LINE_SEPARATOR: char = '\n';
