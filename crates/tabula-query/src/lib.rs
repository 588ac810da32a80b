//! # tabula-query
//!
//! Row operators over Tabula table files.
//!
//! - [`scan`]: full scans and the key-filtered projection scan
//! - [`join`]: two-table nested-loop join, inner and left outer
//! - [`mutation`]: append, delete-by-predicate and update-by-predicate
//!
//! Operators work on a [`TableFile`](tabula_storage::TableFile), which is
//! either a live table or a transaction's shadow copy; choosing between the
//! two is the caller's business.
//!
//! Deletes and updates rewrite the whole file: the header is kept, the
//! surviving rows are re-encoded and written back in their original order.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod join;
pub mod mutation;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_util;

pub use join::{nested_loop_join, JoinMode, JoinSpec};
pub use mutation::{append_row, delete_where, update_where, Comparator};
pub use scan::{scan_all, scan_filtered};
