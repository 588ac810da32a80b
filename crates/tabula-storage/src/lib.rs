//! # tabula-storage
//!
//! Flat-file storage layer for Tabula.
//!
//! A database is a directory, a table is a text file inside it. The first
//! line of a table file is its header, one `"<label> <type>\t"` segment per
//! column; every following line is a row whose fields are tab separated.
//!
//! ```text
//! databases/
//! └── shop/
//!     ├── product.txt          # id int\tname varchar(20)\t
//!     │                        # 1\tGizmo
//!     ├── product_cache.txt    # shadow copy while a transaction writes
//!     └── product_lock         # lock marker, empty
//! ```
//!
//! This crate provides:
//!
//! - [`schema`]: the schema codec ([`ColumnType`], [`Column`], [`Schema`])
//! - [`row`]: the decoded [`Row`]
//! - [`table`]: table paths ([`TableRef`]) and file access ([`TableFile`], [`TableScan`])
//! - [`catalog`]: database and table lifecycle ([`Catalog`])

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod row;
pub mod schema;
pub mod table;

pub use catalog::Catalog;
pub use row::{decode_row, Row};
pub use schema::{Column, ColumnType, Schema};
pub use table::{RowIter, TableFile, TableRef, TableScan};
