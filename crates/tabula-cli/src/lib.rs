//! # tabula-cli
//!
//! The Tabula shell: a statement parser, a dispatcher that runs statements
//! against a [`Session`](tabula_engine::Session), output formatting, and
//! the script and interactive front ends used by the `tabula` binary.
//!
//! ```text
//! input ──► script::split_script ──► parser::Parser ──► dispatch::execute
//!                     │                                        │
//!                     ▼                                        ▼
//!             commands::Command                     formatter::format_result
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod commands;
pub mod config;
pub mod dispatch;
pub mod formatter;
pub mod parser;
pub mod repl;
pub mod script;

pub use config::CliConfig;
pub use dispatch::{execute_sql, StatementResult};
pub use formatter::OutputFormat;
pub use script::{run_script, Flow};
