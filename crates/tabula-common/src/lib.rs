//! # tabula-common
//!
//! Common types, errors, and configuration for Tabula.
//!
//! This crate provides the foundations shared by every Tabula component:
//!
//! - **Errors**: the unified [`TabulaError`] taxonomy and its stable [`ErrorCode`]s
//! - **Config**: [`EngineConfig`] describing where databases live and how tables are locked
//! - **Constants**: directory layout and file-format constants
//!
//! ## Example
//!
//! ```rust
//! use tabula_common::{EngineConfig, TabulaError, TabulaResult};
//!
//! fn open(config: &EngineConfig) -> TabulaResult<()> {
//!     config.validate()?;
//!     Ok(())
//! }
//!
//! assert!(open(&EngineConfig::default()).is_ok());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod constants;
pub mod error;

pub use config::{EngineConfig, LockBackend};
pub use error::{ErrorCode, ObjectKind, TabulaError, TabulaResult};
