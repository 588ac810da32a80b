//! Configuration for Tabula.
//!
//! This module provides the engine configuration shared by the library
//! crates and the command-line shell.

mod engine;

pub use engine::{EngineConfig, LockBackend};
