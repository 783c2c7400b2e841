//! Domain model for callscope
//!
//! This module contains core domain types and errors that provide:
//! - Compile-time safety via small dedicated types
//! - Self-documenting function signatures
//! - Structured error handling

pub mod errors;
pub mod types;

pub use errors::{CallError, ConfigError, ExportError, LoadError, ValidationError};
pub use types::SourceSpan;
