//! Structured error types for callscope
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! One enum per failure domain: registration, validation, loading, calling
//! and export.

use crate::value::ValueType;
use thiserror::Error;

/// Errors raised by the registration API. Always a programming error in the
/// caller's setup, never a runtime condition.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown decorator kind '{0}' (expected 'trace', 'input-types' or 'output-types')")]
    InvalidConfiguration(String),

    #[error("decorator kind '{0}' requires a type tuple")]
    MissingTypeTuple(String),
}

/// Errors raised synchronously by the type validator wrappers. Surfaced to
/// the caller of the instrumented callable, never swallowed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{callable}() takes {expected} arguments ({received} given)")]
    ArgumentCountMismatch { callable: String, expected: usize, received: usize },

    #[error(
        "the {} argument of {callable}() must be of type '{expected}', received '{received}'",
        ordinal(*.position)
    )]
    ArgumentTypeMismatch {
        callable: String,
        position: usize,
        expected: ValueType,
        received: ValueType,
    },

    #[error("{callable}() returns {expected} values ({received} produced)")]
    ReturnCountMismatch { callable: String, expected: usize, received: usize },

    #[error(
        "the {} return value of {callable}() must be of type '{expected}', received '{received}'",
        ordinal(*.position)
    )]
    ReturnTypeMismatch {
        callable: String,
        position: usize,
        expected: ValueType,
        received: ValueType,
    },
}

impl ValidationError {
    /// 1-based position of the offending argument or return value, when the
    /// failure names one.
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::ArgumentTypeMismatch { position, .. }
            | Self::ReturnTypeMismatch { position, .. } => Some(*position),
            _ => None,
        }
    }
}

/// Errors raised by the module loading service. A failing underlying load
/// propagates unchanged and no instrumentation is attempted.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("unknown module '{0}'")]
    UnknownModule(String),

    #[error("recursive load of module '{0}'")]
    RecursiveLoad(String),

    #[error("module '{id}' failed to load")]
    Failed {
        id: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Errors produced by invoking a callable: binding failures, validator
/// rejections and failures raised by the callable body itself.
#[derive(Error, Debug)]
pub enum CallError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{callable}() missing required argument '{name}'")]
    MissingArgument { callable: String, name: String },

    #[error("{callable}() got an unexpected argument '{name}'")]
    UnexpectedArgument { callable: String, name: String },

    #[error("'{scope}' has no attribute '{name}'")]
    Undefined { scope: String, name: String },

    #[error("argument '{name}' must be of type '{expected}'")]
    WrongType { name: String, expected: ValueType },

    #[error("{0}")]
    Raised(String),
}

/// Errors raised when exporting a profile session report.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Ordinal rendering of an integer: 1 -> "1st", 2 -> "2nd", 11 -> "11th".
fn ordinal(num: usize) -> String {
    if (10..20).contains(&(num % 100)) {
        return format!("{num}th");
    }
    let suffix = match num % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    };
    format!("{num}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(4), "4th");
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(12), "12th");
        assert_eq!(ordinal(21), "21st");
        assert_eq!(ordinal(112), "112th");
    }

    #[test]
    fn test_argument_type_mismatch_display() {
        let err = ValidationError::ArgumentTypeMismatch {
            callable: "addition".to_string(),
            position: 2,
            expected: ValueType::Int,
            received: ValueType::Float,
        };
        assert_eq!(
            err.to_string(),
            "the 2nd argument of addition() must be of type 'int', received 'float'"
        );
        assert_eq!(err.position(), Some(2));
    }

    #[test]
    fn test_argument_count_mismatch_display() {
        let err = ValidationError::ArgumentCountMismatch {
            callable: "addition".to_string(),
            expected: 2,
            received: 1,
        };
        assert_eq!(err.to_string(), "addition() takes 2 arguments (1 given)");
        assert_eq!(err.position(), None);
    }

    #[test]
    fn test_load_error_display() {
        let err = LoadError::UnknownModule("demo.math".to_string());
        assert_eq!(err.to_string(), "unknown module 'demo.math'");
    }

    #[test]
    fn test_call_error_display() {
        let err = CallError::MissingArgument {
            callable: "area".to_string(),
            name: "side".to_string(),
        };
        assert_eq!(err.to_string(), "area() missing required argument 'side'");
    }
}
