//! Input and output type validators
//!
//! Two independent `Callable -> Callable` transformers, each parameterized
//! by an ordered type tuple ([`TypeSpec`]s, where [`TypeSpec::Owner`] marks
//! the receiver slot and is skipped). Checks are exact — an `int` is never
//! accepted where a `float` is declared. Both validators are pure
//! pass-through on the happy path.

use crate::domain::errors::ValidationError;
use crate::module::{CallResult, Callable};
use crate::registry::TypeSpec;
use crate::value::Value;
use std::slice;

/// Wrap a callable with input validation.
///
/// On each call the total argument count (positional plus keyword) must
/// equal the type tuple's length — checked before the wrapped callable
/// runs. Positional arguments are then checked for exact type; failures
/// name the 1-based offending position.
#[must_use]
pub fn wrap_input(callable: Callable, types: Vec<TypeSpec>) -> Callable {
    let name = callable.name().to_string();
    let signature = callable.signature().clone();
    let span = callable.span().cloned();
    let inner = callable;
    Callable::from_raw(name.clone(), signature, span, move |args| {
        let received = args.len();
        if received != types.len() {
            return Err(ValidationError::ArgumentCountMismatch {
                callable: name.clone(),
                expected: types.len(),
                received,
            }
            .into());
        }
        for (position, (value, expected)) in
            args.positional_values().iter().zip(&types).enumerate()
        {
            if !expected.matches(value) {
                let TypeSpec::Exact(expected) = expected else { continue };
                return Err(ValidationError::ArgumentTypeMismatch {
                    callable: name.clone(),
                    position: position + 1,
                    expected: *expected,
                    received: value.value_type(),
                }
                .into());
            }
        }
        inner.call(args)
    })
}

/// Wrap a callable with output validation.
///
/// The wrapped callable runs first; a non-tuple result is normalized to a
/// one-element tuple for uniform checking (`None` against an empty type
/// tuple passes as-is). Count then exact-type checks apply, and the
/// original, non-normalized shape is returned on success.
#[must_use]
pub fn wrap_output(callable: Callable, types: Vec<TypeSpec>) -> Callable {
    let name = callable.name().to_string();
    let signature = callable.signature().clone();
    let span = callable.span().cloned();
    let inner = callable;
    Callable::from_raw(name.clone(), signature, span, move |args| {
        let result = inner.call(args)?;
        if matches!(result, Value::None) && types.is_empty() {
            return Ok(result);
        }
        let returned: &[Value] = match &result {
            Value::Tuple(items) => items,
            other => slice::from_ref(other),
        };
        if returned.len() != types.len() {
            return Err(ValidationError::ReturnCountMismatch {
                callable: name.clone(),
                expected: types.len(),
                received: returned.len(),
            }
            .into());
        }
        for (position, (value, expected)) in returned.iter().zip(&types).enumerate() {
            if !expected.matches(value) {
                let TypeSpec::Exact(expected) = expected else { continue };
                return Err(ValidationError::ReturnTypeMismatch {
                    callable: name.clone(),
                    position: position + 1,
                    expected: *expected,
                    received: value.value_type(),
                }
                .into());
            }
        }
        Ok(result)
    })
}
