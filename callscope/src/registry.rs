//! Decoration registry
//!
//! The registry records which callables in which modules must be
//! instrumented and how: module id -> callable identifier ->
//! [`InstrumentationSpec`]. Identifiers are a bare name for a free
//! function, `Class.method` for a bound method, a bare class name for
//! every method of that class, or the wildcard [`WILDCARD`] for every
//! top-level callable and class.
//!
//! The registry is an explicit configuration object owned by the loading
//! service, mutated only by registration calls and read by the applicator
//! when a registered module loads. Entries are never deleted during the
//! process lifetime.

use crate::domain::errors::ConfigError;
use crate::value::{Value, ValueType};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Registry key meaning "every top-level callable/class in this module".
pub const WILDCARD: &str = "ALL";

/// The three recognized instrumentation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecoratorKind {
    Trace,
    InputTypes,
    OutputTypes,
}

impl DecoratorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DecoratorKind::Trace => "trace",
            DecoratorKind::InputTypes => "input-types",
            DecoratorKind::OutputTypes => "output-types",
        }
    }
}

impl fmt::Display for DecoratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DecoratorKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trace" => Ok(DecoratorKind::Trace),
            "input-types" => Ok(DecoratorKind::InputTypes),
            "output-types" => Ok(DecoratorKind::OutputTypes),
            other => Err(ConfigError::InvalidConfiguration(other.to_string())),
        }
    }
}

/// One slot of a validator type tuple: an exact expected type, or the
/// owner-parameter sentinel ("the instance/owner parameter, skip checking").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSpec {
    /// The receiver slot of a bound method; exempt from type checking.
    Owner,
    /// An exact runtime type. No subtype coercion.
    Exact(ValueType),
}

impl TypeSpec {
    /// Whether a value satisfies this slot.
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            TypeSpec::Owner => true,
            TypeSpec::Exact(expected) => value.value_type() == *expected,
        }
    }
}

impl From<ValueType> for TypeSpec {
    fn from(value_type: ValueType) -> Self {
        TypeSpec::Exact(value_type)
    }
}

/// Instrumentation requested for one callable identifier: up to three
/// independent entries, one per kind. Re-registration overwrites the prior
/// entry for that kind only.
#[derive(Debug, Clone, Default)]
pub struct InstrumentationSpec {
    trace: bool,
    input_types: Option<Vec<TypeSpec>>,
    output_types: Option<Vec<TypeSpec>>,
}

impl InstrumentationSpec {
    #[must_use]
    pub fn trace_enabled(&self) -> bool {
        self.trace
    }

    #[must_use]
    pub fn input_types(&self) -> Option<&[TypeSpec]> {
        self.input_types.as_deref()
    }

    #[must_use]
    pub fn output_types(&self) -> Option<&[TypeSpec]> {
        self.output_types.as_deref()
    }

    fn set(&mut self, kind: DecoratorKind, types: Option<Vec<TypeSpec>>) {
        match kind {
            DecoratorKind::Trace => self.trace = true,
            DecoratorKind::InputTypes => self.input_types = types,
            DecoratorKind::OutputTypes => self.output_types = types,
        }
    }
}

/// Process-wide mapping from module id to per-identifier specs.
#[derive(Debug, Default)]
pub struct Registry {
    modules: HashMap<String, HashMap<String, InstrumentationSpec>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or overwrite the spec entry of `kind` for each name in `names`
    /// (default: the wildcard). `kind` is parsed; an unrecognized kind is
    /// [`ConfigError::InvalidConfiguration`], a type kind without a type
    /// tuple is [`ConfigError::MissingTypeTuple`].
    pub fn register(
        &mut self,
        module_id: &str,
        names: Option<&[&str]>,
        kind: &str,
        types: Option<Vec<TypeSpec>>,
    ) -> Result<(), ConfigError> {
        let kind: DecoratorKind = kind.parse()?;
        if kind != DecoratorKind::Trace && types.is_none() {
            return Err(ConfigError::MissingTypeTuple(kind.to_string()));
        }
        let names = names.unwrap_or(&[WILDCARD]);
        for name in names {
            self.entry(module_id, name).set(kind, types.clone());
        }
        Ok(())
    }

    /// Request signature tracing for the given names (wildcard if `None`).
    pub fn trace(&mut self, module_id: &str, names: Option<&[&str]>) {
        let names = names.unwrap_or(&[WILDCARD]);
        for name in names {
            self.entry(module_id, name).set(DecoratorKind::Trace, None);
        }
    }

    /// Declare the expected input types of one callable.
    pub fn set_input_types(&mut self, module_id: &str, name: &str, types: Vec<TypeSpec>) {
        self.entry(module_id, name).set(DecoratorKind::InputTypes, Some(types));
    }

    /// Declare the expected output types of one callable.
    pub fn set_output_types(&mut self, module_id: &str, name: &str, types: Vec<TypeSpec>) {
        self.entry(module_id, name).set(DecoratorKind::OutputTypes, Some(types));
    }

    /// The per-identifier specs of a module, if any were registered.
    #[must_use]
    pub fn module_specs(&self, module_id: &str) -> Option<&HashMap<String, InstrumentationSpec>> {
        self.modules.get(module_id)
    }

    /// Whether anything was registered for this module id.
    #[must_use]
    pub fn is_registered(&self, module_id: &str) -> bool {
        self.modules.contains_key(module_id)
    }

    fn entry(&mut self, module_id: &str, name: &str) -> &mut InstrumentationSpec {
        self.modules
            .entry(module_id.to_string())
            .or_default()
            .entry(name.to_string())
            .or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("trace".parse::<DecoratorKind>().unwrap(), DecoratorKind::Trace);
        assert_eq!("input-types".parse::<DecoratorKind>().unwrap(), DecoratorKind::InputTypes);
        assert_eq!("output-types".parse::<DecoratorKind>().unwrap(), DecoratorKind::OutputTypes);
        assert!(matches!(
            "signature".parse::<DecoratorKind>(),
            Err(ConfigError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_register_defaults_to_wildcard() {
        let mut registry = Registry::new();
        registry.register("demo.math", None, "trace", None).unwrap();
        let specs = registry.module_specs("demo.math").unwrap();
        assert!(specs[WILDCARD].trace_enabled());
    }

    #[test]
    fn test_type_kind_requires_tuple() {
        let mut registry = Registry::new();
        let err = registry.register("demo.math", Some(&["addition"]), "input-types", None);
        assert!(matches!(err, Err(ConfigError::MissingTypeTuple(_))));
    }

    #[test]
    fn test_kinds_are_independent() {
        let mut registry = Registry::new();
        registry.trace("demo.math", Some(&["addition"]));
        registry.set_input_types(
            "demo.math",
            "addition",
            vec![ValueType::Int.into(), ValueType::Int.into()],
        );
        let spec = &registry.module_specs("demo.math").unwrap()["addition"];
        assert!(spec.trace_enabled());
        assert_eq!(spec.input_types().unwrap().len(), 2);
        assert!(spec.output_types().is_none());
    }

    #[test]
    fn test_reregistration_overwrites_single_kind() {
        let mut registry = Registry::new();
        registry.set_input_types("demo.math", "addition", vec![ValueType::Int.into()]);
        registry.set_output_types("demo.math", "addition", vec![ValueType::Int.into()]);
        registry.set_input_types(
            "demo.math",
            "addition",
            vec![ValueType::Float.into(), ValueType::Float.into()],
        );
        let spec = &registry.module_specs("demo.math").unwrap()["addition"];
        assert_eq!(spec.input_types().unwrap().len(), 2);
        assert_eq!(spec.output_types().unwrap().len(), 1);
    }

    #[test]
    fn test_owner_sentinel_matches_anything() {
        assert!(TypeSpec::Owner.matches(&Value::Int(1)));
        assert!(TypeSpec::Exact(ValueType::Int).matches(&Value::Int(1)));
        assert!(!TypeSpec::Exact(ValueType::Int).matches(&Value::Float(1.0)));
    }
}
