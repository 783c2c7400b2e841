//! Dynamic runtime values
//!
//! Instrumented callables exchange [`Value`]s rather than native Rust types:
//! a single tagged representation covering scalars, ordered sequences, sets,
//! tuples, multi-dimensional numeric arrays and class instances. The exact
//! runtime type of a value ([`ValueType`]) is what the input/output
//! validators compare against — no subtype coercion anywhere.

pub mod format;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// A dynamically typed runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The absent value.
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Ordered sequence, rendered with `[..]`.
    List(Vec<Value>),
    /// Fixed shape sequence, rendered with `(..)`. Also the uniform carrier
    /// for multiple return values.
    Tuple(Vec<Value>),
    /// Set rendered with `{..}`; insertion order is preserved.
    Set(Vec<Value>),
    /// Multi-dimensional numeric array.
    Array(ArrayValue),
    /// Shared reference to a class instance.
    Instance(Instance),
}

impl Value {
    /// Convenience constructor for string values.
    #[must_use]
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    /// Convenience constructor for list values.
    #[must_use]
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    /// Convenience constructor for tuple values.
    #[must_use]
    pub fn tuple(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Tuple(items.into_iter().collect())
    }

    /// Convenience constructor for set values.
    #[must_use]
    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Set(items.into_iter().collect())
    }

    /// The exact runtime type tag of this value.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::None => ValueType::None,
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Str(_) => ValueType::Str,
            Value::List(_) => ValueType::List,
            Value::Tuple(_) => ValueType::Tuple,
            Value::Set(_) => ValueType::Set,
            Value::Array(_) => ValueType::Array,
            Value::Instance(_) => ValueType::Instance,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric view of the value: integers widen to `f64`, floats pass
    /// through, everything else is `None`.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Instance(i) => Some(i),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

/// Exact runtime type of a [`Value`], as checked by the validators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    None,
    Bool,
    Int,
    Float,
    Str,
    List,
    Tuple,
    Set,
    Array,
    Instance,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::None => "none",
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Str => "str",
            ValueType::List => "list",
            ValueType::Tuple => "tuple",
            ValueType::Set => "set",
            ValueType::Array => "array",
            ValueType::Instance => "instance",
        };
        write!(f, "{name}")
    }
}

/// Multi-dimensional numeric array: a shape plus row-major data.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl ArrayValue {
    /// Build an array from a shape and row-major data. The data length must
    /// equal the product of the shape's dimensions.
    #[must_use]
    pub fn new(shape: Vec<usize>, data: Vec<f64>) -> Self {
        debug_assert_eq!(shape.iter().product::<usize>(), data.len());
        Self { shape, data }
    }

    /// A one-dimensional array.
    #[must_use]
    pub fn vector(data: Vec<f64>) -> Self {
        Self { shape: vec![data.len()], data }
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[must_use]
    pub fn data(&self) -> &[f64] {
        &self.data
    }
}

/// A shared class instance: the receiver of bound method calls.
///
/// Cloning shares the underlying storage, so a constructor mutating `self`
/// is visible through every handle. Equality is identity, not structure.
#[derive(Clone)]
pub struct Instance {
    inner: Arc<InstanceInner>,
}

struct InstanceInner {
    class_name: String,
    fields: Mutex<HashMap<String, Value>>,
}

impl Instance {
    /// Create a fresh instance of the named class with no fields set.
    #[must_use]
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(InstanceInner {
                class_name: class_name.into(),
                fields: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Name of the class this instance belongs to.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.inner.class_name
    }

    /// Read a field, if set.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<Value> {
        self.inner.fields.lock().ok()?.get(field).cloned()
    }

    /// Write a field, replacing any prior value.
    pub fn set(&self, field: impl Into<String>, value: Value) {
        if let Ok(mut fields) = self.inner.fields.lock() {
            fields.insert(field.into(), value);
        }
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} instance>", self.inner.class_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_tags() {
        assert_eq!(Value::Int(1).value_type(), ValueType::Int);
        assert_eq!(Value::Float(1.0).value_type(), ValueType::Float);
        assert_eq!(Value::str("x").value_type(), ValueType::Str);
        assert_eq!(Value::list([Value::Int(1)]).value_type(), ValueType::List);
        assert_eq!(Value::None.value_type(), ValueType::None);
    }

    #[test]
    fn test_int_and_float_are_distinct_types() {
        assert_ne!(Value::Int(3).value_type(), Value::Float(3.0).value_type());
    }

    #[test]
    fn test_as_number_widens_ints() {
        assert_eq!(Value::Int(3).as_number(), Some(3.0));
        assert_eq!(Value::Float(2.5).as_number(), Some(2.5));
        assert_eq!(Value::str("3").as_number(), None);
    }

    #[test]
    fn test_instance_fields_are_shared() {
        let a = Instance::new("Square");
        let b = a.clone();
        a.set("name", Value::str("my_square"));
        assert_eq!(b.get("name"), Some(Value::str("my_square")));
        assert_eq!(b.class_name(), "Square");
    }

    #[test]
    fn test_instance_equality_is_identity() {
        let a = Instance::new("Square");
        let b = Instance::new("Square");
        assert_ne!(Value::Instance(a.clone()), Value::Instance(b));
        assert_eq!(Value::Instance(a.clone()), Value::Instance(a));
    }

    #[test]
    fn test_array_shape() {
        let a = ArrayValue::new(vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(a.shape(), &[2, 3]);
        assert_eq!(ArrayValue::vector(vec![1.0, 2.0]).shape(), &[2]);
    }
}
