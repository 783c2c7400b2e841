//! Module model and dynamic calling convention
//!
//! A loaded unit of code is an explicit tagged structure: a [`Module`] maps
//! attribute names to [`ModuleItem`]s, each either a free [`Callable`] or a
//! [`ClassDef`] with a method table. The structure is produced once when
//! the module is built, so the decorator applicator pattern-matches over it
//! instead of scattering runtime type inspection.
//!
//! Calls flow through a uniform convention: a [`CallArgs`] of positional
//! and keyword values is bound against the callable's declared
//! [`Signature`] (positional first, then keyword, then declared default),
//! producing the [`BoundArgs`] the body reads from. Binding failures are
//! [`CallError`]s that propagate to the caller unchanged.

use crate::domain::errors::CallError;
use crate::domain::types::SourceSpan;
use crate::value::{Instance, Value, ValueType};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Result of invoking a callable.
pub type CallResult = Result<Value, CallError>;

/// Name of the method invoked by [`ClassDef::instantiate`]. A regular
/// method, so `Class.init` registration and wildcard wrapping cover it.
pub const CONSTRUCTOR: &str = "init";

// =============================================================================
// CALL ARGUMENTS
// =============================================================================

/// Arguments for one invocation: positional values plus keyword overrides.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    positional: Vec<Value>,
    keyword: Vec<(String, Value)>,
}

impl CallArgs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from positional values only.
    #[must_use]
    pub fn positional(values: impl IntoIterator<Item = Value>) -> Self {
        Self { positional: values.into_iter().collect(), keyword: Vec::new() }
    }

    /// Append a positional argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Append a keyword argument.
    #[must_use]
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn positional_values(&self) -> &[Value] {
        &self.positional
    }

    #[must_use]
    pub fn keyword_values(&self) -> &[(String, Value)] {
        &self.keyword
    }

    /// Look up a keyword argument by name.
    #[must_use]
    pub fn keyword(&self, name: &str) -> Option<&Value> {
        self.keyword.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Total argument count, positional plus keyword.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positional.len() + self.keyword.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    /// Copy with a value prepended to the positional list (method receiver).
    #[must_use]
    pub(crate) fn prepend(&self, value: Value) -> Self {
        let mut positional = Vec::with_capacity(self.positional.len() + 1);
        positional.push(value);
        positional.extend(self.positional.iter().cloned());
        Self { positional, keyword: self.keyword.clone() }
    }

    /// Copy with the first positional value dropped (`cls` convention).
    #[must_use]
    pub(crate) fn drop_first(&self) -> Self {
        Self {
            positional: self.positional.iter().skip(1).cloned().collect(),
            keyword: self.keyword.clone(),
        }
    }
}

// =============================================================================
// SIGNATURE
// =============================================================================

/// One declared parameter: a name and an optional default value.
#[derive(Debug, Clone)]
pub struct Param {
    name: String,
    default: Option<Value>,
}

impl Param {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// A parameter without a default is mandatory.
    #[must_use]
    pub fn is_mandatory(&self) -> bool {
        self.default.is_none()
    }
}

/// Declared parameter list of a callable, in order.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    /// Declare parameters by name, all mandatory.
    #[must_use]
    pub fn new(names: &[&str]) -> Self {
        Self {
            params: names
                .iter()
                .map(|n| Param { name: (*n).to_string(), default: None })
                .collect(),
        }
    }

    /// Attach a default value to an already-declared parameter, making it
    /// optional. Naming an undeclared parameter is a programming error.
    #[must_use]
    pub fn with_default(mut self, name: &str, value: impl Into<Value>) -> Self {
        let param = self.params.iter_mut().find(|p| p.name == name);
        debug_assert!(param.is_some(), "no parameter named '{name}'");
        if let Some(param) = param {
            param.default = Some(value.into());
        }
        self
    }

    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Resolve the effective value of the parameter at `index` for a call:
    /// positional first, then keyword, then the declared default.
    #[must_use]
    pub fn resolve(&self, index: usize, args: &CallArgs) -> Option<Value> {
        let param = self.params.get(index)?;
        args.positional_values()
            .get(index)
            .cloned()
            .or_else(|| args.keyword(&param.name).cloned())
            .or_else(|| param.default.clone())
    }

    /// Bind a call against the declared parameters. Every parameter must
    /// resolve, excess positional values and unknown keywords are rejected.
    pub fn bind(&self, callable: &str, args: &CallArgs) -> Result<BoundArgs, CallError> {
        if args.positional_values().len() > self.params.len() {
            return Err(CallError::UnexpectedArgument {
                callable: callable.to_string(),
                name: format!("positional argument {}", self.params.len() + 1),
            });
        }
        for (name, _) in args.keyword_values() {
            if !self.params.iter().any(|p| &p.name == name) {
                return Err(CallError::UnexpectedArgument {
                    callable: callable.to_string(),
                    name: name.clone(),
                });
            }
        }
        let mut values = Vec::with_capacity(self.params.len());
        for (index, param) in self.params.iter().enumerate() {
            match self.resolve(index, args) {
                Some(value) => values.push((param.name.clone(), value)),
                None => {
                    return Err(CallError::MissingArgument {
                        callable: callable.to_string(),
                        name: param.name.clone(),
                    })
                }
            }
        }
        let owner = values
            .first()
            .filter(|(name, _)| name == "self")
            .and_then(|(_, value)| value.as_instance().cloned());
        Ok(BoundArgs { callable: callable.to_string(), values, owner })
    }
}

/// Arguments after binding: every declared parameter resolved to a value,
/// in declaration order.
#[derive(Debug, Clone)]
pub struct BoundArgs {
    callable: String,
    values: Vec<(String, Value)>,
    owner: Option<Instance>,
}

impl BoundArgs {
    /// Look up a bound parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Bound parameter by name; absence means the body asked for a
    /// parameter the signature never declared.
    pub fn value(&self, name: &str) -> Result<&Value, CallError> {
        self.get(name).ok_or_else(|| CallError::MissingArgument {
            callable: self.callable.clone(),
            name: name.to_string(),
        })
    }

    /// Integer view of a bound parameter.
    pub fn int(&self, name: &str) -> Result<i64, CallError> {
        self.value(name)?.as_int().ok_or(CallError::WrongType {
            name: name.to_string(),
            expected: ValueType::Int,
        })
    }

    /// Numeric view of a bound parameter (int or float).
    pub fn number(&self, name: &str) -> Result<f64, CallError> {
        self.value(name)?.as_number().ok_or(CallError::WrongType {
            name: name.to_string(),
            expected: ValueType::Float,
        })
    }

    /// String view of a bound parameter.
    pub fn str(&self, name: &str) -> Result<&str, CallError> {
        self.value(name)?.as_str().ok_or(CallError::WrongType {
            name: name.to_string(),
            expected: ValueType::Str,
        })
    }

    /// The receiver instance, when the first parameter is `self`.
    #[must_use]
    pub fn owner(&self) -> Option<&Instance> {
        self.owner.as_ref()
    }

    /// The receiver instance, required.
    pub fn instance(&self) -> Result<&Instance, CallError> {
        self.owner.as_ref().ok_or(CallError::WrongType {
            name: "self".to_string(),
            expected: ValueType::Instance,
        })
    }
}

// =============================================================================
// CALLABLE
// =============================================================================

type CallBody = Arc<dyn Fn(&CallArgs) -> CallResult + Send + Sync>;

/// A named entry point: declared signature, optional source span, shared
/// call body. Cheap to clone, which is what lets `Callable -> Callable`
/// transformers wrap it.
#[derive(Clone)]
pub struct Callable {
    name: String,
    signature: Signature,
    span: Option<SourceSpan>,
    body: CallBody,
}

impl Callable {
    /// Define a callable whose body receives bound arguments. Binding runs
    /// on every call, so binding failures surface as the callable's own
    /// errors.
    pub fn new(
        name: impl Into<String>,
        signature: Signature,
        body: impl Fn(&BoundArgs) -> CallResult + Send + Sync + 'static,
    ) -> Self {
        let name = name.into();
        let bind_name = name.clone();
        let bind_signature = signature.clone();
        Self {
            name,
            signature,
            span: None,
            body: Arc::new(move |args| {
                let bound = bind_signature.bind(&bind_name, args)?;
                body(&bound)
            }),
        }
    }

    /// Define a callable from a raw body operating on unbound arguments.
    /// Used by wrappers that must observe the call before delegating.
    pub(crate) fn from_raw(
        name: impl Into<String>,
        signature: Signature,
        span: Option<SourceSpan>,
        body: impl Fn(&CallArgs) -> CallResult + Send + Sync + 'static,
    ) -> Self {
        Self { name: name.into(), signature, span, body: Arc::new(body) }
    }

    /// Attach the source span captured where the callable is defined.
    #[must_use]
    pub fn with_span(mut self, span: SourceSpan) -> Self {
        self.span = Some(span);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    #[must_use]
    pub fn span(&self) -> Option<&SourceSpan> {
        self.span.as_ref()
    }

    /// Invoke the callable.
    pub fn call(&self, args: &CallArgs) -> CallResult {
        (self.body)(args)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<&str> = self.signature.params().iter().map(Param::name).collect();
        write!(f, "{}({})", self.name, params.join(", "))
    }
}

// =============================================================================
// CLASSES AND MODULES
// =============================================================================

/// A class: a name plus a method table. Methods take the receiver as their
/// first parameter, conventionally named `self`.
#[derive(Debug)]
pub struct ClassDef {
    name: String,
    methods: BTreeMap<String, Callable>,
}

impl ClassDef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), methods: BTreeMap::new() }
    }

    /// Add a method, keyed by its callable name.
    #[must_use]
    pub fn with_method(mut self, method: Callable) -> Self {
        self.methods.insert(method.name().to_string(), method);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn method(&self, name: &str) -> Option<&Callable> {
        self.methods.get(name)
    }

    pub fn methods(&self) -> impl Iterator<Item = (&str, &Callable)> {
        self.methods.iter().map(|(n, c)| (n.as_str(), c))
    }

    pub(crate) fn methods_mut(&mut self) -> &mut BTreeMap<String, Callable> {
        &mut self.methods
    }

    /// Create an instance, running the `init` method (if any) with the
    /// fresh instance as `self`.
    pub fn instantiate(&self, args: &CallArgs) -> Result<Instance, CallError> {
        let instance = Instance::new(&self.name);
        if let Some(init) = self.method(CONSTRUCTOR) {
            init.call(&args.prepend(Value::Instance(instance.clone())))?;
        }
        Ok(instance)
    }

    /// Invoke a method on an instance, prepending the receiver.
    pub fn call_method(&self, name: &str, instance: &Instance, args: &CallArgs) -> CallResult {
        let method = self.method(name).ok_or_else(|| CallError::Undefined {
            scope: self.name.clone(),
            name: name.to_string(),
        })?;
        method.call(&args.prepend(Value::Instance(instance.clone())))
    }
}

/// A top-level item of a module.
#[derive(Debug)]
pub enum ModuleItem {
    Function(Callable),
    Class(ClassDef),
}

/// A loaded unit of code: an identifier plus named top-level items.
#[derive(Debug)]
pub struct Module {
    id: String,
    items: BTreeMap<String, ModuleItem>,
}

impl Module {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), items: BTreeMap::new() }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Expose a free function, keyed by its callable name.
    pub fn add_function(&mut self, function: Callable) {
        self.items.insert(function.name().to_string(), ModuleItem::Function(function));
    }

    /// Expose a class, keyed by its name.
    pub fn add_class(&mut self, class: ClassDef) {
        self.items.insert(class.name().to_string(), ModuleItem::Class(class));
    }

    #[must_use]
    pub fn function(&self, name: &str) -> Option<&Callable> {
        match self.items.get(name) {
            Some(ModuleItem::Function(c)) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub fn class(&self, name: &str) -> Option<&ClassDef> {
        match self.items.get(name) {
            Some(ModuleItem::Class(c)) => Some(c),
            _ => None,
        }
    }

    pub fn items(&self) -> impl Iterator<Item = (&str, &ModuleItem)> {
        self.items.iter().map(|(n, i)| (n.as_str(), i))
    }

    pub(crate) fn items_mut(&mut self) -> &mut BTreeMap<String, ModuleItem> {
        &mut self.items
    }

    /// Invoke a free function by name.
    pub fn call(&self, name: &str, args: &CallArgs) -> CallResult {
        let function = self.function(name).ok_or_else(|| CallError::Undefined {
            scope: self.id.clone(),
            name: name.to_string(),
        })?;
        function.call(args)
    }
}
