//! The instrumentation engine
//!
//! [`Engine`] owns the decoration registry, the module catalog, the cache
//! of loaded modules and the call-time profiling state. Its
//! [`ModuleLoader::load`] implementation is the load interceptor: a module
//! id with registered specs is built by its source, handed to the
//! decorator applicator, and only then exposed (cached) — everything else
//! loads untouched.
//!
//! Per module-load request:
//!
//! ```text
//! Requested ──▶ cached? ──────────────▶ returned as-is (wrapped at most once)
//!      │
//!      ├──▶ no source ───────────────▶ LoadError::UnknownModule
//!      ├──▶ already in flight ───────▶ LoadError::RecursiveLoad
//!      ├──▶ source fails ────────────▶ LoadError::Failed (not instrumented)
//!      └──▶ built ──▶ applicator ────▶ cached + exposed
//! ```
//!
//! Registration must complete before the target module's first load; the
//! cache makes later loads idempotent, so re-registration afterwards is
//! observed only as a warning, never as a rewrap.
//!
//! The engine is an explicit, injectable object: build one per process and
//! pass it where loading happens. Nothing here is a global.

use crate::apply::{self, WrapContext};
use crate::domain::errors::{ConfigError, LoadError};
use crate::loader::{ModuleCatalog, ModuleLoader};
use crate::module::Module;
use crate::profiling::{MarkerProfiler, ProfileSession, SamplingProfiler};
use crate::registry::{Registry, TypeSpec};
use crate::trace::SessionSink;
use log::{info, warn};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The call-instrumentation engine: registry, loading service and
/// profiling state in one injectable object.
pub struct Engine {
    registry: Registry,
    catalog: ModuleCatalog,
    cache: HashMap<String, Arc<Module>>,
    in_flight: HashSet<String>,
    profiling: Arc<AtomicBool>,
    profiler: Arc<dyn SamplingProfiler>,
    last_session: SessionSink,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// An engine using the bundled marker-based profiler, with profiling
    /// enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::with_profiler(Arc::new(MarkerProfiler))
    }

    /// An engine using the given sampling profiler collaborator.
    #[must_use]
    pub fn with_profiler(profiler: Arc<dyn SamplingProfiler>) -> Self {
        Self {
            registry: Registry::new(),
            catalog: ModuleCatalog::new(),
            cache: HashMap::new(),
            in_flight: HashSet::new(),
            profiling: Arc::new(AtomicBool::new(true)),
            profiler,
            last_session: Arc::default(),
        }
    }

    /// Register a module source constructor with the loading machinery.
    pub fn provide<F>(&mut self, id: impl Into<String>, source: F)
    where
        F: Fn(&mut dyn ModuleLoader) -> anyhow::Result<Module> + Send + Sync + 'static,
    {
        self.catalog.provide(id, source);
    }

    /// Add or overwrite the instrumentation entry of `kind` for each name
    /// in `names` (wildcard if `None`). Must run before the module's first
    /// load; afterwards the entry is recorded but never applied.
    pub fn register(
        &mut self,
        module_id: &str,
        names: Option<&[&str]>,
        kind: &str,
        types: Option<Vec<TypeSpec>>,
    ) -> Result<(), ConfigError> {
        self.warn_if_loaded(module_id);
        self.registry.register(module_id, names, kind, types)
    }

    /// Request signature tracing for the given names (wildcard if `None`).
    pub fn trace(&mut self, module_id: &str, names: Option<&[&str]>) {
        self.warn_if_loaded(module_id);
        self.registry.trace(module_id, names);
    }

    /// Declare expected input types for one callable. A
    /// [`TypeSpec::Owner`] slot marks the receiver parameter.
    pub fn set_input_types(&mut self, module_id: &str, name: &str, types: Vec<TypeSpec>) {
        self.warn_if_loaded(module_id);
        self.registry.set_input_types(module_id, name, types);
    }

    /// Declare expected output types for one callable.
    pub fn set_output_types(&mut self, module_id: &str, name: &str, types: Vec<TypeSpec>) {
        self.warn_if_loaded(module_id);
        self.registry.set_output_types(module_id, name, types);
    }

    /// Flip the process-wide profiling toggle. Read by trace wrappers at
    /// call time, so it takes effect between calls of already-wrapped
    /// callables.
    pub fn set_profiling(&self, enabled: bool) {
        self.profiling.store(enabled, Ordering::Relaxed);
    }

    #[must_use]
    pub fn profiling_enabled(&self) -> bool {
        self.profiling.load(Ordering::Relaxed)
    }

    /// The registered specs, read-only.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Whether a module id has already been loaded (and cached).
    #[must_use]
    pub fn is_loaded(&self, id: &str) -> bool {
        self.cache.contains_key(id)
    }

    /// Take the most recent profiled call's session, if any.
    #[must_use]
    pub fn take_session(&self) -> Option<ProfileSession> {
        self.last_session.lock().ok()?.take()
    }

    fn warn_if_loaded(&self, module_id: &str) {
        if self.is_loaded(module_id) {
            warn!("module '{module_id}' already loaded; registration will not be applied");
        }
    }

    fn wrap_context(&self) -> WrapContext {
        WrapContext {
            profiling: Arc::clone(&self.profiling),
            profiler: Arc::clone(&self.profiler),
            session_sink: Arc::clone(&self.last_session),
        }
    }
}

impl ModuleLoader for Engine {
    fn load(&mut self, id: &str) -> Result<Arc<Module>, LoadError> {
        if let Some(module) = self.cache.get(id) {
            return Ok(Arc::clone(module));
        }
        let Some(source) = self.catalog.source(id) else {
            return Err(LoadError::UnknownModule(id.to_string()));
        };
        if !self.in_flight.insert(id.to_string()) {
            return Err(LoadError::RecursiveLoad(id.to_string()));
        }
        // The source may load other modules through us; the in-flight set
        // only blocks cycles back into this id.
        let built = (*source)(self);
        self.in_flight.remove(id);
        let mut module = match built {
            Ok(module) => module,
            Err(source) => return Err(LoadError::Failed { id: id.to_string(), source }),
        };
        info!("loaded module '{id}'");
        if let Some(specs) = self.registry.module_specs(id) {
            apply::apply(&mut module, specs, &self.wrap_context());
        }
        let module = Arc::new(module);
        self.cache.insert(id.to_string(), Arc::clone(&module));
        Ok(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{CallArgs, Callable, Signature};
    use crate::value::Value;

    fn math_source(_: &mut dyn ModuleLoader) -> anyhow::Result<Module> {
        let mut module = Module::new("demo.math");
        module.add_function(Callable::new(
            "addition",
            Signature::new(&["a", "b"]),
            |args| Ok(Value::Int(args.int("a")? + args.int("b")?)),
        ));
        Ok(module)
    }

    #[test]
    fn test_unregistered_module_loads_untouched() {
        let mut engine = Engine::new();
        engine.provide("demo.math", math_source);
        let module = engine.load("demo.math").unwrap();
        assert_eq!(
            module.call("addition", &CallArgs::new().arg(1i64).arg(2i64)).unwrap(),
            Value::Int(3)
        );
    }

    #[test]
    fn test_unknown_module() {
        let mut engine = Engine::new();
        assert!(matches!(engine.load("ghost"), Err(LoadError::UnknownModule(_))));
    }

    #[test]
    fn test_repeated_load_returns_cached_module() {
        let mut engine = Engine::new();
        engine.provide("demo.math", math_source);
        let first = engine.load("demo.math").unwrap();
        let second = engine.load("demo.math").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_failing_source_propagates_and_is_not_cached() {
        let mut engine = Engine::new();
        engine.provide("broken", |_| anyhow::bail!("corrupt module"));
        let err = engine.load("broken").unwrap_err();
        assert!(matches!(err, LoadError::Failed { .. }));
        assert!(!engine.is_loaded("broken"));
        // A later load fails the same way instead of serving stale state.
        assert!(matches!(engine.load("broken"), Err(LoadError::Failed { .. })));
    }

    #[test]
    fn test_nested_load_is_permitted() {
        let mut engine = Engine::new();
        engine.provide("demo.math", math_source);
        engine.provide("outer", |loader| {
            let math = loader.load("demo.math")?;
            let mut module = Module::new("outer");
            let sum = math.call("addition", &CallArgs::new().arg(20i64).arg(1i64))?;
            module.add_function(Callable::new("constant", Signature::default(), move |_| {
                Ok(sum.clone())
            }));
            Ok(module)
        });
        let outer = engine.load("outer").unwrap();
        assert_eq!(outer.call("constant", &CallArgs::new()).unwrap(), Value::Int(21));
        assert!(engine.is_loaded("demo.math"));
    }

    #[test]
    fn test_recursive_load_is_rejected() {
        let mut engine = Engine::new();
        engine.provide("selfish", |loader| {
            loader.load("selfish")?;
            Ok(Module::new("selfish"))
        });
        let err = engine.load("selfish").unwrap_err();
        // The cycle surfaces as the source's failure, caused by the guard.
        match err {
            LoadError::Failed { id, source } => {
                assert_eq!(id, "selfish");
                assert!(source.to_string().contains("recursive load"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!engine.is_loaded("selfish"));
    }

    #[test]
    fn test_profiling_toggle() {
        let engine = Engine::new();
        assert!(engine.profiling_enabled());
        engine.set_profiling(false);
        assert!(!engine.profiling_enabled());
    }

    #[test]
    fn test_registration_after_load_does_not_rewrap() {
        let mut engine = Engine::new();
        engine.provide("demo.math", math_source);
        let _ = engine.load("demo.math").unwrap();
        engine.set_input_types(
            "demo.math",
            "addition",
            vec![crate::value::ValueType::Int.into(), crate::value::ValueType::Int.into()],
        );
        let module = engine.load("demo.math").unwrap();
        // Still the untouched module: a float argument is not rejected.
        assert_eq!(
            module.call("addition", &CallArgs::new().arg(1i64).arg(2i64)).unwrap(),
            Value::Int(3)
        );
        assert!(module.call("addition", &CallArgs::new().arg(1i64)).is_err());
    }
}
