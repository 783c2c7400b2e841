//! Module loading service
//!
//! Loading is a capability: anything implementing [`ModuleLoader`] can turn
//! a module id into a loaded [`Module`], so alternate loaders are
//! substitutable in tests. The [`ModuleCatalog`] plays the role of the
//! normal loading machinery — it maps module ids to source constructors.
//! A constructor receives the loader it was invoked through, so building
//! one module may load others (nested loads go through the same
//! interception path as top-level ones).

use crate::domain::errors::LoadError;
use crate::module::Module;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Capability-typed loading interface: `load(id) -> Module`.
pub trait ModuleLoader {
    /// Load (or return the already-loaded) module for `id`.
    fn load(&mut self, id: &str) -> Result<Arc<Module>, LoadError>;
}

/// A module source constructor. Failures propagate as
/// [`LoadError::Failed`] and the module is never instrumented.
pub type ModuleSource = Arc<dyn Fn(&mut dyn ModuleLoader) -> anyhow::Result<Module> + Send + Sync>;

/// The plain loading machinery: module id -> source constructor.
#[derive(Default)]
pub struct ModuleCatalog {
    sources: HashMap<String, ModuleSource>,
}

impl ModuleCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source constructor for a module id, replacing any prior
    /// one.
    pub fn provide<F>(&mut self, id: impl Into<String>, source: F)
    where
        F: Fn(&mut dyn ModuleLoader) -> anyhow::Result<Module> + Send + Sync + 'static,
    {
        self.sources.insert(id.into(), Arc::new(source));
    }

    /// The source constructor for `id`, if provided.
    #[must_use]
    pub fn source(&self, id: &str) -> Option<ModuleSource> {
        self.sources.get(id).map(Arc::clone)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }
}

impl fmt::Debug for ModuleCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.sources.keys().map(String::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("ModuleCatalog").field("modules", &ids).finish()
    }
}
