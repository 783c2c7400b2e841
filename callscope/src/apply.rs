//! Decorator applicator
//!
//! Given a freshly loaded module and its registered specs, walks the
//! module's top-level items and rebinds each matched function or class
//! method in place with the wrapped version. Matching follows the registry
//! identifier forms: exact name, `Class.method`, bare class name (every
//! method of that class), or the wildcard (everything).
//!
//! Spec precedence per method: explicit `Class.method` entry, then the
//! bare-class entry, then the wildcard. Registered names absent from the
//! module are silently ignored — partial specs written defensively against
//! future refactors are not an error.

use crate::module::{Callable, Module, ModuleItem};
use crate::profiling::SamplingProfiler;
use crate::registry::{InstrumentationSpec, WILDCARD};
use crate::trace::{self, SessionSink, TraceOptions};
use crate::validate;
use log::debug;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Call-time dependencies handed to every trace wrapper.
pub(crate) struct WrapContext {
    pub profiling: Arc<AtomicBool>,
    pub profiler: Arc<dyn SamplingProfiler>,
    pub session_sink: SessionSink,
}

/// Rewrite `module` in place according to its registered specs.
pub(crate) fn apply(
    module: &mut Module,
    specs: &HashMap<String, InstrumentationSpec>,
    ctx: &WrapContext,
) {
    let wildcard = specs.get(WILDCARD);

    // Per-class allow-lists from the "Class.method" identifiers.
    let mut class_methods: HashMap<&str, HashSet<&str>> = HashMap::new();
    for identifier in specs.keys() {
        if let Some((class, method)) = identifier.split_once('.') {
            class_methods.entry(class).or_default().insert(method);
        }
    }

    let module_id = module.id().to_string();
    for (attr, item) in module.items_mut() {
        match item {
            ModuleItem::Function(function) => {
                let Some(spec) = specs.get(attr).or(wildcard) else { continue };
                debug!("instrumenting {module_id}.{attr}");
                *function = wrap(function.clone(), spec, &module_id, false, ctx);
            }
            ModuleItem::Class(class) => {
                let explicit = class_methods.get(attr.as_str());
                let class_spec = specs.get(attr);
                if wildcard.is_none() && class_spec.is_none() && explicit.is_none() {
                    continue;
                }
                // A bare class name (or the wildcard) selects every method;
                // otherwise only the explicitly named ones.
                let select_all = wildcard.is_some() || class_spec.is_some();
                let class_name = class.name().to_string();
                for (method_name, method) in class.methods_mut() {
                    let named = explicit.is_some_and(|set| set.contains(method_name.as_str()));
                    if !select_all && !named {
                        continue;
                    }
                    let identifier = format!("{class_name}.{method_name}");
                    let Some(spec) = specs.get(&identifier).or(class_spec).or(wildcard) else {
                        continue;
                    };
                    debug!("instrumenting {module_id}.{identifier}");
                    *method = wrap(method.clone(), spec, &module_id, true, ctx);
                }
            }
        }
    }
}

/// Produce the wrapped version of one callable according to its spec.
///
/// A trace spec yields the trace wrapper with the validators composed
/// inside it; a validators-only spec composes them directly around the
/// callable (input applied first, then output).
fn wrap(
    callable: Callable,
    spec: &InstrumentationSpec,
    module_id: &str,
    is_method: bool,
    ctx: &WrapContext,
) -> Callable {
    if spec.trace_enabled() {
        return trace::instrument(
            callable,
            TraceOptions {
                module_id: module_id.to_string(),
                is_method,
                input_types: spec.input_types().map(<[_]>::to_vec),
                output_types: spec.output_types().map(<[_]>::to_vec),
                profiling: Arc::clone(&ctx.profiling),
                profiler: Arc::clone(&ctx.profiler),
                session_sink: Arc::clone(&ctx.session_sink),
            },
        );
    }
    let mut wrapped = callable;
    if let Some(types) = spec.input_types() {
        wrapped = validate::wrap_input(wrapped, types.to_vec());
    }
    if let Some(types) = spec.output_types() {
        wrapped = validate::wrap_output(wrapped, types.to_vec());
    }
    wrapped
}
