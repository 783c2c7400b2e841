//! Signature/trace decorator
//!
//! The primary wrapper produced for a registered callable. On every call it
//! captures a snapshot of the bound arguments, prints a call banner with
//! the synthesized signature, runs the callable (optionally under a
//! profiler session, optionally inside the type validators), emits the
//! line annotator's report, and closes with the elapsed wall-clock time.
//!
//! The wrapper is referentially transparent: the result value or error of
//! the wrapped callable passes through unchanged — only the printed
//! diagnostics differ from the unwrapped call.

use crate::domain::types::SourceSpan;
use crate::module::{CallArgs, Callable, Signature};
use crate::profiling::{self, annotator, ProfileSession, SamplingProfiler};
use crate::registry::TypeSpec;
use crate::validate;
use crate::value::format;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Width of the banner rule and the right-aligned timing footer.
const BANNER_WIDTH: usize = 80;

/// Shared slot receiving the most recent profile session (export path).
pub type SessionSink = Arc<Mutex<Option<ProfileSession>>>;

/// Everything the trace wrapper needs at call time.
pub struct TraceOptions {
    /// Identifier of the module the callable belongs to.
    pub module_id: String,
    /// True for class methods: the printed name is qualified with the
    /// owner instance's class.
    pub is_method: bool,
    /// Input type tuple, validated before the call.
    pub input_types: Option<Vec<TypeSpec>>,
    /// Output type tuple, validated after the call.
    pub output_types: Option<Vec<TypeSpec>>,
    /// Process-wide profiling toggle, read at call time — it can be
    /// flipped between calls.
    pub profiling: Arc<AtomicBool>,
    /// The sampling profiler collaborator.
    pub profiler: Arc<dyn SamplingProfiler>,
    /// Receives each profiled call's session.
    pub session_sink: SessionSink,
}

/// Wrap a callable with signature tracing (and the requested validators).
#[must_use]
pub fn instrument(callable: Callable, opts: TraceOptions) -> Callable {
    // Compose the innermost callable once, at wrap time: original wrapped
    // by input validation, then output validation, so input checks run
    // before the call and output checks after.
    let mut inner = callable.clone();
    if let Some(types) = &opts.input_types {
        inner = validate::wrap_input(inner, types.clone());
    }
    if let Some(types) = &opts.output_types {
        inner = validate::wrap_output(inner, types.clone());
    }

    let name = callable.name().to_string();
    let signature = callable.signature().clone();
    let span = callable.span().cloned();
    let banner_span = span.clone();

    Callable::from_raw(name.clone(), signature.clone(), span, move |args| {
        let snapshot = CallSnapshot::capture(&signature, args);
        let qualified = snapshot.qualified_name(&opts.module_id, &name, opts.is_method);
        println!("{}", render_banner(&opts.module_id, &qualified, &name, &snapshot));

        let call_args = if snapshot.drop_first { args.drop_first() } else { args.clone() };
        let started = Instant::now();
        let result = if opts.profiling.load(Ordering::Relaxed) {
            let (result, session) = profiling::run_profiled(&*opts.profiler, &inner, &call_args);
            // Report before re-raising, with whatever samples were collected.
            if let Some(span) = &banner_span {
                let report = annotator::render(&session, span);
                if !report.is_empty() {
                    print!("{report}");
                }
            }
            if let Ok(mut sink) = opts.session_sink.lock() {
                *sink = Some(session);
            }
            result
        } else {
            inner.call(&call_args)
        };
        println!("{}", render_footer(started.elapsed()));
        result
    })
}

// =============================================================================
// CALL FRAME SNAPSHOT
// =============================================================================

/// Per-invocation view of the bound arguments, rendered for display.
/// Created when the wrapper fires, destroyed when it returns.
pub(crate) struct CallSnapshot {
    /// Rendered (name, value) pairs for mandatory parameters. A mandatory
    /// parameter that could not be resolved renders as `None` and the
    /// signature stays partial.
    mandatory: Vec<(String, Option<String>)>,
    /// Rendered effective values for optional parameters: the override if
    /// supplied, the declared default otherwise.
    optional: Vec<(String, String)>,
    /// Class name of the receiver, when the first parameter is `self`.
    owner_class: Option<String>,
    /// First parameter is `cls`: drop it from the onward positional list.
    drop_first: bool,
}

impl CallSnapshot {
    pub(crate) fn capture(signature: &Signature, args: &CallArgs) -> Self {
        let mut mandatory = Vec::new();
        let mut optional = Vec::new();
        let mut owner_class = None;
        let mut drop_first = false;

        for (index, param) in signature.params().iter().enumerate() {
            let resolved = signature.resolve(index, args);
            if index == 0 {
                if param.name() == "self" {
                    owner_class = resolved
                        .as_ref()
                        .and_then(|v| v.as_instance())
                        .map(|i| i.class_name().to_string());
                } else if param.name() == "cls" {
                    drop_first = true;
                }
            }
            let rendered = resolved.as_ref().map(format::render);
            if param.is_mandatory() {
                mandatory.push((param.name().to_string(), rendered));
            } else if let Some(rendered) = rendered {
                optional.push((param.name().to_string(), rendered));
            }
        }
        Self { mandatory, optional, owner_class, drop_first }
    }

    /// Fully qualified printed name, including the owner class when the
    /// callable is a bound method.
    pub(crate) fn qualified_name(&self, module_id: &str, name: &str, is_method: bool) -> String {
        match (&self.owner_class, is_method) {
            (Some(class), true) => format!("{module_id}.{class}.{name}"),
            _ => format!("{module_id}.{name}"),
        }
    }
}

// =============================================================================
// RENDERING
// =============================================================================

/// The call banner: rule, module-scoped tag, qualified name, synthesized
/// signature with mandatory parameters first and optional ones after.
pub(crate) fn render_banner(
    module_id: &str,
    qualified: &str,
    name: &str,
    snapshot: &CallSnapshot,
) -> String {
    let tag = module_id.split('.').next().unwrap_or(module_id);
    format!(
        "{}\n[{tag}] Calling {qualified}...\n{}",
        "_".repeat(BANNER_WIDTH),
        render_signature(name, snapshot)
    )
}

pub(crate) fn render_signature(name: &str, snapshot: &CallSnapshot) -> String {
    let mut params: Vec<String> = snapshot
        .mandatory
        .iter()
        .filter_map(|(n, v)| v.as_ref().map(|v| format!("{n}={v}")))
        .collect();
    params.extend(snapshot.optional.iter().map(|(n, v)| format!("{n}={v}")));
    format!("{name}({})", params.join(", "))
}

/// The closing line: elapsed seconds and minutes, right-aligned under the
/// banner rule.
pub(crate) fn render_footer(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs_f64();
    let msg = format!("{seconds:.1}s, {:.1}min", seconds / 60.0);
    format!("{}{msg}", "_".repeat(BANNER_WIDTH.saturating_sub(msg.len())))
}
