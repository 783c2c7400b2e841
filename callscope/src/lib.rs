//! # callscope - Load-Time Call Instrumentation Engine
//!
//! callscope intercepts the loading of selected modules and rewrites their
//! callable entry points — free functions and class methods — to inject
//! signature tracing, execution-time profiling and argument/return type
//! validation, without touching call sites. Everything not explicitly
//! registered loads untouched.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Embedding Program                         │
//! │        registration calls          module loads + calls        │
//! └───────────┬──────────────────────────────┬──────────────────────┘
//!             ▼                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Engine (This Crate)                         │
//! │                                                                 │
//! │  ┌──────────────┐    ┌──────────────┐    ┌──────────────┐     │
//! │  │   Registry   │───▶│  Interceptor │───▶│  Applicator  │     │
//! │  │   (specs)    │    │  (load hook) │    │  (rewriting) │     │
//! │  └──────────────┘    └──────┬───────┘    └──────┬───────┘     │
//! │                             │                    ▼              │
//! │                      ┌──────────────┐    ┌──────────────┐     │
//! │                      │    Catalog   │    │Trace wrapper │     │
//! │                      │  (sources)   │    │ + validators │     │
//! │                      └──────────────┘    └──────┬───────┘     │
//! │                                                  ▼              │
//! │                      ┌──────────────┐    ┌──────────────┐     │
//! │                      │  Annotator   │◀───│   Profiler   │     │
//! │                      │ (line report)│    │   session    │     │
//! │                      └──────────────┘    └──────────────┘     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`engine`]: the injectable facade — registry, module catalog, load
//!   interception with a reentrancy guard, module cache, profiling toggle
//! - [`registry`]: which callables in which modules get which decorators
//! - [`loader`]: the `load(id) -> Module` capability and the catalog of
//!   module source constructors
//! - [`module`]: the tagged module structure (functions, classes with
//!   method tables), signatures with defaults, the dynamic call convention
//! - [`value`]: dynamic runtime values, exact type tags, bounded rendering
//! - [`profiling`]: the sampling-profiler collaborator contract, the
//!   bundled marker-based implementation, the line annotator
//! - [`export`]: JSON export of a profile session
//! - [`demo`]: the instrumented demo modules used by examples and tests
//! - [`cli`]: argument parsing for the demo binary
//!
//! ## Typical Usage
//!
//! ```
//! use callscope::{CallArgs, Engine, ModuleLoader};
//! use callscope::demo;
//!
//! let mut engine = Engine::new();
//! demo::install(&mut engine);
//! engine.set_profiling(false);
//!
//! // Registration must precede the module's first load.
//! engine.trace(demo::MATH, Some(&["addition"]));
//!
//! let math = engine.load(demo::MATH)?;
//! // Prints a call banner and timing footer, returns 3 unchanged.
//! let sum = math.call("addition", &CallArgs::new().arg(2i64).arg(1i64))?;
//! # assert_eq!(sum, callscope::Value::Int(3));
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Key Concepts
//!
//! - **Instrumented callable**: a function or method transparently wrapped
//!   with tracing, timing and/or type validation
//! - **Wildcard identifier**: the registry key `ALL`, meaning every
//!   top-level callable/class of a module absent a more specific entry
//! - **Sampling profiler session**: one call's line-level hit counts and
//!   durations, captured by the [`profiling::SamplingProfiler`] collaborator
//! - **Owner instance**: the receiver of a bound method call, used to
//!   qualify its printed name
//! - **Type tuple**: ordered expected exact types (or the owner sentinel)
//!   checked by the input/output validators

pub mod cli;
pub mod demo;
pub mod domain;
pub mod engine;
pub mod export;
pub mod loader;
pub mod module;
pub mod profiling;
pub mod registry;
pub mod trace;
pub mod validate;
pub mod value;

mod apply;

pub use domain::errors::{CallError, ConfigError, ExportError, LoadError, ValidationError};
pub use domain::types::SourceSpan;
pub use engine::Engine;
pub use loader::{ModuleCatalog, ModuleLoader, ModuleSource};
pub use module::{
    BoundArgs, CallArgs, CallResult, Callable, ClassDef, Module, ModuleItem, Signature,
};
pub use profiling::{MarkerProfiler, ProfileSession, SamplingProfiler};
pub use registry::{DecoratorKind, InstrumentationSpec, Registry, TypeSpec, WILDCARD};
pub use value::{ArrayValue, Instance, Value, ValueType};
