//! CLI argument definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "callscope",
    about = "Trace, profile and type-check calls into the demo modules",
    after_help = "\
EXAMPLES:
    callscope                        Trace every demo callable, with profiling
    callscope functions --no-profile Signatures only, no line tables
    callscope typed                  Input/output type validation walkthrough
    callscope shapes --export s.json Trace methods, export the last session"
)]
pub struct Args {
    /// Demo scenario to run
    #[arg(value_enum, default_value = "all")]
    pub scenario: Scenario,

    /// Disable per-call line profiling (signature tracing stays on)
    #[arg(long)]
    pub no_profile: bool,

    /// Export the last profiled call's session as JSON
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

/// Which demo registration/run to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Wildcard-trace both demo modules and exercise everything
    All,
    /// Trace two named free functions, leave the rest untouched
    Functions,
    /// Trace every method of the shape classes
    Shapes,
    /// Input/output type validation on top of tracing
    Typed,
}
