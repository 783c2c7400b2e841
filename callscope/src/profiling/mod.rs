//! Execution profiling
//!
//! The engine treats line sampling as an external collaborator behind the
//! [`SamplingProfiler`] trait: one call, one opaque session. A session
//! yields per-file line tables (hit count, cumulative duration, raw source
//! text per line) plus the total elapsed duration — the contract the line
//! annotator and the session exporter consume.
//!
//! Sessions are call-scoped. A session is created for a single invocation
//! of an instrumented callable and never shared or pooled across
//! concurrent invocations.

pub mod annotator;
pub mod marker;

pub use marker::{touch, MarkerProfiler};

use crate::module::{CallArgs, CallResult, Callable};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

// =============================================================================
// SESSION MODEL
// =============================================================================

/// One annotated line of a profiled file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRow {
    /// 1-indexed line number.
    pub line: u32,
    /// Times the line was hit during the session.
    pub hits: u64,
    /// Cumulative time attributed to the line.
    pub duration: Duration,
    /// Raw source text of the line.
    pub text: String,
}

/// Line-level timing of one source file within a session.
///
/// Holds the file's full source so un-hit lines still report with zero
/// counts inside a callable's span.
#[derive(Debug, Clone, Default)]
pub struct FileTiming {
    source: Vec<String>,
    hits: HashMap<u32, (u64, Duration)>,
}

impl FileTiming {
    /// Build from the file's source text, with no hits recorded yet.
    #[must_use]
    pub fn from_source(text: &str) -> Self {
        Self { source: text.lines().map(str::to_string).collect(), hits: HashMap::new() }
    }

    /// Accumulate hits and duration on a line.
    pub fn record(&mut self, line: u32, hits: u64, duration: Duration) {
        let entry = self.hits.entry(line).or_insert((0, Duration::ZERO));
        entry.0 += hits;
        entry.1 += duration;
    }

    /// The annotated row for a line, or `None` past the end of the file.
    #[must_use]
    pub fn row(&self, line: u32) -> Option<LineRow> {
        let text = self.source.get(line.checked_sub(1)? as usize)?.clone();
        let (hits, duration) = self.hits.get(&line).copied().unwrap_or((0, Duration::ZERO));
        Some(LineRow { line, hits, duration, text })
    }

    /// All rows of the file, in line order.
    pub fn rows(&self) -> impl Iterator<Item = LineRow> + '_ {
        (1..=u32::try_from(self.source.len()).unwrap_or(u32::MAX)).filter_map(|n| self.row(n))
    }

    /// Number of lines in the underlying source.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.source.len()
    }
}

/// The samples of one profiled call: total elapsed duration plus per-file
/// line tables.
#[derive(Debug, Clone, Default)]
pub struct ProfileSession {
    total: Duration,
    files: HashMap<PathBuf, FileTiming>,
}

impl ProfileSession {
    #[must_use]
    pub fn new(total: Duration) -> Self {
        Self { total, files: HashMap::new() }
    }

    /// Attach the timing table of one file.
    pub fn insert_file(&mut self, path: impl Into<PathBuf>, timing: FileTiming) {
        self.files.insert(path.into(), timing);
    }

    /// Timing table of a file, if the file appeared in the session.
    #[must_use]
    pub fn timing_for(&self, path: &Path) -> Option<&FileTiming> {
        self.files.get(path)
    }

    /// Total elapsed duration across the whole session.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.total
    }

    /// Profiled files, in unspecified order.
    pub fn files(&self) -> impl Iterator<Item = (&Path, &FileTiming)> {
        self.files.iter().map(|(p, t)| (p.as_path(), t))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

// =============================================================================
// COLLABORATOR CONTRACT AND ADAPTER
// =============================================================================

/// External sampling profiler contract: run one call, capture one session.
pub trait SamplingProfiler: Send + Sync {
    /// Run the call under a fresh session and return both its result and
    /// the captured samples. The result must pass through unchanged.
    fn profile(&self, call: &mut dyn FnMut() -> CallResult) -> (CallResult, ProfileSession);
}

/// Run one invocation of a callable inside a profiler session.
pub(crate) fn run_profiled(
    profiler: &dyn SamplingProfiler,
    callable: &Callable,
    args: &CallArgs,
) -> (CallResult, ProfileSession) {
    let mut call = || callable.call(args);
    profiler.profile(&mut call)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_timing_rows_include_unhit_lines() {
        let mut timing = FileTiming::from_source("fn a() {\n    work();\n}\n");
        timing.record(2, 3, Duration::from_millis(30));
        assert_eq!(timing.line_count(), 3);

        let row = timing.row(1).unwrap();
        assert_eq!(row.hits, 0);
        assert_eq!(row.duration, Duration::ZERO);
        assert_eq!(row.text, "fn a() {");

        let row = timing.row(2).unwrap();
        assert_eq!(row.hits, 3);
        assert_eq!(row.duration, Duration::from_millis(30));

        assert!(timing.row(4).is_none());
        assert!(timing.row(0).is_none());
    }

    #[test]
    fn test_record_accumulates() {
        let mut timing = FileTiming::from_source("one line");
        timing.record(1, 1, Duration::from_millis(5));
        timing.record(1, 2, Duration::from_millis(10));
        let row = timing.row(1).unwrap();
        assert_eq!(row.hits, 3);
        assert_eq!(row.duration, Duration::from_millis(15));
    }

    #[test]
    fn test_session_lookup_by_path() {
        let mut session = ProfileSession::new(Duration::from_secs(1));
        session.insert_file("src/demo.rs", FileTiming::from_source("x"));
        assert!(session.timing_for(Path::new("src/demo.rs")).is_some());
        assert!(session.timing_for(Path::new("src/other.rs")).is_none());
        assert!(!session.is_empty());
    }
}
