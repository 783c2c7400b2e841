//! Marker-based line profiler
//!
//! The bundled [`SamplingProfiler`] implementation uses explicit
//! instrumentation: code under profile calls [`touch`] (via the [`probe!`]
//! macro) at the lines it wants attributed, and the active recorder
//! charges each marker with the time elapsed since the previous one. At
//! session end the touched files are read from disk to supply the raw
//! source text the annotator prints.
//!
//! The recorder is thread-local, so each invocation gets an independent
//! session and concurrent calls on other threads never share state. A
//! nested profiled call suspends the outer recorder and restores it on the
//! way out.
//!
//! [`probe!`]: crate::probe

use super::{FileTiming, ProfileSession, SamplingProfiler};
use crate::module::CallResult;
use log::warn;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};
use std::{fs, io};

thread_local! {
    static ACTIVE: RefCell<Option<Recorder>> = const { RefCell::new(None) };
}

/// Record a line hit against the active session, if any. Outside a
/// profiled call this is a no-op.
pub fn touch(file: &str, line: u32) {
    ACTIVE.with(|active| {
        if let Some(recorder) = active.borrow_mut().as_mut() {
            recorder.touch(file, line);
        }
    });
}

/// Record a line hit in the calling function's source file.
///
/// Expands to [`profiling::touch`](touch) with `file!()` / `line!()`, so
/// the hit lands on the exact line the macro occupies.
#[macro_export]
macro_rules! probe {
    () => {
        $crate::profiling::touch(file!(), line!())
    };
}

struct Recorder {
    started: Instant,
    last: Instant,
    hits: HashMap<(String, u32), (u64, Duration)>,
}

impl Recorder {
    fn new() -> Self {
        let now = Instant::now();
        Self { started: now, last: now, hits: HashMap::new() }
    }

    fn touch(&mut self, file: &str, line: u32) {
        let now = Instant::now();
        let delta = now.duration_since(self.last);
        self.last = now;
        let entry = self.hits.entry((file.to_string(), line)).or_insert((0, Duration::ZERO));
        entry.0 += 1;
        entry.1 += delta;
    }

    /// Close the session: group hits per file and load each file's source
    /// text. Unreadable files are dropped from the table with a warning.
    fn finish(self) -> ProfileSession {
        let mut session = ProfileSession::new(self.started.elapsed());
        let mut per_file: HashMap<String, Vec<(u32, u64, Duration)>> = HashMap::new();
        for ((file, line), (hits, duration)) in self.hits {
            per_file.entry(file).or_default().push((line, hits, duration));
        }
        for (file, lines) in per_file {
            let text = match read_source(&file) {
                Ok(text) => text,
                Err(e) => {
                    warn!("dropping profile samples for unreadable source '{file}': {e}");
                    continue;
                }
            };
            let mut timing = FileTiming::from_source(&text);
            for (line, hits, duration) in lines {
                timing.record(line, hits, duration);
            }
            session.insert_file(file, timing);
        }
        session
    }
}

/// Read a marker's source file. `file!()` paths are relative to the
/// workspace root, while the process may be running from the package
/// directory (test binaries do) — fall back to the workspace root then.
fn read_source(file: &str) -> io::Result<String> {
    match fs::read_to_string(file) {
        Ok(text) => Ok(text),
        Err(err) => match Path::new(env!("CARGO_MANIFEST_DIR")).parent() {
            Some(root) => fs::read_to_string(root.join(file)).map_err(|_| err),
            None => Err(err),
        },
    }
}

/// Marker-based profiler: sessions record [`touch`] hits on the current
/// thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkerProfiler;

impl SamplingProfiler for MarkerProfiler {
    fn profile(&self, call: &mut dyn FnMut() -> CallResult) -> (CallResult, ProfileSession) {
        // Suspend any outer session for the duration of this call.
        let previous = ACTIVE.with(|active| active.borrow_mut().replace(Recorder::new()));
        let result = call();
        let recorder = ACTIVE.with(|active| {
            let mut slot = active.borrow_mut();
            let finished = slot.take();
            *slot = previous;
            finished
        });
        let session = recorder.map_or_else(ProfileSession::default, Recorder::finish);
        (result, session)
    }
}
