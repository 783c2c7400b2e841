//! Profile session export
//!
//! Serializes a [`ProfileSession`] into a JSON report for offline
//! inspection. The report mirrors what the line annotator prints — per-file
//! line rows with hits and cumulative time — in a machine-readable shape.

use crate::domain::errors::ExportError;
use crate::profiling::ProfileSession;
use serde::Serialize;
use std::io::Write;

/// JSON-serializable rendering of one profile session.
#[derive(Debug, Serialize)]
pub struct SessionReport {
    /// Qualified name of the call the session belongs to.
    callable: String,
    /// Total elapsed duration of the session, in seconds.
    total_seconds: f64,
    /// Per-file line rows, sorted by path.
    files: Vec<FileReport>,
}

#[derive(Debug, Serialize)]
struct FileReport {
    path: String,
    lines: Vec<LineReport>,
}

#[derive(Debug, Serialize)]
struct LineReport {
    line: u32,
    hits: u64,
    seconds: f64,
    text: String,
}

impl SessionReport {
    /// Build a report from a session. Only lines that were actually hit
    /// are included; un-hit source lines belong in the printed annotation,
    /// not the export.
    #[must_use]
    pub fn from_session(callable: impl Into<String>, session: &ProfileSession) -> Self {
        let mut files: Vec<FileReport> = session
            .files()
            .map(|(path, timing)| FileReport {
                path: path.display().to_string(),
                lines: timing
                    .rows()
                    .filter(|row| row.hits > 0)
                    .map(|row| LineReport {
                        line: row.line,
                        hits: row.hits,
                        seconds: row.duration.as_secs_f64(),
                        text: row.text,
                    })
                    .collect(),
            })
            .collect();
        files.sort_unstable_by(|a, b| a.path.cmp(&b.path));
        Self {
            callable: callable.into(),
            total_seconds: session.total().as_secs_f64(),
            files,
        }
    }

    /// Write the report as pretty-printed JSON to any writer — a file, a
    /// buffer in tests, or stdout.
    pub fn export<W: Write>(&self, writer: W) -> Result<(), ExportError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}
