//! Line annotator
//!
//! Merges a profile session's line table with source text to produce a
//! bounded report for one callable: a header plus one row per source line
//! inside the callable's span — line number, hit count, cumulative time,
//! time per hit, percentage of the session total, raw source text.
//!
//! The span is the explicit `(file, first_line, last_line)` range captured
//! when the callable was defined, so duplicate source text elsewhere in
//! the file cannot skew the report. If the target file does not appear in
//! the session (or the session recorded no time at all), nothing is
//! emitted.

use super::ProfileSession;
use crate::domain::types::SourceSpan;
use std::io::{self, Write};

const HEADER: &str = "Line #|     Hits|         Time| Time per hit|      %|Source code";
const RULE: &str = "------+---------+-------------+-------------+-------+-----------";

/// Write the annotated report for `span` to `out`. Time unit is seconds.
pub fn annotate<W: Write>(
    out: &mut W,
    session: &ProfileSession,
    span: &SourceSpan,
) -> io::Result<()> {
    let Some(timing) = session.timing_for(span.file()) else {
        return Ok(());
    };
    let total = session.total().as_secs_f64();
    if total <= 0.0 {
        return Ok(());
    }

    writeln!(out, "{HEADER}")?;
    writeln!(out, "{RULE}")?;
    for line in span.first_line..=span.last_line {
        let Some(row) = timing.row(line) else { continue };
        let seconds = row.duration.as_secs_f64();
        let per_hit = if row.hits == 0 { 0.0 } else { seconds / row.hits as f64 };
        let percent = seconds * 100.0 / total;
        writeln!(
            out,
            "{:>6}|{:>9}|{:>13.6}|{:>13.6}|{:>6.2}%|{}",
            row.line, row.hits, seconds, per_hit, percent, row.text
        )?;
    }
    Ok(())
}

/// Render the report into a string (stdout emission path).
#[must_use]
pub(crate) fn render(session: &ProfileSession, span: &SourceSpan) -> String {
    let mut buf = Vec::new();
    // Vec<u8> writes are infallible.
    let _ = annotate(&mut buf, session, span);
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiling::FileTiming;
    use std::time::Duration;

    fn session_with(path: &str, source: &str, hits: &[(u32, u64, Duration)]) -> ProfileSession {
        let mut timing = FileTiming::from_source(source);
        for &(line, count, duration) in hits {
            timing.record(line, count, duration);
        }
        let mut session = ProfileSession::new(Duration::from_secs(1));
        session.insert_file(path, timing);
        session
    }

    #[test]
    fn test_report_restricted_to_span() {
        let source = "before\nfn work() {\n    step();\n}\nafter\n";
        let session = session_with(
            "src/demo.rs",
            source,
            &[(3, 4, Duration::from_millis(500)), (5, 9, Duration::from_millis(100))],
        );
        let span = SourceSpan::new("src/demo.rs", 2, 4);
        let report = render(&session, &span);

        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 5); // header + rule + 3 rows
        assert_eq!(lines[0], HEADER);
        assert!(lines[2].starts_with("     2|        0|"));
        assert!(lines[3].contains("    step();"));
        // Line 5 is outside the span despite having samples.
        assert!(!report.contains("after"));
    }

    #[test]
    fn test_percent_and_time_per_hit() {
        let session =
            session_with("src/demo.rs", "a\nb\n", &[(2, 4, Duration::from_millis(500))]);
        let span = SourceSpan::new("src/demo.rs", 2, 2);
        let report = render(&session, &span);
        // 500ms over 4 hits at a 1s total: 0.125s/hit, 50%.
        assert!(report.contains("     0.500000"), "report was: {report}");
        assert!(report.contains("     0.125000"));
        assert!(report.contains(" 50.00%"));
    }

    #[test]
    fn test_zero_hit_rows_report_zero_per_hit() {
        let session =
            session_with("src/demo.rs", "a\nb\n", &[(2, 2, Duration::from_millis(100))]);
        let span = SourceSpan::new("src/demo.rs", 1, 2);
        let report = render(&session, &span);
        let first_row = report.lines().nth(2).unwrap();
        assert!(first_row.starts_with("     1|        0|     0.000000|     0.000000|  0.00%|a"));
    }

    #[test]
    fn test_absent_file_emits_nothing() {
        let session = session_with("src/demo.rs", "a\n", &[]);
        let span = SourceSpan::new("src/other.rs", 1, 1);
        assert_eq!(render(&session, &span), "");
    }

    #[test]
    fn test_zero_total_emits_nothing() {
        let mut timing = FileTiming::from_source("a\n");
        timing.record(1, 1, Duration::ZERO);
        let mut session = ProfileSession::new(Duration::ZERO);
        session.insert_file("src/demo.rs", timing);
        let span = SourceSpan::new("src/demo.rs", 1, 1);
        assert_eq!(render(&session, &span), "");
    }

    #[test]
    fn test_span_past_end_of_file_truncates() {
        let session = session_with("src/demo.rs", "only\n", &[(1, 1, Duration::from_millis(1))]);
        let span = SourceSpan::new("src/demo.rs", 1, 40);
        let report = render(&session, &span);
        assert_eq!(report.lines().count(), 3); // header + rule + the single real row
    }
}
