use std::io::{self, IsTerminal, Write};
use std::path::Path;

use pdfmarker::{Document, ExtractWarning, ProgressSink, ProgressStep};
use serde::Serialize;

use crate::page_range::parse_page_range;

/// Open a PDF file with user-friendly error messages.
///
/// Returns `Err(1)` with a message printed to stderr if the file is not found
/// or cannot be opened as a PDF with pages.
pub fn open_document(file: &Path) -> Result<Document, i32> {
    if !file.exists() {
        eprintln!("Error: file not found: {}", file.display());
        return Err(1);
    }

    Document::open_file(file, None).map_err(|e| {
        eprintln!("Error: failed to open PDF: {e}");
        1
    })
}

/// Resolve an optional page selection into 0-indexed page indices.
///
/// `None` selects every page in document order.
pub fn resolve_pages(pages: Option<&str>, page_count: usize) -> Result<Vec<usize>, i32> {
    match pages {
        Some(range) => parse_page_range(range, page_count).map_err(|e| {
            eprintln!("Error: {e}");
            1
        }),
        None => Ok((0..page_count).collect()),
    }
}

/// Print a value as one line of JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), i32> {
    let line = serde_json::to_string(value).map_err(|e| {
        eprintln!("Error: failed to serialize output: {e}");
        1
    })?;
    println!("{line}");
    Ok(())
}

/// Print extraction warnings to stderr.
pub fn print_warnings(warnings: &[ExtractWarning]) {
    for warning in warnings {
        eprintln!("warning: {warning}");
    }
}

/// Escape a string for CSV output.
///
/// Text containing commas, double quotes or newlines is wrapped in double
/// quotes with internal quotes doubled.
pub fn csv_escape(text: &str) -> String {
    if text.contains(',') || text.contains('"') || text.contains('\n') {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

/// Shows the run's current step and percentage on stderr, only when stderr
/// is a terminal.
pub struct ProgressReporter {
    is_tty: bool,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            is_tty: io::stderr().is_terminal(),
        }
    }

    /// Clear the progress line (if TTY).
    pub fn finish(&self) {
        if self.is_tty {
            eprint!("\r{}\r", " ".repeat(40));
            let _ = io::stderr().flush();
        }
    }
}

impl ProgressSink for ProgressReporter {
    fn report(&mut self, step: ProgressStep, percent: u8) {
        tracing::debug!(step = step.as_str(), percent, "progress");
        if self.is_tty {
            eprint!("\r{:<14}{percent:>3}%", step.as_str());
            let _ = io::stderr().flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_escape_plain_text() {
        assert_eq!(csv_escape("hello"), "hello");
    }

    #[test]
    fn csv_escape_with_comma() {
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
    }

    #[test]
    fn csv_escape_with_quotes() {
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn open_document_file_not_found() {
        match open_document(Path::new("/nonexistent/file.pdf")) {
            Err(code) => assert_eq!(code, 1),
            Ok(_) => panic!("expected error"),
        }
    }

    #[test]
    fn resolve_pages_none_returns_all() {
        assert_eq!(resolve_pages(None, 3).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn resolve_pages_keeps_written_order() {
        assert_eq!(resolve_pages(Some("3,1"), 5).unwrap(), vec![2, 0]);
    }

    #[test]
    fn resolve_pages_invalid_range() {
        assert_eq!(resolve_pages(Some("0"), 5).unwrap_err(), 1);
    }

    #[test]
    fn progress_reporter_accepts_reports() {
        let mut reporter = ProgressReporter::new();
        reporter.report(ProgressStep::Extracting, 10);
        reporter.report(ProgressStep::Complete, 100);
        reporter.finish();
    }
}
