//! Output seams: where rectangles and progress go.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::PdfError;
use crate::highlight::HighlightRect;

/// Receives highlight rectangles as they are produced.
///
/// May be called any number of times per page. Implementations that write
/// into a document typically buffer until asked to flush.
pub trait HighlightSink {
    /// Draw one rectangle on the given 0-based page.
    fn draw_rect(&mut self, page_index: usize, rect: &HighlightRect) -> Result<(), PdfError>;
}

impl<S: HighlightSink + ?Sized> HighlightSink for &mut S {
    fn draw_rect(&mut self, page_index: usize, rect: &HighlightRect) -> Result<(), PdfError> {
        (**self).draw_rect(page_index, rect)
    }
}

/// A sink that keeps every rectangle in memory.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    rects: Vec<(usize, HighlightRect)>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All `(page_index, rect)` pairs in drawing order.
    pub fn rects(&self) -> &[(usize, HighlightRect)] {
        &self.rects
    }

    /// Rectangles drawn on one page.
    pub fn on_page(&self, page_index: usize) -> impl Iterator<Item = &HighlightRect> {
        self.rects
            .iter()
            .filter(move |(p, _)| *p == page_index)
            .map(|(_, r)| r)
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn into_rects(self) -> Vec<(usize, HighlightRect)> {
        self.rects
    }
}

impl HighlightSink for CollectingSink {
    fn draw_rect(&mut self, page_index: usize, rect: &HighlightRect) -> Result<(), PdfError> {
        self.rects.push((page_index, *rect));
        Ok(())
    }
}

/// Stage reported to a [`ProgressSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProgressStep {
    Extracting,
    Analyzing,
    Highlighting,
    Complete,
}

impl ProgressStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStep::Extracting => "extracting",
            ProgressStep::Analyzing => "analyzing",
            ProgressStep::Highlighting => "highlighting",
            ProgressStep::Complete => "complete",
        }
    }
}

impl fmt::Display for ProgressStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives progress updates. `percent` is in `0..=100`.
pub trait ProgressSink {
    fn report(&mut self, step: ProgressStep, percent: u8);
}

impl<F> ProgressSink for F
where
    F: FnMut(ProgressStep, u8),
{
    fn report(&mut self, step: ProgressStep, percent: u8) {
        self(step, percent)
    }
}

/// A progress sink that discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _step: ProgressStep, _percent: u8) {}
}

/// Cooperative cancellation flag, cheap to clone and share across threads.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Takes effect before the next page.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::Rgb;

    fn rect(x: f64) -> HighlightRect {
        HighlightRect {
            x,
            y: 0.0,
            width: 10.0,
            height: 12.0,
            opacity: 0.4,
            color: Rgb::YELLOW,
        }
    }

    #[test]
    fn collecting_sink_keeps_order_and_pages() {
        let mut sink = CollectingSink::new();
        sink.draw_rect(0, &rect(1.0)).unwrap();
        sink.draw_rect(2, &rect(2.0)).unwrap();
        sink.draw_rect(0, &rect(3.0)).unwrap();
        assert_eq!(sink.len(), 3);
        let xs: Vec<f64> = sink.on_page(0).map(|r| r.x).collect();
        assert_eq!(xs, vec![1.0, 3.0]);
        assert_eq!(sink.on_page(1).count(), 0);
    }

    #[test]
    fn sink_by_mutable_reference() {
        fn draw_twice(mut sink: impl HighlightSink) {
            sink.draw_rect(0, &rect(0.0)).unwrap();
            sink.draw_rect(1, &rect(0.0)).unwrap();
        }
        let mut sink = CollectingSink::new();
        draw_twice(&mut sink);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn closures_are_progress_sinks() {
        let mut seen = Vec::new();
        {
            let mut sink = |step: ProgressStep, pct: u8| seen.push((step, pct));
            sink.report(ProgressStep::Extracting, 10);
            sink.report(ProgressStep::Complete, 100);
        }
        assert_eq!(
            seen,
            vec![(ProgressStep::Extracting, 10), (ProgressStep::Complete, 100)]
        );
    }

    #[test]
    fn progress_step_names() {
        assert_eq!(ProgressStep::Analyzing.to_string(), "analyzing");
        assert_eq!(ProgressStep::Highlighting.as_str(), "highlighting");
    }

    #[test]
    fn cancel_token_is_shared_between_clones() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }
}
