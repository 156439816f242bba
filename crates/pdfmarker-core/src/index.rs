//! Stream indexing: flatten a page's runs into one string with run spans.
//!
//! Every run's text is appended followed by a single separator space. The
//! separator belongs to neither neighbour, so two adjacent runs can never
//! be matched as if they were one word. This gives the invariant
//! `text.len() == Σ run.text.len() + runs.len()`.

use crate::run::{RawTextItem, TextRun};

/// Separator appended after every run.
pub const RUN_SEPARATOR: char = ' ';

/// Immutable index of one page: its runs in reading order and the
/// flattened page string they were concatenated into.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageIndex {
    runs: Vec<TextRun>,
    text: String,
}

impl PageIndex {
    /// Build the index from raw items, preserving their order.
    ///
    /// Items without text become empty runs; they still consume a
    /// separator so offsets never collide.
    pub fn build<I>(items: I) -> Self
    where
        I: IntoIterator<Item = RawTextItem>,
    {
        let mut text = String::new();
        let mut runs = Vec::new();

        for item in items {
            let run_text = item.text.unwrap_or_default();
            let start = text.len();
            text.push_str(&run_text);
            let end = text.len();
            text.push(RUN_SEPARATOR);

            runs.push(TextRun {
                text: run_text,
                transform: item.transform,
                width: item.width,
                start,
                end,
            });
        }

        Self { runs, text }
    }

    /// The flattened page string.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// All runs in reading order, spacing runs included.
    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    /// Whether the page has no runs at all.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Number of runs (spacing runs included).
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Whether any run carries non-whitespace text.
    pub fn has_content(&self) -> bool {
        self.runs.iter().any(|r| !r.is_spacing())
    }

    /// Non-spacing runs whose span overlaps `[start, end)`, in reading order.
    pub fn runs_overlapping(&self, start: usize, end: usize) -> impl Iterator<Item = &TextRun> {
        // Spans are sorted, so everything starting at or past `end` can be skipped.
        let upper = self.runs.partition_point(|r| r.start < end);
        self.runs[..upper]
            .iter()
            .filter(move |r| !r.is_spacing() && r.overlaps(start, end))
    }
}
