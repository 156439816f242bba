//! Page orchestration: extract, propose, locate, project, draw.
//!
//! [`Highlighter`] drives the pipeline one page at a time in document
//! order. Each selected page is indexed, its text handed to the
//! [`PhraseProposer`], every proposed phrase located in the flattened text,
//! and each occurrence projected to rectangles for the [`HighlightSink`].
//! A proposer failure only skips that page.

use pdfmarker_core::{
    CancelToken, ExtractResult, ExtractWarning, ExtractWarningCode, HighlightSink,
    HighlightStyle, LocateOptions, PageIndex, PdfError, ProgressSink, ProgressStep, RawTextItem,
    occurrences, project,
};

use crate::document::Document;
use crate::proposer::{Phrase, PhraseProposer, dedupe_phrases};

/// Options for a highlighting run.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HighlightOptions {
    pub locate: LocateOptions,
    pub style: HighlightStyle,
    /// 0-based pages to process, in this order. `None` means every page.
    pub pages: Option<Vec<usize>>,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RunOutcome {
    /// Every selected page was processed.
    Complete,
    /// Cancelled before the page at position `pages_done` in the selection.
    Cancelled { pages_done: usize },
}

/// What happened to one proposed phrase on one page.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhraseOutcome {
    pub phrase: String,
    pub details: Option<String>,
    /// `false` when the phrase was too short or blank to search for.
    pub accepted: bool,
    pub occurrences: usize,
    pub rects: usize,
}

/// Per-page summary.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageReport {
    /// 0-based page index.
    pub page: usize,
    /// Number of runs in the page index, spacing runs included.
    pub run_count: usize,
    pub phrases: Vec<PhraseOutcome>,
    pub warnings: Vec<ExtractWarning>,
    /// No phrases were requested or the proposer failed.
    pub skipped: bool,
}

impl PageReport {
    fn new(page: usize, run_count: usize, warnings: Vec<ExtractWarning>) -> Self {
        Self {
            page,
            run_count,
            phrases: Vec::new(),
            warnings,
            skipped: false,
        }
    }

    /// Rectangles drawn on this page.
    pub fn rect_count(&self) -> usize {
        self.phrases.iter().map(|p| p.rects).sum()
    }
}

/// Summary of a highlighting run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HighlightReport {
    pub pages: Vec<PageReport>,
    pub outcome: RunOutcome,
}

impl HighlightReport {
    /// Total rectangles handed to the sink.
    pub fn total_rects(&self) -> usize {
        self.pages.iter().map(PageReport::rect_count).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.outcome == RunOutcome::Complete
    }

    /// All warnings, in page order.
    pub fn warnings(&self) -> impl Iterator<Item = &ExtractWarning> {
        self.pages.iter().flat_map(|p| p.warnings.iter())
    }

    /// Pages whose highlights were skipped.
    pub fn skipped_pages(&self) -> impl Iterator<Item = usize> + '_ {
        self.pages.iter().filter(|p| p.skipped).map(|p| p.page)
    }
}

/// Drives the highlighting pipeline over a document.
///
/// # Example
///
/// ```ignore
/// let doc = Document::open(&bytes, None)?;
/// let highlighter = Highlighter::new(FixedPhrases::new(["key finding"]));
/// let mut sink = CollectingSink::new();
/// let report = highlighter.run(&doc, &mut sink, &mut NoProgress)?;
/// println!("{} rectangles", report.total_rects());
/// ```
pub struct Highlighter {
    proposer: Box<dyn PhraseProposer>,
    options: HighlightOptions,
    cancel: CancelToken,
}

impl std::fmt::Debug for Highlighter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Highlighter")
            .field("options", &self.options)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Highlighter {
    pub fn new(proposer: impl PhraseProposer + 'static) -> Self {
        Self {
            proposer: Box::new(proposer),
            options: HighlightOptions::default(),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_options(mut self, options: HighlightOptions) -> Self {
        self.options = options;
        self
    }

    /// Share an existing cancellation token.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn options(&self) -> &HighlightOptions {
        &self.options
    }

    /// A handle that cancels this highlighter's runs.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Highlight the selected pages of `doc`.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::PageOutOfRange`] if the page selection names a
    /// page the document does not have, or any error the sink returns.
    pub fn run(
        &self,
        doc: &Document,
        sink: &mut dyn HighlightSink,
        progress: &mut dyn ProgressSink,
    ) -> Result<HighlightReport, PdfError> {
        let pages = self.selected_pages(doc.page_count())?;
        tracing::info!(pages = pages.len(), "highlighting document");

        #[cfg(feature = "parallel")]
        let report = {
            use std::collections::VecDeque;

            use rayon::prelude::*;

            // Index a bounded chunk ahead of the drive loop. A cancel stops
            // further chunks and each index is dropped once its page is done.
            let chunk = rayon::current_num_threads().max(1);
            let mut ready: VecDeque<Result<ExtractResult<PageIndex>, PdfError>> = VecDeque::new();
            self.drive(&pages, sink, progress, |pos, page| {
                if ready.is_empty() {
                    let end = (pos + chunk).min(pages.len());
                    let ahead = pages.get(pos..end).unwrap_or_default();
                    ready = ahead
                        .par_iter()
                        .map(|&p| doc.page_index(p))
                        .collect::<Vec<_>>()
                        .into();
                }
                ready.pop_front().unwrap_or_else(|| doc.page_index(page))
            })?
        };

        #[cfg(not(feature = "parallel"))]
        let report = self.drive(&pages, sink, progress, |_, page| doc.page_index(page))?;

        tracing::info!(
            rects = report.total_rects(),
            complete = report.is_complete(),
            "finished highlighting"
        );
        Ok(report)
    }

    /// Highlight pages given directly as raw items, one list per page.
    ///
    /// The page selection in the options applies to positions in `pages`.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::PageOutOfRange`] for a bad page selection, or
    /// any error the sink returns.
    pub fn run_items(
        &self,
        pages: Vec<Vec<RawTextItem>>,
        sink: &mut dyn HighlightSink,
        progress: &mut dyn ProgressSink,
    ) -> Result<HighlightReport, PdfError> {
        let selected = self.selected_pages(pages.len())?;
        let mut pages: Vec<Option<Vec<RawTextItem>>> = pages.into_iter().map(Some).collect();
        self.drive(&selected, sink, progress, |_, page| {
            let items = pages.get_mut(page).and_then(Option::take).unwrap_or_default();
            Ok(ExtractResult::ok(PageIndex::build(items)))
        })
    }

    /// The pages to process, in order. A page listed twice keeps its first
    /// position.
    fn selected_pages(&self, count: usize) -> Result<Vec<usize>, PdfError> {
        match &self.options.pages {
            None => Ok((0..count).collect()),
            Some(pages) => {
                if let Some(&index) = pages.iter().find(|&&p| p >= count) {
                    return Err(PdfError::PageOutOfRange { index, count });
                }
                let mut seen = vec![false; count];
                Ok(pages
                    .iter()
                    .copied()
                    .filter(|&p| !std::mem::replace(&mut seen[p], true))
                    .collect())
            }
        }
    }

    fn drive<L>(
        &self,
        pages: &[usize],
        sink: &mut dyn HighlightSink,
        progress: &mut dyn ProgressSink,
        mut load: L,
    ) -> Result<HighlightReport, PdfError>
    where
        L: FnMut(usize, usize) -> Result<ExtractResult<PageIndex>, PdfError>,
    {
        let n = pages.len();
        let mut reports = Vec::with_capacity(n);
        progress.report(ProgressStep::Extracting, 10);

        for (pos, &page) in pages.iter().enumerate() {
            if self.cancel.is_cancelled() {
                tracing::info!(pages_done = pos, "highlighting cancelled");
                return Ok(HighlightReport {
                    pages: reports,
                    outcome: RunOutcome::Cancelled { pages_done: pos },
                });
            }

            progress.report(ProgressStep::Analyzing, step_percent(pos, n));
            let ExtractResult { value: index, warnings } = load(pos, page)?;
            let report = self.highlight_page(page, &index, warnings, sink)?;
            tracing::debug!(
                page,
                runs = report.run_count,
                rects = report.rect_count(),
                skipped = report.skipped,
                "page done"
            );
            reports.push(report);
            progress.report(ProgressStep::Highlighting, step_percent(pos + 1, n));
        }

        progress.report(ProgressStep::Complete, 100);
        Ok(HighlightReport {
            pages: reports,
            outcome: RunOutcome::Complete,
        })
    }

    fn highlight_page(
        &self,
        page: usize,
        index: &PageIndex,
        warnings: Vec<ExtractWarning>,
        sink: &mut dyn HighlightSink,
    ) -> Result<PageReport, PdfError> {
        let mut report = PageReport::new(page, index.len(), warnings);
        if !index.has_content() {
            report.skipped = true;
            return Ok(report);
        }

        let phrases = match self.proposer.propose(index.text()) {
            Ok(phrases) => dedupe_phrases(phrases),
            Err(e) => {
                tracing::warn!(page, error = %e, "phrase proposal failed, skipping page");
                let code = if e.is_malformed() {
                    ExtractWarningCode::MalformedProposal
                } else {
                    ExtractWarningCode::ProposalFailed
                };
                report
                    .warnings
                    .push(ExtractWarning::with_code(code, e.to_string()).on_page(page));
                report.skipped = true;
                return Ok(report);
            }
        };

        for Phrase { text, details } in phrases {
            let accepted = self.options.locate.accepts(&text);
            let mut outcome = PhraseOutcome {
                phrase: text,
                details,
                accepted,
                occurrences: 0,
                rects: 0,
            };
            for occ in occurrences(index.text(), &outcome.phrase, &self.options.locate) {
                outcome.occurrences += 1;
                for rect in project(&occ, index, &self.options.style) {
                    sink.draw_rect(page, &rect)?;
                    outcome.rects += 1;
                }
            }
            tracing::debug!(
                page,
                phrase = %outcome.phrase,
                occurrences = outcome.occurrences,
                rects = outcome.rects,
                "phrase located"
            );
            report.phrases.push(outcome);
        }
        Ok(report)
    }
}

/// Progress after `done` of `total` pages: `10 + ⌊80·done/total⌋`.
fn step_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 90;
    }
    (10 + 80 * done / total) as u8
}
