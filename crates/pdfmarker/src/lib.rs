//! pdfmarker: highlight the phrases a model picks, right where they sit on the page.
//!
//! This is the public API facade crate for pdfmarker. It re-exports types from
//! pdfmarker-core and uses pdfmarker-parse for PDF reading and writing.
//!
//! # Architecture
//!
//! - **pdfmarker-core**: Backend-independent runs, page index, locator and projector
//! - **pdfmarker-parse**: lopdf content stream interpreter and highlight writer
//! - **pdfmarker** (this crate): [`Document`], phrase proposers and the [`Highlighter`]

mod document;
mod highlighter;
#[cfg(feature = "ollama")]
mod ollama;
mod proposer;

pub use document::Document;
pub use highlighter::{
    HighlightOptions, HighlightReport, Highlighter, PageReport, PhraseOutcome, RunOutcome,
};
#[cfg(feature = "ollama")]
pub use ollama::{DEFAULT_ENDPOINT, DEFAULT_MODEL, OllamaConfig, OllamaProposer, build_prompt};
pub use proposer::{
    FixedPhrases, Phrase, PhraseProposer, ProposalError, dedupe_phrases, parse_phrase_response,
};

pub use pdfmarker_core::{
    CancelToken, CollectingSink, Ctm, ExtractOptions, ExtractResult, ExtractWarning,
    ExtractWarningCode, HighlightRect, HighlightSink, HighlightStyle, LocateOptions, NoProgress,
    Occurrence, PageIndex, PdfError, ProgressSink, ProgressStep, RawTextItem, Rgb, TextRun,
    locate, project,
};
pub use pdfmarker_parse::{HighlightMode, HighlightWriter};

pub use pdfmarker_core;
pub use pdfmarker_parse;
