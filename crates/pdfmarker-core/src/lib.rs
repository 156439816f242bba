//! pdfmarker-core: Backend-independent data types and algorithms.
//!
//! This crate provides the text-to-geometry reconciliation engine used by
//! pdfmarker: positioned text runs, the per-page [`PageIndex`], verbatim
//! phrase location, and projection of located phrases into highlight
//! rectangles. It knows nothing about PDF syntax; the parse crate feeds it
//! [`RawTextItem`]s and a [`HighlightSink`] receives its output.

pub mod error;
pub mod geometry;
pub mod highlight;
pub mod index;
pub mod locate;
pub mod run;
pub mod sink;

pub use error::{ExtractOptions, ExtractResult, ExtractWarning, ExtractWarningCode, PdfError};
pub use geometry::Ctm;
pub use highlight::{HighlightRect, HighlightStyle, Rgb, project};
pub use index::{PageIndex, RUN_SEPARATOR};
pub use locate::{LocateOptions, Occurrence, Occurrences, locate, occurrences};
pub use run::{RawTextItem, TextRun};
pub use sink::{
    CancelToken, CollectingSink, HighlightSink, NoProgress, ProgressSink, ProgressStep,
};
