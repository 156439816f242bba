//! pdfmarker-parse: lopdf backend for pdfmarker.
//!
//! Interprets page content streams into positioned text items (one per
//! text-showing operation) and writes highlight rectangles back into the
//! document. It depends on pdfmarker-core for shared data types.

pub mod backend;
pub mod error;
pub mod fonts;
pub mod handler;
mod interpreter;
pub mod lopdf_backend;
pub mod standard_fonts;
pub mod text_state;
pub mod writer;

pub use backend::PdfBackend;
pub use error::BackendError;
pub use fonts::{DEFAULT_GLYPH_WIDTH, GlyphWidths, LoadedFont};
pub use handler::{ItemCollector, RunHandler};
pub use lopdf_backend::{LopdfBackend, LopdfDocument, LopdfPage};
pub use standard_fonts::standard_widths;
pub use pdfmarker_core;
pub use text_state::{TextParams, TextState};
pub use writer::{HighlightMode, HighlightWriter};
