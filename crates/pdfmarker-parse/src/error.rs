//! Error types for the parsing, interpreter and writer layers.
//!
//! Uses [`thiserror`] for error derivation. Provides [`BackendError`]
//! that wraps backend-specific errors and converts them to [`PdfError`].

use pdfmarker_core::PdfError;
use thiserror::Error;

/// Error type for PDF backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Error from PDF parsing (structure, syntax, object resolution).
    #[error("PDF parse error: {0}")]
    Parse(String),

    /// Error reading or writing PDF data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error resolving font or encoding information.
    #[error("font error: {0}")]
    Font(String),

    /// Error during content stream interpretation.
    #[error("interpreter error: {0}")]
    Interpreter(String),

    /// Form XObjects nested past the configured recursion limit.
    #[error("resource limit reached: {0}")]
    ResourceLimit(String),

    /// Error writing highlights into the document.
    #[error("write error: {0}")]
    Write(String),

    /// A core library error.
    #[error(transparent)]
    Core(#[from] PdfError),
}

impl From<BackendError> for PdfError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Parse(msg) => PdfError::ParseError(msg),
            BackendError::Io(e) => PdfError::IoError(e.to_string()),
            BackendError::Font(msg) => PdfError::FontError(msg),
            BackendError::Interpreter(msg) | BackendError::ResourceLimit(msg) => {
                PdfError::InterpreterError(msg)
            }
            BackendError::Write(msg) => PdfError::WriteError(msg),
            BackendError::Core(e) => e,
        }
    }
}
