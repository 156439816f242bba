//! Error and warning types for pdfmarker.
//!
//! Provides [`PdfError`] for fatal errors that stop processing a document,
//! [`ExtractWarning`] for non-fatal issues that allow best-effort
//! continuation, [`ExtractResult`] for pairing a value with collected
//! warnings, and [`ExtractOptions`] for configuring the content interpreter.

use std::fmt;

/// Fatal error types for PDF processing.
///
/// Only whole-document failures are fatal; page-level problems are
/// reported as [`ExtractWarning`]s instead.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfError {
    /// Error parsing PDF structure or syntax.
    ParseError(String),
    /// I/O error reading or writing PDF data.
    IoError(String),
    /// Error resolving font or encoding information.
    FontError(String),
    /// Error during content stream interpretation.
    InterpreterError(String),
    /// The PDF is encrypted and requires a password to open.
    PasswordRequired,
    /// The document enumerates no pages.
    NoPages,
    /// A page index outside the document was requested.
    PageOutOfRange {
        /// The requested 0-based index.
        index: usize,
        /// Number of pages in the document.
        count: usize,
    },
    /// Error writing highlights into the output document.
    WriteError(String),
    /// Any other error not covered by specific variants.
    Other(String),
}

impl fmt::Display for PdfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfError::ParseError(msg) => write!(f, "parse error: {msg}"),
            PdfError::IoError(msg) => write!(f, "I/O error: {msg}"),
            PdfError::FontError(msg) => write!(f, "font error: {msg}"),
            PdfError::InterpreterError(msg) => write!(f, "interpreter error: {msg}"),
            PdfError::PasswordRequired => write!(f, "PDF is encrypted and requires a password"),
            PdfError::NoPages => write!(f, "PDF contains no pages"),
            PdfError::PageOutOfRange { index, count } => write!(
                f,
                "page index {index} out of range (document has {count} pages)"
            ),
            PdfError::WriteError(msg) => write!(f, "write error: {msg}"),
            PdfError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for PdfError {}

impl From<std::io::Error> for PdfError {
    fn from(err: std::io::Error) -> Self {
        PdfError::IoError(err.to_string())
    }
}

/// Machine-readable warning code for categorizing non-fatal issues.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type", content = "detail")
)]
pub enum ExtractWarningCode {
    /// A referenced font was not found, or carries no usable widths.
    MissingFont,
    /// Character decoding fell back to a default mapping.
    EncodingFallback,
    /// A PDF object is malformed or has unexpected structure.
    MalformedObject,
    /// A configured resource limit was reached during extraction.
    ResourceLimitReached,
    /// The page produced no text runs.
    NoTextRuns,
    /// The phrase collaborator failed for this page.
    ProposalFailed,
    /// The phrase collaborator returned output that could not be parsed.
    MalformedProposal,
    /// Any other warning not covered by specific variants.
    Other(String),
}

impl ExtractWarningCode {
    /// Returns the string tag for this warning code.
    pub fn as_str(&self) -> &str {
        match self {
            ExtractWarningCode::MissingFont => "MISSING_FONT",
            ExtractWarningCode::EncodingFallback => "ENCODING_FALLBACK",
            ExtractWarningCode::MalformedObject => "MALFORMED_OBJECT",
            ExtractWarningCode::ResourceLimitReached => "RESOURCE_LIMIT_REACHED",
            ExtractWarningCode::NoTextRuns => "NO_TEXT_RUNS",
            ExtractWarningCode::ProposalFailed => "PROPOSAL_FAILED",
            ExtractWarningCode::MalformedProposal => "MALFORMED_PROPOSAL",
            ExtractWarningCode::Other(_) => "OTHER",
        }
    }
}

impl fmt::Display for ExtractWarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal warning encountered while processing a page.
///
/// Carries a structured [`code`](ExtractWarning::code), a human-readable
/// description, and optional page, operator and font context.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtractWarning {
    /// Machine-readable warning code.
    pub code: ExtractWarningCode,
    /// Human-readable description of the warning.
    pub description: String,
    /// Page where the warning occurred (0-indexed), if applicable.
    pub page: Option<usize>,
    /// Index of the content stream operator involved, if applicable.
    pub operator_index: Option<usize>,
    /// Font resource name involved, if applicable.
    pub font_name: Option<String>,
}

impl ExtractWarning {
    /// Create a warning with just a description.
    ///
    /// Uses [`ExtractWarningCode::Other`] as the default code.
    pub fn new(description: impl Into<String>) -> Self {
        let desc = description.into();
        Self::with_code(ExtractWarningCode::Other(desc.clone()), desc)
    }

    /// Create a warning with a specific code and description.
    pub fn with_code(code: ExtractWarningCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            page: None,
            operator_index: None,
            font_name: None,
        }
    }

    /// Create a warning with operator and font context.
    pub fn with_operator_context(
        description: impl Into<String>,
        operator_index: usize,
        font_name: impl Into<String>,
    ) -> Self {
        let mut w = Self::new(description);
        w.operator_index = Some(operator_index);
        w.font_name = Some(font_name.into());
        w
    }

    /// Set the warning code (builder pattern).
    pub fn set_code(mut self, code: ExtractWarningCode) -> Self {
        self.code = code;
        self
    }

    /// Attach a page index (builder pattern).
    pub fn on_page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }
}

impl fmt::Display for ExtractWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.description)?;
        if let Some(page) = self.page {
            write!(f, " (page {page})")?;
        }
        if let Some(ref font_name) = self.font_name {
            write!(f, " [font {font_name}]")?;
        }
        if let Some(index) = self.operator_index {
            write!(f, " [operator #{index}]")?;
        }
        Ok(())
    }
}

/// Result wrapper that pairs a value with collected warnings.
#[derive(Debug, Clone)]
pub struct ExtractResult<T> {
    /// The extracted value.
    pub value: T,
    /// Warnings collected during extraction.
    pub warnings: Vec<ExtractWarning>,
}

impl<T> ExtractResult<T> {
    /// Create a result with no warnings.
    pub fn ok(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    /// Create a result with warnings.
    pub fn with_warnings(value: T, warnings: Vec<ExtractWarning>) -> Self {
        Self { value, warnings }
    }

    /// Returns true if there are no warnings.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Transform the value while preserving warnings.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ExtractResult<U> {
        ExtractResult {
            value: f(self.value),
            warnings: self.warnings,
        }
    }
}

/// Options controlling content stream interpretation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtractOptions {
    /// Maximum nesting depth for Form XObjects (default: 10).
    pub max_recursion_depth: usize,
    /// Whether to collect warnings during extraction (default: true).
    pub collect_warnings: bool,
    /// `TJ` adjustment, in thousandths of text space, below which a space
    /// is inserted into the item text (default: -250).
    pub tj_space_threshold: f64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_recursion_depth: 10,
            collect_warnings: true,
            tj_space_threshold: -250.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_error_display() {
        assert_eq!(
            PdfError::ParseError("invalid xref".to_string()).to_string(),
            "parse error: invalid xref"
        );
        assert_eq!(
            PdfError::IoError("file not found".to_string()).to_string(),
            "I/O error: file not found"
        );
        assert_eq!(
            PdfError::WriteError("bad object".to_string()).to_string(),
            "write error: bad object"
        );
        assert_eq!(
            PdfError::Other("something went wrong".to_string()).to_string(),
            "something went wrong"
        );
    }

    #[test]
    fn pdf_error_structural_variants() {
        assert_eq!(
            PdfError::PasswordRequired.to_string(),
            "PDF is encrypted and requires a password"
        );
        assert_eq!(PdfError::NoPages.to_string(), "PDF contains no pages");
        assert_eq!(
            PdfError::PageOutOfRange { index: 7, count: 3 }.to_string(),
            "page index 7 out of range (document has 3 pages)"
        );
    }

    #[test]
    fn pdf_error_implements_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(PdfError::ParseError("test".to_string()));
        assert_eq!(err.to_string(), "parse error: test");
    }

    #[test]
    fn pdf_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let pdf_err: PdfError = io_err.into();
        assert!(matches!(pdf_err, PdfError::IoError(_)));
        assert!(pdf_err.to_string().contains("missing file"));
    }

    #[test]
    fn warning_new_defaults_to_other() {
        let w = ExtractWarning::new("missing font metrics");
        assert!(matches!(w.code, ExtractWarningCode::Other(_)));
        assert_eq!(w.page, None);
        assert_eq!(w.to_string(), "[OTHER] missing font metrics");
    }

    #[test]
    fn warning_builders_chain() {
        let w = ExtractWarning::new("model timed out")
            .set_code(ExtractWarningCode::ProposalFailed)
            .on_page(2);
        assert_eq!(w.code, ExtractWarningCode::ProposalFailed);
        assert_eq!(w.to_string(), "[PROPOSAL_FAILED] model timed out (page 2)");
    }

    #[test]
    fn warning_with_operator_context() {
        let w =
            ExtractWarning::with_operator_context("font not found in resources", 5, "F1")
                .set_code(ExtractWarningCode::MissingFont);
        assert_eq!(w.operator_index, Some(5));
        assert_eq!(w.font_name.as_deref(), Some("F1"));
        assert_eq!(
            w.to_string(),
            "[MISSING_FONT] font not found in resources [font F1] [operator #5]"
        );
    }

    #[test]
    fn warning_code_tags() {
        assert_eq!(ExtractWarningCode::EncodingFallback.as_str(), "ENCODING_FALLBACK");
        assert_eq!(ExtractWarningCode::NoTextRuns.as_str(), "NO_TEXT_RUNS");
        assert_eq!(
            ExtractWarningCode::MalformedProposal.as_str(),
            "MALFORMED_PROPOSAL"
        );
        assert_eq!(format!("{}", ExtractWarningCode::Other("x".into())), "OTHER");
    }

    #[test]
    fn extract_result_map_preserves_warnings() {
        let result = ExtractResult::with_warnings(10, vec![ExtractWarning::new("test")]);
        assert!(!result.is_clean());
        let mapped = result.map(|v| v * 2);
        assert_eq!(mapped.value, 20);
        assert_eq!(mapped.warnings.len(), 1);
        assert!(ExtractResult::ok(()).is_clean());
    }

    #[test]
    fn extract_options_default_values() {
        let opts = ExtractOptions::default();
        assert_eq!(opts.max_recursion_depth, 10);
        assert!(opts.collect_warnings);
        assert_eq!(opts.tj_space_threshold, -250.0);
    }
}
