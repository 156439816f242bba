//! PDF parsing backend trait.
//!
//! Defines the [`PdfBackend`] trait that abstracts the PDF operations the
//! highlighter needs: open a document, enumerate pages, and interpret a
//! page's content into positioned text items.

use pdfmarker_core::{ExtractOptions, PdfError};

use crate::handler::RunHandler;

/// Trait abstracting PDF parsing operations.
///
/// # Associated Types
///
/// - `Document`: The parsed PDF document representation.
/// - `Page`: A reference to a single page within a document.
/// - `Error`: Backend-specific error type, convertible to [`PdfError`].
///
/// # Usage
///
/// ```ignore
/// let doc = MyBackend::open(pdf_bytes)?;
/// let page = MyBackend::get_page(&doc, 0)?;
/// MyBackend::interpret_page(&doc, &page, &mut handler, &options)?;
/// ```
pub trait PdfBackend {
    /// The parsed PDF document type.
    type Document;

    /// A reference to a single page within a document.
    type Page;

    /// Backend-specific error type, convertible to [`PdfError`].
    type Error: std::error::Error + Into<PdfError>;

    /// Parse PDF bytes into a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid PDF, or the document
    /// is encrypted.
    fn open(bytes: &[u8]) -> Result<Self::Document, Self::Error>;

    /// Return the number of pages in the document.
    fn page_count(doc: &Self::Document) -> usize;

    /// Access a page by 0-based index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range.
    fn get_page(doc: &Self::Document, index: usize) -> Result<Self::Page, Self::Error>;

    /// Interpret the page's content stream, emitting text items to `handler`
    /// in content stream order.
    ///
    /// # Errors
    ///
    /// Returns an error if the content stream cannot be decoded or Form
    /// XObjects nest deeper than `options.max_recursion_depth`.
    fn interpret_page(
        doc: &Self::Document,
        page: &Self::Page,
        handler: &mut dyn RunHandler,
        options: &ExtractOptions,
    ) -> Result<(), Self::Error>;
}
