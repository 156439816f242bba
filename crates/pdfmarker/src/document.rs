//! Top-level PDF document type for opening and indexing pages.

use pdfmarker_core::{
    ExtractOptions, ExtractResult, ExtractWarning, ExtractWarningCode, PageIndex, PdfError,
    RawTextItem,
};
use pdfmarker_parse::{
    BackendError, HighlightMode, HighlightWriter, ItemCollector, LopdfBackend, LopdfDocument,
    PdfBackend,
};

/// A PDF document opened for highlighting.
///
/// # Example
///
/// ```ignore
/// let doc = Document::open(&bytes, None)?;
/// let page = doc.page_index(0)?;
/// println!("{}", page.value.text());
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    doc: LopdfDocument,
    options: ExtractOptions,
}

impl Document {
    /// Open a PDF document from a file path.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError`] if the file cannot be read or is not a valid PDF.
    pub fn open_file(
        path: impl AsRef<std::path::Path>,
        options: Option<ExtractOptions>,
    ) -> Result<Self, PdfError> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| PdfError::IoError(e.to_string()))?;
        Self::open(&bytes, options)
    }

    /// Open a PDF document from bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::PasswordRequired`] if the PDF is encrypted,
    /// [`PdfError::NoPages`] if it enumerates no pages, and
    /// [`PdfError::ParseError`] if the bytes are not a valid PDF document.
    pub fn open(bytes: &[u8], options: Option<ExtractOptions>) -> Result<Self, PdfError> {
        let doc = LopdfBackend::open(bytes).map_err(PdfError::from)?;
        if LopdfBackend::page_count(&doc) == 0 {
            return Err(PdfError::NoPages);
        }
        Ok(Self {
            doc,
            options: options.unwrap_or_default(),
        })
    }

    /// Return the number of pages in the document.
    pub fn page_count(&self) -> usize {
        LopdfBackend::page_count(&self.doc)
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Raw text items of a page, in content stream order.
    ///
    /// A page whose content cannot be interpreted yields no items and a
    /// warning; only an out-of-range index is an error.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::PageOutOfRange`] if `index` is not a page.
    pub fn page_items(&self, index: usize) -> Result<ExtractResult<Vec<RawTextItem>>, PdfError> {
        let page = LopdfBackend::get_page(&self.doc, index).map_err(PdfError::from)?;
        let mut collector = ItemCollector::new(self.options.collect_warnings);

        let interpreted =
            LopdfBackend::interpret_page(&self.doc, &page, &mut collector, &self.options);

        let ItemCollector {
            items,
            mut warnings,
            ..
        } = collector;
        for w in &mut warnings {
            w.page.get_or_insert(index);
        }

        match interpreted {
            Ok(()) => Ok(ExtractResult::with_warnings(items, warnings)),
            Err(e) => {
                tracing::warn!(page = index, error = %e, "page content could not be interpreted");
                if self.options.collect_warnings {
                    let code = match &e {
                        BackendError::ResourceLimit(_) => ExtractWarningCode::ResourceLimitReached,
                        _ => ExtractWarningCode::MalformedObject,
                    };
                    warnings.push(
                        ExtractWarning::with_code(
                            code,
                            format!("page content could not be interpreted: {e}"),
                        )
                        .on_page(index),
                    );
                }
                Ok(ExtractResult::with_warnings(Vec::new(), warnings))
            }
        }
    }

    /// Build the [`PageIndex`] of a page.
    ///
    /// Adds a [`ExtractWarningCode::NoTextRuns`] warning when the page has
    /// no highlightable text.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::PageOutOfRange`] if `index` is not a page.
    pub fn page_index(&self, index: usize) -> Result<ExtractResult<PageIndex>, PdfError> {
        let items = self.page_items(index)?;
        let mut result = items.map(PageIndex::build);
        if !result.value.has_content() && self.options.collect_warnings {
            result.warnings.push(
                ExtractWarning::with_code(ExtractWarningCode::NoTextRuns, "page has no text runs")
                    .on_page(index),
            );
        }
        Ok(result)
    }

    /// A writer over a copy of this document.
    pub fn highlight_writer(&self, mode: HighlightMode) -> HighlightWriter {
        HighlightWriter::new(self.doc.clone(), mode)
    }
}
