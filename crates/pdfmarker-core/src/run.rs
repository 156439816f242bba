//! Positioned text runs: the raw per-page input and its indexed form.

/// One positioned text item as delivered by a page text-layer extractor.
///
/// `text` is `None` for items that carry no textual content (e.g. marked
/// content markers). Such items are indexed as empty spacing runs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawTextItem {
    /// Text content, if any. Accepts `str` as an alias when deserializing.
    #[cfg_attr(feature = "serde", serde(default, alias = "str"))]
    pub text: Option<String>,
    /// Text rendering matrix `[a, b, c, d, x, y]` in page space.
    pub transform: [f64; 6],
    /// Advance width in page units.
    #[cfg_attr(feature = "serde", serde(default))]
    pub width: f64,
}

impl RawTextItem {
    /// Create an item with text content.
    pub fn new(text: impl Into<String>, transform: [f64; 6], width: f64) -> Self {
        Self {
            text: Some(text.into()),
            transform,
            width,
        }
    }

    /// Create an item without textual content.
    pub fn marker(transform: [f64; 6]) -> Self {
        Self {
            text: None,
            transform,
            width: 0.0,
        }
    }
}

/// One run of page text with its span in the page's flattened string.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextRun {
    /// The run's text (possibly empty or whitespace only).
    pub text: String,
    /// Text rendering matrix `[a, b, c, d, x, y]`. `x, y` is the baseline
    /// origin and `d` approximates the glyph height.
    pub transform: [f64; 6],
    /// Advance width in page units.
    pub width: f64,
    /// Byte offset of the first byte of `text` in the flattened string.
    pub start: usize,
    /// Byte offset one past the last byte of `text`.
    pub end: usize,
}

impl TextRun {
    /// Whether this run only contributes spacing (empty or whitespace only).
    ///
    /// Spacing runs keep their span in the flattened string but are never
    /// projected into highlight rectangles.
    pub fn is_spacing(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Baseline origin x.
    pub fn x(&self) -> f64 {
        self.transform[4]
    }

    /// Baseline origin y.
    pub fn y(&self) -> f64 {
        self.transform[5]
    }

    /// Nominal glyph height (the `d` component of the transform).
    pub fn glyph_height(&self) -> f64 {
        self.transform[3]
    }

    /// Whether the run's span overlaps `[start, end)`.
    ///
    /// True when the run starts inside the range, ends inside it, or
    /// encloses it.
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        (self.start >= start && self.start < end)
            || (self.end > start && self.end <= end)
            || (self.start <= start && self.end >= end)
    }
}
