//! Font handling for text runs: glyph widths and text decoding.
//!
//! Simple fonts read `/FirstChar`, `/Widths` and the descriptor's
//! `/MissingWidth`, or the AFM table of a standard 14 `/BaseFont` when
//! `/Widths` is absent. Type0 fonts use two-byte codes with the descendant's
//! `/W` array and `/DW`. Text is decoded through lopdf's font encoding
//! (which covers `/ToUnicode`), falling back to UTF-16BE or Latin-1.

use std::collections::HashMap;

use lopdf::{Document, Encoding, Object};

use crate::standard_fonts::{WidthTable, standard_widths};

/// Width used when a font carries no width information, in glyph units.
pub const DEFAULT_GLYPH_WIDTH: f64 = 600.0;

/// Default `/DW` for CID fonts.
const DEFAULT_CID_WIDTH: f64 = 1000.0;

/// Glyph widths in glyph space units (1/1000 of text space).
#[derive(Debug, Clone, PartialEq)]
pub enum GlyphWidths {
    /// Single-byte font with a `/Widths` array starting at `first_char`.
    Simple {
        first_char: u32,
        widths: Vec<f64>,
        missing_width: f64,
    },
    /// Standard 14 font without `/Widths`, measured from its AFM table.
    Standard(&'static WidthTable),
    /// CID font with explicit widths and a default.
    Composite {
        widths: HashMap<u32, f64>,
        default_width: f64,
    },
    /// No width information; every glyph uses [`DEFAULT_GLYPH_WIDTH`].
    Unknown,
}

impl GlyphWidths {
    /// Width of one character code.
    pub fn width(&self, code: u32) -> f64 {
        match self {
            GlyphWidths::Simple {
                first_char,
                widths,
                missing_width,
            } => code
                .checked_sub(*first_char)
                .and_then(|i| widths.get(i as usize))
                .copied()
                .unwrap_or(*missing_width),
            GlyphWidths::Composite {
                widths,
                default_width,
            } => widths.get(&code).copied().unwrap_or(*default_width),
            GlyphWidths::Standard(table) => table
                .get(code as usize)
                .map_or(DEFAULT_GLYPH_WIDTH, |&w| f64::from(w)),
            GlyphWidths::Unknown => DEFAULT_GLYPH_WIDTH,
        }
    }
}

/// A font resource prepared for showing text.
pub struct LoadedFont<'a> {
    pub widths: GlyphWidths,
    /// Whether character codes are two bytes wide (Type0 fonts).
    pub two_byte: bool,
    encoding: Option<Encoding<'a>>,
}

impl std::fmt::Debug for LoadedFont<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedFont")
            .field("widths", &self.widths)
            .field("two_byte", &self.two_byte)
            .field("has_encoding", &self.encoding.is_some())
            .finish()
    }
}

impl<'a> LoadedFont<'a> {
    /// Prepare a font from its dictionary.
    pub fn load(doc: &'a Document, font_dict: &'a lopdf::Dictionary) -> Self {
        let two_byte = is_type0_font(font_dict);
        let widths = if two_byte {
            descendant_font(doc, font_dict)
                .map(|d| composite_widths(doc, d))
                .unwrap_or(GlyphWidths::Unknown)
        } else {
            simple_widths(doc, font_dict)
        };

        Self {
            widths,
            two_byte,
            encoding: font_dict.get_font_encoding(doc).ok(),
        }
    }

    /// A placeholder for a font that could not be found.
    pub fn missing() -> Self {
        Self {
            widths: GlyphWidths::Unknown,
            two_byte: false,
            encoding: None,
        }
    }

    /// Whether this font has no width information.
    pub fn lacks_widths(&self) -> bool {
        self.widths == GlyphWidths::Unknown
    }

    /// Split a string operand into character codes.
    pub fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        if self.two_byte {
            bytes
                .chunks(2)
                .map(|pair| match pair {
                    [hi, lo] => (u32::from(*hi) << 8) | u32::from(*lo),
                    [single] => u32::from(*single),
                    _ => 0,
                })
                .collect()
        } else {
            bytes.iter().map(|&b| u32::from(b)).collect()
        }
    }

    /// Decode a string operand to text.
    ///
    /// Returns the text and whether a fallback decoding had to be used.
    pub fn decode(&self, bytes: &[u8]) -> (String, bool) {
        if let Some(encoding) = &self.encoding {
            if let Ok(text) = Document::decode_text(encoding, bytes) {
                return (text, false);
            }
        }
        (fallback_decode(bytes), true)
    }
}

/// Decode bytes without font information: UTF-16BE when a BOM is present,
/// Latin-1 otherwise.
pub fn fallback_decode(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| char::from(b)).collect()
}

pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(*f as f64),
        _ => None,
    }
}

fn is_type0_font(font_dict: &lopdf::Dictionary) -> bool {
    font_dict
        .get(b"Subtype")
        .ok()
        .and_then(|o| o.as_name().ok())
        .is_some_and(|s| s == b"Type0")
}

fn descendant_font<'a>(
    doc: &'a Document,
    type0_dict: &'a lopdf::Dictionary,
) -> Option<&'a lopdf::Dictionary> {
    let descendants = resolve(doc, type0_dict.get(b"DescendantFonts").ok()?);
    let first = resolve(doc, descendants.as_array().ok()?.first()?);
    first.as_dict().ok()
}

fn simple_widths(doc: &Document, font_dict: &lopdf::Dictionary) -> GlyphWidths {
    let Some(arr) = font_dict
        .get(b"Widths")
        .ok()
        .and_then(|o| resolve(doc, o).as_array().ok())
    else {
        return font_dict
            .get(b"BaseFont")
            .ok()
            .and_then(|o| o.as_name().ok())
            .and_then(|name| standard_widths(&String::from_utf8_lossy(name)))
            .map_or(GlyphWidths::Unknown, GlyphWidths::Standard);
    };
    let widths: Vec<f64> = arr
        .iter()
        .map(|o| number(resolve(doc, o)).unwrap_or(0.0))
        .collect();

    let first_char = font_dict
        .get(b"FirstChar")
        .ok()
        .and_then(|o| number(resolve(doc, o)))
        .map_or(0, |v| v.max(0.0) as u32);

    let missing_width = font_dict
        .get(b"FontDescriptor")
        .ok()
        .and_then(|o| resolve(doc, o).as_dict().ok())
        .and_then(|d| d.get(b"MissingWidth").ok())
        .and_then(|o| number(resolve(doc, o)))
        .unwrap_or(DEFAULT_GLYPH_WIDTH);

    GlyphWidths::Simple {
        first_char,
        widths,
        missing_width,
    }
}

fn composite_widths(doc: &Document, cid_font: &lopdf::Dictionary) -> GlyphWidths {
    let default_width = cid_font
        .get(b"DW")
        .ok()
        .and_then(|o| number(resolve(doc, o)))
        .unwrap_or(DEFAULT_CID_WIDTH);

    let widths = cid_font
        .get(b"W")
        .ok()
        .and_then(|o| resolve(doc, o).as_array().ok())
        .map(|arr| parse_w_array(doc, arr))
        .unwrap_or_default();

    GlyphWidths::Composite {
        widths,
        default_width,
    }
}

/// Parse a CID `/W` array: entries are either `c [w1 w2 ...]` or
/// `c_first c_last w`.
fn parse_w_array(doc: &Document, objects: &[Object]) -> HashMap<u32, f64> {
    let mut widths = HashMap::new();
    let mut i = 0;

    while i < objects.len() {
        let Some(start) = number(resolve(doc, &objects[i])).map(|v| v as u32) else {
            i += 1;
            continue;
        };
        let Some(next) = objects.get(i + 1).map(|o| resolve(doc, o)) else {
            break;
        };

        if let Ok(arr) = next.as_array() {
            for (j, w) in arr.iter().enumerate() {
                if let Some(w) = number(resolve(doc, w)) {
                    widths.insert(start + j as u32, w);
                }
            }
            i += 2;
        } else if let Some(end) = number(next).map(|v| v as u32) {
            if let Some(w) = objects.get(i + 2).and_then(|o| number(resolve(doc, o))) {
                for cid in start..=end {
                    widths.insert(cid, w);
                }
            }
            i += 3;
        } else {
            i += 2;
        }
    }

    widths
}
