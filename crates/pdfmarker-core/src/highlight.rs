//! Geometry projection: turn located occurrences into page-space rectangles.

use std::fmt;

use crate::index::PageIndex;
use crate::locate::Occurrence;

/// An RGB color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const YELLOW: Rgb = Rgb::new(1.0, 1.0, 0.0);

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .ok()
                .map(|v| f64::from(v) / 255.0)
        };
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Components as an array, in PDF operand order.
    pub fn to_array(&self) -> [f64; 3] {
        [self.r, self.g, self.b]
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::YELLOW
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let to_byte = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        write!(
            f,
            "#{:02x}{:02x}{:02x}",
            to_byte(self.r),
            to_byte(self.g),
            to_byte(self.b)
        )
    }
}

/// Appearance of drawn highlights.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HighlightStyle {
    /// Fill color (default: yellow).
    pub color: Rgb,
    /// Fill opacity in `0.0..=1.0` (default: 0.4).
    pub opacity: f64,
    /// Rectangle height as a multiple of the glyph height (default: 1.4).
    pub height_factor: f64,
    /// How far below the baseline the rectangle starts, as a fraction of
    /// the glyph height (default: 0.2).
    pub descender_ratio: f64,
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self {
            color: Rgb::YELLOW,
            opacity: 0.4,
            height_factor: 1.4,
            descender_ratio: 0.2,
        }
    }
}

/// A translucent rectangle in PDF page space (origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HighlightRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub opacity: f64,
    pub color: Rgb,
}

impl HighlightRect {
    /// Corners as `[x0, y0, x1, y1]` with `x0 <= x1` and `y0 <= y1`.
    pub fn bounds(&self) -> [f64; 4] {
        let (x0, x1) = min_max(self.x, self.x + self.width);
        let (y0, y1) = min_max(self.y, self.y + self.height);
        [x0, y0, x1, y1]
    }
}

fn min_max(a: f64, b: f64) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Project one occurrence onto the runs it covers.
///
/// Emits exactly one rectangle per non-spacing run overlapping the
/// occurrence, in reading order. Rectangles are never merged, so a phrase
/// spanning three runs yields three rectangles.
pub fn project(
    occurrence: &Occurrence,
    index: &PageIndex,
    style: &HighlightStyle,
) -> Vec<HighlightRect> {
    index
        .runs_overlapping(occurrence.start, occurrence.end)
        .map(|run| {
            let glyph_height = run.glyph_height();
            HighlightRect {
                x: run.x(),
                y: run.y() - glyph_height * style.descender_ratio,
                width: run.width,
                height: glyph_height * style.height_factor,
                opacity: style.opacity,
                color: style.color,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::{LocateOptions, locate};
    use crate::run::RawTextItem;

    fn cats() -> PageIndex {
        PageIndex::build(vec![
            RawTextItem::new("Cats", [12.0, 0.0, 0.0, 12.0, 72.0, 700.0], 26.0),
            RawTextItem::new("are", [12.0, 0.0, 0.0, 12.0, 101.0, 700.0], 18.0),
            RawTextItem::new("great", [12.0, 0.0, 0.0, 12.0, 122.0, 700.0], 30.0),
        ])
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn default_style() {
        let style = HighlightStyle::default();
        assert_eq!(style.color, Rgb::new(1.0, 1.0, 0.0));
        assert_eq!(style.opacity, 0.4);
        assert_eq!(style.height_factor, 1.4);
        assert_eq!(style.descender_ratio, 0.2);
    }

    #[test]
    fn phrase_over_two_runs_gives_two_rects() {
        let index = cats();
        let occ = Occurrence { start: 5, end: 14 };
        let rects = project(&occ, &index, &HighlightStyle::default());
        assert_eq!(rects.len(), 2);

        assert_eq!(rects[0].x, 101.0);
        assert!(approx(rects[0].y, 700.0 - 12.0 * 0.2));
        assert_eq!(rects[0].width, 18.0);
        assert!(approx(rects[0].height, 12.0 * 1.4));

        assert_eq!(rects[1].x, 122.0);
        assert_eq!(rects[1].width, 30.0);
    }

    #[test]
    fn scenario_end_to_end() {
        let index = cats();
        let opts = LocateOptions {
            min_phrase_chars: 5,
        };
        let occs = locate(index.text(), "are great", &opts);
        let rects: Vec<HighlightRect> = occs
            .iter()
            .flat_map(|o| project(o, &index, &HighlightStyle::default()))
            .collect();
        assert_eq!(rects.len(), 2);
    }

    #[test]
    fn partial_run_is_highlighted_whole() {
        let index = cats();
        // "at" inside "Cats"
        let occ = Occurrence { start: 1, end: 3 };
        let rects = project(&occ, &index, &HighlightStyle::default());
        assert_eq!(rects.len(), 1);
        assert_eq!(rects[0].x, 72.0);
        assert_eq!(rects[0].width, 26.0);
    }

    #[test]
    fn spacing_runs_are_not_projected() {
        let index = PageIndex::build(vec![
            RawTextItem::new("one", [10.0, 0.0, 0.0, 10.0, 0.0, 0.0], 15.0),
            RawTextItem::new("   ", [10.0, 0.0, 0.0, 10.0, 15.0, 0.0], 7.5),
            RawTextItem::marker([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]),
            RawTextItem::new("two", [10.0, 0.0, 0.0, 10.0, 25.0, 0.0], 15.0),
        ]);
        let occ = Occurrence {
            start: 0,
            end: index.text().len() - 1,
        };
        let rects = project(&occ, &index, &HighlightStyle::default());
        assert_eq!(rects.len(), 2);
        assert_eq!(rects[1].x, 25.0);
    }

    #[test]
    fn style_flows_into_rects() {
        let style = HighlightStyle {
            color: Rgb::new(0.0, 1.0, 0.0),
            opacity: 0.7,
            height_factor: 1.0,
            descender_ratio: 0.0,
        };
        let rects = project(&Occurrence { start: 0, end: 4 }, &cats(), &style);
        assert_eq!(rects[0].y, 700.0);
        assert_eq!(rects[0].height, 12.0);
        assert_eq!(rects[0].opacity, 0.7);
        assert_eq!(rects[0].color, Rgb::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn rgb_from_hex() {
        assert_eq!(Rgb::from_hex("#ffff00"), Some(Rgb::YELLOW));
        assert_eq!(Rgb::from_hex("00ff00"), Some(Rgb::new(0.0, 1.0, 0.0)));
        assert_eq!(Rgb::from_hex("#fff"), None);
        assert_eq!(Rgb::from_hex("#gg0000"), None);
        assert_eq!(Rgb::from_hex("#ééé"), None);
    }

    #[test]
    fn rgb_display() {
        assert_eq!(Rgb::YELLOW.to_string(), "#ffff00");
    }

    #[test]
    fn bounds_normalize_negative_extent() {
        let rect = HighlightRect {
            x: 10.0,
            y: 10.0,
            width: -5.0,
            height: 2.0,
            opacity: 0.4,
            color: Rgb::YELLOW,
        };
        assert_eq!(rect.bounds(), [5.0, 10.0, 10.0, 12.0]);
    }
}
