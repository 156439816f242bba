//! Writes highlight rectangles back into a PDF document.
//!
//! [`HighlightWriter`] is a [`HighlightSink`] that buffers rectangles per
//! page and applies them to a copy of the document on [`HighlightWriter::finish`].

use std::collections::BTreeMap;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object, ObjectId, Stream, dictionary};
use pdfmarker_core::{HighlightRect, HighlightSink, PdfError};

use crate::backend::PdfBackend;
use crate::error::BackendError;
use crate::lopdf_backend::{LopdfBackend, LopdfDocument, get_page_resources};

/// How rectangles are written into the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HighlightMode {
    /// Paint translucent rectangles over the page content.
    #[default]
    Overlay,
    /// Add `/Highlight` markup annotations.
    Annotation,
}

/// Prefix for ExtGState resource names added by the overlay writer.
const GS_PREFIX: &str = "PMgs";

/// A sink that writes rectangles into a lopdf document.
///
/// # Example
///
/// ```ignore
/// let mut writer = HighlightWriter::from_bytes(&pdf_bytes, HighlightMode::Overlay)?;
/// writer.draw_rect(0, &rect)?;
/// let highlighted: Vec<u8> = writer.finish()?;
/// ```
pub struct HighlightWriter {
    doc: lopdf::Document,
    page_ids: Vec<ObjectId>,
    mode: HighlightMode,
    pending: BTreeMap<usize, Vec<HighlightRect>>,
}

impl HighlightWriter {
    /// Wrap an already opened document.
    pub fn new(doc: LopdfDocument, mode: HighlightMode) -> Self {
        let page_ids = doc.page_ids().to_vec();
        Self {
            doc: doc.into_inner(),
            page_ids,
            mode,
            pending: BTreeMap::new(),
        }
    }

    /// Open `bytes` and wrap the result.
    pub fn from_bytes(bytes: &[u8], mode: HighlightMode) -> Result<Self, BackendError> {
        Ok(Self::new(LopdfBackend::open(bytes)?, mode))
    }

    pub fn mode(&self) -> HighlightMode {
        self.mode
    }

    /// Number of rectangles buffered so far.
    pub fn pending(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    /// Apply all buffered rectangles and serialize the document.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Write`] if a page dictionary cannot be
    /// updated or the document cannot be saved.
    pub fn finish(mut self) -> Result<Vec<u8>, BackendError> {
        let pending = std::mem::take(&mut self.pending);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            pages = pending.len(),
            mode = ?self.mode,
            "writing highlights"
        );

        for (page_index, rects) in &pending {
            let page_id = *self.page_ids.get(*page_index).ok_or(BackendError::Core(
                PdfError::PageOutOfRange {
                    index: *page_index,
                    count: self.page_ids.len(),
                },
            ))?;
            match self.mode {
                HighlightMode::Overlay => self.write_overlay(page_id, rects)?,
                HighlightMode::Annotation => self.write_annotations(page_id, rects)?,
            }
        }

        let mut buf = Vec::new();
        self.doc
            .save_to(&mut buf)
            .map_err(|e| BackendError::Write(format!("failed to save document: {e}")))?;
        Ok(buf)
    }

    fn write_overlay(
        &mut self,
        page_id: ObjectId,
        rects: &[HighlightRect],
    ) -> Result<(), BackendError> {
        let mut resources = get_page_resources(&self.doc, page_id)?.clone();
        let mut ext_gstates = match resources.get(b"ExtGState") {
            Ok(obj) => self.resolve_dict(obj)?,
            Err(_) => Dictionary::new(),
        };

        // one ExtGState per distinct opacity
        let mut states: Vec<(f64, Vec<u8>)> = Vec::new();
        let mut operations = vec![Operation::new("Q", vec![])];
        for rect in rects {
            let name = match states.iter().find(|(op, _)| *op == rect.opacity) {
                Some((_, name)) => name.clone(),
                None => {
                    let name = unused_name(&ext_gstates, states.len());
                    ext_gstates.set(
                        name.clone(),
                        dictionary! {
                            "Type" => "ExtGState",
                            "ca" => real(rect.opacity),
                            "CA" => real(rect.opacity),
                        },
                    );
                    states.push((rect.opacity, name.clone()));
                    name
                }
            };
            let [r, g, b] = rect.color.to_array();
            operations.extend([
                Operation::new("q", vec![]),
                Operation::new("gs", vec![Object::Name(name)]),
                Operation::new("rg", vec![real(r), real(g), real(b)]),
                Operation::new(
                    "re",
                    vec![
                        real(rect.x),
                        real(rect.y),
                        real(rect.width),
                        real(rect.height),
                    ],
                ),
                Operation::new("f", vec![]),
                Operation::new("Q", vec![]),
            ]);
        }
        resources.set("ExtGState", ext_gstates);

        let suffix = Content { operations }
            .encode()
            .map_err(|e| BackendError::Write(format!("failed to encode overlay: {e}")))?;

        let mut contents = self.existing_contents(page_id)?;
        let prefix_id = self.doc.add_object(Stream::new(dictionary! {}, b"q".to_vec()));
        let suffix_id = self.doc.add_object(Stream::new(dictionary! {}, suffix));
        contents.insert(0, Object::Reference(prefix_id));
        contents.push(Object::Reference(suffix_id));

        let page = self.page_dict_mut(page_id)?;
        page.set("Contents", contents);
        page.set("Resources", resources);
        Ok(())
    }

    fn write_annotations(
        &mut self,
        page_id: ObjectId,
        rects: &[HighlightRect],
    ) -> Result<(), BackendError> {
        let mut annots = match self.page_dict(page_id)?.get(b"Annots") {
            Ok(Object::Reference(id)) => self
                .doc
                .get_object(*id)
                .and_then(|o| o.as_array())
                .cloned()
                .map_err(|e| BackendError::Write(format!("invalid /Annots reference: {e}")))?,
            Ok(Object::Array(arr)) => arr.clone(),
            _ => Vec::new(),
        };

        for rect in rects {
            let [x0, y0, x1, y1] = rect.bounds();
            let [r, g, b] = rect.color.to_array();
            let annot_id = self.doc.add_object(dictionary! {
                "Type" => "Annot",
                "Subtype" => "Highlight",
                "Rect" => vec![real(x0), real(y0), real(x1), real(y1)],
                // upper-left, upper-right, lower-left, lower-right
                "QuadPoints" => vec![
                    real(x0), real(y1), real(x1), real(y1),
                    real(x0), real(y0), real(x1), real(y0),
                ],
                "C" => vec![real(r), real(g), real(b)],
                "CA" => real(rect.opacity),
                "F" => 4i64,
                "P" => page_id,
            });
            annots.push(Object::Reference(annot_id));
        }

        self.page_dict_mut(page_id)?.set("Annots", annots);
        Ok(())
    }

    /// The page's current `/Contents` as a list of stream references.
    fn existing_contents(&self, page_id: ObjectId) -> Result<Vec<Object>, BackendError> {
        match self.page_dict(page_id)?.get(b"Contents") {
            Ok(Object::Reference(id)) => match self.doc.get_object(*id) {
                Ok(Object::Array(arr)) => Ok(arr.clone()),
                Ok(_) => Ok(vec![Object::Reference(*id)]),
                Err(e) => Err(BackendError::Write(format!("failed to resolve /Contents: {e}"))),
            },
            Ok(Object::Array(arr)) => Ok(arr.clone()),
            Ok(_) => Err(BackendError::Write(
                "/Contents is not a reference or array".to_string(),
            )),
            Err(_) => Ok(Vec::new()),
        }
    }

    fn resolve_dict(&self, obj: &Object) -> Result<Dictionary, BackendError> {
        let obj = match obj {
            Object::Reference(id) => self
                .doc
                .get_object(*id)
                .map_err(|e| BackendError::Write(format!("failed to resolve reference: {e}")))?,
            other => other,
        };
        obj.as_dict()
            .cloned()
            .map_err(|e| BackendError::Write(format!("expected a dictionary: {e}")))
    }

    fn page_dict(&self, page_id: ObjectId) -> Result<&Dictionary, BackendError> {
        self.doc
            .get_object(page_id)
            .and_then(|o| o.as_dict())
            .map_err(|e| BackendError::Write(format!("failed to get page dictionary: {e}")))
    }

    fn page_dict_mut(&mut self, page_id: ObjectId) -> Result<&mut Dictionary, BackendError> {
        self.doc
            .get_object_mut(page_id)
            .and_then(|o| o.as_dict_mut())
            .map_err(|e| BackendError::Write(format!("failed to get page dictionary: {e}")))
    }
}

impl std::fmt::Debug for HighlightWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HighlightWriter")
            .field("mode", &self.mode)
            .field("page_count", &self.page_ids.len())
            .field("pending", &self.pending())
            .finish()
    }
}

impl HighlightSink for HighlightWriter {
    fn draw_rect(&mut self, page_index: usize, rect: &HighlightRect) -> Result<(), PdfError> {
        if page_index >= self.page_ids.len() {
            return Err(PdfError::PageOutOfRange {
                index: page_index,
                count: self.page_ids.len(),
            });
        }
        self.pending.entry(page_index).or_default().push(*rect);
        Ok(())
    }
}

fn real(v: f64) -> Object {
    (v as f32).into()
}

/// First `PMgs<n>` name, starting at `n`, not already present in `dict`.
fn unused_name(dict: &Dictionary, mut n: usize) -> Vec<u8> {
    loop {
        let name = format!("{GS_PREFIX}{n}").into_bytes();
        if !dict.has(&name) {
            return name;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfmarker_core::Rgb;

    fn create_test_pdf(page_count: usize) -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::new();
        for _ in 0..page_count {
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                b"BT /F1 12 Tf 72 700 Td (Hello) Tj ET".to_vec(),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut buf = Vec::new();
        doc.save_to(&mut buf).expect("failed to save test PDF");
        buf
    }

    fn rect(x: f64, opacity: f64) -> HighlightRect {
        HighlightRect {
            x,
            y: 697.6,
            width: 36.0,
            height: 16.8,
            opacity,
            color: Rgb::YELLOW,
        }
    }

    fn page_contents(bytes: &[u8], index: usize) -> (lopdf::Document, Vec<ObjectId>) {
        let doc = lopdf::Document::load_mem(bytes).unwrap();
        let page_id = *doc.get_pages().values().nth(index).unwrap();
        let ids = doc
            .get_object(page_id)
            .unwrap()
            .as_dict()
            .unwrap()
            .get(b"Contents")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o.as_reference().unwrap())
            .collect();
        (doc, ids)
    }

    fn stream_ops(doc: &lopdf::Document, id: ObjectId) -> Vec<String> {
        let stream = doc.get_object(id).unwrap().as_stream().unwrap();
        let bytes = stream.decompressed_content().unwrap_or(stream.content.clone());
        Content::decode(&bytes)
            .unwrap()
            .operations
            .into_iter()
            .map(|op| op.operator)
            .collect()
    }

    #[test]
    fn overlay_wraps_existing_content_and_adds_one_re_per_rect() {
        let bytes = create_test_pdf(2);
        let mut writer = HighlightWriter::from_bytes(&bytes, HighlightMode::Overlay).unwrap();
        writer.draw_rect(1, &rect(72.0, 0.4)).unwrap();
        writer.draw_rect(1, &rect(120.0, 0.4)).unwrap();
        assert_eq!(writer.pending(), 2);
        let out = writer.finish().unwrap();

        let (doc, ids) = page_contents(&out, 1);
        assert_eq!(doc.get_pages().len(), 2);
        assert_eq!(ids.len(), 3);
        assert_eq!(stream_ops(&doc, ids[0]), vec!["q"]);
        let suffix = stream_ops(&doc, ids[2]);
        assert_eq!(suffix[0], "Q");
        assert_eq!(suffix.iter().filter(|op| *op == "re").count(), 2);
        assert_eq!(suffix.iter().filter(|op| *op == "gs").count(), 2);
    }

    #[test]
    fn overlay_registers_ext_gstate_per_opacity() {
        let bytes = create_test_pdf(1);
        let mut writer = HighlightWriter::from_bytes(&bytes, HighlightMode::Overlay).unwrap();
        writer.draw_rect(0, &rect(72.0, 0.4)).unwrap();
        writer.draw_rect(0, &rect(90.0, 0.4)).unwrap();
        writer.draw_rect(0, &rect(120.0, 0.8)).unwrap();
        let out = writer.finish().unwrap();

        let doc = lopdf::Document::load_mem(&out).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let gs = resources.get(b"ExtGState").unwrap().as_dict().unwrap();
        assert_eq!(gs.len(), 2);
        let state = gs.get(b"PMgs0").unwrap().as_dict().unwrap();
        let ca = state.get(b"ca").unwrap().as_float().unwrap();
        assert!((ca - 0.4).abs() < 1e-6);
    }

    #[test]
    fn untouched_pages_keep_their_contents() {
        let bytes = create_test_pdf(2);
        let mut writer = HighlightWriter::from_bytes(&bytes, HighlightMode::Overlay).unwrap();
        writer.draw_rect(0, &rect(72.0, 0.4)).unwrap();
        let out = writer.finish().unwrap();

        let doc = lopdf::Document::load_mem(&out).unwrap();
        let page_id = *doc.get_pages().values().nth(1).unwrap();
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        assert!(page.get(b"Contents").unwrap().as_reference().is_ok());
    }

    #[test]
    fn annotation_mode_adds_highlight_annots() {
        let bytes = create_test_pdf(1);
        let mut writer = HighlightWriter::from_bytes(&bytes, HighlightMode::Annotation).unwrap();
        writer.draw_rect(0, &rect(72.0, 0.4)).unwrap();
        writer.draw_rect(0, &rect(120.0, 0.4)).unwrap();
        let out = writer.finish().unwrap();

        let doc = lopdf::Document::load_mem(&out).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let annots = page.get(b"Annots").unwrap().as_array().unwrap();
        assert_eq!(annots.len(), 2);

        let annot = doc
            .get_object(annots[0].as_reference().unwrap())
            .unwrap()
            .as_dict()
            .unwrap();
        assert_eq!(annot.get(b"Subtype").unwrap().as_name().unwrap(), b"Highlight");
        assert_eq!(annot.get(b"QuadPoints").unwrap().as_array().unwrap().len(), 8);
        assert_eq!(annot.get(b"C").unwrap().as_array().unwrap().len(), 3);
    }

    #[test]
    fn draw_rect_out_of_range_is_rejected() {
        let bytes = create_test_pdf(1);
        let mut writer = HighlightWriter::from_bytes(&bytes, HighlightMode::Overlay).unwrap();
        let err = writer.draw_rect(5, &rect(72.0, 0.4)).unwrap_err();
        assert_eq!(err, PdfError::PageOutOfRange { index: 5, count: 1 });
        assert_eq!(writer.pending(), 0);
    }

    #[test]
    fn finish_without_rects_round_trips() {
        let bytes = create_test_pdf(3);
        let writer = HighlightWriter::from_bytes(&bytes, HighlightMode::default()).unwrap();
        let out = writer.finish().unwrap();
        let doc = lopdf::Document::load_mem(&out).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn unused_name_skips_existing_entries() {
        let dict = dictionary! { "PMgs0" => dictionary! {}, "PMgs1" => dictionary! {} };
        assert_eq!(unused_name(&dict, 0), b"PMgs2".to_vec());
        assert_eq!(unused_name(&Dictionary::new(), 3), b"PMgs3".to_vec());
    }
}
