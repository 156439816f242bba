//! Content stream interpreter producing positioned text items.
//!
//! Walks the operators of a decoded content stream, tracks the graphics and
//! text state, and emits one [`RawTextItem`] per text-showing operation
//! through a [`RunHandler`]. Form XObjects are interpreted recursively with
//! their own resources.

use std::collections::HashMap;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object};
use pdfmarker_core::{Ctm, ExtractOptions, ExtractWarning, ExtractWarningCode, RawTextItem};

use crate::error::BackendError;
use crate::fonts::{LoadedFont, number, resolve};
use crate::handler::RunHandler;
use crate::lopdf_backend::decode_content_stream;
use crate::text_state::TextState;

/// One element of a text-showing operation.
enum ShowPart<'o> {
    Text(&'o [u8]),
    /// `TJ` adjustment in thousandths of text space.
    Adjust(f64),
}

/// Per-stream interpreter context.
struct Interpreter<'a, 'h> {
    doc: &'a Document,
    resources: &'a Dictionary,
    handler: &'h mut dyn RunHandler,
    options: &'h ExtractOptions,
    depth: usize,
    fonts: HashMap<String, LoadedFont<'a>>,
    fallback_reported: bool,
}

/// Interpret a content stream, emitting items through `handler`.
///
/// # Arguments
///
/// * `doc` - The lopdf document (for resolving references)
/// * `stream_bytes` - Decoded content stream bytes
/// * `resources` - Resources dictionary for this scope
/// * `handler` - Item callback handler
/// * `options` - Recursion limit and text options
/// * `depth` - Current Form XObject nesting depth (0 for page-level)
/// * `state` - Current graphics and text state
pub(crate) fn interpret_content_stream<'a>(
    doc: &'a Document,
    stream_bytes: &[u8],
    resources: &'a Dictionary,
    handler: &mut dyn RunHandler,
    options: &ExtractOptions,
    depth: usize,
    state: &mut TextState,
) -> Result<(), BackendError> {
    if depth > options.max_recursion_depth {
        return Err(BackendError::ResourceLimit(format!(
            "Form XObject recursion depth {} exceeds limit {}",
            depth, options.max_recursion_depth
        )));
    }

    let content = Content::decode(stream_bytes)
        .map_err(|e| BackendError::Interpreter(format!("failed to decode content stream: {e}")))?;

    let mut interp = Interpreter {
        doc,
        resources,
        handler,
        options,
        depth,
        fonts: HashMap::new(),
        fallback_reported: false,
    };

    for (op_index, op) in content.operations.iter().enumerate() {
        let operands = &op.operands;
        match op.operator.as_str() {
            "q" => state.save(),
            "Q" => {
                state.restore();
            }
            "cm" => {
                if let Some(m) = matrix(operands) {
                    state.concat_ctm(m);
                }
            }
            "BT" => state.begin_text(),
            "Tf" => {
                if let (Some(Object::Name(name)), Some(size)) =
                    (operands.first(), operands.get(1).and_then(number))
                {
                    state.set_font(String::from_utf8_lossy(name).into_owned(), size);
                }
            }
            "Tm" => {
                if let Some(m) = matrix(operands) {
                    state.set_text_matrix(m);
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (num(operands, 0), num(operands, 1)) {
                    state.move_text_position(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (num(operands, 0), num(operands, 1)) {
                    state.move_text_position_and_set_leading(tx, ty);
                }
            }
            "T*" => state.move_to_next_line(),
            "TL" => set_param(operands, &mut state.params.leading),
            "Tc" => set_param(operands, &mut state.params.char_spacing),
            "Tw" => set_param(operands, &mut state.params.word_spacing),
            "Tz" => set_param(operands, &mut state.params.h_scaling),
            "Ts" => set_param(operands, &mut state.params.rise),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    interp.show(state, op_index, &[ShowPart::Text(bytes)]);
                }
            }
            "'" => {
                state.move_to_next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    interp.show(state, op_index, &[ShowPart::Text(bytes)]);
                }
            }
            "\"" => {
                set_param(operands, &mut state.params.word_spacing);
                if let Some(ac) = num(operands, 1) {
                    state.params.char_spacing = ac;
                }
                state.move_to_next_line();
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    interp.show(state, op_index, &[ShowPart::Text(bytes)]);
                }
            }
            "TJ" => {
                if let Some(Object::Array(arr)) = operands.first() {
                    let parts: Vec<ShowPart<'_>> = arr
                        .iter()
                        .filter_map(|o| match o {
                            Object::String(bytes, _) => Some(ShowPart::Text(bytes)),
                            other => number(other).map(ShowPart::Adjust),
                        })
                        .collect();
                    interp.show(state, op_index, &parts);
                }
            }
            "Do" => {
                if let Some(Object::Name(name)) = operands.first() {
                    interp.handle_do(state, &String::from_utf8_lossy(name))?;
                }
            }
            _ => {}
        }
    }

    Ok(())
}

impl<'a> Interpreter<'a, '_> {
    fn warn(&mut self, warning: ExtractWarning) {
        #[cfg(feature = "tracing")]
        tracing::debug!(%warning, "interpreter warning");
        self.handler.on_warning(warning);
    }

    /// Look up the current font, loading it on first use.
    fn ensure_font(&mut self, name: &str, op_index: usize) {
        if self.fonts.contains_key(name) {
            return;
        }
        let font = match lookup_font(self.doc, self.resources, name) {
            Some(dict) => {
                let font = LoadedFont::load(self.doc, dict);
                if font.lacks_widths() {
                    self.warn(
                        ExtractWarning::with_operator_context(
                            "font has no glyph widths; using default width",
                            op_index,
                            name,
                        )
                        .set_code(ExtractWarningCode::MissingFont),
                    );
                }
                font
            }
            None => {
                self.warn(
                    ExtractWarning::with_operator_context(
                        "font not found in resources",
                        op_index,
                        name,
                    )
                    .set_code(ExtractWarningCode::MissingFont),
                );
                LoadedFont::missing()
            }
        };
        self.fonts.insert(name.to_string(), font);
    }

    /// Show text and emit one item covering the whole operation.
    fn show(&mut self, state: &mut TextState, op_index: usize, parts: &[ShowPart<'_>]) {
        let font_name = state.params.font_name.clone();
        self.ensure_font(&font_name, op_index);

        let origin = state.rendering_matrix();
        let scale = state.text_to_page_scale();
        let params = &state.params;
        let size = params.font_size;
        let th = params.h_scaling_normalized();

        let mut text = String::new();
        let mut advance = 0.0;
        let mut fell_back = false;

        if let Some(font) = self.fonts.get(&font_name) {
            for part in parts {
                match part {
                    ShowPart::Text(bytes) => {
                        let (decoded, fallback) = font.decode(bytes);
                        fell_back |= fallback;
                        text.push_str(&decoded);
                        for code in font.codes(bytes) {
                            let mut tx = font.widths.width(code) / 1000.0 * size
                                + params.char_spacing;
                            if !font.two_byte && code == 32 {
                                tx += params.word_spacing;
                            }
                            advance += tx * th;
                        }
                    }
                    ShowPart::Adjust(adj) => {
                        advance -= adj / 1000.0 * size * th;
                        if *adj < self.options.tj_space_threshold
                            && !text.is_empty()
                            && !text.ends_with(' ')
                        {
                            text.push(' ');
                        }
                    }
                }
            }
        }

        if fell_back && !self.fallback_reported {
            self.fallback_reported = true;
            self.warn(
                ExtractWarning::with_operator_context(
                    "font encoding unavailable; decoded text with fallback mapping",
                    op_index,
                    font_name.as_str(),
                )
                .set_code(ExtractWarningCode::EncodingFallback),
            );
        }

        state.advance(advance);
        self.handler
            .on_item(RawTextItem::new(text, origin.to_array(), advance * scale));
    }

    fn handle_do(&mut self, state: &mut TextState, name: &str) -> Result<(), BackendError> {
        let Some(stream) = lookup_xobject(self.doc, self.resources, name) else {
            self.warn(
                ExtractWarning::new(format!("XObject /{name} not found in resources"))
                    .set_code(ExtractWarningCode::MalformedObject),
            );
            return Ok(());
        };

        let is_form = stream
            .dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .is_some_and(|s| s == b"Form");
        if !is_form {
            return Ok(());
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(xobject = name, depth = self.depth + 1, "entering form");

        let bytes = decode_content_stream(stream).map_err(|e| {
            BackendError::Interpreter(format!("failed to decode Form XObject /{name}: {e}"))
        })?;

        let form_resources = stream
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|o| resolve(self.doc, o).as_dict().ok())
            .unwrap_or(self.resources);

        state.save();
        if let Some(m) = stream
            .dict
            .get(b"Matrix")
            .ok()
            .and_then(|o| o.as_array().ok())
            .and_then(|arr| matrix(arr))
        {
            state.concat_ctm(m);
        }

        let result = interpret_content_stream(
            self.doc,
            &bytes,
            form_resources,
            &mut *self.handler,
            self.options,
            self.depth + 1,
            state,
        );
        state.restore();
        result
    }
}

fn lookup_font<'a>(
    doc: &'a Document,
    resources: &'a Dictionary,
    name: &str,
) -> Option<&'a Dictionary> {
    let fonts = resolve(doc, resources.get(b"Font").ok()?).as_dict().ok()?;
    resolve(doc, fonts.get(name.as_bytes()).ok()?).as_dict().ok()
}

fn lookup_xobject<'a>(
    doc: &'a Document,
    resources: &'a Dictionary,
    name: &str,
) -> Option<&'a lopdf::Stream> {
    let xobjects = resolve(doc, resources.get(b"XObject").ok()?).as_dict().ok()?;
    resolve(doc, xobjects.get(name.as_bytes()).ok()?).as_stream().ok()
}

fn num(operands: &[Object], index: usize) -> Option<f64> {
    operands.get(index).and_then(number)
}

fn set_param(operands: &[Object], target: &mut f64) {
    if let Some(v) = num(operands, 0) {
        *target = v;
    }
}

fn matrix(operands: &[Object]) -> Option<Ctm> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = [0.0; 6];
    for (slot, obj) in m.iter_mut().zip(operands) {
        *slot = number(obj)?;
    }
    Some(Ctm::from_array(m))
}
