//! Text and graphics state for the content stream interpreter.
//!
//! Implements the parts of the PDF state model that position text: the
//! CTM stack (`q`, `Q`, `cm`), text object tracking (`BT`/`ET`), font
//! selection (`Tf`), the text and line matrices (`Tm`, `Td`, `TD`, `T*`)
//! and the text state parameters `Tc`, `Tw`, `Tz`, `TL`, `Ts`.

use pdfmarker_core::Ctm;

/// Text state parameters saved and restored by `q`/`Q`.
///
/// Excludes the text and line matrices, which only live inside a text
/// object.
#[derive(Debug, Clone, PartialEq)]
pub struct TextParams {
    /// Character spacing (Tc).
    pub char_spacing: f64,
    /// Word spacing (Tw), applied to single-byte code 32.
    pub word_spacing: f64,
    /// Horizontal scaling (Tz) as a percentage, 100 = normal.
    pub h_scaling: f64,
    /// Text leading (TL).
    pub leading: f64,
    /// Font resource name selected by Tf.
    pub font_name: String,
    /// Font size selected by Tf.
    pub font_size: f64,
    /// Text rise (Ts).
    pub rise: f64,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scaling: 100.0,
            leading: 0.0,
            font_name: String::new(),
            font_size: 0.0,
            rise: 0.0,
        }
    }
}

impl TextParams {
    /// Horizontal scaling as a fraction (1.0 = 100%).
    pub fn h_scaling_normalized(&self) -> f64 {
        self.h_scaling / 100.0
    }
}

/// Interpreter state: CTM, text parameters and the `q`/`Q` stack.
#[derive(Debug, Clone, Default)]
pub struct TextState {
    pub params: TextParams,
    ctm: Ctm,
    text_matrix: Ctm,
    line_matrix: Ctm,
    stack: Vec<(Ctm, TextParams)>,
}

impl TextState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ctm(&self) -> &Ctm {
        &self.ctm
    }

    pub fn text_matrix(&self) -> &Ctm {
        &self.text_matrix
    }

    pub fn line_matrix(&self) -> &Ctm {
        &self.line_matrix
    }

    // --- graphics state ---

    /// `q`: push the CTM and text parameters.
    pub fn save(&mut self) {
        self.stack.push((self.ctm, self.params.clone()));
    }

    /// `Q`: pop the last saved state. Unbalanced `Q` is ignored.
    pub fn restore(&mut self) -> bool {
        match self.stack.pop() {
            Some((ctm, params)) => {
                self.ctm = ctm;
                self.params = params;
                true
            }
            None => false,
        }
    }

    /// `cm`: pre-multiply the CTM.
    pub fn concat_ctm(&mut self, m: Ctm) {
        self.ctm = m.concat(&self.ctm);
    }

    // --- text object ---

    /// `BT`: reset the text and line matrices.
    pub fn begin_text(&mut self) {
        self.text_matrix = Ctm::identity();
        self.line_matrix = Ctm::identity();
    }

    /// `Tf`.
    pub fn set_font(&mut self, font_name: String, font_size: f64) {
        self.params.font_name = font_name;
        self.params.font_size = font_size;
    }

    /// `Tm`: replace both matrices.
    pub fn set_text_matrix(&mut self, m: Ctm) {
        self.text_matrix = m;
        self.line_matrix = m;
    }

    /// `Td`: move to the start of the next line, offset from the current one.
    pub fn move_text_position(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Ctm::translation(tx, ty).concat(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    /// `TD`: same as `-ty TL` followed by `tx ty Td`.
    pub fn move_text_position_and_set_leading(&mut self, tx: f64, ty: f64) {
        self.params.leading = -ty;
        self.move_text_position(tx, ty);
    }

    /// `T*`: same as `0 -TL Td`.
    pub fn move_to_next_line(&mut self) {
        let leading = self.params.leading;
        self.move_text_position(0.0, -leading);
    }

    /// Advance the text matrix by a horizontal displacement in text space.
    pub fn advance(&mut self, tx: f64) {
        self.text_matrix = Ctm::translation(tx, 0.0).concat(&self.text_matrix);
    }

    /// Text rendering matrix at the current position:
    /// `[size·Th, 0, 0, size, 0, rise] × Tm × CTM`.
    pub fn rendering_matrix(&self) -> Ctm {
        let p = &self.params;
        let font = Ctm::new(
            p.font_size * p.h_scaling_normalized(),
            0.0,
            0.0,
            p.font_size,
            0.0,
            p.rise,
        );
        font.concat(&self.text_matrix).concat(&self.ctm)
    }

    /// Scale from text space to page space along the baseline.
    pub fn text_to_page_scale(&self) -> f64 {
        self.text_matrix.concat(&self.ctm).horizontal_scale()
    }
}
