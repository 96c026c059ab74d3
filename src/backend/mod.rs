//! # Drawing Backend
//!
//! The primitives layout and drawing need from a document backend: text
//! measurement and splitting, page management, paint state and drawing
//! operations, and final serialization.
//!
//! Two implementations ship with the crate: [`pdf::PdfBackend`] writes real
//! PDF, [`recording::RecordingBackend`] uses fixed-width metrics and records
//! every call, which keeps layout tests independent of font tables.
//!
//! Coordinates are page-local points with y growing downwards. `draw_text`
//! takes the top of the line box as its y.

pub mod pdf;
pub mod recording;

use crate::error::Result;
use crate::model::{Metadata, PageSize};
use crate::style::{Color, HAlign, Style, StyleState};

pub use pdf::PdfBackend;
pub use recording::RecordingBackend;

/// Measured size of a piece of text in the current font.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextExtent {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintMode {
    Fill,
    Stroke,
    FillStroke,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Unknown,
}

impl ImageFormat {
    /// Guess the format from a data URI prefix or a file extension.
    pub fn from_source(src: &str) -> Self {
        let lower = src.trim().to_ascii_lowercase();
        if lower.starts_with("data:image/jpeg") || lower.starts_with("data:image/jpg") {
            return ImageFormat::Jpeg;
        }
        if lower.starts_with("data:image/png") {
            return ImageFormat::Png;
        }
        if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
            ImageFormat::Jpeg
        } else if lower.ends_with(".png") {
            ImageFormat::Png
        } else {
            ImageFormat::Unknown
        }
    }
}

/// Options for a single `draw_text` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextOptions {
    /// Leading draws from x; trailing ends at x; center is centered on x.
    pub align: HAlign,
    /// Line width to fill when justifying.
    pub max_width: Option<f64>,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            align: HAlign::Leading,
            max_width: None,
        }
    }
}

pub trait Backend {
    /// Open a new document with one empty page.
    fn create_document(size: PageSize) -> Self
    where
        Self: Sized;

    fn set_metadata(&mut self, _metadata: &Metadata) {}

    // ── Pages ──────────────────────────────────────────────────

    fn page_width(&self) -> f64;
    fn page_height(&self) -> f64;
    fn add_page(&mut self);
    /// Select the page (1-based) subsequent drawing goes to.
    fn set_current_page(&mut self, page: usize);
    fn page_count(&self) -> usize;

    // ── Paint state ────────────────────────────────────────────

    fn style_state(&self) -> StyleState;
    fn apply_style(&mut self, state: &StyleState);

    fn font_size(&self) -> f64 {
        self.style_state().font_size
    }

    /// Line height as a multiple of the font size.
    fn line_height_factor(&self) -> f64;

    fn set_fill_color(&mut self, color: Color) {
        let mut state = self.style_state();
        state.fill_color = color;
        self.apply_style(&state);
    }

    fn set_stroke_color(&mut self, color: Color) {
        let mut state = self.style_state();
        state.stroke_color = color;
        self.apply_style(&state);
    }

    fn set_line_width(&mut self, width: f64) {
        let mut state = self.style_state();
        state.line_width = width;
        self.apply_style(&state);
    }

    /// Fill and stroke alpha until the next graphics-state restore.
    fn set_opacity(&mut self, alpha: f64);
    fn save_graphics_state(&mut self);
    fn restore_graphics_state(&mut self);

    // ── Measurement ────────────────────────────────────────────

    fn measure_text_dimensions(&self, text: &str) -> TextExtent;
    /// Advance of one character at font size 1.
    fn string_unit_width(&self, ch: char) -> f64;
    fn split_text_to_width(&self, text: &str, width: f64) -> Vec<String>;

    // ── Drawing ────────────────────────────────────────────────

    fn draw_text(&mut self, text: &str, x: f64, y: f64, options: &TextOptions);
    fn draw_rect(&mut self, x: f64, y: f64, w: f64, h: f64, mode: PaintMode);
    #[allow(clippy::too_many_arguments)]
    fn draw_rounded_rect(&mut self, x: f64, y: f64, w: f64, h: f64, rx: f64, ry: f64, mode: PaintMode);
    /// `data` is whatever the node's source holds: a path, data URI or base64.
    fn add_image(&mut self, data: &str, format: ImageFormat, x: f64, y: f64, w: f64, h: f64)
        -> Result<()>;
    fn add_link(&mut self, x: f64, y: f64, w: f64, h: f64, url: &str);

    /// Serialize the document.
    fn finish(&mut self) -> Result<Vec<u8>>;
}

/// Restores the paint state that was current before a node's style was applied.
#[must_use = "the saved style must be restored"]
#[derive(Debug)]
pub struct StyleToken {
    saved: StyleState,
}

impl StyleToken {
    pub fn restore<B: Backend + ?Sized>(self, backend: &mut B) {
        backend.apply_style(&self.saved);
    }
}

/// Apply a node's draw-affecting style on top of the current state.
pub fn push_style<B: Backend + ?Sized>(backend: &mut B, style: &Style) -> StyleToken {
    let saved = backend.style_state();
    let next = style.overlay(&saved);
    if next != saved {
        backend.apply_style(&next);
    }
    StyleToken { saved }
}
