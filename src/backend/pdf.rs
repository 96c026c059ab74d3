//! The PDF backend: draws with the standard fonts into per-page content
//! streams and hands the result to [`crate::pdf::PdfWriter`].

use std::collections::HashMap;
use std::fmt::Write as FmtWrite;

use super::{Backend, ImageFormat, PaintMode, TextExtent, TextOptions};
use crate::error::Result;
use crate::font::{StandardFont, StandardFontMetrics};
use crate::image_loader::load_image;
use crate::model::{Metadata, PageSize};
use crate::pdf::{encode_winansi, rounded_rect_path, LinkAnnotation, PageContent, PdfDocument, PdfWriter};
use crate::style::{Color, HAlign, StyleState};
use crate::text::break_lines;

pub const LINE_HEIGHT_FACTOR: f64 = 1.15;

const TAB: &str = "        ";

pub struct PdfBackend {
    document: PdfDocument,
    current: usize,
    state: StyleState,
    /// Font index per standard font, in first-use order.
    font_slots: HashMap<StandardFont, usize>,
    /// Image index per source string, so repeated images embed once.
    image_slots: HashMap<String, usize>,
    /// Opacity state per alpha in thousandths.
    opacity_slots: HashMap<u32, usize>,
    /// Open `q` operators per page; unbalanced ones are closed on finish.
    depth: Vec<usize>,
}

impl PdfBackend {
    fn font(&self) -> StandardFont {
        StandardFont::resolve(&self.state.font_family, self.state.font_weight)
    }

    fn metrics(&self) -> StandardFontMetrics {
        self.font().metrics()
    }

    fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let metrics = self.metrics();
        match ch {
            '\t' => metrics.char_width(' ', font_size) * TAB.len() as f64,
            _ => metrics.char_width(ch, font_size),
        }
    }

    fn page(&mut self) -> &mut PageContent {
        &mut self.document.pages[self.current]
    }

    fn font_slot(&mut self, font: StandardFont) -> usize {
        let next = self.document.fonts.len();
        let slot = *self.font_slots.entry(font).or_insert(next);
        if slot == next {
            self.document.fonts.push(font);
        }
        slot
    }

    fn opacity_slot(&mut self, alpha: f64) -> usize {
        let key = (alpha.clamp(0.0, 1.0) * 1000.0).round() as u32;
        let next = self.document.opacities.len();
        let slot = *self.opacity_slots.entry(key).or_insert(next);
        if slot == next {
            self.document.opacities.push(key as f64 / 1000.0);
        }
        slot
    }

    fn write_color(out: &mut String, color: Color, op: &str) {
        let _ = writeln!(out, "{:.3} {:.3} {:.3} {}", color.r, color.g, color.b, op);
    }
}

impl Backend for PdfBackend {
    fn create_document(size: PageSize) -> Self {
        let (width, height) = size.dimensions();
        Self {
            document: PdfDocument {
                pages: vec![PageContent::new(width, height)],
                ..Default::default()
            },
            current: 0,
            state: StyleState::default(),
            font_slots: HashMap::new(),
            image_slots: HashMap::new(),
            opacity_slots: HashMap::new(),
            depth: vec![0],
        }
    }

    fn set_metadata(&mut self, metadata: &Metadata) {
        self.document.metadata = metadata.clone();
    }

    fn page_width(&self) -> f64 {
        self.document.pages[self.current].width
    }

    fn page_height(&self) -> f64 {
        self.document.pages[self.current].height
    }

    fn add_page(&mut self) {
        let (width, height) = (self.page_width(), self.page_height());
        self.document.pages.push(PageContent::new(width, height));
        self.depth.push(0);
        self.current = self.document.pages.len() - 1;
    }

    fn set_current_page(&mut self, page: usize) {
        self.current = page.clamp(1, self.document.pages.len()) - 1;
    }

    fn page_count(&self) -> usize {
        self.document.pages.len()
    }

    fn style_state(&self) -> StyleState {
        self.state.clone()
    }

    fn apply_style(&mut self, state: &StyleState) {
        self.state = state.clone();
    }

    fn line_height_factor(&self) -> f64 {
        LINE_HEIGHT_FACTOR
    }

    fn set_opacity(&mut self, alpha: f64) {
        let slot = self.opacity_slot(alpha);
        let page = self.page();
        page.states.insert(slot);
        let _ = writeln!(page.content, "/GS{slot} gs");
    }

    fn save_graphics_state(&mut self) {
        self.depth[self.current] += 1;
        self.page().content.push_str("q\n");
    }

    fn restore_graphics_state(&mut self) {
        if self.depth[self.current] == 0 {
            log::warn!("graphics state restore without a matching save");
            return;
        }
        self.depth[self.current] -= 1;
        self.page().content.push_str("Q\n");
    }

    fn measure_text_dimensions(&self, text: &str) -> TextExtent {
        let font_size = self.state.font_size;
        let lines: Vec<&str> = text.split('\n').collect();
        let width = lines
            .iter()
            .map(|line| line.chars().map(|ch| self.char_width(ch, font_size)).sum::<f64>())
            .fold(0.0, f64::max);
        TextExtent {
            width,
            height: lines.len() as f64 * font_size * LINE_HEIGHT_FACTOR,
        }
    }

    fn string_unit_width(&self, ch: char) -> f64 {
        self.char_width(ch, 1.0)
    }

    fn split_text_to_width(&self, text: &str, width: f64) -> Vec<String> {
        let font_size = self.state.font_size;
        break_lines(text, width, |ch| self.char_width(ch, font_size))
    }

    fn draw_text(&mut self, text: &str, x: f64, y: f64, options: &TextOptions) {
        let text = text.replace('\t', TAB);
        let font = self.font();
        let metrics = font.metrics();
        let font_size = self.state.font_size;
        let color = self.state.text_color;
        let width = metrics.measure_string(&text, font_size);

        let mut word_spacing = 0.0;
        let left = match options.align {
            HAlign::Leading => x,
            HAlign::Center => x - width / 2.0,
            HAlign::Trailing => x - width,
            HAlign::Justify => {
                let spaces = text.trim_end().matches(' ').count();
                if let Some(max_width) = options.max_width {
                    if spaces > 0 && max_width > width {
                        word_spacing = (max_width - width) / spaces as f64;
                    }
                }
                x
            }
        };
        let baseline = self.page_height() - y - metrics.ascender as f64 / 1000.0 * font_size;

        let slot = self.font_slot(font);
        let gs = (!color.is_opaque()).then(|| self.opacity_slot(color.a));
        let page = self.page();
        page.fonts.insert(slot);
        let out = &mut page.content;
        if let Some(gs) = gs {
            page.states.insert(gs);
            let _ = writeln!(out, "q\n/GS{gs} gs");
        }
        out.push_str("BT\n");
        Self::write_color(out, color, "rg");
        let _ = writeln!(out, "/F{slot} {font_size:.2} Tf");
        if word_spacing > 0.0 {
            let _ = writeln!(out, "{word_spacing:.3} Tw");
        }
        let _ = writeln!(out, "{left:.2} {baseline:.2} Td");
        let _ = writeln!(out, "({}) Tj", encode_winansi(&text));
        if word_spacing > 0.0 {
            // Word spacing is graphics state and would leak into later text.
            out.push_str("0 Tw\n");
        }
        out.push_str("ET\n");
        if gs.is_some() {
            out.push_str("Q\n");
        }
    }

    fn draw_rect(&mut self, x: f64, y: f64, w: f64, h: f64, mode: PaintMode) {
        let state = self.state.clone();
        let bottom = self.page_height() - y - h;
        let out = &mut self.page().content;
        out.push_str("q\n");
        paint_setup(out, &state, mode);
        let _ = writeln!(out, "{x:.2} {bottom:.2} {w:.2} {h:.2} re");
        out.push_str(paint_operator(mode));
        out.push_str("Q\n");
    }

    fn draw_rounded_rect(&mut self, x: f64, y: f64, w: f64, h: f64, rx: f64, ry: f64, mode: PaintMode) {
        let state = self.state.clone();
        let bottom = self.page_height() - y - h;
        let out = &mut self.page().content;
        out.push_str("q\n");
        paint_setup(out, &state, mode);
        rounded_rect_path(out, x, bottom, w, h, rx, ry);
        out.push_str(paint_operator(mode));
        out.push_str("Q\n");
    }

    fn add_image(&mut self, data: &str, format: ImageFormat, x: f64, y: f64, w: f64, h: f64) -> Result<()> {
        let slot = match self.image_slots.get(data) {
            Some(&slot) => slot,
            None => {
                let image = load_image(data, format)?;
                log::debug!("embedding {}x{} image", image.width_px, image.height_px);
                self.document.images.push(image);
                let slot = self.document.images.len() - 1;
                self.image_slots.insert(data.to_string(), slot);
                slot
            }
        };
        let bottom = self.page_height() - y - h;
        let page = self.page();
        page.images.insert(slot);
        let _ = writeln!(page.content, "q\n{w:.2} 0 0 {h:.2} {x:.2} {bottom:.2} cm\n/Im{slot} Do\nQ");
        Ok(())
    }

    fn add_link(&mut self, x: f64, y: f64, w: f64, h: f64, url: &str) {
        let top = self.page_height() - y;
        self.page().links.push(LinkAnnotation {
            rect: [x, top - h, x + w, top],
            uri: url.to_string(),
        });
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        for (page, open) in self.document.pages.iter_mut().zip(self.depth.iter_mut()) {
            while *open > 0 {
                page.content.push_str("Q\n");
                *open -= 1;
            }
        }
        let bytes = PdfWriter::write(&self.document);
        log::debug!("serialized {} pages into {} bytes", self.document.pages.len(), bytes.len());
        Ok(bytes)
    }
}

fn paint_setup(out: &mut String, state: &StyleState, mode: PaintMode) {
    if matches!(mode, PaintMode::Fill | PaintMode::FillStroke) {
        PdfBackend::write_color(out, state.fill_color, "rg");
    }
    if matches!(mode, PaintMode::Stroke | PaintMode::FillStroke) {
        PdfBackend::write_color(out, state.stroke_color, "RG");
        let _ = writeln!(out, "{:.2} w", state.line_width);
    }
}

fn paint_operator(mode: PaintMode) -> &'static str {
    match mode {
        PaintMode::Fill => "f\n",
        PaintMode::Stroke => "S\n",
        PaintMode::FillStroke => "B\n",
    }
}
