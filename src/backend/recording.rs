//! A deterministic backend that records draw calls.
//!
//! Every character is `UNIT_WIDTH` em wide and lines are `LINE_HEIGHT_FACTOR`
//! font sizes tall, so layout results can be computed by hand in tests.

use super::{Backend, ImageFormat, PaintMode, TextExtent, TextOptions};
use crate::error::Result;
use crate::model::{Metadata, PageSize};
use crate::style::{Color, HAlign, StyleState};
use std::fmt::Write as FmtWrite;

pub const UNIT_WIDTH: f64 = 0.5;
pub const LINE_HEIGHT_FACTOR: f64 = 1.2;
pub const DEFAULT_FONT_SIZE: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        page: usize,
        text: String,
        x: f64,
        y: f64,
        align: HAlign,
        font_size: f64,
        color: Color,
    },
    Rect {
        page: usize,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        mode: PaintMode,
        fill: Color,
    },
    RoundedRect {
        page: usize,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        radius: f64,
        mode: PaintMode,
    },
    Image {
        page: usize,
        src: String,
        format: ImageFormat,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
    },
    Link {
        page: usize,
        url: String,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
    },
    Opacity {
        page: usize,
        alpha: f64,
    },
}

impl DrawOp {
    pub fn page(&self) -> usize {
        match self {
            DrawOp::Text { page, .. }
            | DrawOp::Rect { page, .. }
            | DrawOp::RoundedRect { page, .. }
            | DrawOp::Image { page, .. }
            | DrawOp::Link { page, .. }
            | DrawOp::Opacity { page, .. } => *page,
        }
    }
}

#[derive(Debug)]
pub struct RecordingBackend {
    width: f64,
    height: f64,
    pages: usize,
    current_page: usize,
    state: StyleState,
    saved: Vec<StyleState>,
    pub ops: Vec<DrawOp>,
    pub metadata: Metadata,
}

impl RecordingBackend {
    /// Text drawn so far, in call order.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    fn char_width(&self) -> f64 {
        UNIT_WIDTH * self.state.font_size
    }
}

impl Backend for RecordingBackend {
    fn create_document(size: PageSize) -> Self {
        let (width, height) = size.dimensions();
        Self {
            width,
            height,
            pages: 1,
            current_page: 1,
            state: StyleState {
                font_size: DEFAULT_FONT_SIZE,
                ..StyleState::default()
            },
            saved: Vec::new(),
            ops: Vec::new(),
            metadata: Metadata::default(),
        }
    }

    fn set_metadata(&mut self, metadata: &Metadata) {
        self.metadata = metadata.clone();
    }

    fn page_width(&self) -> f64 {
        self.width
    }

    fn page_height(&self) -> f64 {
        self.height
    }

    fn add_page(&mut self) {
        self.pages += 1;
        self.current_page = self.pages;
    }

    fn set_current_page(&mut self, page: usize) {
        self.current_page = page.clamp(1, self.pages);
    }

    fn page_count(&self) -> usize {
        self.pages
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
        self.ops.push(DrawOp::Opacity {
            page: self.current_page,
            alpha,
        });
    }

    fn save_graphics_state(&mut self) {
        self.saved.push(self.state.clone());
    }

    fn restore_graphics_state(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.state = state;
        }
    }

    fn measure_text_dimensions(&self, text: &str) -> TextExtent {
        let lines: Vec<&str> = text.split('\n').collect();
        let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        TextExtent {
            width: longest as f64 * self.char_width(),
            height: lines.len() as f64 * self.state.font_size * LINE_HEIGHT_FACTOR,
        }
    }

    fn string_unit_width(&self, _ch: char) -> f64 {
        UNIT_WIDTH
    }

    /// Greedy word wrap; words longer than a line are cut at character boundaries.
    fn split_text_to_width(&self, text: &str, width: f64) -> Vec<String> {
        let max_chars = ((width / self.char_width()) + 1e-9).floor().max(1.0) as usize;
        let mut lines = Vec::new();
        for paragraph in text.split('\n') {
            let mut line = String::new();
            let mut line_len = 0;
            for word in paragraph.split_whitespace() {
                let mut chars: Vec<char> = word.chars().collect();
                let gap = if line_len == 0 { 0 } else { 1 };
                if line_len + gap + chars.len() <= max_chars {
                    if gap == 1 {
                        line.push(' ');
                    }
                    line.extend(chars.iter());
                    line_len += gap + chars.len();
                    continue;
                }
                if line_len > 0 {
                    lines.push(std::mem::take(&mut line));
                }
                while chars.len() > max_chars {
                    let rest = chars.split_off(max_chars);
                    lines.push(chars.iter().collect());
                    chars = rest;
                }
                line = chars.iter().collect();
                line_len = chars.len();
            }
            lines.push(line);
        }
        lines
    }

    fn draw_text(&mut self, text: &str, x: f64, y: f64, options: &TextOptions) {
        self.ops.push(DrawOp::Text {
            page: self.current_page,
            text: text.to_string(),
            x,
            y,
            align: options.align,
            font_size: self.state.font_size,
            color: self.state.text_color,
        });
    }

    fn draw_rect(&mut self, x: f64, y: f64, w: f64, h: f64, mode: PaintMode) {
        self.ops.push(DrawOp::Rect {
            page: self.current_page,
            x,
            y,
            w,
            h,
            mode,
            fill: self.state.fill_color,
        });
    }

    fn draw_rounded_rect(&mut self, x: f64, y: f64, w: f64, h: f64, rx: f64, _ry: f64, mode: PaintMode) {
        self.ops.push(DrawOp::RoundedRect {
            page: self.current_page,
            x,
            y,
            w,
            h,
            radius: rx,
            mode,
        });
    }

    fn add_image(&mut self, data: &str, format: ImageFormat, x: f64, y: f64, w: f64, h: f64) -> Result<()> {
        self.ops.push(DrawOp::Image {
            page: self.current_page,
            src: data.to_string(),
            format,
            x,
            y,
            w,
            h,
        });
        Ok(())
    }

    fn add_link(&mut self, x: f64, y: f64, w: f64, h: f64, url: &str) {
        self.ops.push(DrawOp::Link {
            page: self.current_page,
            url: url.to_string(),
            x,
            y,
            w,
            h,
        });
    }

    /// A plain-text listing of the recorded operations.
    fn finish(&mut self) -> Result<Vec<u8>> {
        let mut out = format!("%RECORDING pages={}\n", self.pages);
        for op in &self.ops {
            let _ = writeln!(out, "{:?}", op);
        }
        Ok(out.into_bytes())
    }
}
