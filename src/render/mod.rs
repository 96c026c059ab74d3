//! # Draw Driver
//!
//! Walks a laid-out tree in document order and issues backend calls. Each
//! node is drawn completely (every page it spans) before its children, so
//! the backend's current page is never shared between two nodes in flight.

use std::collections::HashMap;

use crate::backend::{push_style, Backend, ImageFormat, PaintMode, TextOptions};
use crate::error::Result;
use crate::layout::geometry::Geometry;
use crate::layout::{text, PageFrame};
use crate::style::{Color, HAlign};
use crate::tree::{BoxNode, BoxTree, Content, ElementKind, NodeId};

/// Fraction of the font size added to each line's top when drawing.
pub const BASELINE_CORRECTION: f64 = 0.1;

/// A link whose target is inside the document (or otherwise not a URL).
///
/// These are left for the caller to resolve, typically against
/// [`RenderOutput::page_numbers`].
#[derive(Debug, Clone, PartialEq)]
pub struct LocalHref {
    pub href: String,
    pub page: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Default)]
pub struct RenderOutput {
    /// First page of every node with an id.
    pub page_numbers: HashMap<String, usize>,
    pub local_hrefs: Vec<LocalHref>,
}

/// Highest page any reachable node ends on.
pub fn max_page(tree: &BoxTree, root: NodeId) -> usize {
    tree.descendants(root)
        .into_iter()
        .filter_map(|id| tree.geometry(id))
        .map(|g| g.end_page)
        .max()
        .unwrap_or(0)
}

/// `scheme://...` and `mailto:` links become link annotations.
pub fn is_external(href: &str) -> bool {
    href.contains("://") || href.starts_with("mailto:")
}

/// Create the pages the layout needs and draw every node.
pub fn render<B: Backend + ?Sized>(
    tree: &BoxTree,
    root: NodeId,
    backend: &mut B,
    frame: PageFrame,
) -> Result<RenderOutput> {
    let pages = max_page(tree, root);
    while backend.page_count() < pages {
        backend.add_page();
    }
    log::debug!("drawing {} pages", pages);

    let mut driver = Driver {
        tree,
        backend,
        frame,
        output: RenderOutput::default(),
    };
    driver.draw(root)?;
    Ok(driver.output)
}

struct Driver<'a, B: Backend + ?Sized> {
    tree: &'a BoxTree,
    backend: &'a mut B,
    frame: PageFrame,
    output: RenderOutput,
}

impl<B: Backend + ?Sized> Driver<'_, B> {
    fn draw(&mut self, id: NodeId) -> Result<()> {
        let tree = self.tree;
        let node = tree.node(id);
        let Some(g) = node.geometry else {
            return Ok(());
        };

        let token = push_style(&mut *self.backend, &node.style);
        let result = self.draw_node(id, node, &g).and_then(|()| {
            for &child in tree.children(id) {
                self.draw(child)?;
            }
            Ok(())
        });
        token.restore(&mut *self.backend);
        result
    }

    fn draw_node(&mut self, id: NodeId, node: &BoxNode, g: &Geometry) -> Result<()> {
        if let Some(name) = &node.id {
            self.output
                .page_numbers
                .entry(name.clone())
                .or_insert(g.start_page);
        }
        if node.kind == ElementKind::Document {
            return Ok(());
        }

        self.paint_box(node, g);
        match &node.content {
            Content::Text(_) => self.draw_text(id, node, g),
            Content::Image(src) => {
                self.backend.set_current_page(g.start_page);
                self.backend.add_image(
                    src,
                    ImageFormat::from_source(src),
                    g.padding_start_x(),
                    g.padding_start_y(),
                    g.width,
                    g.height,
                )?;
            }
            _ => {}
        }

        if let Some(href) = &node.style.href {
            let (x, y) = (g.padding_start_x(), g.padding_start_y());
            let height = if g.spans_pages() {
                self.frame.content_bottom() - y
            } else {
                g.height
            };
            if is_external(href) {
                self.backend.set_current_page(g.start_page);
                self.backend.add_link(x, y, g.width, height, href);
            } else {
                self.output.local_hrefs.push(LocalHref {
                    href: href.clone(),
                    page: g.start_page,
                    x,
                    y,
                    width: g.width,
                    height,
                });
            }
        }
        Ok(())
    }

    /// Background and border, one shape per page the node covers.
    fn paint_box(&mut self, node: &BoxNode, g: &Geometry) {
        let background = node.style.background_color;
        let border = node.style.border.filter(|b| b.width > 0.0);
        if background.is_none() && border.is_none() {
            return;
        }
        let radius = border.map_or(0.0, |b| b.radius);
        let x = g.margin_start_x();
        let w = g.margin_end_x() - x;

        for page in g.start_page..=g.end_page {
            let top = if page == g.start_page {
                g.margin_start_y()
            } else {
                self.frame.content_top()
            };
            let bottom = if page == g.end_page {
                g.page_end_y() - g.margin.bottom
            } else {
                self.frame.content_bottom()
            };
            if bottom - top <= 0.0 {
                continue;
            }
            self.backend.set_current_page(page);

            if let Some(color) = background {
                self.with_alpha(color, |b| {
                    b.set_fill_color(color);
                    shape(b, x, top, w, bottom - top, radius, PaintMode::Fill);
                });
            }
            if let Some(border) = border {
                self.with_alpha(border.color, |b| {
                    b.set_stroke_color(border.color);
                    b.set_line_width(border.width);
                    shape(b, x, top, w, bottom - top, radius, PaintMode::Stroke);
                });
            }
        }
    }

    fn with_alpha(&mut self, color: Color, paint: impl FnOnce(&mut B)) {
        if color.is_opaque() {
            paint(&mut *self.backend);
            return;
        }
        self.backend.save_graphics_state();
        self.backend.set_opacity(color.a);
        paint(&mut *self.backend);
        self.backend.restore_graphics_state();
    }

    fn draw_text(&mut self, id: NodeId, node: &BoxNode, g: &Geometry) {
        let content = node.text().unwrap_or_default();
        let parent_full = self
            .tree
            .parent(id)
            .and_then(|p| self.tree.geometry(p))
            .map_or(self.frame.content_width(), |p| p.max_width);
        let lines = text::layout_lines(&*self.backend, content, g.width, parent_full);
        let line_height = text::line_height(&*self.backend);
        let correction = self.backend.font_size() * BASELINE_CORRECTION;

        let left = g.padding_start_x();
        let (x, align) = match node.style.h_align() {
            HAlign::Leading => (left, HAlign::Leading),
            HAlign::Center => (left + g.width / 2.0, HAlign::Center),
            HAlign::Trailing => (left + g.width, HAlign::Trailing),
            HAlign::Justify => (left, HAlign::Justify),
        };

        self.backend.set_current_page(g.start_page);
        let count = lines.len();
        for (i, line) in lines.iter().enumerate() {
            let options = TextOptions {
                // The last line of a justified paragraph stays ragged.
                align: if align == HAlign::Justify && i + 1 == count {
                    HAlign::Leading
                } else {
                    align
                },
                max_width: Some(g.width),
            };
            let y = g.padding_start_y() + i as f64 * line_height + correction;
            self.backend.draw_text(line, x, y, &options);
        }
    }
}

fn shape<B: Backend + ?Sized>(backend: &mut B, x: f64, y: f64, w: f64, h: f64, radius: f64, mode: PaintMode) {
    if radius > 0.0 {
        backend.draw_rounded_rect(x, y, w, h, radius, radius, mode);
    } else {
        backend.draw_rect(x, y, w, h, mode);
    }
}
