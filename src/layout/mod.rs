//! # Page-Aware Layout Engine
//!
//! Turns a [`BoxTree`] into concrete page-relative geometry.
//!
//! The engine works top-down with a single cursor: each node is placed at
//! the cursor `(x, y, page)` its parent hands it, sizes itself (leaves by
//! measuring, containers by placing their children in turn) and reports a
//! [`Geometry`] whose resume point is where the parent continues.
//!
//! ## Pagination
//!
//! There is no infinite canvas. When a leaf ends below the content area of
//! its page, it is dealt with immediately:
//!
//! 1. An image moves to the top of the next page.
//! 2. Text whose first line does not fit moves to the next page.
//! 3. Otherwise text is split greedily: as many lines as fit stay on this
//!    page, the rest continue on following pages as fragment siblings.
//!
//! Containers notice the page change when a child ends on a later page and
//! continue on that page. A stack marked `same_page` that would fit on a
//! fresh page is moved there instead of straddling a page boundary.
//!
//! ## Retries
//!
//! Moving a node (to a fresh row, or to the next page) is expressed as a
//! [`Step::Retry`] returned to a bounded loop, never as unbounded recursion.

pub mod geometry;
mod reflow;
pub mod text;

use crate::backend::{push_style, Backend};
use crate::code::{self, Highlighter};
use crate::error::{LayoutError, Result};
use crate::model::Edges;
use crate::style::{Dimension, HAlign, Style, VAlign};
use crate::tree::{BoxTree, Content, ElementKind, NodeId};
use geometry::Geometry;

/// Attempts at placing one node before layout gives up.
pub const MAX_LAYOUT_RETRIES: usize = 64;

/// Tolerance for floating point comparisons against page and budget edges.
pub(crate) const EPS: f64 = 1e-6;

/// Page dimensions and margins, shared by every page of a document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFrame {
    pub width: f64,
    pub height: f64,
    pub margin: Edges,
}

impl PageFrame {
    pub fn new(width: f64, height: f64, margin: Edges) -> Self {
        Self {
            width,
            height,
            margin,
        }
    }

    pub fn content_left(&self) -> f64 {
        self.margin.left
    }

    pub fn content_top(&self) -> f64 {
        self.margin.top
    }

    pub fn content_right(&self) -> f64 {
        self.width - self.margin.right
    }

    pub fn content_bottom(&self) -> f64 {
        self.height - self.margin.bottom
    }

    pub fn content_width(&self) -> f64 {
        self.content_right() - self.content_left()
    }

    pub fn content_height(&self) -> f64 {
        self.content_bottom() - self.content_top()
    }
}

/// Outcome of placing one node.
#[derive(Debug, Clone)]
pub enum Placement {
    Node(Geometry),
    /// The node was replaced by fragments; `last` is the final fragment's geometry.
    Split {
        fragments: Vec<NodeId>,
        last: Geometry,
    },
}

impl Placement {
    pub fn geometry(&self) -> Geometry {
        match self {
            Placement::Node(g) => *g,
            Placement::Split { last, .. } => *last,
        }
    }
}

#[derive(Debug)]
enum Step {
    Done(Placement),
    /// Lay the node out again from a different cursor.
    Retry {
        x: f64,
        y: f64,
        page: usize,
        wrapped: bool,
    },
}

/// Explicit sizes after percentage resolution and absolute offsets.
#[derive(Debug, Clone, Copy)]
struct Sizing {
    width: Option<f64>,
    height: Option<f64>,
    /// Right edge target for right-anchored absolute nodes.
    anchor_right: Option<f64>,
    anchor_bottom: Option<f64>,
    /// Incoming cursor, kept as the resume point of absolute nodes.
    origin: (f64, f64),
}

pub struct LayoutEngine<'a, B: Backend + ?Sized> {
    tree: &'a mut BoxTree,
    backend: &'a mut B,
    highlighter: &'a dyn Highlighter,
    frame: PageFrame,
}

impl<'a, B: Backend + ?Sized> LayoutEngine<'a, B> {
    /// Page size is taken from the backend, margins from the page configuration.
    pub fn new(
        tree: &'a mut BoxTree,
        backend: &'a mut B,
        highlighter: &'a dyn Highlighter,
        margin: Edges,
    ) -> Self {
        let frame = PageFrame::new(backend.page_width(), backend.page_height(), margin);
        Self {
            tree,
            backend,
            highlighter,
            frame,
        }
    }

    pub fn frame(&self) -> PageFrame {
        self.frame
    }

    /// Lay out `id` at the given cursor.
    ///
    /// Without `refresh`, a node that already has geometry returns it
    /// unchanged. If the node is text that had to be split across pages, it
    /// is replaced in its parent by the fragments and the last fragment's
    /// geometry is returned.
    pub fn compute(&mut self, id: NodeId, x: f64, y: f64, page: usize, refresh: bool) -> Result<Geometry> {
        match self.place(id, x, y, page, refresh)? {
            Placement::Node(g) => Ok(g),
            Placement::Split { fragments, last } => {
                self.tree.replace_child(id, &fragments);
                Ok(last)
            }
        }
    }

    fn place(&mut self, id: NodeId, x: f64, y: f64, page: usize, refresh: bool) -> Result<Placement> {
        if !refresh {
            if let Some(g) = self.tree.geometry(id) {
                return Ok(Placement::Node(g));
            }
        }

        let (mut x, mut y, mut page, mut wrapped, mut refresh) = (x, y, page, false, refresh);
        for _ in 0..MAX_LAYOUT_RETRIES {
            match self.step(id, x, y, page, wrapped, refresh)? {
                Step::Done(placement) => {
                    if let Placement::Node(g) = &placement {
                        self.tree.node_mut(id).geometry = Some(*g);
                        log::trace!(
                            "{}: ({:.2}, {:.2}) {:.2}x{:.2} pages {}..={}",
                            self.tree.label(id),
                            g.start_x,
                            g.start_y,
                            g.width,
                            g.height,
                            g.start_page,
                            g.end_page
                        );
                    }
                    return Ok(placement);
                }
                Step::Retry {
                    x: nx,
                    y: ny,
                    page: np,
                    wrapped: nw,
                } => {
                    log::debug!(
                        "{}: relayout at ({:.2}, {:.2}) page {}{}",
                        self.tree.label(id),
                        nx,
                        ny,
                        np,
                        if nw { " on a new row" } else { "" }
                    );
                    x = nx;
                    y = ny;
                    page = np;
                    wrapped = nw;
                    refresh = true;
                }
            }
        }
        Err(LayoutError::LayoutNonProgress {
            node: self.tree.label(id),
            attempts: MAX_LAYOUT_RETRIES,
        })
    }

    fn step(&mut self, id: NodeId, x: f64, y: f64, page: usize, wrapped: bool, refresh: bool) -> Result<Step> {
        let kind = self.tree.node(id).kind;
        if kind == ElementKind::CodeBlock {
            code::materialize(self.tree, id, self.highlighter)?;
        }
        if let Content::Text(value) = &mut self.tree.node_mut(id).content {
            value.coerce();
        }

        let style = self.tree.node(id).style.clone();
        let is_absolute = style.is_absolute();
        if let Some(bound) = style.page {
            if !is_absolute {
                return Err(LayoutError::InvalidPageBinding {
                    node: self.tree.label(id),
                    page: bound,
                });
            }
        }

        let frame = self.frame;
        let origin = (x, y);
        let (mut x, mut y, mut page) = (x, y, page);
        let mut margin = style.margin();
        let padding = style.padding();
        match kind {
            ElementKind::Document => {
                // Page margins act as the document's own margin box.
                x = 0.0;
                y = 0.0;
                page = 1;
                margin = frame.margin;
            }
            ElementKind::Page => {
                x = frame.content_left();
                y = frame.content_top();
                page += 1;
                log::debug!("{} opens page {}", self.tree.label(id), page);
            }
            _ => {}
        }
        if let Some(bound) = style.page {
            page = bound.max(1);
        }

        let mut forced_width = None;
        let mut forced_height = None;
        let mut anchor_right = None;
        let mut anchor_bottom = None;
        if is_absolute {
            match (style.left, style.right) {
                (Some(left), Some(right)) => {
                    x = left;
                    forced_width = Some(frame.width - right - left);
                }
                (Some(left), None) => x = left,
                (None, Some(right)) => {
                    anchor_right = Some(frame.width - right - (margin.horizontal() + padding.horizontal()));
                }
                (None, None) => {}
            }
            match (style.top, style.bottom) {
                (Some(top), Some(bottom)) => {
                    y = top;
                    forced_height = Some(frame.height - bottom - top);
                }
                (Some(top), None) => y = top,
                (None, Some(bottom)) => {
                    anchor_bottom = Some(frame.height - bottom - (margin.vertical() + padding.vertical()));
                }
                (None, None) => {}
            }
        }

        let ancestor = self.nearest_geometry(self.tree.parent(id));
        let inherited_max_x = if kind == ElementKind::Document {
            frame.width
        } else if is_absolute {
            frame.width - style.right.unwrap_or(frame.margin.right)
        } else {
            ancestor.map(|g| g.max_x).unwrap_or(frame.content_right())
        };

        let width = if kind == ElementKind::Document {
            Some(frame.content_width())
        } else {
            forced_width.or_else(|| self.resolve_width(id, &style, ancestor.map(|g| g.max_width)))
        };
        let height = forced_height.or_else(|| match style.height {
            Some(Dimension::Pt(h)) => Some(h),
            Some(Dimension::Percent(_)) => {
                log::warn!("{}: percentage heights are not supported, sizing to content", self.tree.label(id));
                None
            }
            None => None,
        });

        // Right/bottom anchored boxes are laid out at a provisional origin and
        // moved once their size is known.
        if let Some(anchor) = anchor_right {
            x = width.map(|w| anchor - w).unwrap_or(frame.content_left());
        }
        if let Some(anchor) = anchor_bottom {
            y = height.map(|h| anchor - h).unwrap_or(frame.content_top());
        }

        let content_x = x + margin.left + padding.left;
        let content_y = y + margin.top + padding.top;
        let limit = inherited_max_x - margin.right - padding.right;
        let max_x = match width {
            Some(w) => (content_x + w).min(limit),
            None => limit,
        };

        let mut g = Geometry {
            start_x: x,
            start_y: y,
            width: width.unwrap_or(0.0),
            height: height.unwrap_or(0.0),
            start_page: page,
            end_page: page,
            margin,
            padding,
            is_absolute,
            is_wrapped: wrapped,
            max_x,
            max_width: (max_x - content_x).max(0.0),
            resume_x: x,
            resume_y: y,
            wrap_x: content_x,
            wrap_y: content_y,
            tail_y: y,
        };
        // Children read their budget and wrap anchor from here.
        self.tree.node_mut(id).geometry = Some(g);

        let sizing = Sizing {
            width,
            height,
            anchor_right,
            anchor_bottom,
            origin,
        };
        let token = push_style(&mut *self.backend, &style);
        let result = self.size_and_flow(id, kind, &style, &mut g, sizing, refresh);
        token.restore(&mut *self.backend);
        result
    }

    /// Everything that runs under the node's own style.
    fn size_and_flow(
        &mut self,
        id: NodeId,
        kind: ElementKind,
        style: &Style,
        g: &mut Geometry,
        sizing: Sizing,
        refresh: bool,
    ) -> Result<Step> {
        match kind {
            ElementKind::Text => {
                if let Some(retry) = self.size_text(id, g, sizing)? {
                    return Ok(retry);
                }
            }
            ElementKind::Image => match (sizing.width, sizing.height) {
                (Some(w), Some(h)) => {
                    g.width = w;
                    g.height = h;
                }
                _ => {
                    return Err(LayoutError::MissingImageDimension {
                        node: self.tree.label(id),
                    })
                }
            },
            _ => self.layout_children(id, kind, style, g, sizing, refresh)?,
        }

        if let Some(anchor) = sizing.anchor_right {
            let dx = anchor - g.width - g.start_x;
            self.shift_children(id, dx, 0.0);
            g.translate(dx, 0.0);
        }
        if let Some(anchor) = sizing.anchor_bottom {
            let dy = anchor - g.height - g.start_y;
            self.shift_children(id, 0.0, dy);
            g.translate(0.0, dy);
        }

        if g.is_absolute {
            (g.resume_x, g.resume_y) = sizing.origin;
        } else {
            g.resume_x = g.end_x();
            g.resume_y = g.page_end_y();
        }

        let is_leaf = matches!(kind, ElementKind::Text | ElementKind::Image);
        if is_leaf
            && !g.is_absolute
            && !self.tree.node(id).fragment
            && g.end_y() > self.frame.content_bottom() + EPS
        {
            return self.reflow(id, kind, *g);
        }

        if style.same_page
            && matches!(kind, ElementKind::VStack | ElementKind::HStack)
            && !g.is_absolute
            && g.spans_pages()
            && g.start_y > self.frame.content_top() + EPS
            && g.outer_height() <= self.frame.content_height() + EPS
        {
            log::debug!(
                "{} fits on one page, moving it to page {}",
                self.tree.label(id),
                g.start_page + 1
            );
            return Ok(Step::Retry {
                x: g.start_x,
                y: self.frame.content_top(),
                page: g.start_page + 1,
                wrapped: g.is_wrapped,
            });
        }

        Ok(Step::Done(Placement::Node(*g)))
    }

    fn resolve_width(&self, id: NodeId, style: &Style, budget: Option<f64>) -> Option<f64> {
        let dimension = style.width?;
        let resolved = dimension.resolve(budget);
        if resolved.is_none() {
            log::warn!(
                "{}: no ancestor width to resolve {:?} against, sizing to content",
                self.tree.label(id),
                dimension
            );
        }
        resolved
    }

    // ── Leaves ─────────────────────────────────────────────────

    fn size_text(&mut self, id: NodeId, g: &mut Geometry, sizing: Sizing) -> Result<Option<Step>> {
        let node = self.tree.node(id);
        let content = node.text().unwrap_or_default().to_string();
        let fragment = node.fragment;
        let parent = self.nearest_geometry(node.parent);
        let parent_full = parent.map(|p| p.max_width).unwrap_or(self.frame.content_width());

        let natural = text::natural_width(&*self.backend, &content);
        let unbreakable = !text::has_internal_whitespace(&content);
        let mut width = match sizing.width {
            Some(w) => w,
            None if self.backend.style_state().is_bold() => natural * text::BOLD_WIDTH_FACTOR,
            None => natural,
        };

        if width > g.max_width + EPS {
            let edges = g.margin.horizontal() + g.padding.horizontal();
            if let Some(p) = parent {
                if unbreakable && !fragment && !g.is_wrapped && g.max_width + edges < p.max_width - EPS {
                    return Ok(Some(Step::Retry {
                        x: p.wrap_x,
                        y: p.wrap_y,
                        page: g.start_page,
                        wrapped: true,
                    }));
                }
            }
            width = g.max_width;
        }

        let line_height = text::line_height(&*self.backend);
        g.width = width;
        g.height = match sizing.height {
            Some(h) => h,
            None => {
                let lines = text::layout_lines(&*self.backend, &content, width, parent_full);
                text::text_height(lines.len(), line_height)
            }
        };
        Ok(None)
    }

    // ── Containers ─────────────────────────────────────────────

    fn layout_children(
        &mut self,
        id: NodeId,
        kind: ElementKind,
        style: &Style,
        g: &mut Geometry,
        sizing: Sizing,
        refresh: bool,
    ) -> Result<()> {
        let horizontal = kind.is_horizontal();
        let content_x = g.padding_start_x();
        let content_y = g.padding_start_y();
        let (mut cur_x, mut cur_y) = (content_x, content_y);
        // Document children start before page 1 so the first Page opens page 1.
        let mut cur_page = if kind == ElementKind::Document { 0 } else { g.start_page };
        let (mut extent_x, mut extent_y) = (content_x, content_y);
        let mut row: Vec<NodeId> = Vec::new();
        let mut row_bottom = content_y;
        let mut placed = Vec::new();
        let mut flow = Vec::new();

        let children = self.tree.children(id).to_vec();
        for child in children {
            g.wrap_x = content_x;
            g.wrap_y = if horizontal { row_bottom } else { cur_y };
            self.tree.node_mut(id).geometry = Some(*g);

            let child_page = if kind == ElementKind::Document && self.tree.node(child).kind != ElementKind::Page {
                cur_page.max(1)
            } else {
                cur_page
            };
            let placement = self.place(child, cur_x, cur_y, child_page, refresh)?;
            let cg = placement.geometry();
            let ids = match placement {
                Placement::Node(_) => vec![child],
                Placement::Split { fragments, .. } => fragments,
            };
            placed.extend_from_slice(&ids);
            if cg.is_absolute {
                continue;
            }
            flow.extend_from_slice(&ids);

            if cg.end_page > g.end_page {
                // A page break happened inside the child.
                if horizontal {
                    if let Some(edge) = self.close_row(&row, g.max_x, style.v_align()) {
                        extent_x = extent_x.max(edge);
                    }
                    row.clear();
                    if let Some(&last) = ids.last() {
                        row.push(last);
                    }
                    cur_x = if cg.is_wrapped { content_x } else { cg.resume_x };
                    cur_y = self.frame.content_top();
                    row_bottom = cg.page_end_y();
                } else {
                    cur_x = content_x;
                    cur_y = cg.resume_y;
                }
                g.end_page = cg.end_page;
                cur_page = cg.end_page;
                extent_y = cg.page_end_y();
            } else {
                cur_page = cur_page.max(cg.end_page);
                extent_y = extent_y.max(cg.page_end_y());
                if horizontal {
                    if cg.is_wrapped && !row.is_empty() {
                        if let Some(edge) = self.close_row(&row, g.max_x, style.v_align()) {
                            extent_x = extent_x.max(edge);
                        }
                        row.clear();
                        row_bottom = cg.page_end_y();
                    } else {
                        row_bottom = row_bottom.max(cg.page_end_y());
                    }
                    row.extend_from_slice(&ids);
                    if cg.resume_x >= g.max_x - EPS {
                        if let Some(edge) = self.close_row(&row, g.max_x, style.v_align()) {
                            extent_x = extent_x.max(edge);
                        }
                        row.clear();
                        cur_x = content_x;
                        cur_y = row_bottom;
                    } else {
                        cur_x = cg.resume_x;
                        cur_y = cg.start_y;
                    }
                } else {
                    cur_x = content_x;
                    cur_y = cg.resume_y;
                }
            }
            extent_x = extent_x.max(cg.end_x());
        }
        if horizontal {
            if let Some(edge) = self.close_row(&row, g.max_x, style.v_align()) {
                extent_x = extent_x.max(edge);
            }
        }

        let measured_width = extent_x - content_x;
        g.width = sizing.width.map_or(measured_width, |w| w.max(measured_width));
        if g.spans_pages() {
            // The content decides where a page-spanning box ends.
            if sizing.height.is_some() {
                log::debug!("{} spans pages, ignoring its explicit height", self.tree.label(id));
            }
            g.height = self.flowed_height(content_y, g.start_page, extent_y, g.end_page);
            g.tail_y = extent_y + g.padding.bottom + g.margin.bottom;
        } else {
            let measured_height = extent_y - content_y;
            g.height = sizing.height.map_or(measured_height, |h| h.max(measured_height));
        }

        if !horizontal {
            self.align_column(&flow, g.width, style.h_align());
        }
        self.tree.set_children(id, placed);
        Ok(())
    }

    /// Finish an HStack row: vertical alignment, then stretch distribution.
    /// Returns the row's new right edge when stretch children grew.
    fn close_row(&mut self, row: &[NodeId], max_x: f64, align: VAlign) -> Option<f64> {
        if row.is_empty() {
            return None;
        }

        let factor = match align {
            VAlign::Leading => 0.0,
            VAlign::Center => 0.5,
            VAlign::Trailing => 1.0,
        };
        if factor > 0.0 {
            let row_height = row
                .iter()
                .filter_map(|&c| self.tree.geometry(c))
                .filter(|cg| !cg.spans_pages())
                .map(|cg| cg.outer_height())
                .fold(0.0, f64::max);
            for &child in row {
                let Some(cg) = self.tree.geometry(child) else {
                    continue;
                };
                let delta = (row_height - cg.outer_height()) * factor;
                if !cg.spans_pages() && delta > EPS {
                    self.translate_subtree(child, 0.0, delta);
                }
            }
        }

        let stretched = row.iter().filter(|&&c| self.tree.node(c).style.stretch).count();
        if stretched == 0 {
            return None;
        }
        let row_end = row
            .iter()
            .filter_map(|&c| self.tree.geometry(c))
            .map(|cg| cg.end_x())
            .fold(f64::MIN, f64::max);
        let slack = max_x - row_end;
        if slack <= EPS {
            return None;
        }
        let step = slack / stretched as f64;
        let mut shift = 0.0;
        for &child in row {
            if shift > 0.0 {
                self.translate_subtree(child, shift, 0.0);
            }
            if self.tree.node(child).style.stretch {
                if let Some(cg) = self.tree.node_mut(child).geometry.as_mut() {
                    cg.width += step;
                    cg.max_x += step;
                    cg.max_width += step;
                    cg.resume_x += step;
                }
                shift += step;
            }
        }
        log::debug!("stretched {} children by {:.2}pt each", stretched, step);
        Some(max_x)
    }

    /// Cross-axis alignment of a vertical stack's children.
    fn align_column(&mut self, children: &[NodeId], inner_width: f64, align: HAlign) {
        let factor = match align {
            HAlign::Center => 0.5,
            HAlign::Trailing => 1.0,
            HAlign::Leading | HAlign::Justify => return,
        };
        for &child in children {
            let Some(cg) = self.tree.geometry(child) else {
                continue;
            };
            let dx = (inner_width - cg.outer_width()) * factor;
            if dx > EPS {
                self.translate_subtree(child, dx, 0.0);
            }
        }
    }

    // ── Helpers ────────────────────────────────────────────────

    fn nearest_geometry(&self, mut current: Option<NodeId>) -> Option<Geometry> {
        while let Some(id) = current {
            let node = self.tree.node(id);
            if node.geometry.is_some() {
                return node.geometry;
            }
            current = node.parent;
        }
        None
    }

    fn translate_subtree(&mut self, root: NodeId, dx: f64, dy: f64) {
        for id in self.tree.descendants(root) {
            if let Some(g) = self.tree.node_mut(id).geometry.as_mut() {
                g.translate(dx, dy);
            }
        }
    }

    fn shift_children(&mut self, id: NodeId, dx: f64, dy: f64) {
        if dx.abs() <= EPS && dy.abs() <= EPS {
            return;
        }
        for child in self.tree.children(id).to_vec() {
            self.translate_subtree(child, dx, dy);
        }
    }

    /// Content height from `top` on `first` page down to `bottom` on `last`,
    /// summed over the pages in between.
    fn flowed_height(&self, top: f64, first: usize, bottom: f64, last: usize) -> f64 {
        let frame = self.frame;
        let middle_pages = last.saturating_sub(first + 1) as f64;
        let first_part = (frame.content_bottom() - top).max(0.0);
        let last_part = (bottom - frame.content_top()).max(0.0);
        first_part + middle_pages * frame.content_height() + last_part
    }
}
