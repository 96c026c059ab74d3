//! Page-overflow handling for leaves that end below the content area.

use super::text::{self, TEXT_BOTTOM_SLACK};
use super::{LayoutEngine, Placement, Step, EPS, MAX_LAYOUT_RETRIES};
use crate::backend::Backend;
use crate::error::{LayoutError, Result};
use crate::layout::geometry::Geometry;
use crate::style::Dimension;
use crate::tree::{Content, ElementKind, NodeId};

impl<B: Backend + ?Sized> LayoutEngine<'_, B> {
    pub(super) fn reflow(&mut self, id: NodeId, kind: ElementKind, g: Geometry) -> Result<Step> {
        match kind {
            ElementKind::Text => self.split_text(id, g),
            _ => Ok(self.next_page_or_accept(id, g)),
        }
    }

    /// Move to the top of the next page, unless already at the top of one.
    fn next_page_or_accept(&self, id: NodeId, g: Geometry) -> Step {
        let top = self.frame.content_top();
        if g.start_y <= top + EPS {
            log::warn!(
                "{} is taller than the page content area and overflows page {}",
                self.tree.label(id),
                g.start_page
            );
            return Step::Done(Placement::Node(g));
        }
        Step::Retry {
            x: g.start_x,
            y: top,
            page: g.start_page + 1,
            wrapped: g.is_wrapped,
        }
    }

    /// Greedy split of an overflowing text node into one fragment per page.
    fn split_text(&mut self, id: NodeId, g: Geometry) -> Result<Step> {
        if self.tree.parent(id).is_none() {
            return Ok(Step::Done(Placement::Node(g)));
        }
        let content = self.tree.node(id).text().unwrap_or_default().to_string();
        let line_height = text::line_height(&*self.backend);
        let slack = TEXT_BOTTOM_SLACK * line_height;
        let top = self.frame.content_top();
        let bottom = self.frame.content_bottom();
        let top_edges = g.margin.top + g.padding.top;
        let bottom_edges = g.margin.bottom + g.padding.bottom;

        let first_line_fits = g.start_y + top_edges + line_height + slack <= bottom + EPS;
        if !first_line_fits && g.start_y > top + EPS {
            return Ok(self.next_page_or_accept(id, g));
        }
        let lines = self.backend.split_text_to_width(content.trim_end(), g.width);
        if lines.len() <= 1 {
            return Ok(self.next_page_or_accept(id, g));
        }

        let bounds = text::line_boundaries(&content, &lines);
        let total = lines.len();
        let (mut next, mut y, mut page) = (0, g.start_y, g.start_page);
        let mut skipped = 0;
        let mut fragments = Vec::new();
        let mut last = g;
        while next < total {
            let first = fragments.is_empty();
            let lead = if first { top_edges } else { 0.0 };
            let available = bottom - y - lead - slack;
            let mut fit = ((available / line_height) + EPS).floor().max(0.0) as usize;
            fit = fit.min(total - next);
            if fit > 0
                && fit == total - next
                && y + lead + fit as f64 * line_height + slack + bottom_edges > bottom + EPS
            {
                fit -= 1;
            }

            if fit == 0 {
                skipped += 1;
                if skipped > MAX_LAYOUT_RETRIES {
                    return Err(LayoutError::LayoutNonProgress {
                        node: self.tree.label(id),
                        attempts: skipped,
                    });
                }
                page += 1;
                y = top;
                continue;
            }
            skipped = 0;

            let is_last = next + fit == total;
            let start = bounds[next];
            let end = if is_last { content.len() } else { bounds[next + fit] };
            let fragment = self.make_fragment(id, &content[start..end], first, is_last, g.width);
            last = self.place(fragment, g.start_x, y, page, true)?.geometry();
            fragments.push(fragment);

            next += fit;
            page += 1;
            y = top;
        }

        log::debug!(
            "{} split into {} fragments across pages {}..={}",
            self.tree.label(id),
            fragments.len(),
            g.start_page,
            last.end_page
        );
        Ok(Step::Done(Placement::Split { fragments, last }))
    }

    /// A copy of the text node holding `slice`.
    ///
    /// Top and left edges stay on the first fragment only, the bottom edge on
    /// the last one. Every fragment keeps the original's resolved width so it
    /// breaks into the same lines.
    fn make_fragment(&mut self, source: NodeId, slice: &str, first: bool, last: bool, width: f64) -> NodeId {
        let id = self.tree.copy_leaf(source, Content::Text(slice.into()));
        let original_id = self.tree.node(source).id.clone();
        let node = self.tree.node_mut(id);
        node.fragment = true;
        if first {
            node.id = original_id;
        }

        let style = &mut node.style;
        let mut margin = style.margin();
        let mut padding = style.padding();
        if !first {
            margin.top = 0.0;
            padding.top = 0.0;
            margin.left = 0.0;
            padding.left = 0.0;
        }
        if !last {
            margin.bottom = 0.0;
            padding.bottom = 0.0;
        }
        style.margin = Some(margin);
        style.padding = Some(padding);
        style.width = Some(Dimension::Pt(width));
        style.height = None;
        id
    }
}
