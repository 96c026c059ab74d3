//! Computed box of a laid-out node.

use crate::model::Edges;

/// Page-relative position, inner size and page span of one node, plus the
/// cursor data its children and siblings continue from.
///
/// Coordinates are page-local with y growing downwards. For a node that
/// spans pages, `start_y` is measured on `start_page`, `height` is the
/// content height summed over every page it covers, and `tail_y` is where
/// it ends on `end_page`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Geometry {
    pub start_x: f64,
    pub start_y: f64,
    /// Content box width (excludes margin and padding).
    pub width: f64,
    /// Content box height.
    pub height: f64,
    pub start_page: usize,
    pub end_page: usize,
    pub margin: Edges,
    pub padding: Edges,
    pub is_absolute: bool,
    /// Moved to a fresh row because it could not fit the remaining row space.
    pub is_wrapped: bool,
    /// Rightmost x the content may reach.
    pub max_x: f64,
    /// Width budget handed to children.
    pub max_width: f64,
    /// Where the next sibling continues.
    pub resume_x: f64,
    pub resume_y: f64,
    /// Where the next row starts if a child has to wrap.
    pub wrap_x: f64,
    pub wrap_y: f64,
    /// Bottom of the margin box on `end_page`. Only meaningful when the box
    /// spans pages.
    pub tail_y: f64,
}

impl Geometry {
    /// Sum of every horizontal edge plus the inner width.
    pub fn end_x(&self) -> f64 {
        self.start_x
            + self.margin.right
            + self.margin.left
            + self.padding.right
            + self.padding.left
            + self.width
    }

    pub fn end_y(&self) -> f64 {
        self.start_y
            + self.margin.bottom
            + self.margin.top
            + self.padding.bottom
            + self.padding.top
            + self.height
    }

    pub fn margin_start_x(&self) -> f64 {
        self.start_x + self.margin.left
    }

    pub fn margin_start_y(&self) -> f64 {
        self.start_y + self.margin.top
    }

    pub fn margin_end_x(&self) -> f64 {
        self.end_x() - self.margin.right
    }

    pub fn margin_end_y(&self) -> f64 {
        self.end_y() - self.margin.bottom
    }

    pub fn padding_start_x(&self) -> f64 {
        self.start_x + self.margin.left + self.padding.left
    }

    pub fn padding_start_y(&self) -> f64 {
        self.start_y + self.margin.top + self.padding.top
    }

    pub fn padding_end_x(&self) -> f64 {
        self.end_x() - self.margin.right - self.padding.right
    }

    pub fn padding_end_y(&self) -> f64 {
        self.end_y() - self.margin.bottom - self.padding.bottom
    }

    pub fn outer_width(&self) -> f64 {
        self.end_x() - self.start_x
    }

    pub fn outer_height(&self) -> f64 {
        self.end_y() - self.start_y
    }

    pub fn spans_pages(&self) -> bool {
        self.end_page > self.start_page
    }

    /// Bottom of the margin box on the page the box ends on.
    pub fn page_end_y(&self) -> f64 {
        if self.spans_pages() {
            self.tail_y
        } else {
            self.end_y()
        }
    }

    /// Move the box and every cursor it carries.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.start_x += dx;
        self.start_y += dy;
        self.resume_x += dx;
        self.resume_y += dy;
        self.wrap_x += dx;
        self.wrap_y += dy;
        self.tail_y += dy;
        self.max_x += dx;
    }
}
