//! # stackpdf
//!
//! A box-tree layout engine that paginates stacks into PDF.
//!
//! A document is a tree of pages, vertical and horizontal stacks, text,
//! images and code blocks. Layout places every box on a fixed-size page
//! canvas: horizontal stacks wrap into rows, text that runs off the bottom
//! of a page is split into fragments that continue on the next one, and
//! boxes marked `samePage` move to a fresh page rather than straddle a
//! break. Once every box has its geometry, a second pass draws the tree.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON/API)
//!       ↓
//!   [model]    Serializable document description
//!       ↓
//!   [tree]     Arena of boxes with parent links
//!       ↓
//!   [layout]   Geometry, wrapping, page splitting
//!       ↓
//!   [render]   Draw calls against a Backend
//!       ↓
//!   [backend]  PDF bytes (or a recording, in tests)
//! ```

pub mod backend;
pub mod code;
pub mod document;
pub mod error;
pub mod font;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod render;
pub mod style;
pub mod text;
pub mod tree;

pub use backend::{Backend, PdfBackend, RecordingBackend};
pub use document::{Document, DocumentState};
pub use error::{LayoutError, Result};
pub use layout::geometry::Geometry;
pub use tree::{BoxTree, NodeId};

/// Render a document described as JSON to PDF bytes.
pub fn render_json(json: &str) -> Result<Vec<u8>> {
    let mut document: Document<PdfBackend> = Document::from_json(json)?;
    document.bytes()
}
