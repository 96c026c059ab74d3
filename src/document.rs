//! # Document
//!
//! Owns a box tree and a backend and moves them through
//! `Uncomputed → Computed → Built → Saved`. Every transition runs at most
//! once; asking for a later state runs the earlier ones first.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use crate::backend::{Backend, PdfBackend};
use crate::code::{BuiltinHighlighter, Highlighter};
use crate::error::{LayoutError, Result};
use crate::layout::geometry::Geometry;
use crate::layout::{LayoutEngine, PageFrame};
use crate::model::{self, Metadata, PageConfig};
use crate::render::{self, LocalHref};
use crate::tree::{BoxTree, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DocumentState {
    Uncomputed,
    /// Geometry is final and the page count is known.
    Computed,
    /// Draw calls have been issued.
    Built,
    /// Bytes have been produced; the backend is finished.
    Saved,
}

pub struct Document<B: Backend = PdfBackend> {
    tree: BoxTree,
    /// The tree as it was before layout split text and expanded code blocks.
    pristine: Option<BoxTree>,
    root: NodeId,
    config: PageConfig,
    metadata: Metadata,
    highlighter: Box<dyn Highlighter>,
    backend: Option<B>,
    state: DocumentState,
    page_numbers: HashMap<String, usize>,
    local_hrefs: Vec<LocalHref>,
    output: Option<Vec<u8>>,
}

impl<B: Backend> Document<B> {
    /// An empty document. Add content under [`Document::root`] via [`Document::tree_mut`].
    pub fn new(config: PageConfig) -> Self {
        let mut tree = BoxTree::new();
        let root = tree.document();
        Self::with_tree(tree, root, config, Metadata::default())
    }

    pub fn from_model(document: &model::Document) -> Self {
        let (tree, root) = BoxTree::from_model(document);
        Self::with_tree(tree, root, document.page, document.metadata.clone())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let document: model::Document = serde_json::from_str(json)?;
        Ok(Self::from_model(&document))
    }

    fn with_tree(tree: BoxTree, root: NodeId, config: PageConfig, metadata: Metadata) -> Self {
        Self {
            tree,
            pristine: None,
            root,
            config,
            metadata,
            highlighter: Box::new(BuiltinHighlighter),
            backend: None,
            state: DocumentState::Uncomputed,
            page_numbers: HashMap::new(),
            local_hrefs: Vec::new(),
            output: None,
        }
    }

    pub fn with_highlighter(mut self, highlighter: impl Highlighter + 'static) -> Self {
        self.highlighter = Box::new(highlighter);
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn tree(&self) -> &BoxTree {
        &self.tree
    }

    /// Mutable access for building content. After `compute` this is the
    /// laid-out tree; [`Document::recompute`] starts over from the tree as it
    /// was before layout.
    pub fn tree_mut(&mut self) -> &mut BoxTree {
        &mut self.tree
    }

    /// Append a node under the document root.
    pub fn append(&mut self, child: NodeId) {
        self.tree.append_child(self.root, child);
    }

    pub fn state(&self) -> DocumentState {
        self.state
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    pub fn geometry(&self, id: NodeId) -> Option<Geometry> {
        self.tree.get(id).and_then(|n| n.geometry)
    }

    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    /// Lay out the whole tree. No-op once computed. On error the tree is
    /// left exactly as it was before the call.
    pub fn compute(&mut self) -> Result<()> {
        if self.state != DocumentState::Uncomputed {
            return Ok(());
        }
        let snapshot = self.tree.clone();
        let mut backend = B::create_document(self.config.size);
        backend.set_metadata(&self.metadata);
        let laid_out = LayoutEngine::new(
            &mut self.tree,
            &mut backend,
            self.highlighter.as_ref(),
            self.config.margin,
        )
        .compute(self.root, 0.0, 0.0, 1, true);
        if let Err(err) = laid_out {
            // Splits and code blocks may already be applied; hand back the
            // tree as it was built.
            self.tree = snapshot;
            return Err(err);
        }
        self.pristine = Some(snapshot);
        self.backend = Some(backend);
        self.state = DocumentState::Computed;
        log::debug!("layout finished on {} pages", self.max_page());
        Ok(())
    }

    /// Discard geometry and drawing and lay out again on a fresh backend.
    pub fn recompute(&mut self) -> Result<()> {
        if self.state == DocumentState::Saved {
            return Err(LayoutError::InvalidState(
                "cannot recompute a document that has been saved".to_string(),
            ));
        }
        if let Some(pristine) = self.pristine.take() {
            self.tree = pristine;
        }
        self.backend = None;
        self.page_numbers.clear();
        self.local_hrefs.clear();
        self.state = DocumentState::Uncomputed;
        self.compute()
    }

    /// Compute, then issue every draw call. No-op once built.
    pub fn build(&mut self) -> Result<()> {
        self.compute()?;
        if self.state >= DocumentState::Built {
            return Ok(());
        }
        let frame = self.frame();
        let backend = self.backend.as_mut().ok_or_else(not_computed)?;
        let output = render::render(&self.tree, self.root, backend, frame)?;
        self.page_numbers = output.page_numbers;
        self.local_hrefs = output.local_hrefs;
        self.state = DocumentState::Built;
        Ok(())
    }

    /// Number of pages, or 0 before layout.
    pub fn max_page(&self) -> usize {
        render::max_page(&self.tree, self.root)
    }

    /// Visit every page after drawing, e.g. to add headers or page numbers.
    pub fn iterate_pages<F>(&mut self, mut callback: F) -> Result<()>
    where
        F: FnMut(&mut B, usize) -> Result<()>,
    {
        self.build()?;
        if self.state == DocumentState::Saved {
            return Err(LayoutError::InvalidState(
                "pages cannot be drawn on after the document was saved".to_string(),
            ));
        }
        let pages = self.max_page();
        let backend = self.backend_mut()?;
        for page in 1..=pages {
            backend.set_current_page(page);
            callback(backend, page)?;
        }
        Ok(())
    }

    /// Serialized document. The first call finishes the backend.
    pub fn bytes(&mut self) -> Result<Vec<u8>> {
        self.build()?;
        if let Some(output) = &self.output {
            return Ok(output.clone());
        }
        let bytes = self.backend_mut()?.finish()?;
        self.output = Some(bytes.clone());
        self.state = DocumentState::Saved;
        Ok(bytes)
    }

    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.bytes()?;
        std::fs::write(path.as_ref(), bytes)?;
        log::debug!("wrote {}", path.as_ref().display());
        Ok(())
    }

    /// The serialized document as a readable stream.
    pub fn stream(&mut self) -> Result<Cursor<Vec<u8>>> {
        Ok(Cursor::new(self.bytes()?))
    }

    /// First page of every node with an id. Filled by `build`.
    pub fn page_numbers(&self) -> &HashMap<String, usize> {
        &self.page_numbers
    }

    /// Links to non-URL targets collected by `build`.
    pub fn local_hrefs(&self) -> &[LocalHref] {
        &self.local_hrefs
    }

    fn frame(&self) -> PageFrame {
        let (width, height) = match &self.backend {
            Some(b) => (b.page_width(), b.page_height()),
            None => self.config.size.dimensions(),
        };
        PageFrame::new(width, height, self.config.margin)
    }

    fn backend_mut(&mut self) -> Result<&mut B> {
        self.backend.as_mut().ok_or_else(not_computed)
    }
}

fn not_computed() -> LayoutError {
    LayoutError::InvalidState("document has not been computed".to_string())
}
