//! # Code Blocks
//!
//! A code block is a container whose children are generated from its
//! source the first time it is laid out: the source is tokenized by a
//! [`Highlighter`], and every token becomes a styled Text node inside one
//! HStack per source line.

pub mod lexer;

use crate::error::{LayoutError, Result};
use crate::style::{Color, Style};
use crate::tree::{BoxTree, Content, NodeId};

pub use lexer::BuiltinHighlighter;

/// Default monospace family for code blocks without an explicit font.
pub const CODE_FONT_FAMILY: &str = "Courier";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenClass {
    Comment,
    /// TODO, FIXME and friends inside a comment.
    CommentKeyword,
    /// `inline code` inside a comment.
    CommentCodeblock,
    CommentUrl,
    String,
    Numeric,
    Keyword,
    Operator,
    Preprocessor,
    /// The name introduced by `struct`, `class`, `enum` and similar.
    TypeDef,
    Type,
    Parameter,
    LineBreak,
    Plain,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub class: TokenClass,
    pub text: String,
}

impl Token {
    pub fn new(class: TokenClass, text: impl Into<String>) -> Self {
        Self {
            class,
            text: text.into(),
        }
    }
}

/// Tokenizer output: either one flat list or one list per source line.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenStream {
    Flat(Vec<Token>),
    Lines(Vec<Vec<Token>>),
}

pub trait Highlighter {
    /// `None` when the language is not supported.
    fn tokenize(&self, language: &str, source: &str) -> Option<TokenStream>;
}

/// Text style for a token class.
pub fn token_style(class: TokenClass) -> Style {
    let (color, bold, background) = match class {
        TokenClass::Comment => (Some("#6a737d"), false, None),
        TokenClass::CommentKeyword => (Some("#6a737d"), true, None),
        TokenClass::CommentCodeblock | TokenClass::CommentUrl => (Some("#0366d6"), false, Some("#f1f8ff")),
        TokenClass::String => (Some("#032f62"), false, None),
        TokenClass::Numeric => (Some("#005cc5"), false, None),
        TokenClass::Keyword | TokenClass::Operator => (Some("#d73a49"), false, None),
        TokenClass::Preprocessor => (Some("#6f42c1"), false, None),
        TokenClass::TypeDef => (Some("#6f42c1"), true, None),
        TokenClass::Type => (Some("#005cc5"), false, None),
        TokenClass::Parameter => (Some("#e36209"), false, None),
        TokenClass::LineBreak | TokenClass::Plain => (None, false, None),
    };
    Style {
        color: color.map(Color::hex),
        font_weight: bold.then_some(700),
        background_color: background.map(Color::hex),
        ..Default::default()
    }
}

/// Replace a code block's children by its tokenized source. Runs once.
pub fn materialize(tree: &mut BoxTree, id: NodeId, highlighter: &dyn Highlighter) -> Result<()> {
    let (language, source) = match &tree.node(id).content {
        Content::Code {
            language,
            source,
            materialized: false,
        } => (language.clone(), source.clone()),
        _ => return Ok(()),
    };
    let stream = highlighter
        .tokenize(&language, &source)
        .ok_or_else(|| LayoutError::UnsupportedLanguage {
            language: language.clone(),
        })?;

    let rows = match stream {
        TokenStream::Flat(tokens) => vec![tokens],
        TokenStream::Lines(lines) => lines,
    };
    let mut lines = Vec::with_capacity(rows.len());
    for row in rows {
        let mut texts: Vec<NodeId> = row
            .into_iter()
            .filter(|t| t.class != TokenClass::LineBreak && !t.text.is_empty())
            .map(|t| tree.text(t.text, token_style(t.class)))
            .collect();
        if texts.is_empty() {
            // Keeps blank lines one line tall.
            texts.push(tree.text(" ", Style::default()));
        }
        lines.push(tree.hstack(Style::default(), texts));
    }
    log::debug!("{} ({}) materialized into {} lines", tree.label(id), language, lines.len());
    tree.set_children(id, lines);

    let node = tree.node_mut(id);
    if node.style.font_family.is_none() {
        node.style.font_family = Some(CODE_FONT_FAMILY.to_string());
    }
    if let Content::Code { materialized, .. } = &mut node.content {
        *materialized = true;
    }
    Ok(())
}
