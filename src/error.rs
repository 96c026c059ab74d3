//! Error types for layout, drawing and serialization.
//!
//! Every engine-detected problem is fatal: it propagates out of
//! `compute()`/`build()` and no bytes are produced.

use thiserror::Error;

/// The unified error type returned by all public stackpdf API functions.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// An explicit start page was set on a node that is not absolutely positioned.
    #[error("node {node} binds to page {page} but is not absolutely positioned")]
    InvalidPageBinding { node: String, page: usize },

    /// An image reached layout without both a width and a height.
    #[error("image {node} needs both an explicit width and height")]
    MissingImageDimension { node: String },

    /// No tokenizer handles a code block's language.
    #[error("no tokenizer available for language '{language}'")]
    UnsupportedLanguage { language: String },

    /// The layout retry loop gave up without placing anything.
    #[error("layout made no progress placing {node} after {attempts} attempts")]
    LayoutNonProgress { node: String, attempts: usize },

    /// An image source could not be read or decoded.
    #[error("image error: {0}")]
    Image(String),

    /// An operation was invoked out of order (e.g. drawing after saving).
    #[error("invalid document state: {0}")]
    InvalidState(String),

    /// JSON input failed to parse as a valid document.
    #[error("failed to parse document: {source}{}", hint_suffix(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for LayoutError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the document schema. Check node kinds and style field names.".to_string()
            }
            serde_json::error::Category::Eof => "Unexpected end of input. Is the JSON truncated?".to_string(),
            serde_json::error::Category::Io => String::new(),
        };
        LayoutError::Parse { source: e, hint }
    }
}

pub type Result<T, E = LayoutError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_carries_hint() {
        let err: LayoutError = serde_json::from_str::<serde_json::Value>("{\"a\": 1,}")
            .unwrap_err()
            .into();
        let msg = err.to_string();
        assert!(msg.starts_with("failed to parse document"));
        assert!(msg.contains("Hint: Check for trailing commas"));
    }

    #[test]
    fn test_layout_messages_name_the_node() {
        let err = LayoutError::MissingImageDimension {
            node: "Image#logo".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "image Image#logo needs both an explicit width and height"
        );
    }
}
