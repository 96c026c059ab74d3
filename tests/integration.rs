//! Integration tests for the stackpdf rendering pipeline.
//!
//! These tests exercise the full path from JSON or model input to PDF bytes.
//! They verify:
//! - JSON deserialization and error reporting
//! - Page counts after layout and splitting
//! - PDF output is structurally valid
//! - Images and links make it into the file

use std::io::{Cursor, Read};

use base64::Engine as _;
use stackpdf::model::*;
use stackpdf::style::*;
use stackpdf::{render_json, Document, DocumentState, LayoutError};

// ─── Helpers ────────────────────────────────────────────────────

fn make_text(content: &str, font_size: f64) -> Node {
    Node::text(
        content,
        Style {
            font_size: Some(font_size),
            ..Default::default()
        },
    )
}

fn make_page(children: Vec<Node>) -> Node {
    Node::page(Style::default(), children)
}

fn default_doc(children: Vec<Node>) -> stackpdf::model::Document {
    stackpdf::model::Document {
        children,
        metadata: Metadata::default(),
        page: PageConfig::default(),
    }
}

fn render_to_pdf(doc: &stackpdf::model::Document) -> Vec<u8> {
    let mut document: Document = Document::from_model(doc);
    document.bytes().expect("render failed")
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 50, "PDF too small to be valid");
    assert!(bytes.starts_with(b"%PDF-1.7"), "missing PDF header");
    let text = String::from_utf8_lossy(bytes);
    assert!(text.trim_end().ends_with("%%EOF"), "missing %%EOF marker");
    assert!(text.contains("xref"), "missing xref table");
    assert!(text.contains("/Type /Catalog"), "missing catalog");
}

fn page_count(bytes: &[u8]) -> usize {
    let text = String::from_utf8_lossy(bytes);
    let start = text.find("/Count ").expect("no page tree") + "/Count ".len();
    text[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .expect("page count")
}

fn tiny_png() -> Vec<u8> {
    let mut img = image::RgbaImage::new(2, 2);
    img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
    img.put_pixel(1, 1, image::Rgba([0, 0, 255, 128]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageOutputFormat::Png)
        .expect("encode png");
    out.into_inner()
}

// ─── Pipeline ───────────────────────────────────────────────────

#[test]
fn test_empty_document() {
    let bytes = render_to_pdf(&default_doc(vec![]));
    assert_valid_pdf(&bytes);
    assert_eq!(page_count(&bytes), 1);
}

#[test]
fn test_single_text_produces_valid_pdf() {
    let bytes = render_to_pdf(&default_doc(vec![make_page(vec![make_text("Hello", 12.0)])]));
    assert_valid_pdf(&bytes);
    assert!(String::from_utf8_lossy(&bytes).contains("/BaseFont /Helvetica"));
}

#[test]
fn test_each_page_node_adds_a_page() {
    let doc = default_doc(vec![
        make_page(vec![make_text("one", 12.0)]),
        make_page(vec![make_text("two", 12.0)]),
        make_page(vec![make_text("three", 12.0)]),
    ]);
    assert_eq!(page_count(&render_to_pdf(&doc)), 3);
}

#[test]
fn test_content_overflow_creates_new_page() {
    let paragraph = "All work and no play makes a dull report. ".repeat(200);
    let doc = default_doc(vec![make_page(vec![make_text(&paragraph, 12.0)])]);
    let mut document: Document = Document::from_model(&doc);
    document.compute().unwrap();
    assert!(document.max_page() > 1);

    let bytes = document.bytes().unwrap();
    assert_eq!(page_count(&bytes), document.max_page());
}

#[test]
fn test_large_font_overflows_faster() {
    let paragraph = "word ".repeat(400);
    let pages_at = |size: f64| {
        let doc = default_doc(vec![make_page(vec![make_text(&paragraph, size)])]);
        let mut document: Document = Document::from_model(&doc);
        document.compute().unwrap();
        document.max_page()
    };
    assert!(pages_at(24.0) > pages_at(10.0));
}

// ─── JSON ───────────────────────────────────────────────────────

#[test]
fn test_minimal_json() {
    let json = r#"{ "children": [ { "type": "Text", "content": "Hello" } ] }"#;
    let bytes = render_json(json).unwrap();
    assert_valid_pdf(&bytes);
}

#[test]
fn test_json_metadata_and_custom_size() {
    let json = r#"{
        "metadata": { "title": "Invoice 42", "author": "Accounts" },
        "page": { "size": { "Custom": { "width": 300, "height": 200 } }, "margin": { "top": 10, "right": 10, "bottom": 10, "left": 10 } },
        "children": [
            { "type": "Page", "children": [ { "type": "Text", "content": 42, "style": { "fontSize": 18 } } ] }
        ]
    }"#;
    let bytes = render_json(json).unwrap();
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/Title (Invoice 42)"));
    assert!(text.contains("/Author (Accounts)"));
    assert!(text.contains("/MediaBox [0 0 300.00 200.00]"), "{text}");
}

#[test]
fn test_json_styles_parse() {
    let json = r##"{
        "children": [ {
            "type": "VStack",
            "style": {
                "width": "50%",
                "padding": { "top": 4, "right": 4, "bottom": 4, "left": 4 },
                "backgroundColor": "#f6f8fa",
                "border": { "color": "#d0d7de", "width": 1, "radius": 4 },
                "align": "Center"
            },
            "children": [
                { "type": "Text", "content": "styled", "style": { "color": { "r": 1, "g": 0, "b": 0, "a": 0.5 } } }
            ]
        } ]
    }"##;
    let doc: stackpdf::model::Document = serde_json::from_str(json).unwrap();
    let stack = &doc.children[0];
    assert_eq!(stack.style.width, Some(Dimension::Percent(50.0)));
    assert_eq!(stack.style.align, Some(HAlign::Center));
    assert!(stack.style.border.is_some());

    let bytes = render_json(json).unwrap();
    assert_valid_pdf(&bytes);
    // Half-transparent text needs an opacity state.
    assert!(String::from_utf8_lossy(&bytes).contains("/ca 0.500"));
}

#[test]
fn test_invalid_json_is_a_parse_error() {
    let err = render_json(r#"{ "children": [ { "type": "Paragraph" } ] }"#).unwrap_err();
    assert!(matches!(err, LayoutError::Parse { .. }), "{err}");
    assert!(err.to_string().contains("failed to parse document"));
}

#[test]
fn test_layout_errors_surface_through_json() {
    let json = r#"{ "children": [ { "type": "CodeBlock", "language": "cobol", "source": "STOP RUN." } ] }"#;
    let err = render_json(json).unwrap_err();
    assert!(matches!(err, LayoutError::UnsupportedLanguage { .. }));
}

#[test]
fn test_code_block_renders() {
    let json = r#"{ "children": [ {
        "type": "CodeBlock",
        "language": "rust",
        "source": "// TODO: remove\nfn main() {\n    let answer = 42;\n}"
    } ] }"#;
    let bytes = render_json(json).unwrap();
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/BaseFont /Courier"));
    assert!(text.contains("/BaseFont /Courier-Bold"), "TODO marker is bold");
}

// ─── Images and links ───────────────────────────────────────────

#[test]
fn test_data_uri_png_is_embedded_once() {
    let uri = format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(tiny_png())
    );
    let image = |uri: &str| {
        Node::image(
            uri,
            Style {
                width: Some(Dimension::Pt(40.0)),
                height: Some(Dimension::Pt(40.0)),
                ..Default::default()
            },
        )
    };
    let doc = default_doc(vec![make_page(vec![image(&uri), image(&uri)])]);
    let bytes = render_to_pdf(&doc);
    let text = String::from_utf8_lossy(&bytes);
    assert_eq!(text.matches("/Subtype /Image").count(), 2, "image plus its soft mask");
    assert!(text.contains("/SMask"));
}

#[test]
fn test_missing_image_file_fails() {
    let doc = default_doc(vec![Node::image(
        "./does/not/exist.png",
        Style {
            width: Some(Dimension::Pt(10.0)),
            height: Some(Dimension::Pt(10.0)),
            ..Default::default()
        },
    )]);
    let mut document: Document = Document::from_model(&doc);
    assert!(matches!(document.bytes().unwrap_err(), LayoutError::Image(_)));
}

#[test]
fn test_external_link_annotation() {
    let doc = default_doc(vec![Node::text(
        "docs",
        Style {
            href: Some("https://example.com/docs".to_string()),
            ..Default::default()
        },
    )]);
    let text = String::from_utf8_lossy(&render_to_pdf(&doc)).into_owned();
    assert!(text.contains("/Subtype /Link"));
    assert!(text.contains("(https://example.com/docs)"));
}

// ─── Document lifecycle ─────────────────────────────────────────

#[test]
fn test_page_numbers_by_id() {
    let doc = default_doc(vec![
        make_page(vec![make_text("intro", 12.0).with_id("intro")]),
        make_page(vec![make_text("appendix", 12.0).with_id("appendix")]),
    ]);
    let mut document: Document = Document::from_model(&doc);
    document.build().unwrap();
    assert_eq!(document.page_numbers().get("intro"), Some(&1));
    assert_eq!(document.page_numbers().get("appendix"), Some(&2));
}

#[test]
fn test_save_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.pdf");
    let mut document: Document = Document::from_model(&default_doc(vec![make_text("saved", 12.0)]));
    document.save(&path).unwrap();
    assert_eq!(document.state(), DocumentState::Saved);

    let bytes = std::fs::read(&path).unwrap();
    assert_valid_pdf(&bytes);
    assert!(matches!(document.recompute().unwrap_err(), LayoutError::InvalidState(_)));
}

#[test]
fn test_stream_matches_bytes() {
    let mut document: Document = Document::from_model(&default_doc(vec![make_text("streamed", 12.0)]));
    let bytes = document.bytes().unwrap();
    let mut streamed = Vec::new();
    document.stream().unwrap().read_to_end(&mut streamed).unwrap();
    assert_eq!(streamed, bytes);
}
