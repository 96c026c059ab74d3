//! # PDF Serializer
//!
//! A small from-scratch PDF 1.7 writer. The drawing backend collects one
//! content stream per page plus the fonts, images, opacity states and links
//! those pages use; [`PdfWriter::write`] turns that into bytes.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- catalog, page tree, fonts, images, pages, streams
//! ...
//! xref                <- byte offset of each object
//! trailer             <- points to the catalog and the info dictionary
//! %%EOF
//! ```

use std::collections::BTreeSet;
use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::font::StandardFont;
use crate::image_loader::{LoadedImage, Pixels};
use crate::model::Metadata;

const COMPRESSION_LEVEL: u8 = 6;
const PRODUCER: &str = concat!("stackpdf ", env!("CARGO_PKG_VERSION"));

/// Bézier control distance for a quarter circle of radius 1.
const KAPPA: f64 = 0.5522847498;

/// A URI link annotation, in PDF user space (y up).
#[derive(Debug, Clone, PartialEq)]
pub struct LinkAnnotation {
    pub rect: [f64; 4],
    pub uri: String,
}

/// Everything drawn on one page.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    pub width: f64,
    pub height: f64,
    /// Uncompressed content stream operators.
    pub content: String,
    /// Indices into [`PdfDocument::fonts`], named `/F{i}` in the stream.
    pub fonts: BTreeSet<usize>,
    /// Indices into [`PdfDocument::images`], named `/Im{i}`.
    pub images: BTreeSet<usize>,
    /// Indices into [`PdfDocument::opacities`], named `/GS{i}`.
    pub states: BTreeSet<usize>,
    pub links: Vec<LinkAnnotation>,
}

impl PageContent {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }
}

/// Document-wide resources shared by all pages.
#[derive(Debug, Clone, Default)]
pub struct PdfDocument {
    pub pages: Vec<PageContent>,
    pub fonts: Vec<StandardFont>,
    pub images: Vec<LoadedImage>,
    pub opacities: Vec<f64>,
    pub metadata: Metadata,
}

pub struct PdfWriter;

struct PdfBuilder {
    /// Object bodies; index 0 is the free-list head and never written.
    objects: Vec<Vec<u8>>,
}

impl PdfBuilder {
    fn new() -> Self {
        // 0 = placeholder, 1 = Catalog, 2 = Pages
        Self {
            objects: vec![Vec::new(), Vec::new(), Vec::new()],
        }
    }

    fn push(&mut self, data: Vec<u8>) -> usize {
        self.objects.push(data);
        self.objects.len() - 1
    }

    fn push_stream(&mut self, dict: &str, payload: &[u8]) -> usize {
        let mut data = Vec::with_capacity(payload.len() + dict.len() + 32);
        let _ = write!(data, "<< {} /Length {} >>\nstream\n", dict, payload.len());
        data.extend_from_slice(payload);
        data.extend_from_slice(b"\nendstream");
        self.push(data)
    }
}

impl PdfWriter {
    pub fn write(document: &PdfDocument) -> Vec<u8> {
        let mut builder = PdfBuilder::new();

        let font_ids: Vec<usize> = document
            .fonts
            .iter()
            .map(|font| {
                builder.push(
                    format!(
                        "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                        font.pdf_name()
                    )
                    .into_bytes(),
                )
            })
            .collect();
        let image_ids: Vec<usize> = document
            .images
            .iter()
            .map(|image| Self::write_image_xobject(&mut builder, image))
            .collect();
        let state_ids: Vec<usize> = document
            .opacities
            .iter()
            .map(|alpha| {
                builder.push(format!("<< /Type /ExtGState /ca {alpha:.3} /CA {alpha:.3} >>").into_bytes())
            })
            .collect();

        let mut page_ids = Vec::with_capacity(document.pages.len());
        for page in &document.pages {
            let compressed = compress_to_vec_zlib(page.content.as_bytes(), COMPRESSION_LEVEL);
            let content_id = builder.push_stream("/Filter /FlateDecode", &compressed);

            let annots: Vec<usize> = page
                .links
                .iter()
                .map(|link| {
                    let [x0, y0, x1, y1] = link.rect;
                    builder.push(
                        format!(
                            "<< /Type /Annot /Subtype /Link /Rect [{x0:.2} {y0:.2} {x1:.2} {y1:.2}] \
                             /Border [0 0 0] /A << /S /URI /URI ({}) >> >>",
                            escape_pdf_string(&link.uri)
                        )
                        .into_bytes(),
                    )
                })
                .collect();

            let mut resources = String::new();
            Self::resource_dict(&mut resources, "Font", "F", &page.fonts, &font_ids);
            Self::resource_dict(&mut resources, "XObject", "Im", &page.images, &image_ids);
            Self::resource_dict(&mut resources, "ExtGState", "GS", &page.states, &state_ids);

            let mut page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] /Contents {} 0 R /Resources << {}>>",
                page.width, page.height, content_id, resources
            );
            if !annots.is_empty() {
                let refs: Vec<String> = annots.iter().map(|id| format!("{id} 0 R")).collect();
                let _ = write!(page_dict, " /Annots [{}]", refs.join(" "));
            }
            page_dict.push_str(" >>");
            page_ids.push(builder.push(page_dict.into_bytes()));
        }

        builder.objects[1] = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();
        let kids: Vec<String> = page_ids.iter().map(|id| format!("{id} 0 R")).collect();
        builder.objects[2] = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            page_ids.len()
        )
        .into_bytes();

        let info_id = builder.push(Self::info_dict(&document.metadata).into_bytes());
        Self::serialize(&builder, info_id)
    }

    fn resource_dict(out: &mut String, kind: &str, prefix: &str, used: &BTreeSet<usize>, ids: &[usize]) {
        if used.is_empty() {
            return;
        }
        let _ = write!(out, "/{kind} << ");
        for &i in used {
            if let Some(id) = ids.get(i) {
                let _ = write!(out, "/{prefix}{i} {id} 0 R ");
            }
        }
        out.push_str(">> ");
    }

    fn info_dict(metadata: &Metadata) -> String {
        let mut info = String::from("<< ");
        let fields = [
            ("Title", &metadata.title),
            ("Author", &metadata.author),
            ("Subject", &metadata.subject),
            ("Creator", &metadata.creator),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                let _ = write!(info, "/{key} ({}) ", escape_pdf_string(value));
            }
        }
        let _ = write!(info, "/Producer ({PRODUCER}) >>");
        info
    }

    /// One XObject, plus a soft mask object when the image has alpha.
    fn write_image_xobject(builder: &mut PdfBuilder, image: &LoadedImage) -> usize {
        let (w, h) = (image.width_px, image.height_px);
        match &image.pixels {
            Pixels::Jpeg { data, gray } => {
                let color_space = if *gray { "/DeviceGray" } else { "/DeviceRGB" };
                builder.push_stream(
                    &format!(
                        "/Type /XObject /Subtype /Image /Width {w} /Height {h} \
                         /ColorSpace {color_space} /BitsPerComponent 8 /Filter /DCTDecode"
                    ),
                    data,
                )
            }
            Pixels::Rgb { rgb, alpha } => {
                let smask = alpha.as_ref().map(|alpha| {
                    let compressed = compress_to_vec_zlib(alpha, COMPRESSION_LEVEL);
                    builder.push_stream(
                        &format!(
                            "/Type /XObject /Subtype /Image /Width {w} /Height {h} \
                             /ColorSpace /DeviceGray /BitsPerComponent 8 /Filter /FlateDecode"
                        ),
                        &compressed,
                    )
                });
                let smask_ref = smask.map(|id| format!(" /SMask {id} 0 R")).unwrap_or_default();
                let compressed = compress_to_vec_zlib(rgb, COMPRESSION_LEVEL);
                builder.push_stream(
                    &format!(
                        "/Type /XObject /Subtype /Image /Width {w} /Height {h} \
                         /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode{smask_ref}"
                    ),
                    &compressed,
                )
            }
        }
    }

    fn serialize(builder: &PdfBuilder, info_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets = vec![0usize; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{i} 0 obj\n");
            output.extend_from_slice(obj);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        output.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{offset:010} 00000 n \n");
        }
        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_id,
            xref_offset
        );
        output
    }
}

/// Escape a string for a PDF literal `( ... )`.
pub fn escape_pdf_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' | '(' | ')' => {
                out.push('\\');
                out.push(ch);
            }
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out
}

/// Encode text as an escaped WinAnsi literal body. Characters outside the
/// encoding become `?`.
pub fn encode_winansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match unicode_to_winansi(ch).unwrap_or(b'?') {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            b @ 0x20..=0x7E => out.push(b as char),
            b => {
                let _ = write!(out, "\\{b:03o}");
            }
        }
    }
    out
}

/// WinAnsiEncoding is Windows-1252: Latin-1 plus typographic punctuation in
/// 0x80..=0x9F.
pub fn unicode_to_winansi(ch: char) -> Option<u8> {
    let cp = ch as u32;
    if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
        return Some(cp as u8);
    }
    let byte = match cp {
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => return None,
    };
    Some(byte)
}

/// Append a closed rounded-rectangle path. `(x, y)` is the bottom-left
/// corner in PDF space.
#[allow(clippy::too_many_arguments)]
pub fn rounded_rect_path(out: &mut String, x: f64, y: f64, w: f64, h: f64, rx: f64, ry: f64) {
    let rx = rx.min(w / 2.0).max(0.0);
    let ry = ry.min(h / 2.0).max(0.0);
    let (kx, ky) = (rx * KAPPA, ry * KAPPA);

    let _ = writeln!(out, "{:.2} {:.2} m", x + rx, y);
    let _ = writeln!(out, "{:.2} {:.2} l", x + w - rx, y);
    let _ = writeln!(
        out,
        "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c",
        x + w - rx + kx, y, x + w, y + ry - ky, x + w, y + ry
    );
    let _ = writeln!(out, "{:.2} {:.2} l", x + w, y + h - ry);
    let _ = writeln!(
        out,
        "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c",
        x + w, y + h - ry + ky, x + w - rx + kx, y + h, x + w - rx, y + h
    );
    let _ = writeln!(out, "{:.2} {:.2} l", x + rx, y + h);
    let _ = writeln!(
        out,
        "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c",
        x + rx - kx, y + h, x, y + h - ry + ky, x, y + h - ry
    );
    let _ = writeln!(out, "{:.2} {:.2} l", x, y + ry);
    let _ = writeln!(
        out,
        "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c",
        x, y + ry - ky, x + rx - kx, y, x + rx, y
    );
    out.push_str("h\n");
}
