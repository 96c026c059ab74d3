//! # Image Loading
//!
//! Resolves an image node's source (data URI, file path or bare base64) to
//! bytes and prepares them for embedding. JPEG bytes are embedded as they
//! are; PNG is decoded to RGB with a separate alpha plane for the soft mask.

use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use image::codecs::jpeg::JpegDecoder;
use image::{ColorType, ImageDecoder};

use crate::backend::ImageFormat;
use crate::error::{LayoutError, Result};

#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub pixels: Pixels,
    pub width_px: u32,
    pub height_px: u32,
}

#[derive(Debug, Clone)]
pub enum Pixels {
    /// Untouched JPEG stream, embedded with DCTDecode.
    Jpeg { data: Vec<u8>, gray: bool },
    /// 8-bit RGB samples plus an alpha plane when any pixel is translucent.
    Rgb { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

/// Load and decode `src`. The format hint is only used to report mismatches;
/// the bytes decide how the image is decoded.
pub fn load_image(src: &str, hint: ImageFormat) -> Result<LoadedImage> {
    let bytes = read_source(src)?;
    let loaded = if bytes.starts_with(&[0xFF, 0xD8]) {
        load_jpeg(bytes)?
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        load_png(&bytes)?
    } else {
        return Err(LayoutError::Image(format!(
            "unsupported image data in {} (expected JPEG or PNG)",
            describe(src)
        )));
    };

    let actual = match loaded.pixels {
        Pixels::Jpeg { .. } => ImageFormat::Jpeg,
        Pixels::Rgb { .. } => ImageFormat::Png,
    };
    if hint != ImageFormat::Unknown && hint != actual {
        log::warn!("{} is declared as {:?} but contains {:?}", describe(src), hint, actual);
    }
    Ok(loaded)
}

fn read_source(src: &str) -> Result<Vec<u8>> {
    let src = src.trim();
    if let Some(rest) = src.strip_prefix("data:") {
        let (_, payload) = rest
            .split_once(',')
            .ok_or_else(|| LayoutError::Image("data URI has no payload".to_string()))?;
        return decode_base64(payload);
    }
    let path = Path::new(src);
    if src.starts_with('/') || src.starts_with("./") || src.starts_with("../") || path.is_file() {
        return std::fs::read(path)
            .map_err(|e| LayoutError::Image(format!("cannot read image file {src}: {e}")));
    }
    decode_base64(src)
}

fn decode_base64(payload: &str) -> Result<Vec<u8>> {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| LayoutError::Image(format!("invalid base64 image data: {e}")))
}

/// Reads the frame header only; the compressed data is kept as is.
fn load_jpeg(data: Vec<u8>) -> Result<LoadedImage> {
    let ((width_px, height_px), gray) = {
        let decoder = JpegDecoder::new(Cursor::new(data.as_slice()))
            .map_err(|e| LayoutError::Image(format!("invalid JPEG: {e}")))?;
        let gray = matches!(decoder.color_type(), ColorType::L8 | ColorType::L16);
        (decoder.dimensions(), gray)
    };
    Ok(LoadedImage {
        pixels: Pixels::Jpeg { data, gray },
        width_px,
        height_px,
    })
}

fn load_png(data: &[u8]) -> Result<LoadedImage> {
    let decoded = image::load_from_memory_with_format(data, image::ImageFormat::Png)
        .map_err(|e| LayoutError::Image(format!("invalid PNG: {e}")))?;
    let rgba = decoded.to_rgba8();
    let (width_px, height_px) = rgba.dimensions();

    let count = (width_px as usize) * (height_px as usize);
    let mut rgb = Vec::with_capacity(count * 3);
    let mut alpha = Vec::with_capacity(count);
    for pixel in rgba.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel.0[3]);
    }
    let translucent = alpha.iter().any(|&a| a != u8::MAX);
    Ok(LoadedImage {
        pixels: Pixels::Rgb {
            rgb,
            alpha: translucent.then_some(alpha),
        },
        width_px,
        height_px,
    })
}

/// Short name for log and error messages; data URIs can be megabytes long.
fn describe(src: &str) -> String {
    if src.len() > 48 {
        format!("{}...", &src[..src.char_indices().nth(40).map_or(src.len(), |(i, _)| i)])
    } else {
        src.to_string()
    }
}
