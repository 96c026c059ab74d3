//! # Style System
//!
//! The style inputs a box carries into layout: box model, sizing,
//! absolute offsets, alignment, typography, color and border.
//!
//! Styles are not cascaded by resolution here. Draw-affecting properties
//! (font, size, weight, text color) are pushed onto the backend while a
//! subtree is computed or drawn, so descendants inherit them through the
//! backend's [`StyleState`] and the state is restored once the subtree is done.

use crate::model::Edges;
use serde::{Deserialize, Serialize};

/// The complete set of style inputs for a node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    // ── Box Model ──────────────────────────────────────────────
    /// Explicit content width (points or percentage of the parent's budget).
    pub width: Option<Dimension>,
    /// Explicit content height.
    pub height: Option<Dimension>,
    /// Margin outside the padding box.
    pub margin: Option<Edges>,
    /// Padding inside the margin box.
    pub padding: Option<Edges>,

    // ── Positioning ────────────────────────────────────────────
    /// Page-relative offsets. Any offset set makes the node absolute.
    pub top: Option<f64>,
    pub right: Option<f64>,
    pub bottom: Option<f64>,
    pub left: Option<f64>,
    /// Explicit start page (absolute nodes only).
    pub page: Option<usize>,

    // ── Stack Behavior ─────────────────────────────────────────
    /// Absorb leftover horizontal space in an HStack row.
    #[serde(default)]
    pub stretch: bool,
    /// Keep a stack on one page when it would fit on a fresh one.
    #[serde(default)]
    pub same_page: bool,
    /// Horizontal alignment (text alignment for leaves, child alignment for VStacks).
    pub align: Option<HAlign>,
    /// Vertical alignment of HStack row members.
    pub vertical_align: Option<VAlign>,

    // ── Typography ─────────────────────────────────────────────
    pub font_family: Option<String>,
    /// Font weight (100-900); 600 and above draws bold.
    pub font_weight: Option<u32>,
    pub font_size: Option<f64>,
    /// Text color.
    pub color: Option<Color>,

    // ── Visual ─────────────────────────────────────────────────
    pub background_color: Option<Color>,
    pub border: Option<Border>,
    /// Link target for the node's padding box.
    pub href: Option<String>,
}

impl Style {
    pub fn margin(&self) -> Edges {
        self.margin.unwrap_or_default()
    }

    pub fn padding(&self) -> Edges {
        self.padding.unwrap_or_default()
    }

    /// A node is absolute as soon as any of its four offsets is set.
    pub fn is_absolute(&self) -> bool {
        self.top.is_some() || self.right.is_some() || self.bottom.is_some() || self.left.is_some()
    }

    pub fn h_align(&self) -> HAlign {
        self.align.unwrap_or_default()
    }

    pub fn v_align(&self) -> VAlign {
        self.vertical_align.unwrap_or_default()
    }

    /// Set the four offsets in CSS order (top, right, bottom, left).
    pub fn position(
        mut self,
        top: Option<f64>,
        right: Option<f64>,
        bottom: Option<f64>,
        left: Option<f64>,
    ) -> Self {
        self.top = top;
        self.right = right;
        self.bottom = bottom;
        self.left = left;
        self
    }

    /// Overlay this node's draw-affecting properties onto the current backend state.
    pub fn overlay(&self, base: &StyleState) -> StyleState {
        StyleState {
            font_family: self
                .font_family
                .clone()
                .unwrap_or_else(|| base.font_family.clone()),
            font_weight: self.font_weight.unwrap_or(base.font_weight),
            font_size: self.font_size.unwrap_or(base.font_size),
            text_color: self.color.unwrap_or(base.text_color),
            ..base.clone()
        }
    }
}

/// A size that is either absolute or a percentage of the parent's width budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DimensionRepr", into = "DimensionRepr")]
pub enum Dimension {
    /// Fixed size in points (1/72 inch).
    Pt(f64),
    /// Percentage of the nearest ancestor's content budget.
    Percent(f64),
}

impl Dimension {
    /// Resolve against a parent size. Percentages need one; points never do.
    pub fn resolve(&self, parent_size: Option<f64>) -> Option<f64> {
        match self {
            Dimension::Pt(v) => Some(*v),
            Dimension::Percent(p) => parent_size.map(|s| s * p / 100.0),
        }
    }
}

/// JSON form of a [`Dimension`]: a bare number, `"120"`, or `"50%"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum DimensionRepr {
    Number(f64),
    Text(String),
}

impl TryFrom<DimensionRepr> for Dimension {
    type Error = String;

    fn try_from(repr: DimensionRepr) -> Result<Self, Self::Error> {
        match repr {
            DimensionRepr::Number(v) => Ok(Dimension::Pt(v)),
            DimensionRepr::Text(s) => {
                let s = s.trim();
                if let Some(pct) = s.strip_suffix('%') {
                    pct.trim()
                        .parse::<f64>()
                        .map(Dimension::Percent)
                        .map_err(|_| format!("invalid percentage '{}'", s))
                } else {
                    s.trim_end_matches("pt")
                        .parse::<f64>()
                        .map(Dimension::Pt)
                        .map_err(|_| format!("invalid dimension '{}'", s))
                }
            }
        }
    }
}

impl From<Dimension> for DimensionRepr {
    fn from(d: Dimension) -> Self {
        match d {
            Dimension::Pt(v) => DimensionRepr::Number(v),
            Dimension::Percent(p) => DimensionRepr::Text(format!("{}%", p)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HAlign {
    #[default]
    Leading,
    Center,
    Trailing,
    Justify,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VAlign {
    #[default]
    Leading,
    Center,
    Trailing,
}

/// Stroke around a node's margin box.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Border {
    #[serde(default)]
    pub color: Color,
    #[serde(default = "default_border_width")]
    pub width: f64,
    #[serde(default)]
    pub radius: f64,
}

fn default_border_width() -> f64 {
    1.0
}

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "ColorRepr", into = "ColorRepr")]
pub struct Color {
    pub r: f64, // 0.0 - 1.0
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`. Malformed input yields black.
    pub fn hex(hex: &str) -> Self {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Color::BLACK;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).unwrap_or(0) as f64 / 255.0;
        match hex.len() {
            3 => Self::rgb(
                channel(&hex[0..1].repeat(2)),
                channel(&hex[1..2].repeat(2)),
                channel(&hex[2..3].repeat(2)),
            ),
            6 => Self::rgb(channel(&hex[0..2]), channel(&hex[2..4]), channel(&hex[4..6])),
            8 => Self::rgba(
                channel(&hex[0..2]),
                channel(&hex[2..4]),
                channel(&hex[4..6]),
                channel(&hex[6..8]),
            ),
            _ => Color::BLACK,
        }
    }

    pub fn is_opaque(&self) -> bool {
        self.a >= 1.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Hex(String),
    Rgba {
        r: f64,
        g: f64,
        b: f64,
        #[serde(default = "opaque")]
        a: f64,
    },
}

fn opaque() -> f64 {
    1.0
}

impl From<ColorRepr> for Color {
    fn from(repr: ColorRepr) -> Self {
        match repr {
            ColorRepr::Hex(s) => Color::hex(&s),
            ColorRepr::Rgba { r, g, b, a } => Color { r, g, b, a },
        }
    }
}

impl From<Color> for ColorRepr {
    fn from(c: Color) -> Self {
        ColorRepr::Rgba {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// The backend's draw-affecting state as one typed record.
///
/// Pushing a node's style takes a snapshot of this record; restoring writes
/// the snapshot back. Nothing is dispatched by property name.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleState {
    pub font_family: String,
    pub font_weight: u32,
    pub font_size: f64,
    pub text_color: Color,
    pub fill_color: Color,
    pub stroke_color: Color,
    pub line_width: f64,
}

impl StyleState {
    pub fn is_bold(&self) -> bool {
        self.font_weight >= 600
    }
}

impl Default for StyleState {
    fn default() -> Self {
        Self {
            font_family: "Helvetica".to_string(),
            font_weight: 400,
            font_size: 12.0,
            text_color: Color::BLACK,
            fill_color: Color::BLACK,
            stroke_color: Color::BLACK,
            line_width: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_from_json() {
        let d: Dimension = serde_json::from_str("120").unwrap();
        assert_eq!(d, Dimension::Pt(120.0));
        let d: Dimension = serde_json::from_str("\"50%\"").unwrap();
        assert_eq!(d, Dimension::Percent(50.0));
        assert!(serde_json::from_str::<Dimension>("\"wide\"").is_err());
    }

    #[test]
    fn test_percentage_needs_parent() {
        assert_eq!(Dimension::Percent(50.0).resolve(Some(300.0)), Some(150.0));
        assert_eq!(Dimension::Percent(50.0).resolve(None), None);
        assert_eq!(Dimension::Pt(20.0).resolve(None), Some(20.0));
    }

    #[test]
    fn test_hex_colors() {
        let c = Color::hex("#ff0000");
        assert_eq!((c.r, c.g, c.b, c.a), (1.0, 0.0, 0.0, 1.0));
        let c = Color::hex("#0f0");
        assert_eq!(c.g, 1.0);
        let c = Color::hex("#00000080");
        assert!((c.a - 128.0 / 255.0).abs() < 1e-9);
        assert!(!c.is_opaque());
        assert_eq!(Color::hex("nonsense"), Color::BLACK);
    }

    #[test]
    fn test_hex_rejects_non_ascii_input() {
        assert_eq!(Color::hex("#aé"), Color::BLACK);
        assert_eq!(Color::hex("#ééé"), Color::BLACK);
        assert_eq!(Color::hex("#12345g"), Color::BLACK);
        let c: Color = serde_json::from_str("\"#aé\"").unwrap();
        assert_eq!(c, Color::BLACK);
    }

    #[test]
    fn test_color_accepts_object_or_hex() {
        let c: Color = serde_json::from_str(r#"{"r": 0.5, "g": 0.5, "b": 0.5}"#).unwrap();
        assert_eq!(c.a, 1.0);
        let c: Color = serde_json::from_str("\"#ffffff\"").unwrap();
        assert_eq!(c, Color::WHITE);
    }

    #[test]
    fn test_any_offset_makes_absolute() {
        assert!(!Style::default().is_absolute());
        assert!(Style::default().position(None, Some(0.0), None, None).is_absolute());
    }

    #[test]
    fn test_overlay_keeps_unset_properties() {
        let base = StyleState::default();
        let style = Style {
            font_size: Some(20.0),
            font_weight: Some(700),
            ..Default::default()
        };
        let state = style.overlay(&base);
        assert_eq!(state.font_size, 20.0);
        assert!(state.is_bold());
        assert_eq!(state.font_family, "Helvetica");
        assert_eq!(state.fill_color, base.fill_color);
    }
}
