//! # Font Management
//!
//! Maps a style's font family and weight onto one of the standard PDF fonts.
//! Standard fonts need no embedding; every reader ships them, so only their
//! metrics live here.

pub mod metrics;

pub use metrics::StandardFontMetrics;

const COURIER_WIDTH: u16 = 600;

/// The standard fonts stackpdf draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    TimesRoman,
    TimesBold,
    Courier,
    CourierBold,
}

impl StandardFont {
    /// Resolve a family name and CSS-style weight. Unknown families fall
    /// back to Helvetica.
    pub fn resolve(family: &str, weight: u32) -> Self {
        let bold = weight >= 600;
        let normalized = family.trim().trim_matches(|c| c == '"' || c == '\'').to_ascii_lowercase();
        match normalized.as_str() {
            "times" | "times-roman" | "times new roman" | "serif" => {
                if bold {
                    Self::TimesBold
                } else {
                    Self::TimesRoman
                }
            }
            "courier" | "courier new" | "monospace" => {
                if bold {
                    Self::CourierBold
                } else {
                    Self::Courier
                }
            }
            other => {
                if !matches!(other, "helvetica" | "arial" | "sans-serif") {
                    log::debug!("font family {family:?} is not a standard font, using Helvetica");
                }
                if bold {
                    Self::HelveticaBold
                } else {
                    Self::Helvetica
                }
            }
        }
    }

    /// The PDF BaseFont name.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
        }
    }

    pub fn metrics(&self) -> StandardFontMetrics {
        match self {
            Self::Helvetica => StandardFontMetrics {
                widths: &metrics::HELVETICA,
                fixed: None,
                default_width: 556,
                ascender: 718,
                descender: -207,
            },
            Self::HelveticaBold => StandardFontMetrics {
                widths: &metrics::HELVETICA_BOLD,
                fixed: None,
                default_width: 611,
                ascender: 718,
                descender: -207,
            },
            Self::TimesRoman => StandardFontMetrics {
                widths: &metrics::TIMES_ROMAN,
                fixed: None,
                default_width: 500,
                ascender: 683,
                descender: -217,
            },
            Self::TimesBold => StandardFontMetrics {
                widths: &metrics::TIMES_BOLD,
                fixed: None,
                default_width: 500,
                ascender: 676,
                descender: -205,
            },
            Self::Courier | Self::CourierBold => StandardFontMetrics {
                widths: &metrics::HELVETICA,
                fixed: Some(COURIER_WIDTH),
                default_width: COURIER_WIDTH,
                ascender: 629,
                descender: -157,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_families() {
        assert_eq!(StandardFont::resolve("Helvetica", 400), StandardFont::Helvetica);
        assert_eq!(StandardFont::resolve("Arial", 700), StandardFont::HelveticaBold);
        assert_eq!(StandardFont::resolve("Times New Roman", 400), StandardFont::TimesRoman);
        assert_eq!(StandardFont::resolve("courier", 600), StandardFont::CourierBold);
        assert_eq!(StandardFont::resolve("Comic Sans", 400), StandardFont::Helvetica);
    }

    #[test]
    fn test_bold_wider() {
        let regular = StandardFont::Helvetica.metrics().char_width('A', 12.0);
        let bold = StandardFont::HelveticaBold.metrics().char_width('A', 12.0);
        assert!(bold > regular);
    }

    #[test]
    fn test_courier_is_monospaced() {
        let m = StandardFont::Courier.metrics();
        assert!((m.char_width('i', 10.0) - m.char_width('W', 10.0)).abs() < 1e-9);
        assert!((m.char_width('x', 10.0) - 6.0).abs() < 1e-9);
    }
}
