//! Text measurement rules shared by sizing, reflow and drawing.

use crate::backend::Backend;

/// Width multiplier for bold text measured with regular metrics.
pub const BOLD_WIDTH_FACTOR: f64 = 1.04;

/// Extra space below every measured text box, as a fraction of the line height.
pub const TEXT_BOTTOM_SLACK: f64 = 0.15;

/// A tab advances as far as this many spaces.
pub const TAB_WIDTH_IN_SPACES: f64 = 8.0;

/// Widest line of `text` in the backend's current font.
///
/// Glyph runs are measured by the backend; whitespace is summed separately
/// at the width of a space, with tabs counting as eight.
pub fn natural_width<B: Backend + ?Sized>(backend: &B, text: &str) -> f64 {
    let space = backend.string_unit_width(' ') * backend.font_size();
    text.split('\n')
        .map(|line| {
            let mut width = 0.0;
            let mut run_start = None;
            for (i, ch) in line.char_indices() {
                if ch.is_whitespace() {
                    if let Some(start) = run_start.take() {
                        width += backend.measure_text_dimensions(&line[start..i]).width;
                    }
                    width += if ch == '\t' {
                        space * TAB_WIDTH_IN_SPACES
                    } else {
                        space
                    };
                } else if run_start.is_none() {
                    run_start = Some(i);
                }
            }
            if let Some(start) = run_start {
                width += backend.measure_text_dimensions(&line[start..]).width;
            }
            width
        })
        .fold(0.0, f64::max)
}

/// Whitespace between the first and last visible characters.
pub fn has_internal_whitespace(text: &str) -> bool {
    text.trim().chars().any(char::is_whitespace)
}

pub fn line_height<B: Backend + ?Sized>(backend: &B) -> f64 {
    backend.font_size() * backend.line_height_factor()
}

/// Height of a text box holding `lines` lines.
pub fn text_height(lines: usize, line_height: f64) -> f64 {
    lines as f64 * line_height + TEXT_BOTTOM_SLACK * line_height
}

/// Lines as the text will be drawn.
///
/// Text without internal whitespace that fits its container is a single
/// line; everything else is split by the backend.
pub fn layout_lines<B: Backend + ?Sized>(
    backend: &B,
    text: &str,
    width: f64,
    single_line_limit: f64,
) -> Vec<String> {
    if !has_internal_whitespace(text) && natural_width(backend, text) <= single_line_limit + 1e-6 {
        return vec![text.to_string()];
    }
    let lines = backend.split_text_to_width(text.trim_end(), width);
    if lines.is_empty() {
        vec![String::new()]
    } else {
        lines
    }
}

/// Byte offset in `text` where each split line begins.
///
/// The first line always starts at 0. Later lines are located by searching
/// for their trimmed content after the previous line, so slicing `text` at
/// these offsets loses no characters even when the splitter dropped spaces.
/// The line feed that ended a line stays with that line, so a slice starting
/// at a blank line splits into exactly the lines it was cut from.
pub fn line_boundaries(text: &str, lines: &[String]) -> Vec<usize> {
    let mut bounds = Vec::with_capacity(lines.len());
    let mut cursor = 0;
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            bounds.push(0);
            continue;
        }
        cursor = past_line_feed(text, cursor);
        let needle = line.trim();
        if needle.is_empty() {
            bounds.push(cursor);
            continue;
        }
        // Fall back to the first word when the splitter collapsed whitespace.
        let first_word = needle.split_whitespace().next().unwrap_or("");
        let found = text[cursor..]
            .find(needle)
            .map(|offset| (offset, needle.len()))
            .or_else(|| text[cursor..].find(first_word).map(|offset| (offset, first_word.len())));
        match found {
            Some((offset, len)) => {
                bounds.push(cursor + offset);
                cursor += offset + len;
            }
            None => bounds.push(cursor),
        }
    }
    bounds
}

/// Offset just past the line feed at `from`, skipping the blanks before it.
/// Returns `from` when visible text comes first.
fn past_line_feed(text: &str, from: usize) -> usize {
    let rest = &text[from..];
    let blanks = rest.len() - rest.trim_start_matches(|c: char| c.is_whitespace() && c != '\n').len();
    if rest[blanks..].starts_with('\n') {
        from + blanks + 1
    } else {
        from
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;
    use crate::model::PageSize;

    fn backend() -> RecordingBackend {
        // 5pt per character at the default 10pt size
        RecordingBackend::create_document(PageSize::A4)
    }

    #[test]
    fn test_tabs_count_as_eight_spaces() {
        let b = backend();
        assert_eq!(natural_width(&b, "ab cd"), 25.0);
        assert_eq!(natural_width(&b, "ab\tcd"), 20.0 + 40.0);
    }

    #[test]
    fn test_widest_line_wins() {
        let b = backend();
        assert_eq!(natural_width(&b, "a\nabcd\nab"), 20.0);
    }

    #[test]
    fn test_internal_whitespace() {
        assert!(!has_internal_whitespace("  word  "));
        assert!(has_internal_whitespace("two words"));
        assert!(has_internal_whitespace("line\nbreak"));
    }

    #[test]
    fn test_height_includes_slack() {
        assert!((text_height(2, 12.0) - 25.8).abs() < 1e-9);
    }

    #[test]
    fn test_boundaries_partition_text() {
        let b = backend();
        let text = "alpha  beta gamma delta";
        let lines = b.split_text_to_width(text, 60.0);
        let bounds = line_boundaries(text, &lines);
        assert_eq!(bounds[0], 0);
        assert!(bounds.windows(2).all(|w| w[0] <= w[1]));
        let mut rebuilt = String::new();
        for (i, start) in bounds.iter().enumerate() {
            let end = bounds.get(i + 1).copied().unwrap_or(text.len());
            rebuilt.push_str(&text[*start..end]);
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_line_feeds_stay_with_the_line_they_end() {
        let b = backend();
        let text = "l1\nl2\n\nm1\r\nm2";
        let lines = b.split_text_to_width(text, 100.0);
        assert_eq!(lines.len(), 5);
        let bounds = line_boundaries(text, &lines);
        let starts: Vec<&str> = bounds.iter().map(|&i| &text[i..]).collect();
        assert_eq!(starts[1], "l2\n\nm1\r\nm2");
        assert_eq!(starts[2], "\nm1\r\nm2");
        assert_eq!(starts[3], "m1\r\nm2");
        assert_eq!(starts[4], "m2");

        // A slice cut at the blank line splits back into the lines it holds.
        let tail = &text[bounds[2]..];
        assert_eq!(b.split_text_to_width(tail, 100.0).len(), 3);
    }

    #[test]
    fn test_unbreakable_text_that_fits_is_one_line() {
        let b = backend();
        assert_eq!(layout_lines(&b, "abcdef", 10.0, 100.0), vec!["abcdef"]);
        assert_eq!(layout_lines(&b, "abcdef", 10.0, 20.0).len(), 3);
    }
}
