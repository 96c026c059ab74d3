//! # Line Breaking
//!
//! Greedy line breaking on UAX#14 break opportunities. Explicit newlines
//! always break; words wider than the line are cut at character boundaries.
//! Whitespace at the end of a line hangs past the edge and is dropped from
//! the output.

use unicode_linebreak::{linebreaks, BreakOpportunity};

/// Break opportunity before each char. Index 0 is always `None`.
fn break_opportunities(text: &str) -> Vec<Option<BreakOpportunity>> {
    let char_count = text.chars().count();
    let mut result = vec![None; char_count];

    // linebreaks() reports the byte offset where the next segment starts.
    let mut byte_to_char = vec![0usize; text.len() + 1];
    for (char_idx, (byte_idx, _)) in text.char_indices().enumerate() {
        byte_to_char[byte_idx] = char_idx;
    }
    byte_to_char[text.len()] = char_count;

    for (byte_offset, opp) in linebreaks(text) {
        let char_idx = byte_to_char[byte_offset];
        if char_idx < char_count {
            result[char_idx] = Some(opp);
        }
    }
    result
}

fn is_newline(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn push_line(lines: &mut Vec<String>, chars: &[char]) {
    let line: String = chars.iter().filter(|c| !is_newline(**c)).collect();
    lines.push(line.trim_end().to_string());
}

/// Break `text` into lines no wider than `max_width`, measuring each char
/// with `width_of`. Always returns at least one line.
pub fn break_lines(text: &str, max_width: f64, width_of: impl Fn(char) -> f64) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }

    let chars: Vec<char> = text.chars().collect();
    let widths: Vec<f64> = chars.iter().map(|&c| width_of(c)).collect();
    let opportunities = break_opportunities(text);

    let mut lines = Vec::new();
    let mut line_start = 0;
    let mut line_width = 0.0;
    let mut last_break: Option<usize> = None;

    for (i, &ch) in chars.iter().enumerate() {
        match opportunities[i] {
            Some(BreakOpportunity::Mandatory) if i > 0 => {
                push_line(&mut lines, &chars[line_start..i]);
                line_start = i;
                line_width = 0.0;
                last_break = None;
            }
            Some(BreakOpportunity::Allowed) if i > 0 => last_break = Some(i),
            _ => {}
        }

        if is_newline(ch) {
            continue;
        }
        if ch.is_whitespace() {
            line_width += widths[i];
            continue;
        }

        if line_width + widths[i] > max_width && line_start < i {
            match last_break.filter(|&b| b > line_start) {
                Some(b) => {
                    push_line(&mut lines, &chars[line_start..b]);
                    line_start = b;
                }
                None => {
                    // Nothing to break at: cut the word here.
                    push_line(&mut lines, &chars[line_start..i]);
                    line_start = i;
                }
            }
            line_width = widths[line_start..=i].iter().sum();
            last_break = None;
            continue;
        }
        line_width += widths[i];
    }

    if line_start < chars.len() {
        push_line(&mut lines, &chars[line_start..]);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
