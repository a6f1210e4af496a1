//! Truncation and padding helpers.

use unicode_segmentation::UnicodeSegmentation;

use super::ansi::{chunks, Chunk};
use super::width::{grapheme_width, visible_width};

const ANSI_RESET: &str = "\x1b[0m";

/// Cut `text` to at most `max_width` columns, ending with `ellipsis` when cut.
///
/// Codes are kept in place; a reset is inserted before the ellipsis so it is
/// drawn unstyled. With `pad`, the result is filled with spaces to exactly
/// `max_width` columns.
pub fn truncate_to_width(text: &str, max_width: usize, ellipsis: &str, pad: bool) -> String {
    if max_width == 0 {
        return String::new();
    }

    let text_width = visible_width(text);
    if text_width <= max_width {
        return if pad {
            pad_right(text, max_width)
        } else {
            text.to_string()
        };
    }

    let budget = max_width.saturating_sub(visible_width(ellipsis));
    if budget == 0 {
        return ellipsis.chars().take(max_width).collect();
    }

    let mut out = String::with_capacity(text.len() + ellipsis.len() + ANSI_RESET.len());
    let mut used = 0;
    'outer: for chunk in chunks(text) {
        match chunk {
            Chunk::Code(code) => out.push_str(code),
            Chunk::Text(text) => {
                for grapheme in text.graphemes(true) {
                    let width = grapheme_width(grapheme);
                    if used + width > budget {
                        break 'outer;
                    }
                    out.push_str(grapheme);
                    used += width;
                }
            }
        }
    }
    out.push_str(ANSI_RESET);
    out.push_str(ellipsis);

    if pad {
        pad_right(&out, max_width)
    } else {
        out
    }
}

/// Append spaces until `text` is `width` columns wide.
pub fn pad_right(text: &str, width: usize) -> String {
    let missing = width.saturating_sub(visible_width(text));
    let mut out = String::with_capacity(text.len() + missing);
    out.push_str(text);
    out.extend(std::iter::repeat(' ').take(missing));
    out
}

#[cfg(test)]
mod tests {
    use super::{pad_right, truncate_to_width};
    use crate::core::text::width::visible_width;

    #[test]
    fn truncate_returns_original_when_shorter() {
        assert_eq!(truncate_to_width("hello", 6, "...", false), "hello");
    }

    #[test]
    fn truncate_adds_ellipsis_and_reset() {
        let truncated = truncate_to_width("hello", 4, "...", false);
        assert_eq!(truncated, "h\x1b[0m...");
        assert_eq!(visible_width(&truncated), 4);
    }

    #[test]
    fn truncate_preserves_style_prefix() {
        let truncated = truncate_to_width("\x1b[31mhello", 4, "…", false);
        assert_eq!(truncated, "\x1b[31mhel\x1b[0m…");
        assert_eq!(visible_width(&truncated), 4);
    }

    #[test]
    fn truncate_pads_when_requested() {
        let padded = truncate_to_width("hi", 4, "...", true);
        assert_eq!(padded, "hi  ");
    }

    #[test]
    fn truncate_handles_small_max_width() {
        assert_eq!(truncate_to_width("hello", 2, "...", false), "..");
    }

    #[test]
    fn pad_right_measures_visible_columns() {
        assert_eq!(pad_right("\x1b[1mab\x1b[0m", 4), "\x1b[1mab\x1b[0m  ");
        assert_eq!(pad_right("abcdef", 4), "abcdef");
    }
}
