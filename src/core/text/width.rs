//! Column width of graphemes and styled strings.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

use super::ansi::{chunks, Chunk};

const TAB_WIDTH: usize = 3;

pub fn grapheme_width(grapheme: &str) -> usize {
    match grapheme {
        "" => 0,
        "\t" => TAB_WIDTH,
        _ if emojis::get(grapheme).is_some() => 2,
        _ => grapheme
            .chars()
            .map(|ch| {
                if ch == '\t' {
                    TAB_WIDTH
                } else {
                    UnicodeWidthChar::width(ch).unwrap_or(0)
                }
            })
            .sum(),
    }
}

/// Terminal columns occupied by `input`, ignoring escape codes.
pub fn visible_width(input: &str) -> usize {
    chunks(input)
        .map(|chunk| match chunk {
            Chunk::Code(_) => 0,
            Chunk::Text(text) => text.graphemes(true).map(grapheme_width).sum(),
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::visible_width;

    #[test]
    fn ansi_ignored_in_width() {
        assert_eq!(visible_width("hi\x1b[31m!!\x1b[0m"), 4);
    }

    #[test]
    fn hyperlinks_ignored_in_width() {
        let input = "\x1b]8;;https://example.com\x07link\x1b]8;;\x07";
        assert_eq!(visible_width(input), 4);
    }

    #[test]
    fn wide_glyphs_take_two_columns() {
        assert_eq!(visible_width("😀"), 2);
        assert_eq!(visible_width("日本"), 4);
    }

    #[test]
    fn styled_width_matches_plain_width() {
        let plain = "status: ok";
        let styled = "\x1b[1mstatus:\x1b[0m \x1b[38;2;0;200;0mok\x1b[39m";
        assert_eq!(visible_width(styled), visible_width(plain));
        assert_eq!(visible_width(plain), plain.chars().count());
    }
}
