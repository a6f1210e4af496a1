//! Column-based slicing and word wrapping for styled strings.

use unicode_segmentation::UnicodeSegmentation;

use super::ansi::{chunks, Chunk, SgrState};
use super::width::{grapheme_width, visible_width};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice {
    pub text: String,
    pub width: usize,
}

/// Columns `[start, start + length)` of `line`.
///
/// Codes seen before the range are replayed in front of the first grapheme so
/// the slice keeps its styling. With `strict`, a wide grapheme that would
/// cross the right edge is dropped instead of overflowing.
pub fn slice_by_column(line: &str, start: usize, length: usize, strict: bool) -> Slice {
    let mut out = Slice {
        text: String::new(),
        width: 0,
    };
    if length == 0 {
        return out;
    }

    let end = start.saturating_add(length);
    let mut col = 0;
    let mut pending = String::new();

    'outer: for chunk in chunks(line) {
        match chunk {
            Chunk::Code(code) if col < start => pending.push_str(code),
            Chunk::Code(code) => out.text.push_str(code),
            Chunk::Text(text) => {
                for grapheme in text.graphemes(true) {
                    let width = grapheme_width(grapheme);
                    if col >= start && (!strict || col + width <= end) {
                        out.text.push_str(&pending);
                        pending.clear();
                        out.text.push_str(grapheme);
                        out.width += width;
                    }
                    col += width;
                    if col >= end {
                        break 'outer;
                    }
                }
            }
        }
    }
    out
}

/// The parts of a line to the left and right of a column window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segments {
    /// Columns `[0, before_end)`, with their original codes.
    pub before: String,
    pub before_width: usize,
    /// Columns from `after_start` to the end, prefixed with the style active
    /// at that column.
    pub after: String,
    pub after_width: usize,
}

/// Split `line` around the window `[before_end, after_start)`.
///
/// Graphemes that straddle either edge are left out of both sides; callers
/// pad the gap with spaces.
pub fn split_around(line: &str, before_end: usize, after_start: usize) -> Segments {
    let mut segments = Segments {
        before: String::new(),
        before_width: 0,
        after: String::new(),
        after_width: 0,
    };
    let mut state = SgrState::default();
    let mut col = 0;
    let mut after_started = false;

    for chunk in chunks(line) {
        match chunk {
            Chunk::Code(code) => {
                state.apply(code);
                if col < before_end {
                    segments.before.push_str(code);
                } else if after_started {
                    segments.after.push_str(code);
                }
            }
            Chunk::Text(text) => {
                for grapheme in text.graphemes(true) {
                    let width = grapheme_width(grapheme);
                    if col + width <= before_end {
                        segments.before.push_str(grapheme);
                        segments.before_width += width;
                    } else if col >= after_start {
                        if !after_started {
                            segments.after.push_str(&state.to_sequence());
                            after_started = true;
                        }
                        segments.after.push_str(grapheme);
                        segments.after_width += width;
                    }
                    col += width;
                }
            }
        }
    }
    segments
}

/// Word-wrap `text` to `width` columns, keeping styles active across breaks.
///
/// Explicit newlines start new lines. Words longer than the width are broken
/// at grapheme boundaries. Trailing spaces are trimmed from every line.
pub fn wrap_text_with_ansi(text: &str, width: usize) -> Vec<String> {
    if text.is_empty() || width == 0 {
        return vec![String::new()];
    }

    let mut lines = Vec::new();
    let mut carried = SgrState::default();
    for paragraph in text.split('\n') {
        let prefixed = format!("{}{paragraph}", carried.to_sequence());
        lines.extend(wrap_paragraph(&prefixed, width));
        carried.apply_all(paragraph);
    }
    lines
        .into_iter()
        .map(|line| line.trim_end_matches(' ').to_string())
        .collect()
}

fn wrap_paragraph(line: &str, width: usize) -> Vec<String> {
    if visible_width(line) <= width {
        return vec![line.to_string()];
    }

    let mut state = SgrState::default();
    let mut wrapped = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;

    for token in tokens(line) {
        let token_width = visible_width(&token);
        let is_space = token_width > 0 && strip_codes_is_blank(&token);

        if token_width > width && !is_space {
            if current_width > 0 {
                wrapped.push(finish_line(&current, &state));
            }
            let mut pieces = break_word(&token, width, &mut state);
            current = pieces.pop().unwrap_or_default();
            current_width = visible_width(&current);
            wrapped.extend(pieces);
            continue;
        }

        if current_width > 0 && current_width + token_width > width {
            wrapped.push(finish_line(&current, &state));
            current = state.to_sequence();
            current_width = 0;
            if is_space {
                state.apply_all(&token);
                continue;
            }
        }

        current.push_str(&token);
        current_width += token_width;
        state.apply_all(&token);
    }

    if !current.is_empty() {
        wrapped.push(current);
    }
    wrapped
}

fn finish_line(line: &str, state: &SgrState) -> String {
    let mut out = line.trim_end_matches(' ').to_string();
    out.push_str(state.line_end_reset());
    out
}

fn strip_codes_is_blank(token: &str) -> bool {
    chunks(token).all(|chunk| match chunk {
        Chunk::Code(_) => true,
        Chunk::Text(text) => text.chars().all(|ch| ch == ' '),
    })
}

/// Alternating runs of spaces and non-spaces; codes attach to the following text.
fn tokens(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut pending = String::new();
    let mut in_space = false;

    for chunk in chunks(line) {
        match chunk {
            Chunk::Code(code) => pending.push_str(code),
            Chunk::Text(text) => {
                for ch in text.chars() {
                    let is_space = ch == ' ';
                    if is_space != in_space && !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                    current.push_str(&pending);
                    pending.clear();
                    in_space = is_space;
                    current.push(ch);
                }
            }
        }
    }
    current.push_str(&pending);
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn break_word(word: &str, width: usize, state: &mut SgrState) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = state.to_sequence();
    let mut current_width = 0;

    for chunk in chunks(word) {
        match chunk {
            Chunk::Code(code) => {
                current.push_str(code);
                state.apply(code);
            }
            Chunk::Text(text) => {
                for grapheme in text.graphemes(true) {
                    let grapheme_cols = grapheme_width(grapheme);
                    if current_width > 0 && current_width + grapheme_cols > width {
                        current.push_str(state.line_end_reset());
                        lines.push(std::mem::replace(&mut current, state.to_sequence()));
                        current_width = 0;
                    }
                    current.push_str(grapheme);
                    current_width += grapheme_cols;
                }
            }
        }
    }
    lines.push(current);
    lines
}
