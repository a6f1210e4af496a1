//! 2D line buffer with escape-aware measurement and compositing.
//!
//! Lines may embed escape codes. Every width here is the visible width
//! (codes stripped), never the byte length.

use crate::core::style::{dim_line, Style, RESET};
use crate::core::text::slice::{slice_by_column, split_around};
use crate::core::text::utils::pad_right;
use crate::core::text::width::visible_width;

/// Closes SGR state and any open hyperlink between composited segments.
const SEGMENT_RESET: &str = "\x1b[0m\x1b]8;;\x07";

/// Placement of content inside a larger extent, on either axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Alignment {
    #[default]
    Leading,
    Center,
    Trailing,
}

impl Alignment {
    /// Split `extra` cells into (before, after) padding.
    pub fn split(self, extra: usize) -> (usize, usize) {
        match self {
            Alignment::Leading => (0, extra),
            Alignment::Center => (extra / 2, extra - extra / 2),
            Alignment::Trailing => (extra, 0),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    lines: Vec<String>,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Split on `\n`; an empty string still yields one (empty) line.
    pub fn from_text(text: &str) -> Self {
        Self::from_lines(text.split('\n'))
    }

    /// `height` blank lines of `width` spaces.
    pub fn blank(width: usize, height: usize) -> Self {
        Self {
            lines: vec![" ".repeat(width); height],
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn height(&self) -> usize {
        self.lines.len()
    }

    /// Widest visible line.
    pub fn width(&self) -> usize {
        self.lines
            .iter()
            .map(|line| visible_width(line))
            .max()
            .unwrap_or(0)
    }

    /// Stack `other` below, with `spacing` blank lines between non-empty operands.
    pub fn vertical_append(mut self, other: TextBuffer, spacing: usize) -> TextBuffer {
        if other.is_empty() {
            return self;
        }
        if self.is_empty() {
            return other;
        }
        self.lines
            .extend(std::iter::repeat(String::new()).take(spacing));
        self.lines.extend(other.lines);
        self
    }

    /// Place `other` to the right, `spacing` columns after this buffer's width.
    pub fn horizontal_append(self, other: TextBuffer, spacing: usize) -> TextBuffer {
        if other.is_empty() {
            return self;
        }
        if self.is_empty() {
            return other;
        }
        let left_width = self.width();
        let rows = self.height().max(other.height());
        let gap = " ".repeat(spacing);
        let mut left = self.lines.into_iter();
        let mut right = other.lines.into_iter();
        let lines = (0..rows)
            .map(|_| {
                let mut line = pad_right(&left.next().unwrap_or_default(), left_width);
                line.push_str(&gap);
                line.push_str(&right.next().unwrap_or_default());
                line
            })
            .collect();
        TextBuffer { lines }
    }

    /// Row-wise replacement: each non-empty row of `other` replaces the base row.
    pub fn overlay(mut self, other: &TextBuffer) -> TextBuffer {
        for (row, line) in other.lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            match self.lines.get_mut(row) {
                Some(base) => *base = line.clone(),
                None => {
                    self.lines.resize(row, String::new());
                    self.lines.push(line.clone());
                }
            }
        }
        self
    }

    /// Draw `other` as an opaque rectangle with its top-left corner at (x, y).
    ///
    /// The result grows to fit both buffers. Base content left and right of
    /// the rectangle keeps its styling; the overlay's codes are kept verbatim.
    pub fn composite_at(mut self, other: &TextBuffer, x: usize, y: usize) -> TextBuffer {
        if other.is_empty() {
            return self;
        }
        let overlay_width = other.width();
        let needed = y + other.height();
        if self.lines.len() < needed {
            self.lines.resize(needed, String::new());
        }
        for (offset, overlay_line) in other.lines.iter().enumerate() {
            let base = &mut self.lines[y + offset];
            *base = composite_line(base, overlay_line, x, overlay_width);
        }
        self
    }

    /// Pad every line to `width` columns, placing content per `align`.
    /// Wider lines are left as they are.
    pub fn pad_to_width(self, width: usize, align: Alignment) -> TextBuffer {
        self.map_lines(|line| {
            let extra = width.saturating_sub(visible_width(&line));
            if extra == 0 {
                return line;
            }
            let (before, after) = align.split(extra);
            let mut out = String::with_capacity(line.len() + extra);
            out.push_str(&" ".repeat(before));
            out.push_str(&line);
            out.push_str(&" ".repeat(after));
            out
        })
    }

    /// Like [`TextBuffer::pad_to_width`], but moves the block as a whole:
    /// lines are evened to the buffer width before `align` applies.
    pub fn align_to_width(self, width: usize, align: Alignment) -> TextBuffer {
        let own = self.width();
        self.pad_to_width(own, Alignment::Leading)
            .pad_to_width(width, align)
    }

    /// Add empty lines until the buffer is `height` rows tall.
    pub fn pad_to_height(mut self, height: usize, align: Alignment) -> TextBuffer {
        let extra = height.saturating_sub(self.lines.len());
        if extra == 0 {
            return self;
        }
        let (before, after) = align.split(extra);
        let mut lines = Vec::with_capacity(height);
        lines.extend(std::iter::repeat(String::new()).take(before));
        lines.append(&mut self.lines);
        lines.extend(std::iter::repeat(String::new()).take(after));
        TextBuffer { lines }
    }

    /// Cut to at most `width` columns and `height` rows.
    pub fn clip(mut self, width: usize, height: usize) -> TextBuffer {
        self.lines.truncate(height);
        self.map_lines(|line| {
            if visible_width(&line) <= width {
                return line;
            }
            let mut cut = slice_by_column(&line, 0, width, true).text;
            if cut.contains('\x1b') {
                cut.push_str(RESET);
            }
            cut
        })
    }

    pub fn map_lines<F>(self, f: F) -> TextBuffer
    where
        F: FnMut(String) -> String,
    {
        TextBuffer {
            lines: self.lines.into_iter().map(f).collect(),
        }
    }

    /// Pad to the buffer width and paint every line with `style`, keeping it
    /// across resets embedded in the content.
    pub fn with_background(self, style: Style) -> TextBuffer {
        if style.is_plain() {
            return self;
        }
        let width = self.width();
        self.map_lines(|line| style.paint(&pad_right(&line, width)))
    }

    pub fn dimmed(self) -> TextBuffer {
        self.map_lines(|line| dim_line(&line))
    }
}

impl From<Vec<String>> for TextBuffer {
    fn from(lines: Vec<String>) -> Self {
        Self { lines }
    }
}

fn composite_line(base: &str, overlay: &str, start_col: usize, overlay_width: usize) -> String {
    let segments = split_around(base, start_col, start_col + overlay_width);
    let overlay_cols = visible_width(overlay);

    let mut out = String::with_capacity(base.len() + overlay.len() + 2 * SEGMENT_RESET.len());
    out.push_str(&segments.before);
    out.push_str(&" ".repeat(start_col.saturating_sub(segments.before_width)));
    out.push_str(SEGMENT_RESET);
    out.push_str(overlay);
    out.push_str(&" ".repeat(overlay_width.saturating_sub(overlay_cols)));
    out.push_str(SEGMENT_RESET);
    if segments.after_width > 0 {
        // Fill a wide glyph that straddled the right edge.
        let base_width = visible_width(base);
        let gap = base_width
            .saturating_sub(start_col + overlay_width)
            .saturating_sub(segments.after_width);
        out.push_str(&" ".repeat(gap));
        out.push_str(&segments.after);
    }
    out
}
