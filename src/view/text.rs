//! Styled text leaf.

use crate::core::environment::ColorRole;
use crate::core::style::{Color, Style};
use crate::core::text::slice::{slice_by_column, wrap_text_with_ansi};
use crate::core::text::utils::truncate_to_width;
use crate::render::buffer::TextBuffer;
use crate::view::resolve::Scope;
use crate::view::{Element, Primitive};

/// What happens to lines wider than the offered width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextOverflow {
    #[default]
    Wrap,
    /// Cut with a trailing `…`.
    Truncate,
    /// Cut without marker.
    Clip,
}

#[derive(Debug, Clone, Default)]
pub struct Text {
    content: String,
    style: Style,
    role: Option<ColorRole>,
    overflow: TextOverflow,
}

impl Text {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn bold(mut self) -> Self {
        self.style = self.style.bold();
        self
    }

    pub fn dim(mut self) -> Self {
        self.style = self.style.dim();
        self
    }

    pub fn fg(mut self, color: Color) -> Self {
        self.style = self.style.fg(color);
        self
    }

    /// Foreground taken from the active palette at render time.
    /// An explicit [`Text::fg`] wins.
    pub fn color_role(mut self, role: ColorRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn overflow(mut self, overflow: TextOverflow) -> Self {
        self.overflow = overflow;
        self
    }

    pub fn truncate(self) -> Self {
        self.overflow(TextOverflow::Truncate)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    fn lines(&self, width: usize) -> Vec<String> {
        match self.overflow {
            TextOverflow::Wrap => wrap_text_with_ansi(&self.content, width),
            TextOverflow::Truncate => self
                .content
                .split('\n')
                .map(|line| truncate_to_width(line, width, "…", false))
                .collect(),
            TextOverflow::Clip => self
                .content
                .split('\n')
                .map(|line| slice_by_column(line, 0, width, true).text)
                .collect(),
        }
    }
}

impl Primitive for Text {
    fn render(&self, scope: &mut Scope<'_>) -> TextBuffer {
        let mut style = self.style;
        if style.fg.is_none() {
            if let Some(role) = self.role {
                style = style.fg(scope.env().color(role));
            }
        }
        let lines = self.lines(scope.width());
        TextBuffer::from(lines).map_lines(|line| style.paint(&line))
    }
}

impl From<Text> for Element {
    fn from(text: Text) -> Self {
        Element::primitive(text)
    }
}
