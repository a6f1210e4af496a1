//! SGR styling: colours, attributes, and reset rewriting for persistent
//! background and dimming.

pub const RESET: &str = "\x1b[0m";

/// Terminal colour in one of the three encodings terminals understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// Terminal default (`39` / `49`).
    #[default]
    Default,
    /// Legacy palette slot 0..=15 (8 normal + 8 bright).
    Ansi(u8),
    /// 256-colour palette index.
    Indexed(u8),
    Rgb(u8, u8, u8),
}

impl Color {
    pub const BLACK: Color = Color::Ansi(0);
    pub const RED: Color = Color::Ansi(1);
    pub const GREEN: Color = Color::Ansi(2);
    pub const YELLOW: Color = Color::Ansi(3);
    pub const BLUE: Color = Color::Ansi(4);
    pub const MAGENTA: Color = Color::Ansi(5);
    pub const CYAN: Color = Color::Ansi(6);
    pub const WHITE: Color = Color::Ansi(7);
    pub const BRIGHT_BLACK: Color = Color::Ansi(8);
    pub const BRIGHT_WHITE: Color = Color::Ansi(15);

    /// SGR parameters selecting this colour as foreground.
    pub fn fg_params(self) -> String {
        self.params(30, 90, 38)
    }

    /// SGR parameters selecting this colour as background.
    pub fn bg_params(self) -> String {
        self.params(40, 100, 48)
    }

    fn params(self, base: u8, bright_base: u8, extended: u8) -> String {
        match self {
            Color::Default => (base + 9).to_string(),
            Color::Ansi(slot) if slot < 8 => (base + slot).to_string(),
            Color::Ansi(slot) => (bright_base + (slot.min(15) - 8)).to_string(),
            Color::Indexed(index) => format!("{extended};5;{index}"),
            Color::Rgb(r, g, b) => format!("{extended};2;{r};{g};{b}"),
        }
    }
}

bitflags::bitflags! {
    /// Text attributes; each flag maps to one SGR code.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Attributes: u8 {
        const BOLD = 1 << 0;
        const DIM = 1 << 1;
        const ITALIC = 1 << 2;
        const UNDERLINE = 1 << 3;
        const BLINK = 1 << 4;
        const INVERSE = 1 << 5;
        const STRIKETHROUGH = 1 << 6;
    }
}

const ATTRIBUTE_CODES: [(Attributes, u8); 7] = [
    (Attributes::BOLD, 1),
    (Attributes::DIM, 2),
    (Attributes::ITALIC, 3),
    (Attributes::UNDERLINE, 4),
    (Attributes::BLINK, 5),
    (Attributes::INVERSE, 7),
    (Attributes::STRIKETHROUGH, 9),
];

/// Foreground, background and attributes applied to a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub attrs: Attributes,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fg(mut self, color: Color) -> Self {
        self.fg = Some(color);
        self
    }

    pub fn bg(mut self, color: Color) -> Self {
        self.bg = Some(color);
        self
    }

    pub fn bold(self) -> Self {
        self.attr(Attributes::BOLD)
    }

    pub fn dim(self) -> Self {
        self.attr(Attributes::DIM)
    }

    pub fn italic(self) -> Self {
        self.attr(Attributes::ITALIC)
    }

    pub fn underline(self) -> Self {
        self.attr(Attributes::UNDERLINE)
    }

    pub fn inverse(self) -> Self {
        self.attr(Attributes::INVERSE)
    }

    pub fn attr(mut self, attrs: Attributes) -> Self {
        self.attrs |= attrs;
        self
    }

    pub fn is_plain(&self) -> bool {
        self.fg.is_none() && self.bg.is_none() && self.attrs.is_empty()
    }

    /// The opening SGR sequence, or an empty string for a plain style.
    pub fn sgr(&self) -> String {
        if self.is_plain() {
            return String::new();
        }
        let mut params: Vec<String> = ATTRIBUTE_CODES
            .iter()
            .filter(|(flag, _)| self.attrs.contains(*flag))
            .map(|(_, code)| code.to_string())
            .collect();
        params.extend(self.fg.map(Color::fg_params));
        params.extend(self.bg.map(Color::bg_params));
        format!("\x1b[{}m", params.join(";"))
    }

    /// Wrap `text` in this style. Resets embedded in `text` are rewritten so
    /// the style survives them, and the result ends in a reset.
    pub fn paint(&self, text: &str) -> String {
        if self.is_plain() {
            return text.to_string();
        }
        let open = self.sgr();
        let mut out = String::with_capacity(text.len() + open.len() * 2 + RESET.len());
        out.push_str(&open);
        out.push_str(&reapply_after_resets(text, &open));
        out.push_str(RESET);
        out
    }
}

/// Rewrite every reset in `text` as reset followed by `sequence`.
///
/// Both spellings (`ESC[0m` and `ESC[m`) are recognised.
pub fn reapply_after_resets(text: &str, sequence: &str) -> String {
    if sequence.is_empty() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        let next = [RESET, "\x1b[m"]
            .iter()
            .filter_map(|reset| rest.find(reset).map(|idx| (idx, reset.len())))
            .min_by_key(|(idx, _)| *idx);
        let Some((idx, len)) = next else {
            out.push_str(rest);
            return out;
        };
        out.push_str(&rest[..idx]);
        out.push_str(RESET);
        out.push_str(sequence);
        rest = &rest[idx + len..];
    }
}

/// Paint a whole line with `bg`, keeping the background through nested resets.
pub fn persist_background(line: &str, bg: Color) -> String {
    Style::new().bg(bg).paint(line)
}

/// Dim a whole line, keeping the dim attribute through nested resets.
pub fn dim_line(line: &str) -> String {
    Style::new().dim().paint(line)
}

#[cfg(test)]
mod tests {
    use super::{dim_line, persist_background, Attributes, Color, Style, RESET};
    use pretty_assertions::assert_eq;

    #[test]
    fn legacy_colors_use_short_codes() {
        assert_eq!(Color::RED.fg_params(), "31");
        assert_eq!(Color::Ansi(9).fg_params(), "91");
        assert_eq!(Color::BLUE.bg_params(), "44");
        assert_eq!(Color::BRIGHT_WHITE.bg_params(), "107");
        assert_eq!(Color::Default.fg_params(), "39");
    }

    #[test]
    fn extended_colors_use_prefixed_codes() {
        assert_eq!(Color::Indexed(208).fg_params(), "38;5;208");
        assert_eq!(Color::Rgb(1, 2, 3).bg_params(), "48;2;1;2;3");
    }

    #[test]
    fn attributes_emit_in_code_order() {
        let style = Style::new()
            .attr(Attributes::STRIKETHROUGH | Attributes::BOLD | Attributes::INVERSE)
            .fg(Color::GREEN);
        assert_eq!(style.sgr(), "\x1b[1;7;9;32m");
    }

    #[test]
    fn plain_style_paints_nothing() {
        assert_eq!(Style::new().paint("x"), "x");
    }

    #[test]
    fn background_survives_nested_resets() {
        let inner = format!("a{RESET}b\x1b[mc");
        let painted = persist_background(&inner, Color::BLUE);
        assert_eq!(
            painted,
            "\x1b[44ma\x1b[0m\x1b[44mb\x1b[0m\x1b[44mc\x1b[0m"
        );
    }

    #[test]
    fn dim_survives_nested_resets() {
        let painted = dim_line("\x1b[31mred\x1b[0m tail");
        assert_eq!(painted, "\x1b[2m\x1b[31mred\x1b[0m\x1b[2m tail\x1b[0m");
    }
}
