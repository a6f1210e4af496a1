//! Escape-code scanning and SGR state tracking.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeKind {
    Csi,
    Osc,
    Apc,
    Dcs,
    Ss3,
}

/// Byte length and kind of the escape sequence starting at `pos`, if any.
///
/// Returns `None` when `pos` is not an ESC or the sequence is unterminated.
pub fn escape_at(input: &str, pos: usize) -> Option<(usize, EscapeKind)> {
    let bytes = input.as_bytes();
    if bytes.get(pos) != Some(&0x1b) {
        return None;
    }

    let kind = match bytes.get(pos + 1)? {
        b'[' => EscapeKind::Csi,
        b']' => EscapeKind::Osc,
        b'_' => EscapeKind::Apc,
        b'P' => EscapeKind::Dcs,
        b'O' => EscapeKind::Ss3,
        _ => return None,
    };

    let body = pos + 2;
    let end = match kind {
        EscapeKind::Csi => bytes[body..]
            .iter()
            .position(|b| (0x40..=0x7e).contains(b))
            .map(|offset| body + offset + 1)?,
        EscapeKind::Ss3 => {
            // The final must be a whole char so slicing stays on a boundary.
            let ch = input.get(body..)?.chars().next()?;
            body + ch.len_utf8()
        }
        EscapeKind::Osc | EscapeKind::Apc | EscapeKind::Dcs => string_terminator(bytes, body)?,
    };
    Some((end - pos, kind))
}

fn string_terminator(bytes: &[u8], from: usize) -> Option<usize> {
    let mut idx = from;
    while idx < bytes.len() {
        match bytes[idx] {
            0x07 => return Some(idx + 1),
            0x1b if bytes.get(idx + 1) == Some(&b'\\') => return Some(idx + 2),
            _ => idx += 1,
        }
    }
    None
}

/// A run of either escape codes or printable text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunk<'a> {
    Code(&'a str),
    Text(&'a str),
}

/// Iterator splitting a string into escape codes and the text between them.
///
/// Each `Code` chunk is exactly one sequence; `Text` chunks never contain a
/// recognised sequence.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    input: &'a str,
    pos: usize,
}

pub fn chunks(input: &str) -> Chunks<'_> {
    Chunks { input, pos: 0 }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.input.len() {
            return None;
        }
        let start = self.pos;
        if let Some((len, _)) = escape_at(self.input, start) {
            self.pos += len;
            return Some(Chunk::Code(&self.input[start..self.pos]));
        }

        let mut idx = start;
        while idx < self.input.len() {
            if idx > start && escape_at(self.input, idx).is_some() {
                break;
            }
            idx += self.input[idx..]
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(1);
        }
        self.pos = idx;
        Some(Chunk::Text(&self.input[start..idx]))
    }
}

/// Remove every recognised escape sequence.
pub fn strip_ansi(input: &str) -> String {
    chunks(input)
        .filter_map(|chunk| match chunk {
            Chunk::Text(text) => Some(text),
            Chunk::Code(_) => None,
        })
        .collect()
}

const ATTR_CODES: [u8; 8] = [1, 2, 3, 4, 5, 7, 8, 9];

/// Running SGR state of a line, so a slice taken mid-line can be restyled.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SgrState {
    /// Bit `i` set means `ATTR_CODES[i]` is active.
    attrs: u8,
    fg: Option<String>,
    bg: Option<String>,
}

impl SgrState {
    pub fn is_plain(&self) -> bool {
        self.attrs == 0 && self.fg.is_none() && self.bg.is_none()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Fold one escape code into the state. Non-SGR codes are ignored.
    pub fn apply(&mut self, code: &str) {
        let Some(params) = code
            .strip_prefix("\x1b[")
            .and_then(|rest| rest.strip_suffix('m'))
        else {
            return;
        };
        if params.is_empty() {
            self.reset();
            return;
        }

        let parts: Vec<&str> = params.split(';').collect();
        let mut idx = 0;
        while idx < parts.len() {
            let code: u16 = parts[idx].parse().unwrap_or(0);
            if code == 38 || code == 48 {
                let span = match parts.get(idx + 1) {
                    Some(&"5") => 3,
                    Some(&"2") => 5,
                    _ => 1,
                };
                if span > 1 && idx + span <= parts.len() {
                    let color = parts[idx..idx + span].join(";");
                    if code == 38 {
                        self.fg = Some(color);
                    } else {
                        self.bg = Some(color);
                    }
                    idx += span;
                    continue;
                }
            }
            self.apply_single(code);
            idx += 1;
        }
    }

    fn apply_single(&mut self, code: u16) {
        let bit = |attr: u8| 1u8 << ATTR_CODES.iter().position(|c| *c == attr).unwrap_or(0);
        match code {
            0 => self.reset(),
            1 | 2 | 3 | 4 | 5 | 7 | 8 | 9 => self.attrs |= bit(code as u8),
            21 => self.attrs &= !bit(1),
            22 => self.attrs &= !(bit(1) | bit(2)),
            23 | 24 | 25 | 27 | 28 | 29 => self.attrs &= !bit((code - 20) as u8),
            39 => self.fg = None,
            49 => self.bg = None,
            30..=37 | 90..=97 => self.fg = Some(code.to_string()),
            40..=47 | 100..=107 => self.bg = Some(code.to_string()),
            _ => {}
        }
    }

    /// A single SGR sequence reproducing the current state (empty when plain).
    pub fn to_sequence(&self) -> String {
        let mut codes: Vec<String> = ATTR_CODES
            .iter()
            .enumerate()
            .filter(|(i, _)| self.attrs & (1 << i) != 0)
            .map(|(_, code)| code.to_string())
            .collect();
        codes.extend(self.fg.iter().cloned());
        codes.extend(self.bg.iter().cloned());
        if codes.is_empty() {
            return String::new();
        }
        format!("\x1b[{}m", codes.join(";"))
    }

    /// Close an underline before a wrapped line ends so it does not bleed
    /// into the padding.
    pub fn line_end_reset(&self) -> &'static str {
        if self.attrs & (1 << 3) != 0 {
            "\x1b[24m"
        } else {
            ""
        }
    }

    /// Fold every code found in `text`.
    pub fn apply_all(&mut self, text: &str) {
        for chunk in chunks(text) {
            if let Chunk::Code(code) = chunk {
                self.apply(code);
            }
        }
    }
}
