//! Key decoding: complete input sequences to [`KeyEvent`]s, plus string key
//! bindings such as `"ctrl+c"` or `"shift+tab"`.

use std::fmt;
use std::time::Instant;

use crate::core::sequence::StdinBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Tab,
    Escape,
    Backspace,
    Delete,
    Insert,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    F(u8),
}

impl Key {
    fn name(&self) -> String {
        match self {
            Key::Char(' ') => "space".to_string(),
            Key::Char(ch) => ch.to_string(),
            Key::Enter => "enter".to_string(),
            Key::Tab => "tab".to_string(),
            Key::Escape => "escape".to_string(),
            Key::Backspace => "backspace".to_string(),
            Key::Delete => "delete".to_string(),
            Key::Insert => "insert".to_string(),
            Key::Up => "up".to_string(),
            Key::Down => "down".to_string(),
            Key::Left => "left".to_string(),
            Key::Right => "right".to_string(),
            Key::Home => "home".to_string(),
            Key::End => "end".to_string(),
            Key::PageUp => "pageup".to_string(),
            Key::PageDown => "pagedown".to_string(),
            Key::F(n) => format!("f{n}"),
        }
    }

    fn from_name(name: &str) -> Option<Key> {
        let mut chars = name.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            return Some(Key::Char(ch));
        }
        let lowered = name.to_ascii_lowercase();
        let key = match lowered.as_str() {
            "space" => Key::Char(' '),
            "enter" | "return" => Key::Enter,
            "tab" => Key::Tab,
            "escape" | "esc" => Key::Escape,
            "backspace" => Key::Backspace,
            "delete" | "del" => Key::Delete,
            "insert" => Key::Insert,
            "up" => Key::Up,
            "down" => Key::Down,
            "left" => Key::Left,
            "right" => Key::Right,
            "home" => Key::Home,
            "end" => Key::End,
            "pageup" => Key::PageUp,
            "pagedown" => Key::PageDown,
            f if f.starts_with('f') => {
                let n: u8 = f[1..].parse().ok()?;
                if !(1..=24).contains(&n) {
                    return None;
                }
                Key::F(n)
            }
            _ => return None,
        };
        Some(key)
    }
}

/// A decoded key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: Key,
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            shift: false,
            alt: false,
            ctrl: false,
        }
    }

    pub fn char(ch: char) -> Self {
        Self::new(Key::Char(ch))
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    /// Plain Tab or Shift+Tab (focus navigation keys).
    pub fn is_tab(&self) -> bool {
        self.key == Key::Tab && !self.ctrl && !self.alt
    }

    fn with_modifier_param(mut self, param: u32) -> Self {
        let bits = param.saturating_sub(1);
        self.shift |= bits & 1 != 0;
        self.alt |= bits & 2 != 0;
        self.ctrl |= bits & 4 != 0;
        self
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            f.write_str("ctrl+")?;
        }
        if self.alt {
            f.write_str("alt+")?;
        }
        if self.shift {
            f.write_str("shift+")?;
        }
        f.write_str(&self.key.name())
    }
}

/// Decode one complete input sequence.
///
/// Returns `None` for sequences that do not name a key (unknown CSI finals,
/// unassigned control bytes, OSC/DCS replies).
pub fn parse_key(data: &str) -> Option<KeyEvent> {
    let bytes = data.as_bytes();
    match bytes {
        [] => None,
        [0x1b] => Some(KeyEvent::new(Key::Escape)),
        [0x1b, 0x1b] => Some(KeyEvent::new(Key::Escape).with_alt()),
        [0x1b, b'[', ..] => parse_csi(&data[2..]),
        [0x1b, b'O', _] => parse_ss3(bytes[2]),
        [0x1b, ..] => {
            let rest = &data[1..];
            if rest.chars().count() != 1 {
                return None;
            }
            parse_key(rest).map(KeyEvent::with_alt)
        }
        [byte] if byte.is_ascii_control() => parse_control(*byte),
        _ => {
            let mut chars = data.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => Some(KeyEvent::char(ch)),
                _ => None,
            }
        }
    }
}

fn parse_control(byte: u8) -> Option<KeyEvent> {
    let event = match byte {
        0x00 => KeyEvent::char(' ').with_ctrl(),
        0x09 => KeyEvent::new(Key::Tab),
        0x0a | 0x0d => KeyEvent::new(Key::Enter),
        0x08 | 0x7f => KeyEvent::new(Key::Backspace),
        0x01..=0x1a => KeyEvent::char((byte - 1 + b'a') as char).with_ctrl(),
        0x1c => KeyEvent::char('\\').with_ctrl(),
        0x1d => KeyEvent::char(']').with_ctrl(),
        0x1f => KeyEvent::char('-').with_ctrl(),
        _ => return None,
    };
    Some(event)
}

fn parse_csi(body: &str) -> Option<KeyEvent> {
    let (final_at, final_char) = body.char_indices().last()?;
    if !final_char.is_ascii() {
        return None;
    }
    let final_byte = final_char as u8;
    let params: Vec<u32> = body[..final_at]
        .split(';')
        .map(|part| part.parse().unwrap_or(0))
        .collect();
    let modifier = params.get(1).copied().unwrap_or(1);

    let key = match final_byte {
        b'A' => Key::Up,
        b'B' => Key::Down,
        b'C' => Key::Right,
        b'D' => Key::Left,
        b'H' => Key::Home,
        b'F' => Key::End,
        b'P' => Key::F(1),
        b'Q' => Key::F(2),
        b'R' => Key::F(3),
        b'S' => Key::F(4),
        b'Z' => return Some(KeyEvent::new(Key::Tab).with_shift()),
        b'~' => tilde_key(params.first().copied().unwrap_or(0))?,
        _ => return None,
    };
    Some(KeyEvent::new(key).with_modifier_param(modifier))
}

fn tilde_key(code: u32) -> Option<Key> {
    let key = match code {
        1 | 7 => Key::Home,
        2 => Key::Insert,
        3 => Key::Delete,
        4 | 8 => Key::End,
        5 => Key::PageUp,
        6 => Key::PageDown,
        11..=15 => Key::F((code - 10) as u8),
        17..=21 => Key::F((code - 11) as u8),
        23 | 24 => Key::F((code - 12) as u8),
        _ => return None,
    };
    Some(key)
}

fn parse_ss3(final_byte: u8) -> Option<KeyEvent> {
    let key = match final_byte {
        b'A' => Key::Up,
        b'B' => Key::Down,
        b'C' => Key::Right,
        b'D' => Key::Left,
        b'H' => Key::Home,
        b'F' => Key::End,
        b'M' => Key::Enter,
        b'P' => Key::F(1),
        b'Q' => Key::F(2),
        b'R' => Key::F(3),
        b'S' => Key::F(4),
        _ => return None,
    };
    Some(KeyEvent::new(key))
}

/// Byte stream to key events: sequence splitting plus [`parse_key`].
#[derive(Debug)]
pub struct KeyDecoder {
    buffer: StdinBuffer,
}

impl KeyDecoder {
    pub fn new(escape_timeout_ms: u64) -> Self {
        Self {
            buffer: StdinBuffer::new(escape_timeout_ms),
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) -> Vec<KeyEvent> {
        decode_all(self.buffer.process(bytes))
    }

    /// Decode tails whose escape timeout has elapsed.
    pub fn flush_due(&mut self, now: Instant) -> Vec<KeyEvent> {
        decode_all(self.buffer.flush_due(now))
    }

    /// Decode any held tail now, regardless of the timeout.
    pub fn flush(&mut self) -> Vec<KeyEvent> {
        decode_all(self.buffer.flush())
    }

    pub fn has_pending(&self) -> bool {
        !self.buffer.buffered().is_empty()
    }
}

/// Decode already-split sequences, dropping the ones that name no key.
pub fn decode_all<I>(sequences: I) -> Vec<KeyEvent>
where
    I: IntoIterator<Item = String>,
{
    sequences
        .into_iter()
        .filter_map(|sequence| {
            let event = parse_key(&sequence);
            if event.is_none() {
                tracing::trace!(sequence = ?sequence, "dropped unrecognized input sequence");
            }
            event
        })
        .collect()
}

/// A key plus modifiers parsed from an id such as `"ctrl+shift+up"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    event: KeyEvent,
}

impl KeyBinding {
    pub fn parse(id: &str) -> Option<Self> {
        let mut parts: Vec<&str> = id.split('+').collect();
        // "ctrl++" binds the plus key.
        if id.ends_with("++") {
            parts.truncate(parts.len().saturating_sub(2));
            parts.push("+");
        }
        let (key_name, modifiers) = parts.split_last()?;
        let mut event = KeyEvent::new(Key::from_name(key_name)?);
        for modifier in modifiers {
            match modifier.to_ascii_lowercase().as_str() {
                "ctrl" => event.ctrl = true,
                "alt" => event.alt = true,
                "shift" => event.shift = true,
                _ => return None,
            }
        }
        Some(Self { event })
    }

    pub fn from_event(event: KeyEvent) -> Self {
        Self { event }
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.event == *event
    }

    pub fn event(&self) -> KeyEvent {
        self.event
    }
}

impl fmt::Display for KeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.event.fmt(f)
    }
}
