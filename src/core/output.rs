//! Typed terminal output commands and a single output gate.
//!
//! Invariant: all terminal writes flow through `OutputGate::flush(..)`.

use std::fmt::Write as _;

use crate::core::terminal::Terminal;

const HIDE_CURSOR: &str = "\x1b[?25l";
const SHOW_CURSOR: &str = "\x1b[?25h";
const CLEAR_SCREEN: &str = "\x1b[2J";
const CLEAR_LINE: &str = "\x1b[2K";
const ENTER_ALT_SCREEN: &str = "\x1b[?1049h";
const LEAVE_ALT_SCREEN: &str = "\x1b[?1049l";
const SYNC_START: &str = "\x1b[?2026h";
const SYNC_END: &str = "\x1b[?2026l";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalCmd {
    /// Raw bytes/control sequences (UTF-8 string) to be written to the terminal.
    Bytes(String),

    /// Absolute cursor position, 0-based.
    MoveTo { row: u16, col: u16 },
    MoveUp(u16),
    MoveDown(u16),
    MoveRight(u16),
    MoveLeft(u16),

    HideCursor,
    ShowCursor,

    ClearScreen,
    /// Erase the whole line under the cursor.
    ClearLine,

    EnterAltScreen,
    LeaveAltScreen,

    /// Synchronized-update brackets; terminals without support ignore them.
    BeginSync,
    EndSync,
}

impl TerminalCmd {
    pub fn bytes(data: impl Into<String>) -> Self {
        Self::Bytes(data.into())
    }

    /// Append the wire encoding of this command to `out`.
    pub fn encode_into(&self, out: &mut String) {
        let relative = |out: &mut String, n: u16, final_byte: char| {
            if n > 0 {
                let _ = write!(out, "\x1b[{n}{final_byte}");
            }
        };
        match self {
            TerminalCmd::Bytes(data) => out.push_str(data),
            TerminalCmd::MoveTo { row, col } => {
                let _ = write!(out, "\x1b[{};{}H", u32::from(*row) + 1, u32::from(*col) + 1);
            }
            TerminalCmd::MoveUp(n) => relative(out, *n, 'A'),
            TerminalCmd::MoveDown(n) => relative(out, *n, 'B'),
            TerminalCmd::MoveRight(n) => relative(out, *n, 'C'),
            TerminalCmd::MoveLeft(n) => relative(out, *n, 'D'),
            TerminalCmd::HideCursor => out.push_str(HIDE_CURSOR),
            TerminalCmd::ShowCursor => out.push_str(SHOW_CURSOR),
            TerminalCmd::ClearScreen => out.push_str(CLEAR_SCREEN),
            TerminalCmd::ClearLine => out.push_str(CLEAR_LINE),
            TerminalCmd::EnterAltScreen => out.push_str(ENTER_ALT_SCREEN),
            TerminalCmd::LeaveAltScreen => out.push_str(LEAVE_ALT_SCREEN),
            TerminalCmd::BeginSync => out.push_str(SYNC_START),
            TerminalCmd::EndSync => out.push_str(SYNC_END),
        }
    }

    pub fn encode(&self) -> String {
        let mut out = String::new();
        self.encode_into(&mut out);
        out
    }
}

#[derive(Debug, Default)]
pub struct OutputGate {
    cmds: Vec<TerminalCmd>,
}

impl OutputGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cmd: TerminalCmd) {
        self.cmds.push(cmd);
    }

    pub fn extend<I>(&mut self, cmds: I)
    where
        I: IntoIterator<Item = TerminalCmd>,
    {
        self.cmds.extend(cmds);
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    pub fn clear(&mut self) {
        self.cmds.clear();
    }

    /// Encode buffered commands and hand them to the terminal in one write.
    ///
    /// This is the single write gate: `Terminal::write(..)` must not be called
    /// from anywhere else.
    pub fn flush<T: Terminal + ?Sized>(&mut self, term: &mut T) -> std::io::Result<()> {
        if self.cmds.is_empty() {
            return Ok(());
        }
        let mut out = String::new();
        for cmd in self.cmds.drain(..) {
            cmd.encode_into(&mut out);
        }
        term.write(&out)
    }
}
