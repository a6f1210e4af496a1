//! Splits raw input chunks into complete key sequences.
//!
//! Terminals deliver bytes in arbitrary chunks, so an escape sequence can
//! arrive split across reads. Incomplete escape tails are held until either
//! the rest arrives or the timeout passes; a timed-out tail is flushed
//! verbatim (a lone `ESC` therefore becomes the escape key).

use std::time::{Duration, Instant};

const ESC: u8 = 0x1b;

#[derive(Debug, PartialEq, Eq)]
enum Status {
    Complete,
    Incomplete,
}

/// Buffers input and emits complete sequences.
#[derive(Debug)]
pub struct StdinBuffer {
    pending: String,
    timeout: Duration,
    flush_deadline: Option<Instant>,
}

impl StdinBuffer {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            pending: String::new(),
            timeout: Duration::from_millis(timeout_ms),
            flush_deadline: None,
        }
    }

    /// Feed a chunk read from the terminal.
    pub fn process(&mut self, data: &[u8]) -> Vec<String> {
        self.process_at(data, Instant::now())
    }

    pub fn process_at(&mut self, data: &[u8], now: Instant) -> Vec<String> {
        self.flush_deadline = None;

        // A lone high byte is the meta-bit encoding of alt+<byte-128>.
        if let [byte] = data {
            if *byte > 127 {
                self.pending.push(ESC as char);
                self.pending.push((byte - 128) as char);
            } else {
                self.pending.push_str(&String::from_utf8_lossy(data));
            }
        } else {
            self.pending.push_str(&String::from_utf8_lossy(data));
        }

        let (sequences, remainder) = split_sequences(&self.pending);
        self.pending = remainder;
        if !self.pending.is_empty() {
            self.flush_deadline = Some(now + self.timeout);
        }
        sequences
    }

    /// Flush a held tail whose deadline has passed.
    pub fn flush_due(&mut self, now: Instant) -> Vec<String> {
        match self.flush_deadline {
            Some(deadline) if now >= deadline => self.flush(),
            _ => Vec::new(),
        }
    }

    /// Milliseconds until the held tail is due, capped at `default_ms`.
    pub fn next_timeout_ms(&self, now: Instant, default_ms: i32) -> i32 {
        match self.flush_deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(now).as_millis();
                (remaining.min(i32::MAX as u128) as i32).clamp(0, default_ms)
            }
            None => default_ms,
        }
    }

    /// Emit whatever is held, unconditionally.
    pub fn flush(&mut self) -> Vec<String> {
        self.flush_deadline = None;
        if self.pending.is_empty() {
            return Vec::new();
        }
        vec![std::mem::take(&mut self.pending)]
    }

    pub fn clear(&mut self) {
        self.flush_deadline = None;
        self.pending.clear();
    }

    pub fn buffered(&self) -> &str {
        &self.pending
    }
}

/// Split `buffer` into complete sequences plus an incomplete escape tail.
fn split_sequences(buffer: &str) -> (Vec<String>, String) {
    let bytes = buffer.as_bytes();
    let mut sequences = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] != ESC {
            let ch_len = buffer[pos..].chars().next().map(char::len_utf8).unwrap_or(1);
            sequences.push(buffer[pos..pos + ch_len].to_string());
            pos += ch_len;
            continue;
        }

        let mut end = pos + 1;
        loop {
            if end > bytes.len() {
                return (sequences, buffer[pos..].to_string());
            }
            if buffer.is_char_boundary(end) && status(&buffer[pos..end]) == Status::Complete {
                sequences.push(buffer[pos..end].to_string());
                pos = end;
                break;
            }
            end += 1;
        }
    }

    (sequences, String::new())
}

fn status(candidate: &str) -> Status {
    let bytes = candidate.as_bytes();
    match bytes.get(1) {
        None => Status::Incomplete,
        Some(b'[') => csi_status(bytes),
        Some(b'O') if bytes.len() < 3 => Status::Incomplete,
        Some(b']') => terminated_status(bytes, true),
        Some(b'P') | Some(b'_') => terminated_status(bytes, false),
        // `ESC O x`, `ESC <char>`, `ESC ESC`.
        Some(_) => Status::Complete,
    }
}

fn csi_status(bytes: &[u8]) -> Status {
    match bytes.last() {
        Some(last) if bytes.len() >= 3 && (0x40..=0x7e).contains(last) => Status::Complete,
        _ => Status::Incomplete,
    }
}

fn terminated_status(bytes: &[u8], bell_terminates: bool) -> Status {
    if bytes.ends_with(b"\x1b\\") || (bell_terminates && bytes.ends_with(b"\x07")) {
        Status::Complete
    } else {
        Status::Incomplete
    }
}

#[cfg(test)]
mod tests {
    use super::StdinBuffer;
    use std::time::{Duration, Instant};

    #[test]
    fn splits_partial_sequences_across_chunks() {
        let mut buffer = StdinBuffer::new(10);
        assert!(buffer.process(b"\x1b").is_empty());
        assert!(buffer.process(b"[1;").is_empty());
        assert_eq!(buffer.process(b"5C"), vec!["\x1b[1;5C".to_string()]);
    }

    #[test]
    fn splits_a_burst_into_individual_keys() {
        let mut buffer = StdinBuffer::new(10);
        let sequences = buffer.process(b"ab\x1b[A\x1bOP\x1bx\r");
        assert_eq!(
            sequences,
            vec!["a", "b", "\x1b[A", "\x1bOP", "\x1bx", "\r"]
        );
    }

    #[test]
    fn multibyte_chars_stay_whole() {
        let mut buffer = StdinBuffer::new(10);
        assert_eq!(buffer.process("é日".as_bytes()), vec!["é", "日"]);
    }

    #[test]
    fn lone_escape_flushes_after_timeout() {
        let mut buffer = StdinBuffer::new(10);
        let start = Instant::now();
        assert!(buffer.process_at(b"\x1b", start).is_empty());

        assert!(buffer.flush_due(start + Duration::from_millis(5)).is_empty());
        assert_eq!(
            buffer.flush_due(start + Duration::from_millis(15)),
            vec!["\x1b".to_string()]
        );
        assert!(
            buffer.flush_due(start + Duration::from_millis(50)).is_empty(),
            "flush after deadline should be idempotent"
        );
    }

    #[test]
    fn next_timeout_reflects_pending_deadline() {
        let mut buffer = StdinBuffer::new(25);
        let now = Instant::now();
        assert_eq!(buffer.next_timeout_ms(now, 77), 77);

        buffer.process_at(b"\x1b[", now);
        assert!(buffer.next_timeout_ms(now, 1000) <= 25);

        buffer.clear();
        assert_eq!(buffer.next_timeout_ms(now, 77), 77);
        assert!(buffer.buffered().is_empty());
    }

    #[test]
    fn meta_bit_byte_becomes_alt_sequence() {
        let mut buffer = StdinBuffer::new(10);
        assert_eq!(buffer.process(&[b'x' + 128]), vec!["\x1bx".to_string()]);
    }

    #[test]
    fn malformed_tail_is_held_then_flushed_without_loss() {
        let mut buffer = StdinBuffer::new(10);
        let start = Instant::now();
        let mut out = buffer.process_at(b"a\x1b[12", start);
        assert_eq!(out, vec!["a".to_string()]);
        out.extend(buffer.flush_due(start + Duration::from_millis(20)));
        assert_eq!(out.concat(), "a\x1b[12");
    }
}
