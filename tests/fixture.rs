#![allow(dead_code)]

use std::path::Path;

/// Contents of `tests/fixtures/<name>`.
pub fn read_fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {err}", path.display()))
}

/// Expand the escapes key vectors are written with: `\xHH`, `\u{H..}`, `\r`,
/// `\n` and `\t`. Anything else is a broken fixture.
pub fn unescape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];
        let (ch, used) = match tail.chars().next() {
            Some('r') => ('\r', 1),
            Some('n') => ('\n', 1),
            Some('t') => ('\t', 1),
            Some('x') => {
                let hex = tail.get(1..3).unwrap_or_else(|| panic!("short \\x escape in {input:?}"));
                let byte = u8::from_str_radix(hex, 16)
                    .unwrap_or_else(|_| panic!("bad \\x escape {hex:?} in {input:?}"));
                (char::from(byte), 3)
            }
            Some('u') => {
                let close = tail
                    .find('}')
                    .unwrap_or_else(|| panic!("unterminated \\u escape in {input:?}"));
                let hex = tail
                    .get(2..close)
                    .unwrap_or_else(|| panic!("bad \\u escape in {input:?}"));
                let ch = u32::from_str_radix(hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .unwrap_or_else(|| panic!("bad \\u escape {hex:?} in {input:?}"));
                (ch, close + 1)
            }
            other => panic!("unsupported escape {other:?} in {input:?}"),
        };
        out.push(ch);
        rest = &tail[used..];
    }
    out.push_str(rest);
    out
}
