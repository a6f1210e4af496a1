mod fixture;

use strata_tui::core::input::{parse_key, KeyBinding, KeyDecoder};

#[test]
fn key_vectors_match_fixture() {
    let raw = fixture::read_fixture("key_vectors.tsv");
    for (idx, line) in raw.lines().enumerate() {
        let line_num = idx + 1;
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split('\t').collect();
        let kind = parts.first().copied().unwrap_or("");
        match kind {
            "parse" => {
                assert!(
                    parts.len() == 3,
                    "line {line_num}: expected 3 columns for parse, got {}",
                    parts.len()
                );
                let input = fixture::unescape(parts[1]);
                let expected = match parts[2].trim() {
                    "none" => None,
                    id => Some(id.to_string()),
                };
                let actual = parse_key(&input).map(|event| event.to_string());
                assert_eq!(actual, expected, "line {line_num}: parse_key({input:?}) mismatch");
            }
            "match" => {
                assert!(
                    parts.len() == 4,
                    "line {line_num}: expected 4 columns for match, got {}",
                    parts.len()
                );
                let binding = KeyBinding::parse(parts[1].trim())
                    .unwrap_or_else(|| panic!("line {line_num}: bad binding {:?}", parts[1]));
                let input = fixture::unescape(parts[2]);
                let event = parse_key(&input)
                    .unwrap_or_else(|| panic!("line {line_num}: {input:?} decodes to no key"));
                let expected = parts[3].trim() == "1";
                assert_eq!(
                    binding.matches(&event),
                    expected,
                    "line {line_num}: {binding} vs {event}"
                );
            }
            other => panic!("line {line_num}: unknown vector kind {other:?}"),
        }
    }
}

#[test]
fn chunked_stream_decodes_like_whole_sequences() {
    let mut decoder = KeyDecoder::new(10);
    let mut ids = Vec::new();
    for chunk in [&b"a\x1b["[..], b"1;5", b"Cb\x1b[Z"] {
        ids.extend(decoder.feed(chunk).into_iter().map(|event| event.to_string()));
    }
    assert_eq!(ids, vec!["a", "ctrl+right", "b", "shift+tab"]);
    assert!(!decoder.has_pending());
}

#[test]
fn unknown_sequence_is_dropped_between_known_keys() {
    let mut decoder = KeyDecoder::new(10);
    let ids: Vec<String> = decoder
        .feed(b"x\x1b[99Xy")
        .into_iter()
        .map(|event| event.to_string())
        .collect();
    assert_eq!(ids, vec!["x", "y"]);
}
