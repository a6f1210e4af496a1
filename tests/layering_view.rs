use std::fs;
use std::path::{Path, PathBuf};

fn collect_rs_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries = fs::read_dir(dir).unwrap_or_else(|err| panic!("read_dir({}): {err}", dir.display()));
    for entry in entries {
        let entry = entry.unwrap_or_else(|err| panic!("read_dir entry ({}): {err}", dir.display()));
        let path = entry.path();
        if path.is_dir() {
            collect_rs_files(&path, out);
        } else if path.extension().and_then(|ext| ext.to_str()) == Some("rs") {
            out.push(path);
        }
    }
}

fn offenders(dir: &str, forbidden: &[&str]) -> Vec<String> {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let mut files = Vec::new();
    collect_rs_files(&manifest_dir.join(dir), &mut files);
    files.sort();

    files
        .into_iter()
        .filter(|file| {
            let contents = fs::read_to_string(file)
                .unwrap_or_else(|err| panic!("read_to_string({}): {err}", file.display()));
            forbidden.iter().any(|needle| contents.contains(needle))
        })
        .map(|path| {
            path.strip_prefix(&manifest_dir)
                .unwrap_or(path.as_path())
                .display()
                .to_string()
        })
        .collect()
}

#[test]
fn view_does_not_depend_on_platform_layer() {
    let found = offenders("src/view", &["crate::platform", "strata_tui::platform"]);
    assert!(
        found.is_empty(),
        "view must not touch the terminal directly, but found platform imports in:\n{}",
        found.join("\n")
    );
}

#[test]
fn text_helpers_stay_pure() {
    let found = offenders(
        "src/core/text",
        &["crate::render", "crate::runtime", "crate::platform", "crate::view"],
    );
    assert!(
        found.is_empty(),
        "text helpers must be string-in/string-out, but found layer imports in:\n{}",
        found.join("\n")
    );
}
