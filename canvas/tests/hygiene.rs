//! Hygiene: source scans for patterns the canvas core must not contain.
//!
//! The canvas runs inside the editor's event loop, so a panic takes the whole
//! page down with it and a swallowed error hides a broken gesture. Nothing on
//! the list is allowed in production code; `*_test.rs` files are exempt.

use std::fs;
use std::path::{Path, PathBuf};

/// Forbidden pattern and why it is flagged.
const FORBIDDEN: &[(&str, &str)] = &[
    (".unwrap()", "panics"),
    (".expect(", "panics"),
    ("panic!(", "panics"),
    ("unreachable!(", "panics"),
    ("todo!(", "panics"),
    ("unimplemented!(", "panics"),
    ("let _ =", "discards a result unseen"),
    (".ok()", "discards an error unseen"),
    ("#[allow(dead_code)]", "hides unused code"),
];

/// Files that carry no behaviour of their own.
const UNTESTED_OK: &[&str] = &["lib.rs", "consts.rs"];

struct SourceFile {
    path: PathBuf,
    content: String,
}

impl SourceFile {
    fn name(&self) -> String {
        self.path.file_name().unwrap_or_default().to_string_lossy().into_owned()
    }

    /// Code lines containing `pattern`; comment lines are skipped.
    fn count(&self, pattern: &str) -> usize {
        self.content
            .lines()
            .filter(|line| !line.trim_start().starts_with("//"))
            .filter(|line| line.contains(pattern))
            .count()
    }
}

fn production_sources() -> Vec<SourceFile> {
    let mut files = Vec::new();
    walk(Path::new("src"), &mut files);
    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}

fn walk(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for path in entries.flatten().map(|e| e.path()) {
        if path.is_dir() {
            walk(&path, out);
            continue;
        }
        let is_rs = path.extension().is_some_and(|e| e == "rs");
        let is_test = path.to_string_lossy().ends_with("_test.rs");
        if is_rs && !is_test {
            if let Ok(content) = fs::read_to_string(&path) {
                out.push(SourceFile { path, content });
            }
        }
    }
}

#[test]
fn sources_are_found() {
    let names: Vec<String> = production_sources().iter().map(SourceFile::name).collect();
    for expected in ["engine.rs", "doc.rs", "overlay.rs", "command_menu.rs"] {
        assert!(names.iter().any(|n| n == expected), "{expected} not scanned; got {names:?}");
    }
}

#[test]
fn no_forbidden_patterns() {
    let files = production_sources();
    let mut report = Vec::new();
    for (pattern, reason) in FORBIDDEN {
        for file in &files {
            let hits = file.count(pattern);
            if hits > 0 {
                report.push(format!("  {} has {hits}x `{pattern}` ({reason})", file.path.display()));
            }
        }
    }
    assert!(report.is_empty(), "forbidden patterns in canvas sources:\n{}", report.join("\n"));
}

#[test]
fn every_module_has_tests() {
    let missing: Vec<String> = production_sources()
        .into_iter()
        .filter(|f| !UNTESTED_OK.contains(&f.name().as_str()))
        .filter(|f| !f.content.contains("#[cfg(test)]"))
        .map(|f| f.path.display().to_string())
        .collect();
    assert!(missing.is_empty(), "modules without a test module:\n  {}", missing.join("\n  "));
}
