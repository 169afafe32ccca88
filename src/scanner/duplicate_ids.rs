//! Duplicate element-id pass with per-occurrence line tracking.

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::fs;

use regex::Regex;
use serde::Serialize;

use crate::core::errors::Result;
use crate::scanner::compile_pattern;
use crate::scanner::walker::FileHandle;

/// `id="..."` or `id='...'`, value captured.
pub const ID_ATTRIBUTE_PATTERN: &str = r#"id=["']([^"']+)["']"#;

/// file -> id -> occurrence count
pub type IdCounts = BTreeMap<String, BTreeMap<String, usize>>;
/// file -> id -> 1-based line numbers, in document order
pub type IdLines = BTreeMap<String, BTreeMap<String, Vec<usize>>>;

/// Files that declare the same id more than once.
///
/// Every count equals the length of its line list and is at least 2.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateIds {
    pub counts: IdCounts,
    pub lines: IdLines,
}

impl DuplicateIds {
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of files with at least one duplicate.
    pub fn file_count(&self) -> usize {
        self.counts.len()
    }
}

#[derive(Debug, Clone)]
pub struct DuplicateIdScanner {
    id_attr: Regex,
}

impl DuplicateIdScanner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            id_attr: compile_pattern(ID_ATTRIBUTE_PATTERN)?,
        })
    }

    /// Scan every file. Unreadable files are skipped.
    pub fn find(&self, files: &[FileHandle]) -> DuplicateIds {
        let mut out = DuplicateIds::default();
        for file in files {
            let Ok(bytes) = fs::read(&file.path) else {
                continue;
            };
            let dups = self.duplicates_in(&String::from_utf8_lossy(&bytes));
            if dups.is_empty() {
                continue;
            }
            let key = file.display_path();
            out.counts.insert(
                key.clone(),
                dups.iter().map(|(id, lines)| (id.clone(), lines.len())).collect(),
            );
            out.lines.insert(key, dups);
        }
        out
    }

    /// id -> line numbers, restricted to ids occurring more than once.
    pub fn duplicates_in(&self, text: &str) -> BTreeMap<String, Vec<usize>> {
        let mut seen: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let bytes = text.as_bytes();
        let mut line = 1;
        let mut cursor = 0;

        for caps in self.id_attr.captures_iter(text) {
            let (Some(whole), Some(id)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            line += memchr::memchr_iter(b'\n', &bytes[cursor..whole.start()]).count();
            cursor = whole.start();
            seen.entry(id.as_str().to_string()).or_default().push(line);
        }

        seen.retain(|_, lines| lines.len() > 1);
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scanner() -> DuplicateIdScanner {
        DuplicateIdScanner::new().unwrap()
    }

    #[test]
    fn reports_lines_in_document_order() {
        let text = "<div>\n\n<p id=\"dup\">\n<span id='x'/>\n\n\n<b id=\"dup\">\n";
        let dups = scanner().duplicates_in(text);
        assert_eq!(dups.len(), 1);
        assert_eq!(dups["dup"], vec![3, 7]);
    }

    #[test]
    fn same_line_occurrences_repeat_the_line() {
        let dups = scanner().duplicates_in(r#"<a id="k"></a><b id='k'></b><c id="k"/>"#);
        assert_eq!(dups["k"], vec![1, 1, 1]);
    }

    #[test]
    fn singletons_are_dropped() {
        let dups = scanner().duplicates_in("<a id=\"one\"/>\n<b id=\"two\"/>");
        assert!(dups.is_empty());
    }

    #[test]
    fn empty_id_value_is_not_matched() {
        let dups = scanner().duplicates_in("<a id=\"\"/><b id=\"\"/>");
        assert!(dups.is_empty());
    }

    #[test]
    fn find_keys_by_file_and_keeps_counts_consistent() {
        let tmp = TempDir::new().unwrap();
        let dup = tmp.path().join("page.html");
        fs::write(&dup, "<i id=\"a\"/>\n<i id=\"a\"/>\n<i id=\"b\"/>\n<i id=\"b\"/>\n<i id=\"b\"/>").unwrap();
        let clean = tmp.path().join("clean.tsx");
        fs::write(&clean, "<i id=\"only\"/>").unwrap();

        let files: Vec<FileHandle> = [dup.clone(), clean]
            .into_iter()
            .filter_map(FileHandle::from_path)
            .collect();
        let found = scanner().find(&files);

        assert_eq!(found.file_count(), 1);
        let key = dup.to_string_lossy().into_owned();
        assert_eq!(found.counts[&key]["a"], 2);
        assert_eq!(found.counts[&key]["b"], 3);
        assert_eq!(found.lines[&key]["b"], vec![3, 4, 5]);
        for (file, ids) in &found.counts {
            for (id, count) in ids {
                assert_eq!(*count, found.lines[file][id].len());
                assert!(*count >= 2);
            }
        }
    }

    #[test]
    fn unreadable_files_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let ghost = FileHandle::from_path(tmp.path().join("ghost.html")).unwrap();
        assert!(scanner().find(&[ghost]).is_empty());
    }
}
