//! Header-marker pass: which files lack the required sentinel near their top.

#![allow(missing_docs)]

use std::collections::BTreeSet;
use std::fs;

use regex::Regex;

use crate::core::errors::Result;
use crate::scanner::compile_pattern;
use crate::scanner::walker::FileHandle;

/// Stateless header check over a file list.
#[derive(Debug, Clone)]
pub struct HeaderScanner {
    marker: Regex,
    max_header_lines: usize,
}

impl HeaderScanner {
    /// `max_header_lines == 0` searches the whole file.
    pub fn new(marker_pattern: &str, max_header_lines: usize) -> Result<Self> {
        Ok(Self {
            marker: compile_pattern(marker_pattern)?,
            max_header_lines,
        })
    }

    pub fn max_header_lines(&self) -> usize {
        self.max_header_lines
    }

    /// Sorted, de-duplicated paths of files without the marker.
    ///
    /// A file that cannot be read counts as missing.
    pub fn missing(&self, files: &[FileHandle]) -> Vec<String> {
        let mut missing = BTreeSet::new();
        for file in files {
            let has_marker = match fs::read(&file.path) {
                Ok(bytes) => self.has_marker(&bytes),
                Err(_) => false,
            };
            if !has_marker {
                missing.insert(file.display_path());
            }
        }
        missing.into_iter().collect()
    }

    /// Whether the marker occurs within the configured line window.
    pub fn has_marker(&self, bytes: &[u8]) -> bool {
        let window = header_window(bytes, self.max_header_lines);
        self.marker.is_match(&String::from_utf8_lossy(window))
    }
}

/// The first `max_lines` lines of `bytes` (all of it when `max_lines == 0`).
pub fn header_window(bytes: &[u8], max_lines: usize) -> &[u8] {
    if max_lines == 0 {
        return bytes;
    }
    match memchr::memchr_iter(b'\n', bytes).nth(max_lines - 1) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}
