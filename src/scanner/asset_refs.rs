//! Image-reference discovery over raw source text.
//!
//! One alternation regex covers three shapes: `src=`/`href=` attributes,
//! `import x from "..."` statements, and bare quoted strings. All three must end
//! in one of the configured image extensions. Bare strings make this pass over-match on purpose:
//! a quoted `"logo.png"` inside a comment still counts as a reference.

#![allow(missing_docs)]

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use regex::Regex;

use crate::core::errors::Result;
use crate::scanner::compile_pattern;
use crate::scanner::walker::{FileHandle, extension_of};

/// Reference regex for the given extensions (`.png`, ...).
///
/// Named groups `a` (attribute), `b` (import), `c` (bare string).
pub fn image_reference_pattern<'a, I>(extensions: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let alternation = extensions
        .into_iter()
        .map(|ext| regex::escape(ext.trim_start_matches('.')))
        .collect::<Vec<_>>()
        .join("|");
    let tail = format!(r#"[^"']+\.(?:{alternation}))["']"#);
    format!(
        r#"(?i)(?:src|href)\s*=\s*["'](?P<a>{tail}|import\s+[^'"]+\s+from\s+["'](?P<b>{tail}|["'](?P<c>{tail}"#
    )
}

#[derive(Debug, Clone)]
pub struct AssetReferenceScanner {
    reference: Regex,
    asset_extensions: BTreeSet<String>,
}

impl AssetReferenceScanner {
    /// `asset_extensions` are lower-cased with the leading dot (`.png`).
    pub fn new<I, S>(asset_extensions: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let asset_extensions: BTreeSet<String> = asset_extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().to_ascii_lowercase())
            .filter(|ext| ext.len() > 1)
            .collect();
        let pattern = image_reference_pattern(asset_extensions.iter().map(String::as_str));
        Ok(Self {
            reference: compile_pattern(&pattern)?,
            asset_extensions,
        })
    }

    /// Sorted, de-duplicated asset paths referenced from `files`.
    ///
    /// Unreadable files are skipped.
    pub fn discover(&self, files: &[FileHandle]) -> Vec<String> {
        let mut refs = BTreeSet::new();
        for file in files {
            let Ok(bytes) = fs::read(&file.path) else {
                continue;
            };
            self.collect_into(&String::from_utf8_lossy(&bytes), &mut refs);
        }
        refs.into_iter().collect()
    }

    /// Add every normalized reference found in `text`.
    pub fn collect_into(&self, text: &str, refs: &mut BTreeSet<String>) {
        for caps in self.reference.captures_iter(text) {
            let Some(raw) = caps
                .name("a")
                .or_else(|| caps.name("b"))
                .or_else(|| caps.name("c"))
            else {
                continue;
            };
            let rel = normalize_asset_path(raw.as_str());
            if rel.is_empty() {
                continue;
            }
            let accepted = extension_of(Path::new(rel))
                .is_some_and(|ext| self.asset_extensions.contains(&ext));
            if accepted {
                refs.insert(rel.to_string());
            }
        }
    }
}

/// Strip every leading `.` and `/`, so `./a`, `../a` and `/a` all become `a`.
pub fn normalize_asset_path(raw: &str) -> &str {
    raw.trim().trim_start_matches(['.', '/'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;

    fn scanner() -> AssetReferenceScanner {
        AssetReferenceScanner::new(Config::default().frontend.asset_extensions).unwrap()
    }

    fn refs(text: &str) -> Vec<String> {
        let mut out = BTreeSet::new();
        scanner().collect_into(text, &mut out);
        out.into_iter().collect()
    }

    #[test]
    fn img_src_keeps_case_of_path() {
        assert_eq!(refs(r#"<img src="a/b.PNG">"#), vec!["a/b.PNG"]);
    }

    #[test]
    fn leading_dot_slash_and_slash_are_stripped() {
        assert_eq!(
            refs(r#"<img src="./img/x.png"> <a href="/icons/y.svg">"#),
            vec!["icons/y.svg", "img/x.png"]
        );
    }

    #[test]
    fn default_import_is_recognized() {
        assert_eq!(
            refs("import logo from './assets/logo.webp';"),
            vec!["assets/logo.webp"]
        );
    }

    #[test]
    fn bare_quoted_literals_over_match() {
        assert_eq!(
            refs("// fallback: 'image/hero.jpeg'\nconst x = \"thumb.gif\";"),
            vec!["image/hero.jpeg", "thumb.gif"]
        );
    }

    #[test]
    fn non_image_strings_are_ignored() {
        assert!(refs(r#"<script src="app.js"></script> "notes.txt""#).is_empty());
    }

    #[test]
    fn spaces_around_equals_are_allowed() {
        assert_eq!(refs("<img src = 'p.jpg'>"), vec!["p.jpg"]);
    }

    #[test]
    fn duplicates_collapse_and_sort() {
        assert_eq!(
            refs(r#""b.png" "a.png" "b.png""#),
            vec!["a.png", "b.png"]
        );
    }

    #[test]
    fn narrower_extension_set_filters_matches() {
        let s = AssetReferenceScanner::new([".svg"]).unwrap();
        let mut out = BTreeSet::new();
        s.collect_into(r#""a.png" "b.svg""#, &mut out);
        assert_eq!(out.into_iter().collect::<Vec<_>>(), vec!["b.svg"]);
    }

    #[test]
    fn normalize_strips_all_leading_dots_and_slashes() {
        assert_eq!(normalize_asset_path("./x.png"), "x.png");
        assert_eq!(normalize_asset_path("//x.png"), "x.png");
        assert_eq!(normalize_asset_path("././x.png"), "x.png");
        assert_eq!(normalize_asset_path("../x.png"), "x.png");
        assert_eq!(normalize_asset_path(" /img/a.b.png "), "img/a.b.png");
    }

    #[test]
    fn relative_parent_references_stay_under_public_root() {
        assert_eq!(
            refs(r#"<img src="././img/a.png"> <img src="../img/b.png">"#),
            vec!["img/a.png", "img/b.png"]
        );
    }

    #[test]
    fn configured_extension_outside_defaults_is_discovered() {
        let s = AssetReferenceScanner::new([".avif", ".png"]).unwrap();
        let mut out = BTreeSet::new();
        s.collect_into(
            r#"<img src="hero.avif"> <img src="a.png"> "c.gif""#,
            &mut out,
        );
        assert_eq!(out.into_iter().collect::<Vec<_>>(), vec!["a.png", "hero.avif"]);
    }

    #[test]
    fn extension_metacharacters_are_escaped() {
        let pattern = image_reference_pattern([".a+b"]);
        assert!(pattern.contains(r"a\+b"));
        let s = AssetReferenceScanner::new([".a+b"]).unwrap();
        let mut out = BTreeSet::new();
        s.collect_into(r#""x.aab" "y.a+b""#, &mut out);
        assert!(!out.contains("x.aab"));
        assert!(out.contains("y.a+b"));
    }

    #[test]
    fn discover_reads_files_and_skips_unreadable() {
        let tmp = tempfile::tempdir().unwrap();
        let page = tmp.path().join("page.tsx");
        fs::write(&page, r#"<img src="/image/macmillionmic.png" />"#).unwrap();
        let files: Vec<FileHandle> = [page, tmp.path().join("gone.tsx")]
            .into_iter()
            .filter_map(FileHandle::from_path)
            .collect();
        assert_eq!(scanner().discover(&files), vec!["image/macmillionmic.png"]);
    }
}
