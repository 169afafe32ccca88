//! Ignore globs: gitignore-like pattern sets deciding which discovered paths are excluded.
//!
//! Every pattern compiles into two independent matchers:
//! - a **relative** matcher tested against the root-relative, forward-slash path
//!   (any component-aligned suffix, unless the pattern starts with `/`);
//! - a **basename** matcher, present only when the pattern has no `/`, tested
//!   against the final path segment alone.
//!
//! Patterns shaped like `<stem>/**` (or `<stem>/`) also compile a directory
//! matcher so the walker can prune the subtree without descending into it.

#![allow(missing_docs)]

use std::fs;
use std::path::Path;

use regex::Regex;

use crate::core::errors::{LwaError, Result};
use crate::core::paths::posix_relative;

/// Build/output/cache directories and source maps, used when no ignore file is given.
pub const DEFAULT_IGNORES: &[&str] = &[
    "node_modules/**",
    "dist/**",
    "build/**",
    ".next/**",
    ".vercel/**",
    ".cache/**",
    "coverage/**",
    "**/*.map",
];

/// One compiled ignore pattern.
#[derive(Debug, Clone)]
pub struct IgnorePattern {
    original: String,
    relative: Regex,
    basename: Option<Regex>,
    prune: Option<Regex>,
}

impl IgnorePattern {
    /// Compile a single glob. Every string is accepted as a literal pattern.
    pub fn compile(pattern: &str) -> Result<Self> {
        let normalized = pattern.trim().replace('\\', "/");
        let (anchored, body) = match normalized.strip_prefix('/') {
            Some(rest) => (true, rest.to_string()),
            None => (false, normalized.trim_start_matches("./").to_string()),
        };
        let body = match body.strip_suffix('/') {
            Some(dir) if !dir.is_empty() => format!("{dir}/**"),
            _ => body,
        };

        let relative = compile_anchored(pattern, &glob_to_regex(&body), anchored)?;
        let basename = if normalized.contains('/') {
            None
        } else {
            Some(compile_anchored(pattern, &glob_to_regex(&body), true)?)
        };
        let prune = match body.strip_suffix("/**") {
            Some(stem) if !stem.is_empty() => {
                Some(compile_anchored(pattern, &glob_to_regex(stem), anchored)?)
            }
            _ => None,
        };

        Ok(Self {
            original: pattern.to_string(),
            relative,
            basename,
            prune,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// Match against a root-relative, forward-slash path.
    pub fn matches_relative(&self, rel: &str) -> bool {
        self.relative.is_match(rel)
    }

    /// Match against a bare file name. Always false for patterns containing `/`.
    pub fn matches_basename(&self, name: &str) -> bool {
        self.basename.as_ref().is_some_and(|re| re.is_match(name))
    }

    /// Whether a directory at `rel_dir` (root-relative) lies wholly inside this pattern.
    pub fn prunes_dir(&self, rel_dir: &str) -> bool {
        self.prune.as_ref().is_some_and(|re| re.is_match(rel_dir))
    }
}

/// Ordered, immutable set of ignore patterns for one run. First match wins.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    patterns: Vec<IgnorePattern>,
}

impl IgnoreSet {
    /// Compile patterns in the given order.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pat| IgnorePattern::compile(pat.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Merge the ignore file's lines (or the built-in defaults when no file is
    /// given) with inline patterns, in that order.
    ///
    /// A named file that does not exist contributes nothing.
    pub fn load(ignore_file: Option<&Path>, inline: &[String]) -> Result<Self> {
        let mut raw: Vec<String> = match ignore_file {
            Some(path) => read_ignore_file(path)?,
            None => DEFAULT_IGNORES.iter().map(|s| (*s).to_string()).collect(),
        };
        raw.extend(inline.iter().cloned());
        Self::new(raw)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(IgnorePattern::as_str)
    }

    /// Whether `path` (under `root`) is excluded by any pattern.
    pub fn excluded(&self, path: &Path, root: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let rel = posix_relative(path, root)
            .unwrap_or_else(|| path.to_string_lossy().replace('\\', "/"));
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.patterns
            .iter()
            .any(|pat| pat.matches_relative(&rel) || pat.matches_basename(&name))
    }

    /// Whether the directory at `rel_dir` can be skipped entirely.
    pub fn prunes_dir(&self, rel_dir: &str) -> bool {
        self.patterns.iter().any(|pat| pat.prunes_dir(rel_dir))
    }
}

/// Validate that a glob pattern can be compiled.
pub fn validate_glob_pattern(pattern: &str) -> Result<()> {
    IgnorePattern::compile(pattern).map(|_| ())
}

fn read_ignore_file(path: &Path) -> Result<Vec<String>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            eprintln!(
                "[LWA-IGNORE] ignore file {} not found, continuing with inline patterns only",
                path.display()
            );
            return Ok(Vec::new());
        }
        Err(source) => return Err(LwaError::io(path, source)),
    };
    Ok(parse_ignore_lines(&String::from_utf8_lossy(&bytes)))
}

/// Keep every non-blank line that is not a `#` comment, trimmed.
pub fn parse_ignore_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Convert a shell-style glob to an unanchored regex body.
///
/// - `**/` matches zero or more whole components
/// - `**` matches anything, separators included
/// - `*` matches anything except `/`
/// - `?` matches a single character except `/`
///
/// Every other character is literal.
fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' if i + 1 < chars.len() && chars[i + 1] == '*' => {
                if i + 2 < chars.len() && chars[i + 2] == '/' {
                    out.push_str("(?:.*/)?");
                    i += 3;
                } else {
                    out.push_str(".*");
                    i += 2;
                }
            }
            '*' => {
                out.push_str("[^/]*");
                i += 1;
            }
            '?' => {
                out.push_str("[^/]");
                i += 1;
            }
            c => {
                out.push_str(&regex::escape(&c.to_string()));
                i += 1;
            }
        }
    }
    out
}

fn compile_anchored(original: &str, body: &str, anchored: bool) -> Result<Regex> {
    let full = if anchored {
        format!("^{body}$")
    } else {
        format!("^(?:.*/)?{body}$")
    };
    Regex::new(&full).map_err(|err| LwaError::InvalidPattern {
        pattern: original.to_string(),
        details: err.to_string(),
    })
}
