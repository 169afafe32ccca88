#![allow(missing_docs)]

use std::fs;
use std::path::Path;

use leeway_audit::scanner::ignore::{DEFAULT_IGNORES, IgnorePattern, IgnoreSet};
use leeway_audit::scanner::walker::{TreeWalker, WalkerConfig};
use tempfile::TempDir;

fn excluded(patterns: &[&str], rel: &str) -> bool {
    let set = IgnoreSet::new(patterns).expect("valid patterns");
    let root = Path::new("/repo");
    set.excluded(&root.join(rel), root)
}

#[test]
fn double_star_component_boundary() {
    // `**/` spans whole components only, so `src/badmain.rs` is not a match.
    let patterns = ["src/**/main.rs"];
    assert!(excluded(&patterns, "src/main.rs"));
    assert!(excluded(&patterns, "src/foo/main.rs"));
    assert!(excluded(&patterns, "src/foo/bar/main.rs"));
    assert!(!excluded(&patterns, "src/badmain.rs"));
}

#[test]
fn directory_glob_covers_nested_copies_only() {
    let patterns = ["dist/**"];
    assert!(excluded(&patterns, "dist/app.js"));
    assert!(excluded(&patterns, "dist/assets/app.js"));
    assert!(excluded(&patterns, "packages/ui/dist/app.js"));
    assert!(!excluded(&patterns, "distribution/app.js"));
    assert!(!excluded(&patterns, "src/dist.js"));
    assert!(!excluded(&patterns, "mydist/app.js"));
}

#[test]
fn leading_slash_anchors_at_root() {
    let patterns = ["/dist/**"];
    assert!(excluded(&patterns, "dist/app.js"));
    assert!(!excluded(&patterns, "packages/ui/dist/app.js"));
}

#[test]
fn separator_free_pattern_matches_basename_anywhere() {
    let patterns = ["*.map"];
    assert!(excluded(&patterns, "app.js.map"));
    assert!(excluded(&patterns, "a/b/c/app.js.map"));
    assert!(!excluded(&patterns, "map/app.js"));
    assert!(!excluded(&patterns, "a/app.mapx"));
}

#[test]
fn single_star_does_not_cross_separators() {
    let pattern = IgnorePattern::compile("src/*.js").expect("compile");
    assert!(pattern.matches_relative("src/a.js"));
    assert!(!pattern.matches_relative("src/lib/a.js"));
    assert!(!pattern.matches_basename("a.js"));
}

#[test]
fn trailing_slash_means_whole_directory() {
    let patterns = ["build/"];
    assert!(excluded(&patterns, "build/out.js"));
    assert!(excluded(&patterns, "pkg/build/deep/out.js"));
    assert!(!excluded(&patterns, "builder/out.js"));
}

#[test]
fn backslash_separators_are_normalized() {
    let patterns = [r"dist\**"];
    assert!(excluded(&patterns, "dist/app.js"));
}

#[test]
fn malformed_glob_is_a_literal() {
    let pattern = IgnorePattern::compile("[abc").expect("every line is a literal pattern");
    assert!(pattern.matches_basename("[abc"));
    assert!(!pattern.matches_basename("a"));
}

#[test]
fn prune_only_for_directory_globs() {
    let set = IgnoreSet::new(DEFAULT_IGNORES).expect("defaults compile");
    assert!(set.prunes_dir("node_modules"));
    assert!(set.prunes_dir("packages/web/node_modules"));
    assert!(set.prunes_dir(".next"));
    assert!(!set.prunes_dir("src"));
    assert!(!set.prunes_dir("node_modules_backup"));
}

#[test]
fn walker_never_lists_pruned_or_ignored_files() {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path();
    for rel in [
        "src/App.tsx",
        "src/App.tsx.map",
        "node_modules/react/index.js",
        "packages/ui/node_modules/x/index.js",
        "packages/ui/dist/bundle.js",
        "packages/ui/src/Button.tsx",
    ] {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, "x").expect("write");
    }

    let set = IgnoreSet::new(DEFAULT_IGNORES.iter().copied().chain(["*.map"]))
        .expect("patterns compile");
    let walker = TreeWalker::new(
        WalkerConfig::new(root, [".tsx", ".js", ".map"]).with_parallelism(3),
        &set,
    );
    let mut listed: Vec<String> = walker
        .list()
        .expect("walk")
        .into_iter()
        .map(|f| {
            f.path
                .strip_prefix(root)
                .expect("under root")
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    listed.sort();
    assert_eq!(listed, ["packages/ui/src/Button.tsx", "src/App.tsx"]);
}
