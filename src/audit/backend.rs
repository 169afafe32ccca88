//! Backend audit: required directories, headers, models, checkpoints,
//! Python requirements, and ffmpeg availability.
//!
//! Every check here is a flat existence or substring test; the report shape is
//! consumed by the combined HTML renderer.

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use regex::RegexBuilder;
use serde::Serialize;

use crate::audit::assets::{OrderedMap, StatusMap};
use crate::audit::gate::{BackendCategory, Finding, Gated};
use crate::core::config::{BackendConfig, CheckpointSet, DEFAULT_HEADER_PATTERN};
use crate::core::errors::{LwaError, Result};
use crate::core::paths::join_posix;
use crate::scanner::headers::HeaderScanner;
use crate::scanner::ignore::IgnoreSet;
use crate::scanner::walker::{TreeWalker, WalkerConfig};

/// Which model families appear under `models/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModelFlags {
    pub azr: bool,
    pub phi3: bool,
    pub gemma: bool,
    pub llama: bool,
    pub voice: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModelInventory {
    pub present: Vec<String>,
    pub flags: ModelFlags,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequirementsStatus {
    pub present: Vec<String>,
    pub missing: Vec<String>,
}

/// The persisted backend report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendReport {
    pub root: String,
    pub dirs: StatusMap,
    pub headers_missing: Vec<String>,
    pub models: ModelInventory,
    pub checkpoints: OrderedMap<StatusMap>,
    pub requirements: RequirementsStatus,
    pub ffmpeg_available: bool,
    pub config: BTreeMap<String, String>,
}

/// Existence of each required directory (forward-slash relative to `root`).
pub fn check_dirs<S: AsRef<str>>(root: &Path, required_dirs: &[S]) -> StatusMap {
    required_dirs
        .iter()
        .map(|rel| {
            let rel = rel.as_ref();
            (rel.to_string(), join_posix(root, rel).is_dir())
        })
        .collect()
}

/// Whole-file header scan over every file with a matching extension.
pub fn scan_headers<S: AsRef<str>>(
    root: &Path,
    extensions: &[S],
    workers: usize,
) -> Result<Vec<String>> {
    let ignore = IgnoreSet::default();
    let walker = TreeWalker::new(
        WalkerConfig::new(root, extensions.iter()).with_parallelism(workers),
        &ignore,
    );
    let files = walker.list()?;
    Ok(HeaderScanner::new(DEFAULT_HEADER_PATTERN, 0)?.missing(&files))
}

/// Names under `root/models`, sorted, plus family flags. A missing directory is empty.
pub fn check_models(root: &Path) -> ModelInventory {
    let mut present: Vec<String> = fs::read_dir(root.join("models"))
        .map(|entries| {
            entries
                .flatten()
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    present.sort();

    let has = |needle: &str| present.iter().any(|n| n.to_ascii_lowercase().contains(needle));
    let flags = ModelFlags {
        azr: has("absolute_zero_reasoner"),
        phi3: has("phi3"),
        gemma: has("gemma"),
        llama: has("llama"),
        voice: has("voice"),
    };
    ModelInventory { present, flags }
}

/// set name -> file -> exists
pub fn check_checkpoints(root: &Path, sets: &[CheckpointSet]) -> OrderedMap<StatusMap> {
    sets.iter()
        .map(|set| {
            let dir = join_posix(root, &set.dir);
            let status: StatusMap = set
                .files
                .iter()
                .map(|file| (file.clone(), dir.join(file).is_file()))
                .collect();
            (set.name.clone(), status)
        })
        .collect()
}

/// Each package must start a line of `requirements.txt`, followed by a
/// non-word character or end of line. An unreadable file means all missing.
pub fn check_requirements<S: AsRef<str>>(
    root: &Path,
    packages: &[S],
) -> Result<RequirementsStatus> {
    let text = fs::read(root.join("requirements.txt"))
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default();

    let mut status = RequirementsStatus::default();
    for pkg in packages {
        let pkg = pkg.as_ref();
        let line_start = RegexBuilder::new(&format!(r"^{}(\W|$)", regex::escape(pkg)))
            .case_insensitive(true)
            .multi_line(true)
            .build()
            .map_err(|err| LwaError::InvalidPattern {
                pattern: pkg.to_string(),
                details: err.to_string(),
            })?;
        if line_start.is_match(&text) {
            status.present.push(pkg.to_string());
        } else {
            status.missing.push(pkg.to_string());
        }
    }
    Ok(status)
}

/// Whether `ffmpeg` is on `PATH`.
pub fn ffmpeg_available() -> bool {
    ffmpeg_on_path(env::var_os("PATH"))
}

pub fn ffmpeg_on_path(path_var: Option<OsString>) -> bool {
    let Some(path_var) = path_var else {
        return false;
    };
    let names: &[&str] = if cfg!(windows) {
        &["ffmpeg", "ffmpeg.exe"]
    } else {
        &["ffmpeg"]
    };
    env::split_paths(&path_var).any(|dir| names.iter().any(|name| dir.join(name).is_file()))
}

/// Options for one backend run.
#[derive(Debug, Clone)]
pub struct BackendRun {
    pub root: PathBuf,
    pub strict: Option<BackendCategory>,
    pub workers: usize,
}

/// Run every backend check. The root must be a directory.
pub fn run_backend(cfg: &BackendConfig, run: &BackendRun) -> Result<BackendReport> {
    let root = &run.root;
    if !root.is_dir() {
        return Err(LwaError::MissingRoot {
            role: "backend root",
            path: root.clone(),
        });
    }
    let mut config = BTreeMap::new();
    config.insert(
        "strict".to_string(),
        run.strict.map(|c| c.as_str().to_string()).unwrap_or_default(),
    );
    Ok(BackendReport {
        root: root.to_string_lossy().into_owned(),
        dirs: check_dirs(root, &cfg.required_dirs),
        headers_missing: scan_headers(root, &cfg.header_extensions, run.workers)?,
        models: check_models(root),
        checkpoints: check_checkpoints(root, &cfg.checkpoints),
        requirements: check_requirements(root, &cfg.required_packages)?,
        ffmpeg_available: ffmpeg_available(),
        config,
    })
}

/// Gate view over a backend report, optionally waiving the ffmpeg check.
#[derive(Debug, Clone, Copy)]
pub struct BackendGate<'a> {
    pub report: &'a BackendReport,
    pub ignore_ffmpeg: bool,
}

impl Gated for BackendGate<'_> {
    type Category = BackendCategory;

    fn findings(&self) -> Vec<Finding<BackendCategory>> {
        let r = self.report;
        let mut out = Vec::new();
        let missing_dirs = r.dirs.missing();
        if !missing_dirs.is_empty() {
            out.push(Finding::new(
                BackendCategory::Dirs,
                format!("[backend] missing dirs: {}", missing_dirs.join(", ")),
            ));
        }
        if !r.headers_missing.is_empty() {
            out.push(Finding::new(
                BackendCategory::Headers,
                format!("[backend] missing headers: {}", r.headers_missing.len()),
            ));
        }
        if !r.requirements.missing.is_empty() {
            out.push(Finding::new(
                BackendCategory::Requirements,
                format!(
                    "[backend] missing py pkgs: {}",
                    r.requirements.missing.join(", ")
                ),
            ));
        }
        for (name, files) in r.checkpoints.iter() {
            let need = files.missing();
            if !need.is_empty() {
                out.push(Finding::new(
                    BackendCategory::Checkpoints,
                    format!("[backend] checkpoints:{name} missing {}", need.join(", ")),
                ));
            }
        }
        if !self.ignore_ffmpeg && !r.ffmpeg_available {
            out.push(Finding::new(
                BackendCategory::Ffmpeg,
                "[backend] ffmpeg not available",
            ));
        }
        out
    }
}
