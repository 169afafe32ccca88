//! Frontend audit pipeline: walk, scan, resolve assets, persist, gate.

#![allow(missing_docs)]

use std::path::PathBuf;

use crate::audit::assets::{AssetResolver, merge_required};
use crate::audit::gate::{FrontendCategory, StrictDecision, decide};
use crate::audit::report::{AuditReport, OutputFormat, PersistedReport, RunSettings, persist};
use crate::core::config::FrontendConfig;
use crate::core::errors::Result;
use crate::core::paths::{AuditSide, default_report_path, join_posix};
use crate::scanner::asset_refs::AssetReferenceScanner;
use crate::scanner::coordinator::{ScanCoordinator, ScanInputs};
use crate::scanner::duplicate_ids::DuplicateIdScanner;
use crate::scanner::headers::HeaderScanner;
use crate::scanner::ignore::IgnoreSet;
use crate::scanner::walker::{FileHandle, TreeWalker, WalkerConfig};

/// Effective inputs of one frontend run, after flag/config/env resolution.
#[derive(Debug, Clone)]
pub struct FrontendRun {
    pub root: PathBuf,
    /// `None` means `<root>/run/leeway_frontend_audit_report.json`.
    pub out: Option<PathBuf>,
    pub ignore_file: Option<PathBuf>,
    pub ignore: Vec<String>,
    pub require_images: Vec<String>,
    pub max_header_lines: usize,
    pub workers: usize,
    pub strict: Option<FrontendCategory>,
    pub format: OutputFormat,
}

impl FrontendRun {
    /// Inputs taken straight from the config section.
    pub fn from_config(cfg: &FrontendConfig, root: PathBuf) -> Self {
        Self {
            root,
            out: cfg.out.clone(),
            ignore_file: cfg.ignore_file.clone(),
            ignore: cfg.ignore.clone(),
            require_images: Vec::new(),
            max_header_lines: cfg.max_header_lines,
            workers: cfg.workers,
            strict: None,
            format: OutputFormat::default(),
        }
    }

    pub fn report_path(&self) -> PathBuf {
        self.out
            .clone()
            .unwrap_or_else(|| default_report_path(AuditSide::Frontend, &self.root))
    }
}

/// Everything a caller needs to render and log a finished run.
#[derive(Debug, Clone)]
pub struct FrontendOutcome {
    pub report: AuditReport,
    pub persisted: PersistedReport,
    pub decision: StrictDecision,
    pub ignore_patterns: usize,
    pub files_scanned: usize,
}

/// Run the full frontend audit.
///
/// The report is persisted before this returns, so a rendering failure in the
/// caller cannot lose it.
pub fn run_frontend(cfg: &FrontendConfig, run: &FrontendRun) -> Result<FrontendOutcome> {
    let ignore = IgnoreSet::load(run.ignore_file.as_deref(), &run.ignore)?;

    let walker = TreeWalker::new(
        WalkerConfig::new(&run.root, &cfg.scan_extensions)
            .with_parallelism(run.workers)
            .with_follow_symlinks(cfg.follow_symlinks),
        &ignore,
    );
    let mut all = walker.list()?;
    all.sort();
    let markup: Vec<FileHandle> = all
        .iter()
        .filter(|f| cfg.id_extensions.contains(&f.extension))
        .cloned()
        .collect();

    let coordinator = ScanCoordinator::new(
        HeaderScanner::new(&cfg.header_pattern, run.max_header_lines)?,
        DuplicateIdScanner::new()?,
        AssetReferenceScanner::new(&cfg.asset_extensions)?,
        run.workers,
    );
    let scan = coordinator.run(ScanInputs {
        all: &all,
        markup: &markup,
    })?;

    let resolver = AssetResolver::new(&join_posix(&run.root, &cfg.public_dir))?;
    let required = resolver.check(merge_required(&cfg.required_assets, &run.require_images));
    let discovered = resolver.check(&scan.discovered_assets);

    let settings = RunSettings {
        ignore_file: run.ignore_file.clone(),
        strict: run.strict,
        format: run.format,
        max_header_lines: run.max_header_lines,
        workers: run.workers,
    };
    let report = AuditReport::assemble(scan, required, discovered, &run.root, &settings);
    let persisted = persist(&report, &run.report_path())?;

    let decision = decide(&report, run.strict.unwrap_or(FrontendCategory::None));
    Ok(FrontendOutcome {
        report,
        persisted,
        decision,
        ignore_patterns: ignore.len(),
        files_scanned: all.len(),
    })
}
