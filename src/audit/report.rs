//! Frontend report: assembly, persistence, and digests.

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::audit::assets::StatusMap;
use crate::audit::gate::FrontendCategory;
use crate::core::errors::{LwaError, Result};
use crate::scanner::coordinator::ScanResults;
use crate::scanner::duplicate_ids::{IdCounts, IdLines};

/// Console rendering of a frontend run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    Json,
    #[default]
    Table,
}

impl OutputFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Table => "table",
        }
    }
}

/// Effective settings echoed into the report's `config` map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub ignore_file: Option<PathBuf>,
    pub strict: Option<FrontendCategory>,
    pub format: OutputFormat,
    pub max_header_lines: usize,
    pub workers: usize,
}

impl RunSettings {
    /// All values rendered as strings; absent values are empty strings.
    pub fn echo(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        out.insert(
            "ignore_file".to_string(),
            self.ignore_file
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        out.insert(
            "strict".to_string(),
            self.strict.map(|c| c.as_str().to_string()).unwrap_or_default(),
        );
        out.insert("format".to_string(), self.format.as_str().to_string());
        out.insert(
            "max_header_lines".to_string(),
            self.max_header_lines.to_string(),
        );
        out.insert("workers".to_string(), self.workers.to_string());
        out
    }
}

/// The terminal aggregate of one frontend run. Field names are a stable format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    headers_missing: Vec<String>,
    duplicate_ids: IdCounts,
    duplicate_ids_lines: IdLines,
    required_assets: StatusMap,
    discovered_assets: StatusMap,
    root: String,
    config: BTreeMap<String, String>,
}

impl AuditReport {
    /// Assemble the report from scan results and the two resolver maps.
    pub fn assemble(
        scan: ScanResults,
        required_assets: StatusMap,
        discovered_assets: StatusMap,
        root: &Path,
        settings: &RunSettings,
    ) -> Self {
        let ScanResults {
            headers_missing,
            duplicate_ids,
            ..
        } = scan;
        Self {
            headers_missing,
            duplicate_ids: duplicate_ids.counts,
            duplicate_ids_lines: duplicate_ids.lines,
            required_assets,
            discovered_assets,
            root: root.to_string_lossy().into_owned(),
            config: settings.echo(),
        }
    }

    pub fn headers_missing(&self) -> &[String] {
        &self.headers_missing
    }

    pub fn duplicate_ids(&self) -> &IdCounts {
        &self.duplicate_ids
    }

    pub fn duplicate_ids_lines(&self) -> &IdLines {
        &self.duplicate_ids_lines
    }

    pub fn required_assets(&self) -> &StatusMap {
        &self.required_assets
    }

    pub fn discovered_assets(&self) -> &StatusMap {
        &self.discovered_assets
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn config(&self) -> &BTreeMap<String, String> {
        &self.config
    }

    /// Pretty JSON, two-space indent.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Where a report landed and what it hashed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedReport {
    pub path: PathBuf,
    pub sha256: String,
    pub bytes: usize,
}

/// Write any serializable report as pretty JSON, creating parent directories.
pub fn persist<T: Serialize>(report: &T, path: &Path) -> Result<PersistedReport> {
    let json = serde_json::to_string_pretty(report)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| LwaError::io(parent, source))?;
    }
    fs::write(path, json.as_bytes()).map_err(|source| LwaError::io(path, source))?;
    Ok(PersistedReport {
        path: path.to_path_buf(),
        sha256: sha256_hex(json.as_bytes()),
        bytes: json.len(),
    })
}

/// Lower-case hex SHA-256.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
