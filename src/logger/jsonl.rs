//! JSONL activity log: one self-contained JSON object per line.
//!
//! Lines are assembled in memory and written with a single `write_all` so a
//! tailing reader never sees a partial line.
//!
//! Degradation chain:
//! 1. Primary file path (rotated by size)
//! 2. stderr with `[LWA-JSONL]` prefix
//! 3. Silent discard (an audit must never fail because logging did)

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions, rename};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::config::LoggingConfig;
use crate::core::errors::{LwaError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Activity events emitted by an audit run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    AuditStart,
    ScanComplete,
    ReportWritten,
    GatePass,
    GateFail,
    Error,
}

/// A single log line. Only `ts`, `event`, and `severity` are always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// RFC 3339 UTC timestamp.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    /// `frontend`, `backend`, or `report`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_scanned: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_patterns: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers_missing: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_files: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_assets: Option<usize>,
    /// SHA-256 of the persisted report bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failures: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl LogEntry {
    /// New entry stamped with the current UTC time.
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            severity,
            side: None,
            root: None,
            path: None,
            files_scanned: None,
            ignore_patterns: None,
            headers_missing: None,
            duplicate_files: None,
            missing_assets: None,
            sha256: None,
            bytes: None,
            strict: None,
            failures: None,
            config_hash: None,
            duration_ms: None,
            error_code: None,
            error_message: None,
        }
    }

    #[must_use]
    pub fn side(mut self, side: &str) -> Self {
        self.side = Some(side.to_string());
        self
    }

    #[must_use]
    pub fn root(mut self, root: &Path) -> Self {
        self.root = Some(root.to_string_lossy().into_owned());
        self
    }

    /// Entry for a failed run.
    pub fn from_error(side: &str, err: &LwaError) -> Self {
        let mut entry = Self::new(EventType::Error, Severity::Critical).side(side);
        entry.error_code = Some(err.code().to_string());
        entry.error_message = Some(err.to_string());
        entry
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Normal,
    Stderr,
    Discard,
}

#[derive(Debug, Clone)]
pub struct JsonlConfig {
    pub path: PathBuf,
    /// Rotate before a write would push the file past this size.
    pub max_size_bytes: u64,
    /// Rotated files kept (`activity.jsonl.1` .. `.N`).
    pub max_rotated_files: u32,
}

impl From<&LoggingConfig> for JsonlConfig {
    fn from(cfg: &LoggingConfig) -> Self {
        Self {
            path: cfg.jsonl_path.clone(),
            max_size_bytes: cfg.max_size_bytes,
            max_rotated_files: cfg.max_rotated_files,
        }
    }
}

/// Append-only JSONL writer with size rotation and graceful degradation.
pub struct JsonlWriter {
    config: JsonlConfig,
    writer: Option<BufWriter<File>>,
    state: WriterState,
    bytes_written: u64,
}

impl JsonlWriter {
    /// Open the log file, falling through the degradation chain on failure.
    pub fn open(config: JsonlConfig) -> Self {
        let mut w = Self {
            config,
            writer: None,
            state: WriterState::Discard,
            bytes_written: 0,
        };
        match open_append(&w.config.path) {
            Ok((file, size)) => {
                w.writer = Some(BufWriter::new(file));
                w.state = WriterState::Normal;
                w.bytes_written = size;
            }
            Err(err) => {
                let _ = writeln!(
                    io::stderr(),
                    "[LWA-JSONL] cannot open {}: {err}; logging to stderr",
                    w.config.path.display()
                );
                w.state = WriterState::Stderr;
            }
        }
        w
    }

    /// A writer that drops everything (logging disabled).
    pub fn disabled() -> Self {
        Self {
            config: JsonlConfig {
                path: PathBuf::new(),
                max_size_bytes: u64::MAX,
                max_rotated_files: 0,
            },
            writer: None,
            state: WriterState::Discard,
            bytes_written: 0,
        }
    }

    pub fn write_entry(&mut self, entry: &LogEntry) {
        let line = match serde_json::to_string(entry) {
            Ok(json) => format!("{json}\n"),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[LWA-JSONL] serialize error: {e}");
                return;
            }
        };
        self.write_line(&line);
    }

    pub fn flush(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
    }

    pub fn state(&self) -> &str {
        match self.state {
            WriterState::Normal => "normal",
            WriterState::Stderr => "stderr",
            WriterState::Discard => "discard",
        }
    }

    fn write_line(&mut self, line: &str) {
        if self.state == WriterState::Normal
            && self.bytes_written + line.len() as u64 > self.config.max_size_bytes
        {
            self.rotate();
        }

        match self.state {
            WriterState::Normal => {
                let Some(w) = self.writer.as_mut() else {
                    self.degrade();
                    self.write_line(line);
                    return;
                };
                if w.write_all(line.as_bytes()).is_err() {
                    self.degrade();
                    self.write_line(line);
                    return;
                }
                self.bytes_written += line.len() as u64;
            }
            WriterState::Stderr => {
                if write!(io::stderr(), "[LWA-JSONL] {line}").is_err() {
                    self.degrade();
                }
            }
            WriterState::Discard => {}
        }
    }

    fn degrade(&mut self) {
        self.writer = None;
        self.state = match self.state {
            WriterState::Normal => {
                let _ = writeln!(io::stderr(), "[LWA-JSONL] write failed, using stderr");
                WriterState::Stderr
            }
            WriterState::Stderr | WriterState::Discard => WriterState::Discard,
        };
    }

    fn rotate(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
        self.writer = None;
        let base = self.config.path.clone();

        if self.config.max_rotated_files == 0 {
            let _ = fs::remove_file(&base);
        } else {
            for i in (1..self.config.max_rotated_files).rev() {
                let _ = rename(rotated_name(&base, i), rotated_name(&base, i + 1));
            }
            let _ = rename(&base, rotated_name(&base, 1));
        }

        match open_append(&base) {
            Ok((file, _)) => {
                self.writer = Some(BufWriter::new(file));
                self.bytes_written = 0;
            }
            Err(_) => self.degrade(),
        }
    }
}

impl Drop for JsonlWriter {
    fn drop(&mut self) {
        self.flush();
    }
}

/// Open or create a file for appending. Returns `(File, current_size)`.
fn open_append(path: &Path) -> Result<(File, u64)> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| LwaError::io(parent, source))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LwaError::io(path, source))?;
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);
    Ok((file, size))
}

/// `foo.jsonl` -> `foo.jsonl.3`
fn rotated_name(base: &Path, index: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
