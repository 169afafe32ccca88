//! Configuration system: TOML file + env var overrides + audit defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{LwaError, Result};
use crate::core::paths::{self, AuditSide};

/// Full audit configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub frontend: FrontendConfig,
    pub backend: BackendConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
}

/// Frontend audit: headers, duplicate ids, image assets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FrontendConfig {
    /// Audit root. `None` resolves from the workspace env.
    pub root: Option<PathBuf>,
    /// Report output. `None` means `<root>/run/leeway_frontend_audit_report.json`.
    pub out: Option<PathBuf>,
    /// gitignore-like file; when absent the built-in ignore set is used instead.
    pub ignore_file: Option<PathBuf>,
    /// Extra ignore globs appended after the file/default set.
    pub ignore: Vec<String>,
    /// Seed list of assets that must exist under the public directory.
    pub required_assets: Vec<String>,
    /// Public directory, relative to the root.
    pub public_dir: String,
    /// Search the header marker within the first N lines (0 = whole file).
    pub max_header_lines: usize,
    /// Scan pool size hint (floored at 2 by the coordinator).
    pub workers: usize,
    /// Regex that counts as a header marker.
    pub header_pattern: String,
    pub scan_extensions: Vec<String>,
    pub id_extensions: Vec<String>,
    pub asset_extensions: Vec<String>,
    pub follow_symlinks: bool,
}

/// One checkpoint directory and the files expected inside it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckpointSet {
    pub name: String,
    /// Directory relative to the backend root, forward slashes.
    pub dir: String,
    pub files: Vec<String>,
}

/// Backend audit: directories, headers, requirements, checkpoints, ffmpeg.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BackendConfig {
    pub root: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub header_extensions: Vec<String>,
    pub required_dirs: Vec<String>,
    pub required_packages: Vec<String>,
    pub checkpoints: Vec<CheckpointSet>,
}

/// Combined HTML report locations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ReportConfig {
    pub html_out: Option<PathBuf>,
    pub fe_json: Option<PathBuf>,
}

/// JSONL activity log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub jsonl_path: PathBuf,
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
}

/// Filesystem paths used by lwa itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
}

/// Assets every frontend must ship.
pub const BASE_REQUIRED_ASSETS: &[&str] = &["image/macmillionmic.png", "image/macmillionmic2.png"];

/// Accepted header sentinels.
pub const DEFAULT_HEADER_PATTERN: &str = "LEEWAY HEADER|LEEWAY MICRO:";

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn home_dir() -> PathBuf {
    env::var_os("HOME").map_or_else(
        || {
            eprintln!("[LWA-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths");
            PathBuf::from("/tmp")
        },
        PathBuf::from,
    )
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            root: None,
            out: None,
            ignore_file: None,
            ignore: Vec::new(),
            required_assets: strings(BASE_REQUIRED_ASSETS),
            public_dir: "public".to_string(),
            max_header_lines: 120,
            workers: std::thread::available_parallelism().map_or(4, std::num::NonZero::get),
            header_pattern: DEFAULT_HEADER_PATTERN.to_string(),
            scan_extensions: strings(&[
                ".tsx", ".ts", ".jsx", ".js", ".mjs", ".html", ".css", ".md",
            ]),
            id_extensions: strings(&[".html", ".tsx", ".jsx"]),
            asset_extensions: strings(&[".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp"]),
            follow_symlinks: false,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        let set = |name: &str, dir: &str, files: &[&str]| CheckpointSet {
            name: name.to_string(),
            dir: dir.to_string(),
            files: strings(files),
        };
        Self {
            root: None,
            out: None,
            header_extensions: strings(&[
                ".py", ".ps1", ".psm1", ".mjs", ".js", ".ts", ".md", ".surql",
            ]),
            required_dirs: strings(&[
                "agentlee_mcp_hub/mcp",
                "checkpoints/converter",
                "checkpoints/base_speakers/EN",
                "checkpoints/base_speakers/ZH",
                "models",
                "routes",
                "scripts",
                "tools",
                "webrtc",
                "run",
            ]),
            required_packages: strings(&[
                "fastapi",
                "uvicorn",
                "structlog",
                "pydantic",
                "pydantic-settings",
                "websockets",
                "soundfile",
                "scipy",
                "numpy",
                "ffmpeg-python",
                "jieba",
            ]),
            checkpoints: vec![
                set(
                    "converter",
                    "checkpoints/converter",
                    &["checkpoint.pth", "config.json"],
                ),
                set(
                    "EN",
                    "checkpoints/base_speakers/EN",
                    &[
                        "checkpoint.pth",
                        "config.json",
                        "en_default_se.pth",
                        "en_style_se.pth",
                    ],
                ),
                set(
                    "ZH",
                    "checkpoints/base_speakers/ZH",
                    &["checkpoint.pth", "config.json", "zh_default_se.pth"],
                ),
            ],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            jsonl_path: home_dir()
                .join(".local")
                .join("share")
                .join("lwa")
                .join("activity.jsonl"),
            max_size_bytes: 10 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_file: home_dir().join(".config").join("lwa").join("config.toml"),
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// A missing file at the default path is not an error; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| LwaError::Io {
                path: path_buf.clone(),
                source,
            })?;
            toml::from_str::<Self>(&raw)?
        } else if path.is_some() {
            return Err(LwaError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(env_var)?;
        cfg.normalize_extensions();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Effective frontend root: config value, else `<workspace>/<LW_FRONTEND_ROOT|frontend>`.
    #[must_use]
    pub fn frontend_root(&self) -> PathBuf {
        self.frontend.root.as_deref().map_or_else(
            || paths::default_root(AuditSide::Frontend),
            paths::resolve_absolute_path,
        )
    }

    /// Effective backend root: config value, else `<workspace>/<LW_BACKEND_ROOT|backend>`.
    #[must_use]
    pub fn backend_root(&self) -> PathBuf {
        self.backend.root.as_deref().map_or_else(
            || paths::default_root(AuditSide::Backend),
            paths::resolve_absolute_path,
        )
    }

    /// Deterministic hash of the effective config for the activity log (FNV-1a).
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("LWA_FRONTEND_MAX_HEADER_LINES") {
            self.frontend.max_header_lines = parse_env("LWA_FRONTEND_MAX_HEADER_LINES", &raw)?;
        }
        if let Some(raw) = lookup("LWA_FRONTEND_WORKERS") {
            self.frontend.workers = parse_env("LWA_FRONTEND_WORKERS", &raw)?;
        }
        if let Some(raw) = lookup("LWA_FRONTEND_PUBLIC_DIR") {
            self.frontend.public_dir = raw;
        }
        if let Some(raw) = lookup("LWA_FRONTEND_FOLLOW_SYMLINKS") {
            self.frontend.follow_symlinks = parse_env("LWA_FRONTEND_FOLLOW_SYMLINKS", &raw)?;
        }
        if let Some(raw) = lookup("LWA_LOGGING_ENABLED") {
            self.logging.enabled = parse_env("LWA_LOGGING_ENABLED", &raw)?;
        }
        if let Some(raw) = lookup("LWA_LOGGING_JSONL_PATH") {
            self.logging.jsonl_path = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("LWA_LOGGING_MAX_SIZE_BYTES") {
            self.logging.max_size_bytes = parse_env("LWA_LOGGING_MAX_SIZE_BYTES", &raw)?;
        }
        Ok(())
    }

    /// Lower-case every extension list so matching stays case-insensitive.
    fn normalize_extensions(&mut self) {
        for list in [
            &mut self.frontend.scan_extensions,
            &mut self.frontend.id_extensions,
            &mut self.frontend.asset_extensions,
            &mut self.backend.header_extensions,
        ] {
            for ext in list.iter_mut() {
                *ext = ext.trim().to_ascii_lowercase();
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.frontend.workers == 0 {
            return Err(LwaError::InvalidConfig {
                details: "frontend.workers must be >= 1".to_string(),
            });
        }

        regex::Regex::new(&self.frontend.header_pattern).map_err(|err| {
            LwaError::InvalidPattern {
                pattern: self.frontend.header_pattern.clone(),
                details: err.to_string(),
            }
        })?;

        for (name, list) in [
            ("frontend.scan_extensions", &self.frontend.scan_extensions),
            ("frontend.id_extensions", &self.frontend.id_extensions),
            ("frontend.asset_extensions", &self.frontend.asset_extensions),
            ("backend.header_extensions", &self.backend.header_extensions),
        ] {
            if let Some(bad) = list.iter().find(|ext| !ext.starts_with('.') || ext.len() < 2) {
                return Err(LwaError::InvalidConfig {
                    details: format!("{name} entries must look like \".ext\", got {bad:?}"),
                });
            }
        }

        let public = Path::new(&self.frontend.public_dir);
        if self.frontend.public_dir.trim().is_empty() || public.is_absolute() {
            return Err(LwaError::InvalidConfig {
                details: format!(
                    "frontend.public_dir must be a non-empty relative path, got {:?}",
                    self.frontend.public_dir
                ),
            });
        }

        if self.logging.max_size_bytes == 0 {
            return Err(LwaError::InvalidConfig {
                details: "logging.max_size_bytes must be > 0".to_string(),
            });
        }

        for pattern in &self.frontend.ignore {
            crate::scanner::ignore::validate_glob_pattern(pattern)?;
        }

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|error| LwaError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}
