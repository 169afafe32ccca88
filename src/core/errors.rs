//! LWA-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, LwaError>;

/// Top-level error type for the audit engine.
#[derive(Debug, Error)]
pub enum LwaError {
    #[error("[LWA-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[LWA-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[LWA-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[LWA-1004] invalid pattern {pattern:?}: {details}")]
    InvalidPattern { pattern: String, details: String },

    #[error("[LWA-2001] {role} directory missing or not a directory: {path}")]
    MissingRoot { role: &'static str, path: PathBuf },

    #[error("[LWA-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[LWA-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[LWA-3003] channel closed in component {component}")]
    ChannelClosed { component: &'static str },

    #[error("[LWA-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl LwaError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "LWA-1001",
            Self::MissingConfig { .. } => "LWA-1002",
            Self::ConfigParse { .. } => "LWA-1003",
            Self::InvalidPattern { .. } => "LWA-1004",
            Self::MissingRoot { .. } => "LWA-2001",
            Self::Serialization { .. } => "LWA-2101",
            Self::Io { .. } => "LWA-3002",
            Self::ChannelClosed { .. } => "LWA-3003",
            Self::Runtime { .. } => "LWA-3900",
        }
    }

    /// Whether the failure comes from user-supplied input (config, patterns, paths)
    /// rather than the environment.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. }
                | Self::MissingConfig { .. }
                | Self::ConfigParse { .. }
                | Self::InvalidPattern { .. }
                | Self::MissingRoot { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for LwaError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for LwaError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
