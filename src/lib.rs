#![forbid(unsafe_code)]

//! LEEWAY audit (lwa): source-tree compliance checks for CI.
//!
//! Two audits share one engine:
//! 1. **Frontend**: header markers, duplicate element ids, referenced image assets
//! 2. **Backend**: required dirs, headers, model inventory, checkpoints, packages, ffmpeg
//!
//! Both persist a JSON report; a strict gate turns findings into a CI exit status,
//! and the two reports can be rendered side by side as HTML.
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use leeway_audit::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use leeway_audit::core::config::Config;
//! use leeway_audit::scanner::walker::{TreeWalker, WalkerConfig};
//! ```

pub mod prelude;

pub mod audit;
#[cfg(feature = "cli")]
pub mod cli;
pub mod core;
pub mod logger;
pub mod render;
pub mod scanner;
