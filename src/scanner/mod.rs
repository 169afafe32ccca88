//! Scanner: ignore globs, tree walker, and the three concurrent text passes.

pub mod asset_refs;
pub mod coordinator;
pub mod duplicate_ids;
pub mod headers;
pub mod ignore;
pub mod walker;

use regex::Regex;

use crate::core::errors::{LwaError, Result};

/// Compile a pass regex, mapping failures to `InvalidPattern`.
pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|err| LwaError::InvalidPattern {
        pattern: pattern.to_string(),
        details: err.to_string(),
    })
}
