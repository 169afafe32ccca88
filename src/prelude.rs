//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use leeway_audit::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{LwaError, Result};
pub use crate::core::paths::AuditSide;

// Scanner
pub use crate::scanner::coordinator::{ScanCoordinator, ScanInputs, ScanResults};
pub use crate::scanner::ignore::IgnoreSet;
pub use crate::scanner::walker::{FileHandle, TreeWalker, WalkerConfig};

// Audit
pub use crate::audit::assets::{AssetResolver, StatusMap};
pub use crate::audit::backend::{BackendReport, BackendRun, run_backend};
pub use crate::audit::frontend::{FrontendOutcome, FrontendRun, run_frontend};
pub use crate::audit::gate::{BackendCategory, FrontendCategory, StrictDecision, decide};
pub use crate::audit::report::{AuditReport, OutputFormat};

// Logger
pub use crate::logger::jsonl::{JsonlWriter, LogEntry};
