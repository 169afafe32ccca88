//! Strict gate: turns a report and a requested category into pass/fail.
//!
//! Each report type lists its findings tagged with a category. The gate keeps
//! the findings the request selects; any survivor fails the run.

#![allow(missing_docs)]

use std::fmt;
use std::str::FromStr;

use crate::audit::report::AuditReport;
use crate::core::errors::LwaError;

/// A category selector with `none` and `all` members.
pub trait GateCategory: Copy + Eq + fmt::Debug {
    const NONE: Self;
    const ALL: Self;

    /// Whether a request for `self` covers a finding tagged `finding`.
    fn selects(self, finding: Self) -> bool {
        self == Self::ALL || (self != Self::NONE && self == finding)
    }
}

/// Frontend strict categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum FrontendCategory {
    None,
    Headers,
    Ids,
    Assets,
    All,
}

impl FrontendCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Headers => "headers",
            Self::Ids => "ids",
            Self::Assets => "assets",
            Self::All => "all",
        }
    }
}

impl GateCategory for FrontendCategory {
    const NONE: Self = Self::None;
    const ALL: Self = Self::All;
}

/// Backend strict categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum BackendCategory {
    None,
    Headers,
    Dirs,
    Requirements,
    Checkpoints,
    Ffmpeg,
    All,
}

impl BackendCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Headers => "headers",
            Self::Dirs => "dirs",
            Self::Requirements => "requirements",
            Self::Checkpoints => "checkpoints",
            Self::Ffmpeg => "ffmpeg",
            Self::All => "all",
        }
    }
}

impl GateCategory for BackendCategory {
    const NONE: Self = Self::None;
    const ALL: Self = Self::All;
}

macro_rules! category_text {
    ($ty:ty, [$($variant:ident),+ $(,)?]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = LwaError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase();
                [$(Self::$variant),+]
                    .into_iter()
                    .find(|c| c.as_str() == wanted)
                    .ok_or_else(|| LwaError::InvalidConfig {
                        details: format!("unknown strict category {s:?}"),
                    })
            }
        }
    };
}

category_text!(FrontendCategory, [None, Headers, Ids, Assets, All]);
category_text!(
    BackendCategory,
    [None, Headers, Dirs, Requirements, Checkpoints, Ffmpeg, All]
);

/// One failing condition, ready for console/CI output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding<C> {
    pub category: C,
    pub message: String,
}

impl<C> Finding<C> {
    pub fn new(category: C, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

/// A report the gate can judge.
pub trait Gated {
    type Category: GateCategory;

    /// Every failing condition, in reporting order.
    fn findings(&self) -> Vec<Finding<Self::Category>>;
}

/// Pass/fail plus the itemized reasons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrictDecision {
    pub passed: bool,
    pub failures: Vec<String>,
}

impl StrictDecision {
    pub fn pass() -> Self {
        Self {
            passed: true,
            failures: Vec::new(),
        }
    }
}

/// Keep the findings `category` selects. `none` always passes.
pub fn decide<R: Gated>(report: &R, category: R::Category) -> StrictDecision {
    decide_findings(report.findings(), category)
}

pub fn decide_findings<C: GateCategory>(findings: Vec<Finding<C>>, category: C) -> StrictDecision {
    if category == C::NONE {
        return StrictDecision::pass();
    }
    let failures: Vec<String> = findings
        .into_iter()
        .filter(|f| category.selects(f.category))
        .map(|f| f.message)
        .collect();
    StrictDecision {
        passed: failures.is_empty(),
        failures,
    }
}

impl Gated for AuditReport {
    type Category = FrontendCategory;

    fn findings(&self) -> Vec<Finding<FrontendCategory>> {
        let mut out = Vec::new();
        if !self.headers_missing().is_empty() {
            out.push(Finding::new(
                FrontendCategory::Headers,
                format!(
                    "[frontend] missing headers: {} file(s)",
                    self.headers_missing().len()
                ),
            ));
        }
        if !self.duplicate_ids().is_empty() {
            out.push(Finding::new(
                FrontendCategory::Ids,
                format!(
                    "[frontend] duplicate ids: {} file(s)",
                    self.duplicate_ids().len()
                ),
            ));
        }
        let missing_required = self.required_assets().missing();
        if !missing_required.is_empty() {
            out.push(Finding::new(
                FrontendCategory::Assets,
                format!(
                    "[frontend] missing required assets: {}",
                    missing_required.join(", ")
                ),
            ));
        }
        let missing_discovered = self.discovered_assets().missing();
        if !missing_discovered.is_empty() {
            out.push(Finding::new(
                FrontendCategory::Assets,
                format!(
                    "[frontend] missing discovered assets: {}",
                    missing_discovered.join(", ")
                ),
            ));
        }
        out
    }
}
