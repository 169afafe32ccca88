//! Human-readable summaries printed by `lwa`.

use std::fmt::Write as _;

use colored::Colorize;

use crate::audit::gate::StrictDecision;
use crate::audit::report::AuditReport;

/// How many missing discovered assets the table lists before truncating.
pub const DISCOVERED_PREVIEW: usize = 10;

/// Frontend summary table.
pub fn frontend_table(report: &AuditReport, ignore_patterns: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", "=== LEEWAY FRONTEND AUDIT ===".bold());
    let _ = writeln!(out, "root: {}", report.root());
    let _ = writeln!(out, "ignored patterns: {ignore_patterns}");
    let _ = writeln!(
        out,
        "headers missing: {} file(s)",
        count_cell(report.headers_missing().len())
    );
    let _ = writeln!(
        out,
        "files with duplicate IDs: {}",
        count_cell(report.duplicate_ids().len())
    );

    let missing_required = report.required_assets().missing();
    if !missing_required.is_empty() {
        let _ = writeln!(
            out,
            "missing required assets: {}",
            missing_required.join(", ").red()
        );
    }
    let missing_discovered = report.discovered_assets().missing();
    if !missing_discovered.is_empty() {
        let _ = writeln!(
            out,
            "missing discovered assets: {}",
            truncated_list(&missing_discovered, DISCOVERED_PREVIEW).red()
        );
    }
    out
}

/// First `limit` items joined with `, `, plus `... (+N more)` when truncated.
pub fn truncated_list(items: &[&str], limit: usize) -> String {
    let shown = items.iter().take(limit).copied().collect::<Vec<_>>().join(", ");
    if items.len() > limit {
        format!("{shown} ... (+{} more)", items.len() - limit)
    } else {
        shown
    }
}

/// Pass/fail banner, followed by one line per failure.
pub fn decision_banner(decision: &StrictDecision) -> String {
    if decision.passed {
        return format!("\n{}", "LEEWAY AUDIT PASS".green().bold());
    }
    let mut out = format!("\n{}", "LEEWAY AUDIT FAIL".red().bold());
    for failure in &decision.failures {
        let _ = write!(out, "\n - {failure}");
    }
    out
}

fn count_cell(count: usize) -> String {
    if count == 0 {
        count.to_string().green().to_string()
    } else {
        count.to_string().yellow().to_string()
    }
}
