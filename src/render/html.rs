//! Combined frontend + backend HTML report.
//!
//! Both inputs are read as loose JSON: a missing or unparsable file renders as
//! an empty section rather than failing.

#![allow(missing_docs)]

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::core::errors::{LwaError, Result};

const STYLE: &str = "\
body{font-family:system-ui,Segoe UI,Roboto,Arial,sans-serif;padding:24px;line-height:1.5}
h1{margin:0 0 8px} h2{margin-top:24px;border-bottom:1px solid #eee;padding-bottom:4px}
h3{margin-top:16px} .grid{display:grid;grid-template-columns:repeat(2,minmax(0,1fr));gap:16px}
.ok{color:#16a34a} .bad{color:#dc2626}
.mono{font-family:ui-monospace,SFMono-Regular,Menlo,Consolas,monospace}";

/// Read a persisted report, treating absence or bad JSON as empty.
pub fn load_report(path: &Path) -> Value {
    fs::read(path)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or(Value::Null)
}

/// Escape text for HTML element content and attribute values.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Keys of a `{name: bool}` object whose value is `false`.
fn false_keys(value: &Value) -> Vec<String> {
    value
        .as_object()
        .map(|map| {
            map.iter()
                .filter(|(_, ok)| ok.as_bool() == Some(false))
                .map(|(k, _)| k.clone())
                .collect()
        })
        .unwrap_or_default()
}

fn object_keys(value: &Value) -> Vec<String> {
    value
        .as_object()
        .map(|map| map.keys().cloned().collect())
        .unwrap_or_default()
}

fn list_html(items: &[String]) -> String {
    if items.is_empty() {
        return "<p class=\"ok\">None</p>".to_string();
    }
    let mut out = String::from("<ul>");
    for item in items {
        let _ = write!(out, "<li class=\"mono\">{}</li>", escape_html(item));
    }
    out.push_str("</ul>");
    out
}

fn cell(title: &str, items: &[String]) -> String {
    format!("  <div><h3>{title}</h3>{}</div>\n", list_html(items))
}

/// Render the combined document from two loosely-typed reports.
pub fn render_combined(frontend: &Value, backend: &Value, generated: DateTime<Utc>) -> String {
    let fe_headers = string_list(&frontend["headers_missing"]);
    let fe_dup_files = object_keys(&frontend["duplicate_ids"]);
    let fe_req = false_keys(&frontend["required_assets"]);
    let fe_disc = false_keys(&frontend["discovered_assets"]);

    let be_headers = string_list(&backend["headers_missing"]);
    let be_dirs = false_keys(&backend["dirs"]);
    let be_pkgs = string_list(&backend["requirements"]["missing"]);
    let be_checkpoints: Vec<String> = backend["checkpoints"]
        .as_object()
        .map(|sets| {
            sets.iter()
                .filter_map(|(name, files)| {
                    let need = false_keys(files);
                    (!need.is_empty()).then(|| format!("{name}: {}", need.join(", ")))
                })
                .collect()
        })
        .unwrap_or_default();
    let ffmpeg_missing = backend["ffmpeg_available"].as_bool() == Some(false);

    let mut html = String::new();
    html.push_str("<!doctype html><html><head><meta charset=\"utf-8\"/>\n");
    html.push_str("<title>LEEWAY Audit Report</title>\n");
    let _ = writeln!(html, "<style>\n{STYLE}\n</style></head><body>");
    let _ = writeln!(
        html,
        "<h1>LEEWAY Audit Report</h1><div class=\"mono\">Generated: {}</div>",
        generated.to_rfc3339_opts(SecondsFormat::Secs, true)
    );

    html.push_str("\n<h2>Frontend</h2>\n<div class=\"grid\">\n");
    html.push_str(&cell("Missing Headers", &fe_headers));
    html.push_str(&cell("Files with Duplicate IDs", &fe_dup_files));
    html.push_str("</div>\n<div class=\"grid\">\n");
    html.push_str(&cell("Missing Required Assets", &fe_req));
    html.push_str(&cell("Missing Discovered Assets", &fe_disc));
    html.push_str("</div>\n");

    html.push_str("\n<h2>Backend</h2>\n<div class=\"grid\">\n");
    html.push_str(&cell("Missing Headers", &be_headers));
    html.push_str(&cell("Missing Dirs", &be_dirs));
    html.push_str("</div>\n<div class=\"grid\">\n");
    html.push_str(&cell("Missing Python Packages", &be_pkgs));
    let ffmpeg = if ffmpeg_missing {
        "<p class=\"bad\">FFmpeg: not available</p>"
    } else {
        "<p class=\"ok\">FFmpeg: available</p>"
    };
    let _ = writeln!(
        html,
        "  <div><h3>Checkpoints Missing</h3>{}{ffmpeg}</div>",
        list_html(&be_checkpoints)
    );
    html.push_str("</div>\n</body></html>\n");
    html
}

/// Read both reports, render, and write the document (creating parents).
pub fn write_combined(fe_json: &Path, be_json: &Path, out: &Path) -> Result<()> {
    let html = render_combined(&load_report(fe_json), &load_report(be_json), Utc::now());
    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| LwaError::io(parent, source))?;
    }
    fs::write(out, html).map_err(|source| LwaError::io(out, source))
}
