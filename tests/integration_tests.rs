//! Integration tests: CLI smoke tests and full-pipeline audit scenarios
//! driven through the built `lwa` binary.

mod common;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;

const HEADER: &str = "/* LEEWAY HEADER\n   TAG: TEST */\n";

const DUP_PAGE: &str = "<html>\n<body>\n<div id=\"dup\"></div>\n<p>one</p>\n<p>two</p>\n<p>three</p>\n<span id=\"dup\"></span>\n</body>\n</html>\n";

/// Frontend tree: one compliant component, one page with duplicate ids and no
/// header, and both base required images present.
fn frontend_fixture() -> (TempDir, PathBuf) {
    let sandbox = TempDir::new().expect("create sandbox");
    let root = sandbox.path().join("frontend");
    common::write_file(
        &root,
        "src/App.tsx",
        &format!("{HEADER}export const App = () => <img src=\"/image/logo.png\" />;\n"),
    );
    common::write_file(&root, "src/page.html", DUP_PAGE);
    common::write_file(&root, "public/image/macmillionmic.png", "png");
    common::write_file(&root, "public/image/macmillionmic2.png", "png");
    common::write_file(&root, "public/image/logo.png", "png");
    common::write_file(&root, "node_modules/pkg/index.js", "no header here");
    (sandbox, root)
}

fn report_path(root: &Path) -> PathBuf {
    root.join("run").join("leeway_frontend_audit_report.json")
}

fn read_json(path: &Path) -> Value {
    let raw = fs::read_to_string(path).expect("read report");
    serde_json::from_str(&raw).expect("parse report")
}

#[test]
fn help_command_prints_usage() {
    let sandbox = TempDir::new().expect("create sandbox");
    let result = common::run_cli_case_in("help_command_prints_usage", sandbox.path(), &["--help"]);
    assert!(
        result.status.success(),
        "expected success; log: {}",
        result.log_path.display()
    );
    assert!(
        result.stdout.contains("Usage: lwa [OPTIONS] <COMMAND>"),
        "missing help banner; log: {}",
        result.log_path.display()
    );
}

#[test]
fn version_command_prints_version() {
    let sandbox = TempDir::new().expect("create sandbox");
    let result =
        common::run_cli_case_in("version_command_prints_version", sandbox.path(), &["--version"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(
        result.stdout.contains(env!("CARGO_PKG_VERSION")),
        "log: {}",
        result.log_path.display()
    );
}

#[test]
fn frontend_json_reports_duplicate_ids_with_lines() {
    let (sandbox, root) = frontend_fixture();
    let root_arg = root.to_string_lossy().into_owned();
    let result = common::run_cli_case_in(
        "frontend_json_reports_duplicate_ids_with_lines",
        sandbox.path(),
        &["frontend", "--root", &root_arg, "--format", "json"],
    );
    assert_eq!(result.code(), Some(0), "log: {}", result.log_path.display());

    let stdout: Value = serde_json::from_str(&result.stdout).expect("stdout is the JSON report");
    let persisted = read_json(&report_path(&root));
    assert_eq!(stdout, persisted);

    let headers = persisted["headers_missing"].as_array().expect("headers list");
    assert_eq!(headers.len(), 1, "log: {}", result.log_path.display());
    let page = headers[0].as_str().expect("path string");
    assert!(page.ends_with("src/page.html"));

    assert_eq!(persisted["duplicate_ids"][page]["dup"], 2);
    assert_eq!(
        persisted["duplicate_ids_lines"][page]["dup"],
        serde_json::json!([3, 7])
    );
    assert_eq!(persisted["required_assets"]["image/macmillionmic.png"], true);
    assert_eq!(persisted["discovered_assets"]["image/logo.png"], true);
    assert_eq!(persisted["config"]["format"], "json");
    assert!(result.stderr.contains("LEEWAY AUDIT PASS"));
}

#[test]
fn frontend_table_prints_summary_and_pass_banner() {
    let (sandbox, root) = frontend_fixture();
    let root_arg = root.to_string_lossy().into_owned();
    let result = common::run_cli_case_in(
        "frontend_table_prints_summary_and_pass_banner",
        sandbox.path(),
        &["--no-color", "frontend", "--root", &root_arg],
    );
    assert_eq!(result.code(), Some(0), "log: {}", result.log_path.display());
    assert!(result.stdout.contains("headers missing: 1 file(s)"));
    assert!(result.stdout.contains("files with duplicate IDs: 1"));
    assert!(result.stdout.contains("LEEWAY AUDIT PASS"));
}

#[test]
fn strict_headers_fails_with_itemized_message() {
    let (sandbox, root) = frontend_fixture();
    let root_arg = root.to_string_lossy().into_owned();
    let result = common::run_cli_case_in(
        "strict_headers_fails_with_itemized_message",
        sandbox.path(),
        &["--no-color", "-q", "frontend", "--root", &root_arg, "--strict=headers"],
    );
    assert_eq!(result.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stdout.contains("LEEWAY AUDIT FAIL"));
    assert!(
        result
            .stdout
            .contains(" - [frontend] missing headers: 1 file(s)")
    );
    assert!(!result.stdout.contains("duplicate ids"));
    assert!(!result.stdout.contains("headers missing:"), "quiet hides the table");
    assert!(report_path(&root).is_file(), "report persists even on gate failure");
}

#[test]
fn strict_assets_passes_when_every_asset_exists() {
    let (sandbox, root) = frontend_fixture();
    let root_arg = root.to_string_lossy().into_owned();
    let result = common::run_cli_case_in(
        "strict_assets_passes_when_every_asset_exists",
        sandbox.path(),
        &["--no-color", "frontend", "--root", &root_arg, "--strict=assets"],
    );
    assert_eq!(result.code(), Some(0), "log: {}", result.log_path.display());
}

#[test]
fn bare_strict_fails_on_any_finding() {
    let (sandbox, root) = frontend_fixture();
    let root_arg = root.to_string_lossy().into_owned();
    let result = common::run_cli_case_in(
        "bare_strict_fails_on_any_finding",
        sandbox.path(),
        &[
            "--no-color",
            "frontend",
            "--root",
            &root_arg,
            "--require-image",
            "image/absent.png",
            "--strict",
        ],
    );
    assert_eq!(result.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stdout.contains("[frontend] missing headers: 1 file(s)"));
    assert!(result.stdout.contains("[frontend] duplicate ids: 1 file(s)"));
    assert!(
        result
            .stdout
            .contains("[frontend] missing required assets: image/absent.png")
    );
}

#[test]
fn repeated_runs_write_identical_reports() {
    let (sandbox, root) = frontend_fixture();
    let root_arg = root.to_string_lossy().into_owned();
    let args = ["-q", "frontend", "--root", root_arg.as_str()];

    let first = common::run_cli_case_in("repeated_runs_first", sandbox.path(), &args);
    assert_eq!(first.code(), Some(0), "log: {}", first.log_path.display());
    let first_bytes = fs::read(report_path(&root)).expect("first report");

    let second = common::run_cli_case_in("repeated_runs_second", sandbox.path(), &args);
    assert_eq!(second.code(), Some(0), "log: {}", second.log_path.display());
    let second_bytes = fs::read(report_path(&root)).expect("second report");

    assert_eq!(first_bytes, second_bytes);
}

#[test]
fn missing_root_is_a_user_error() {
    let sandbox = TempDir::new().expect("create sandbox");
    let missing = sandbox.path().join("no-such-frontend");
    let missing_arg = missing.to_string_lossy().into_owned();
    let result = common::run_cli_case_in(
        "missing_root_is_a_user_error",
        sandbox.path(),
        &["frontend", "--root", &missing_arg],
    );
    assert_eq!(result.code(), Some(2), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("LWA-2001"));
}

#[test]
fn missing_public_dir_is_a_user_error() {
    let sandbox = TempDir::new().expect("create sandbox");
    let root = sandbox.path().join("frontend");
    common::write_file(&root, "src/App.tsx", HEADER);
    let root_arg = root.to_string_lossy().into_owned();
    let result = common::run_cli_case_in(
        "missing_public_dir_is_a_user_error",
        sandbox.path(),
        &["frontend", "--root", &root_arg],
    );
    assert_eq!(result.code(), Some(2), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("public"));
}

#[test]
fn frontend_root_defaults_from_workspace_env() {
    let (sandbox, root) = frontend_fixture();
    let workspace = sandbox.path().to_string_lossy().into_owned();
    let result = common::run_cli_case_with_env(
        "frontend_root_defaults_from_workspace_env",
        sandbox.path(),
        &["-q", "frontend"],
        &[("GITHUB_WORKSPACE", workspace.as_str())],
    );
    assert_eq!(result.code(), Some(0), "log: {}", result.log_path.display());
    assert!(report_path(&root).is_file());
}

#[test]
fn activity_log_records_run_lifecycle() {
    let (sandbox, root) = frontend_fixture();
    let root_arg = root.to_string_lossy().into_owned();
    let result = common::run_cli_case_in(
        "activity_log_records_run_lifecycle",
        sandbox.path(),
        &["-q", "frontend", "--root", &root_arg],
    );
    assert_eq!(result.code(), Some(0), "log: {}", result.log_path.display());

    let log = fs::read_to_string(sandbox.path().join("activity.jsonl")).expect("activity log");
    let events: Vec<String> = log
        .lines()
        .map(|line| {
            let entry: Value = serde_json::from_str(line).expect("jsonl line");
            entry["event"].as_str().unwrap_or_default().to_string()
        })
        .collect();
    assert_eq!(
        events,
        ["audit_start", "scan_complete", "report_written", "gate_pass"]
    );
    let written: Value = serde_json::from_str(log.lines().nth(2).expect("written line"))
        .expect("parse written line");
    assert_eq!(written["sha256"].as_str().map(str::len), Some(64));
}

#[test]
fn verbose_prints_scan_diagnostics() {
    let (sandbox, root) = frontend_fixture();
    let root_arg = root.to_string_lossy().into_owned();
    let result = common::run_cli_case_in(
        "verbose_prints_scan_diagnostics",
        sandbox.path(),
        &["-v", "frontend", "--root", &root_arg],
    );
    assert_eq!(result.code(), Some(0), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("[LWA-SCAN] root="));
}

#[test]
fn backend_strict_dirs_and_combined_html() {
    let (sandbox, fe_root) = frontend_fixture();
    let fe_arg = fe_root.to_string_lossy().into_owned();
    let fe_run = common::run_cli_case_in(
        "backend_combined_frontend_first",
        sandbox.path(),
        &["-q", "frontend", "--root", &fe_arg],
    );
    assert_eq!(fe_run.code(), Some(0), "log: {}", fe_run.log_path.display());

    let be_root = sandbox.path().join("backend");
    common::write_file(&be_root, "models/phi3-mini.gguf", "weights");
    common::write_file(&be_root, "requirements.txt", "fastapi==0.110\nnumpy\n");
    let be_arg = be_root.to_string_lossy().into_owned();
    let fe_json = report_path(&fe_root).to_string_lossy().into_owned();
    let html = sandbox.path().join("out").join("combined.html");
    let html_arg = html.to_string_lossy().into_owned();

    let result = common::run_cli_case_in(
        "backend_strict_dirs_and_combined_html",
        sandbox.path(),
        &[
            "--no-color",
            "backend",
            "--root",
            &be_arg,
            "--strict=dirs",
            "--report-html",
            "--fe-json",
            &fe_json,
            "--html-out",
            &html_arg,
        ],
    );
    assert_eq!(result.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stdout.contains("[backend] missing dirs: "));
    assert!(!result.stdout.contains("missing py pkgs"));

    let report = read_json(&be_root.join("run").join("leeway_audit_report.json"));
    assert_eq!(report["models"]["flags"]["phi3"], true);
    assert_eq!(report["config"]["strict"], "dirs");
    assert!(report["requirements"]["present"]
        .as_array()
        .expect("present list")
        .iter()
        .any(|p| p == "numpy"));

    let rendered = fs::read_to_string(&html).expect("html written");
    assert!(rendered.contains("<h2>Frontend</h2>"));
    assert!(rendered.contains("<h2>Backend</h2>"));
    assert!(rendered.contains("src/page.html"));
}

#[test]
fn report_command_renders_with_missing_inputs() {
    let sandbox = TempDir::new().expect("create sandbox");
    let html = sandbox.path().join("combined.html");
    let html_arg = html.to_string_lossy().into_owned();
    let result = common::run_cli_case_in(
        "report_command_renders_with_missing_inputs",
        sandbox.path(),
        &[
            "report",
            "--fe-json",
            "absent-fe.json",
            "--be-json",
            "absent-be.json",
            "--html-out",
            &html_arg,
        ],
    );
    assert_eq!(result.code(), Some(0), "log: {}", result.log_path.display());
    assert!(result.stdout.contains("Wrote "));
    assert!(
        fs::read_to_string(&html)
            .expect("html written")
            .contains("LEEWAY Audit Report")
    );
}

#[test]
fn config_validate_accepts_and_rejects() {
    let sandbox = TempDir::new().expect("create sandbox");
    let good = sandbox.path().join("good.toml");
    fs::write(&good, "[frontend]\nmax_header_lines = 40\n").expect("write config");
    let good_arg = good.to_string_lossy().into_owned();
    let ok = common::run_cli_case_in(
        "config_validate_accepts",
        sandbox.path(),
        &["--config", &good_arg, "config", "validate"],
    );
    assert_eq!(ok.code(), Some(0), "log: {}", ok.log_path.display());
    assert!(ok.stdout.contains("Configuration is valid."));

    let bad = sandbox.path().join("bad.toml");
    fs::write(&bad, "[frontend]\nworkers = 0\n").expect("write config");
    let bad_arg = bad.to_string_lossy().into_owned();
    let rejected = common::run_cli_case_in(
        "config_validate_rejects",
        sandbox.path(),
        &["--config", &bad_arg, "config", "validate"],
    );
    assert_eq!(rejected.code(), Some(2), "log: {}", rejected.log_path.display());
    assert!(rejected.stderr.contains("Configuration is INVALID"));
}

#[test]
fn explicit_missing_config_is_a_user_error() {
    let sandbox = TempDir::new().expect("create sandbox");
    let result = common::run_cli_case_in(
        "explicit_missing_config_is_a_user_error",
        sandbox.path(),
        &["--config", "nowhere.toml", "frontend"],
    );
    assert_eq!(result.code(), Some(2), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("LWA-1002"));
}
