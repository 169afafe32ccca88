//! Top-level CLI definition and dispatch.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::control;
use thiserror::Error;

use leeway_audit::audit::backend::{BackendGate, BackendReport, BackendRun, run_backend};
use leeway_audit::audit::frontend::{FrontendOutcome, FrontendRun, run_frontend};
use leeway_audit::audit::gate::{BackendCategory, FrontendCategory, StrictDecision, decide};
use leeway_audit::audit::report::{OutputFormat, PersistedReport, persist};
use leeway_audit::cli::console;
use leeway_audit::core::config::Config;
use leeway_audit::core::errors::LwaError;
use leeway_audit::core::paths::{
    AuditSide, HTML_REPORT_FILE, default_report_path, resolve_absolute_path,
};
use leeway_audit::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};
use leeway_audit::render::html::write_combined;

/// LEEWAY audit: header, id, asset, and backend layout compliance checks.
#[derive(Debug, Parser)]
#[command(
    name = "lwa",
    author,
    version,
    about = "LEEWAY Audit - source tree compliance checks",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Print scan diagnostics to stderr.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Suppress the summary table (the verdict is still printed).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Audit a frontend tree: headers, duplicate ids, image assets.
    Frontend(FrontendArgs),
    /// Audit a backend tree: dirs, headers, models, checkpoints, packages, ffmpeg.
    Backend(BackendArgs),
    /// Render the combined HTML report from two persisted JSON reports.
    Report(ReportArgs),
    /// View and validate configuration.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args)]
struct FrontendArgs {
    /// Frontend root (default: <workspace>/<LW_FRONTEND_ROOT|frontend>).
    #[arg(long, value_name = "PATH")]
    root: Option<PathBuf>,
    /// JSON report path (default: <root>/run/leeway_frontend_audit_report.json).
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
    /// Ignore file; replaces the built-in ignore list.
    #[arg(long, value_name = "PATH")]
    ignore_file: Option<PathBuf>,
    /// Extra ignore glob (repeatable).
    #[arg(long = "ignore", value_name = "GLOB")]
    ignore: Vec<String>,
    /// Exit non-zero when the selected category fails (bare flag means `all`).
    #[arg(long, value_enum, num_args = 0..=1, default_missing_value = "all", value_name = "CATEGORY")]
    strict: Option<FrontendCategory>,
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
    /// Additional required asset, relative to the public dir (repeatable).
    #[arg(long = "require-image", value_name = "PATH")]
    require_image: Vec<String>,
    /// Lines searched for the header marker (0 = whole file).
    #[arg(long, value_name = "N")]
    max_header_lines: Option<usize>,
    /// Worker threads for traversal and scanning.
    #[arg(long, value_name = "N")]
    workers: Option<usize>,
}

#[derive(Debug, Clone, Args)]
struct BackendArgs {
    /// Backend root (default: <workspace>/<LW_BACKEND_ROOT|backend>).
    #[arg(long, value_name = "PATH")]
    root: Option<PathBuf>,
    /// JSON report path (default: <root>/run/leeway_audit_report.json).
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
    /// Exit non-zero when the selected category fails (bare flag means `all`).
    #[arg(long, value_enum, num_args = 0..=1, default_missing_value = "all", value_name = "CATEGORY")]
    strict: Option<BackendCategory>,
    /// Do not fail on a missing ffmpeg.
    #[arg(long)]
    no_ffmpeg: bool,
    /// Also emit the combined HTML report.
    #[arg(long)]
    report_html: bool,
    /// Frontend JSON report read for the HTML output.
    #[arg(long, value_name = "PATH")]
    fe_json: Option<PathBuf>,
    /// HTML output path (default: <root>/run/leeway_audit_report.html).
    #[arg(long, value_name = "PATH")]
    html_out: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct ReportArgs {
    /// Frontend JSON report.
    #[arg(long, value_name = "PATH")]
    fe_json: Option<PathBuf>,
    /// Backend JSON report.
    #[arg(long, value_name = "PATH")]
    be_json: Option<PathBuf>,
    /// HTML output path.
    #[arg(long, value_name = "PATH")]
    html_out: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print the config file path.
    Path,
    /// Print the effective configuration as TOML.
    Show,
    /// Load and validate the configuration.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum)]
    shell: CompletionShell,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Strict gate rejected the audit.
    #[error("{0}")]
    Gate(String),
    /// Invalid user input (flags, config, missing roots).
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Gate(_) => 1,
            Self::User(_) => 2,
            Self::Runtime(_) | Self::Io(_) => 3,
            Self::Internal(_) | Self::Json(_) => 4,
        }
    }
}

impl From<LwaError> for CliError {
    fn from(err: LwaError) -> Self {
        match err {
            e if e.is_user_error() => Self::User(e.to_string()),
            e @ (LwaError::Runtime { .. } | LwaError::ChannelClosed { .. }) => {
                Self::Internal(e.to_string())
            }
            e => Self::Runtime(e.to_string()),
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Frontend(args) => run_frontend_cmd(cli, args),
        Command::Backend(args) => run_backend_cmd(cli, args),
        Command::Report(args) => run_report(cli, args),
        Command::Config(args) => run_config(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

fn open_activity_log(config: &Config) -> JsonlWriter {
    if config.logging.enabled {
        JsonlWriter::open(JsonlConfig::from(&config.logging))
    } else {
        JsonlWriter::disabled()
    }
}

fn start_entry(side: &str, root: &Path, config: &Config) -> LogEntry {
    let mut entry = LogEntry::new(EventType::AuditStart, Severity::Info)
        .side(side)
        .root(root);
    entry.config_hash = config.stable_hash().ok();
    entry
}

fn written_entry(side: &str, persisted: &PersistedReport) -> LogEntry {
    let mut entry = LogEntry::new(EventType::ReportWritten, Severity::Info).side(side);
    entry.path = Some(persisted.path.to_string_lossy().into_owned());
    entry.sha256 = Some(persisted.sha256.clone());
    entry.bytes = Some(persisted.bytes);
    entry
}

fn gate_entry(side: &str, strict: &str, decision: &StrictDecision) -> LogEntry {
    let (event, severity) = if decision.passed {
        (EventType::GatePass, Severity::Info)
    } else {
        (EventType::GateFail, Severity::Warning)
    };
    let mut entry = LogEntry::new(event, severity).side(side);
    entry.strict = Some(strict.to_string());
    entry.failures = Some(decision.failures.clone());
    entry
}

fn gate_result(decision: &StrictDecision) -> Result<(), CliError> {
    if decision.passed {
        Ok(())
    } else {
        Err(CliError::Gate(format!(
            "strict gate failed: {} finding(s)",
            decision.failures.len()
        )))
    }
}

fn resolve_frontend_run(config: &Config, args: &FrontendArgs) -> Result<FrontendRun, CliError> {
    let root = args
        .root
        .as_deref()
        .map_or_else(|| config.frontend_root(), resolve_absolute_path);
    let mut run = FrontendRun::from_config(&config.frontend, root);
    if let Some(out) = args.out.as_deref().or(config.frontend.out.as_deref()) {
        run.out = Some(resolve_absolute_path(out));
    }
    if let Some(file) = &args.ignore_file {
        run.ignore_file = Some(resolve_absolute_path(file));
    }
    run.ignore.extend(args.ignore.iter().cloned());
    run.require_images.clone_from(&args.require_image);
    if let Some(lines) = args.max_header_lines {
        run.max_header_lines = lines;
    }
    if let Some(workers) = args.workers {
        if workers == 0 {
            return Err(CliError::User("--workers must be at least 1".to_string()));
        }
        run.workers = workers;
    }
    run.strict = args.strict;
    run.format = args.format;
    Ok(run)
}

fn run_frontend_cmd(cli: &Cli, args: &FrontendArgs) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;
    let run = resolve_frontend_run(&config, args)?;
    let mut log = open_activity_log(&config);
    log.write_entry(&start_entry("frontend", &run.root, &config));

    let started = Instant::now();
    let outcome = match run_frontend(&config.frontend, &run) {
        Ok(outcome) => outcome,
        Err(e) => {
            log.write_entry(&LogEntry::from_error("frontend", &e));
            return Err(e.into());
        }
    };
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    log.write_entry(&scan_entry(&outcome, elapsed_ms));
    log.write_entry(&written_entry("frontend", &outcome.persisted));

    if cli.verbose {
        eprintln!(
            "[LWA-SCAN] root={} files={} ignore_patterns={} workers={} elapsed_ms={elapsed_ms}",
            run.root.display(),
            outcome.files_scanned,
            outcome.ignore_patterns,
            run.workers,
        );
        eprintln!(
            "[LWA-SCAN] report={} sha256={}",
            outcome.persisted.path.display(),
            outcome.persisted.sha256
        );
    }

    let banner = console::decision_banner(&outcome.decision);
    match run.format {
        OutputFormat::Json => {
            println!("{}", outcome.report.to_json()?);
            eprintln!("{banner}");
        }
        OutputFormat::Table => {
            if !cli.quiet {
                print!(
                    "{}",
                    console::frontend_table(&outcome.report, outcome.ignore_patterns)
                );
            }
            println!("{banner}");
        }
    }

    let strict = run.strict.unwrap_or(FrontendCategory::None);
    log.write_entry(&gate_entry("frontend", strict.as_str(), &outcome.decision));
    gate_result(&outcome.decision)
}

fn scan_entry(outcome: &FrontendOutcome, elapsed_ms: u64) -> LogEntry {
    let report = &outcome.report;
    let mut entry = LogEntry::new(EventType::ScanComplete, Severity::Info)
        .side("frontend")
        .root(Path::new(report.root()));
    entry.files_scanned = Some(outcome.files_scanned);
    entry.ignore_patterns = Some(outcome.ignore_patterns);
    entry.headers_missing = Some(report.headers_missing().len());
    entry.duplicate_files = Some(report.duplicate_ids().len());
    entry.missing_assets = Some(
        report.required_assets().missing().len() + report.discovered_assets().missing().len(),
    );
    entry.duration_ms = Some(elapsed_ms);
    entry
}

fn backend_report_path(config: &Config, root: &Path) -> PathBuf {
    config.backend.out.as_deref().map_or_else(
        || default_report_path(AuditSide::Backend, root),
        resolve_absolute_path,
    )
}

fn frontend_report_path(config: &Config) -> PathBuf {
    config
        .report
        .fe_json
        .as_deref()
        .or(config.frontend.out.as_deref())
        .map_or_else(
            || default_report_path(AuditSide::Frontend, &config.frontend_root()),
            resolve_absolute_path,
        )
}

fn html_report_path(config: &Config, backend_root: &Path) -> PathBuf {
    config.report.html_out.as_deref().map_or_else(
        || backend_root.join("run").join(HTML_REPORT_FILE),
        resolve_absolute_path,
    )
}

fn run_backend_cmd(cli: &Cli, args: &BackendArgs) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;
    let root = args
        .root
        .as_deref()
        .map_or_else(|| config.backend_root(), resolve_absolute_path);
    let out = args
        .out
        .as_deref()
        .map_or_else(|| backend_report_path(&config, &root), resolve_absolute_path);
    let run = BackendRun {
        root,
        strict: args.strict,
        workers: config.frontend.workers,
    };

    let mut log = open_activity_log(&config);
    log.write_entry(&start_entry("backend", &run.root, &config));

    let started = Instant::now();
    let (report, persisted) = match audit_backend(&config, &run, &out) {
        Ok(done) => done,
        Err(e) => {
            log.write_entry(&LogEntry::from_error("backend", &e));
            return Err(e.into());
        }
    };
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let mut scanned = LogEntry::new(EventType::ScanComplete, Severity::Info)
        .side("backend")
        .root(&run.root);
    scanned.headers_missing = Some(report.headers_missing.len());
    scanned.duration_ms = Some(elapsed_ms);
    log.write_entry(&scanned);
    log.write_entry(&written_entry("backend", &persisted));

    if cli.verbose {
        eprintln!(
            "[LWA-SCAN] root={} report={} sha256={} elapsed_ms={elapsed_ms}",
            run.root.display(),
            persisted.path.display(),
            persisted.sha256
        );
    }
    if !cli.quiet {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if args.report_html {
        let fe_json = args
            .fe_json
            .as_deref()
            .map_or_else(|| frontend_report_path(&config), resolve_absolute_path);
        let html_out = args
            .html_out
            .as_deref()
            .map_or_else(|| html_report_path(&config, &run.root), resolve_absolute_path);
        write_combined(&fe_json, &persisted.path, &html_out)?;
        println!("Wrote {}", html_out.display());
    }

    let Some(strict) = run.strict else {
        return Ok(());
    };
    let gate = BackendGate {
        report: &report,
        ignore_ffmpeg: args.no_ffmpeg,
    };
    let decision = decide(&gate, strict);
    println!("{}", console::decision_banner(&decision));
    log.write_entry(&gate_entry("backend", strict.as_str(), &decision));
    gate_result(&decision)
}

fn audit_backend(
    config: &Config,
    run: &BackendRun,
    out: &Path,
) -> leeway_audit::core::errors::Result<(BackendReport, PersistedReport)> {
    let report = run_backend(&config.backend, run)?;
    let persisted = persist(&report, out)?;
    Ok((report, persisted))
}

fn run_report(cli: &Cli, args: &ReportArgs) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;
    let backend_root = config.backend_root();
    let fe_json = args
        .fe_json
        .as_deref()
        .map_or_else(|| frontend_report_path(&config), resolve_absolute_path);
    let be_json = args
        .be_json
        .as_deref()
        .map_or_else(|| backend_report_path(&config, &backend_root), resolve_absolute_path);
    let html_out = args
        .html_out
        .as_deref()
        .map_or_else(|| html_report_path(&config, &backend_root), resolve_absolute_path);

    if cli.verbose {
        eprintln!(
            "[LWA-SCAN] fe_json={} (exists={}) be_json={} (exists={})",
            fe_json.display(),
            fe_json.is_file(),
            be_json.display(),
            be_json.is_file()
        );
    }
    write_combined(&fe_json, &be_json, &html_out)?;
    println!("Wrote {}", html_out.display());
    Ok(())
}

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match &args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            println!("{}", path.display());
            if !path.exists() {
                println!("  (file does not exist; defaults will be used)");
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = Config::load(cli.config.as_deref())?;
            let toml_str = toml::to_string_pretty(&config)
                .map_err(|e| CliError::Runtime(format!("serialize config: {e}")))?;
            println!("{toml_str}");
            Ok(())
        }
        Some(ConfigCommand::Validate) => match Config::load(cli.config.as_deref()) {
            Ok(config) => {
                let hash = config.stable_hash()?;
                println!("Configuration is valid.");
                println!("  Source: {}", config.paths.config_file.display());
                println!("  Hash: {hash}");
                Ok(())
            }
            Err(e) => {
                eprintln!("Configuration is INVALID: {e}");
                Err(CliError::User(format!("invalid config: {e}")))
            }
        },
    }
}
