//! Path helpers: absolute resolution, audit-root discovery, posix-style relative paths.

use std::env;
use std::path::{Component, Path, PathBuf};

/// Env var naming the CI checkout (GitHub Actions); falls back to CWD.
pub const WORKSPACE_ENV: &str = "GITHUB_WORKSPACE";
/// Env var overriding the frontend root (relative to the workspace).
pub const FRONTEND_ROOT_ENV: &str = "LW_FRONTEND_ROOT";
/// Env var overriding the backend root (relative to the workspace).
pub const BACKEND_ROOT_ENV: &str = "LW_BACKEND_ROOT";

/// File name of the persisted frontend report, under `<root>/run/`.
pub const FRONTEND_REPORT_FILE: &str = "leeway_frontend_audit_report.json";
/// File name of the persisted backend report, under `<root>/run/`.
pub const BACKEND_REPORT_FILE: &str = "leeway_audit_report.json";
/// File name of the combined HTML report, under `<backend root>/run/`.
pub const HTML_REPORT_FILE: &str = "leeway_audit_report.html";

/// Resolve a path to an absolute, normalized path.
///
/// Uses `fs::canonicalize` when the path exists; otherwise the path is made
/// absolute against CWD and `.`/`..` are folded syntactically.
pub fn resolve_absolute_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };

    if let Ok(canonical) = std::fs::canonicalize(&absolute) {
        return canonical;
    }

    normalize_syntactic(&absolute)
}

fn normalize_syntactic(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(..) | Component::RootDir | Component::Normal(_) => {
                components.push(component);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                }
            }
        }
    }
    components.into_iter().collect()
}

/// Which half of the repository an audit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditSide {
    Frontend,
    Backend,
}

impl AuditSide {
    const fn env_var(self) -> &'static str {
        match self {
            Self::Frontend => FRONTEND_ROOT_ENV,
            Self::Backend => BACKEND_ROOT_ENV,
        }
    }

    const fn default_dir(self) -> &'static str {
        match self {
            Self::Frontend => "frontend",
            Self::Backend => "backend",
        }
    }

    const fn report_file(self) -> &'static str {
        match self {
            Self::Frontend => FRONTEND_REPORT_FILE,
            Self::Backend => BACKEND_REPORT_FILE,
        }
    }
}

/// Workspace directory: `$GITHUB_WORKSPACE` when set, else CWD.
pub fn workspace_root_from<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    let base = lookup(WORKSPACE_ENV)
        .filter(|raw| !raw.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    resolve_absolute_path(&base)
}

/// Default audit root for one side: `<workspace>/<env override or side name>`.
pub fn default_root_from<F>(side: AuditSide, lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    let rel = lookup(side.env_var())
        .filter(|raw| !raw.trim().is_empty())
        .unwrap_or_else(|| side.default_dir().to_string());
    resolve_absolute_path(&workspace_root_from(&lookup).join(rel))
}

/// Default audit root using the process environment.
pub fn default_root(side: AuditSide) -> PathBuf {
    default_root_from(side, |name| env::var(name).ok())
}

/// Default persisted-report location for a side: `<root>/run/<file>`.
#[must_use]
pub fn default_report_path(side: AuditSide, root: &Path) -> PathBuf {
    root.join("run").join(side.report_file())
}

/// Render `path` relative to `root` with forward slashes.
///
/// Returns `None` when `path` is not under `root`.
#[must_use]
pub fn posix_relative(path: &Path, root: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Some(parts.join("/"))
}

/// Join a forward-slash relative path onto `base` one segment at a time.
#[must_use]
pub fn join_posix(base: &Path, rel: &str) -> PathBuf {
    rel.split('/')
        .filter(|seg| !seg.is_empty())
        .fold(base.to_path_buf(), |acc, seg| acc.join(seg))
}
