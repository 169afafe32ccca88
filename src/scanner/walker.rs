//! Parallel tree walker: enumerates candidate files under an audit root.
//!
//! Directories are distributed over a small worker pool through a shared work
//! queue; an in-flight counter tells idle workers when the walk is finished.
//! Output order is unspecified, callers sort downstream when they need to.

#![allow(missing_docs)]

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel as channel;

use crate::core::errors::{LwaError, Result};
use crate::core::paths::posix_relative;
use crate::scanner::ignore::IgnoreSet;

/// Releases one in-flight slot on drop, including during unwind.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A discovered file: absolute path plus its lower-cased extension (with the dot).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileHandle {
    pub path: PathBuf,
    pub extension: String,
}

impl FileHandle {
    /// Build a handle, or `None` when the path has no extension.
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let extension = extension_of(&path)?;
        Some(Self { path, extension })
    }

    /// Path rendered for reports.
    pub fn display_path(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// A queued directory plus, when following symlinks, the canonical paths of it
/// and its ancestors.
struct DirTask {
    path: PathBuf,
    chain: Vec<PathBuf>,
}

/// Walker settings for one traversal.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    pub root: PathBuf,
    /// Accepted extensions, lower-cased, with the leading dot.
    pub extensions: BTreeSet<String>,
    pub follow_symlinks: bool,
    pub parallelism: usize,
}

impl WalkerConfig {
    pub fn new<I, S>(root: &Path, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            root: root.to_path_buf(),
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().to_ascii_lowercase())
                .collect(),
            follow_symlinks: false,
            parallelism: 4,
        }
    }

    #[must_use]
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }
}

/// Recursive file enumerator filtered by extension and ignore patterns.
///
/// Symlinked directories are only descended when `follow_symlinks` is set; a
/// directory whose canonical path is already among its own ancestors is skipped,
/// so link cycles terminate while aliases of a directory are still listed.
pub struct TreeWalker<'a> {
    config: WalkerConfig,
    ignore: &'a IgnoreSet,
}

impl<'a> TreeWalker<'a> {
    pub fn new(config: WalkerConfig, ignore: &'a IgnoreSet) -> Self {
        Self { config, ignore }
    }

    /// Walk the root and return every accepted regular file.
    ///
    /// A missing or unreadable root is a hard error. Unreadable subdirectories
    /// are skipped.
    pub fn list(&self) -> Result<Vec<FileHandle>> {
        let root = &self.config.root;
        match fs::metadata(root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(LwaError::MissingRoot {
                    role: "scan root",
                    path: root.clone(),
                });
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(LwaError::MissingRoot {
                    role: "scan root",
                    path: root.clone(),
                });
            }
            Err(source) => return Err(LwaError::io(root, source)),
        }
        fs::read_dir(root).map_err(|source| LwaError::io(root, source))?;

        let (work_tx, work_rx) = channel::unbounded::<DirTask>();
        let (result_tx, result_rx) = channel::unbounded::<FileHandle>();
        let in_flight = AtomicUsize::new(1);
        let chain = if self.config.follow_symlinks {
            fs::canonicalize(root).into_iter().collect()
        } else {
            Vec::new()
        };
        work_tx
            .send(DirTask {
                path: root.clone(),
                chain,
            })
            .map_err(|_| LwaError::ChannelClosed {
                component: "tree walker",
            })?;

        let workers = self.config.parallelism.max(1);
        let panicked = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    let work_rx = work_rx.clone();
                    let work_tx = work_tx.clone();
                    let result_tx = result_tx.clone();
                    let in_flight = &in_flight;
                    scope.spawn(move || {
                        self.worker(&work_rx, &work_tx, &result_tx, in_flight);
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(thread::ScopedJoinHandle::join)
                .filter(std::result::Result::is_err)
                .count()
        });
        drop(result_tx);

        if panicked > 0 {
            return Err(LwaError::Runtime {
                details: format!("{panicked} tree walker worker(s) panicked"),
            });
        }
        Ok(result_rx.try_iter().collect())
    }

    fn worker(
        &self,
        work_rx: &channel::Receiver<DirTask>,
        work_tx: &channel::Sender<DirTask>,
        result_tx: &channel::Sender<FileHandle>,
        in_flight: &AtomicUsize,
    ) {
        loop {
            match work_rx.recv_timeout(Duration::from_millis(20)) {
                Ok(dir) => {
                    let _done = InFlightGuard(in_flight);
                    self.process_directory(dir, work_tx, result_tx, in_flight);
                }
                Err(channel::RecvTimeoutError::Timeout) => {
                    if in_flight.load(Ordering::Acquire) == 0 {
                        return;
                    }
                }
                Err(channel::RecvTimeoutError::Disconnected) => return,
            }
        }
    }

    fn process_directory(
        &self,
        dir: DirTask,
        work_tx: &channel::Sender<DirTask>,
        result_tx: &channel::Sender<FileHandle>,
        in_flight: &AtomicUsize,
    ) {
        let Ok(entries) = fs::read_dir(&dir.path) else {
            return;
        };
        let root = &self.config.root;

        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(ft) = entry.file_type() else {
                continue;
            };

            // Symlinks resolve to their target for the file/dir decision.
            let (is_dir, is_file) = if ft.is_symlink() {
                match fs::metadata(&path) {
                    Ok(meta) => (meta.is_dir() && self.config.follow_symlinks, meta.is_file()),
                    Err(_) => continue,
                }
            } else {
                (ft.is_dir(), ft.is_file())
            };

            if is_dir {
                let rel = posix_relative(&path, root).unwrap_or_default();
                if self.ignore.prunes_dir(&rel) {
                    continue;
                }
                let chain = if self.config.follow_symlinks {
                    let Ok(canonical) = fs::canonicalize(&path) else {
                        continue;
                    };
                    if dir.chain.contains(&canonical) {
                        continue;
                    }
                    let mut chain = dir.chain.clone();
                    chain.push(canonical);
                    chain
                } else {
                    Vec::new()
                };
                in_flight.fetch_add(1, Ordering::AcqRel);
                if work_tx.send(DirTask { path, chain }).is_err() {
                    in_flight.fetch_sub(1, Ordering::AcqRel);
                }
                continue;
            }

            if !is_file {
                continue;
            }
            let Some(handle) = FileHandle::from_path(path) else {
                continue;
            };
            if !self.config.extensions.contains(&handle.extension) {
                continue;
            }
            if self.ignore.excluded(&handle.path, root) {
                continue;
            }
            let _ = result_tx.send(handle);
        }
    }
}

/// Lower-cased extension with its leading dot, e.g. `.tsx`.
pub fn extension_of(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_string_lossy();
    if ext.is_empty() {
        return None;
    }
    Some(format!(".{}", ext.to_ascii_lowercase()))
}
