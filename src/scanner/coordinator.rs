//! Fire-and-join execution of the three scan passes.
//!
//! Each pass owns its accumulator and hands back an immutable result over a
//! channel; the coordinator blocks until all three have reported.

#![allow(missing_docs)]

use std::thread;

use crossbeam_channel as channel;

use crate::core::errors::{LwaError, Result};
use crate::scanner::asset_refs::AssetReferenceScanner;
use crate::scanner::duplicate_ids::{DuplicateIdScanner, DuplicateIds};
use crate::scanner::headers::HeaderScanner;
use crate::scanner::walker::FileHandle;

/// Smallest pool the coordinator will run with.
pub const MIN_WORKERS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanJob {
    Headers,
    DuplicateIds,
    AssetRefs,
}

const JOBS: [ScanJob; 3] = [ScanJob::Headers, ScanJob::DuplicateIds, ScanJob::AssetRefs];

enum ScanOutput {
    Headers(Vec<String>),
    DuplicateIds(DuplicateIds),
    AssetRefs(Vec<String>),
}

/// Joined results of one scan round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResults {
    pub headers_missing: Vec<String>,
    pub duplicate_ids: DuplicateIds,
    pub discovered_assets: Vec<String>,
}

/// Input file lists. Headers and asset references read `all`; ids read `markup`.
#[derive(Debug, Clone, Copy)]
pub struct ScanInputs<'a> {
    pub all: &'a [FileHandle],
    pub markup: &'a [FileHandle],
}

pub struct ScanCoordinator {
    headers: HeaderScanner,
    ids: DuplicateIdScanner,
    assets: AssetReferenceScanner,
    workers: usize,
}

impl ScanCoordinator {
    pub fn new(
        headers: HeaderScanner,
        ids: DuplicateIdScanner,
        assets: AssetReferenceScanner,
        workers: usize,
    ) -> Self {
        Self {
            headers,
            ids,
            assets,
            workers,
        }
    }

    /// Threads actually started: the hint floored at [`MIN_WORKERS`], never more than there are passes.
    pub fn pool_size(&self) -> usize {
        self.workers.max(MIN_WORKERS).min(JOBS.len())
    }

    /// Run all three passes and wait for every one of them.
    pub fn run(&self, inputs: ScanInputs<'_>) -> Result<ScanResults> {
        let (job_tx, job_rx) = channel::bounded::<ScanJob>(JOBS.len());
        let (out_tx, out_rx) = channel::unbounded::<ScanOutput>();

        for job in JOBS {
            job_tx.send(job).map_err(|_| LwaError::ChannelClosed {
                component: "scan coordinator",
            })?;
        }
        drop(job_tx);

        let (outputs, panicked) = thread::scope(|scope| {
            let handles: Vec<_> = (0..self.pool_size())
                .map(|_| {
                    let job_rx = job_rx.clone();
                    let out_tx = out_tx.clone();
                    scope.spawn(move || {
                        for job in job_rx.iter() {
                            if out_tx.send(self.execute(job, inputs)).is_err() {
                                return;
                            }
                        }
                    })
                })
                .collect();
            drop(out_tx);

            let outputs: Vec<ScanOutput> = out_rx.iter().collect();
            let panicked = handles
                .into_iter()
                .map(thread::ScopedJoinHandle::join)
                .filter(std::result::Result::is_err)
                .count();
            (outputs, panicked)
        });

        if panicked > 0 {
            return Err(LwaError::Runtime {
                details: format!("{panicked} scan worker(s) panicked"),
            });
        }

        let mut headers_missing = None;
        let mut duplicate_ids = None;
        let mut discovered_assets = None;
        for output in outputs {
            match output {
                ScanOutput::Headers(v) => headers_missing = Some(v),
                ScanOutput::DuplicateIds(v) => duplicate_ids = Some(v),
                ScanOutput::AssetRefs(v) => discovered_assets = Some(v),
            }
        }

        match (headers_missing, duplicate_ids, discovered_assets) {
            (Some(headers_missing), Some(duplicate_ids), Some(discovered_assets)) => {
                Ok(ScanResults {
                    headers_missing,
                    duplicate_ids,
                    discovered_assets,
                })
            }
            _ => Err(LwaError::ChannelClosed {
                component: "scan coordinator",
            }),
        }
    }

    fn execute(&self, job: ScanJob, inputs: ScanInputs<'_>) -> ScanOutput {
        match job {
            ScanJob::Headers => ScanOutput::Headers(self.headers.missing(inputs.all)),
            ScanJob::DuplicateIds => ScanOutput::DuplicateIds(self.ids.find(inputs.markup)),
            ScanJob::AssetRefs => ScanOutput::AssetRefs(self.assets.discover(inputs.all)),
        }
    }
}
