//! Archive update runs
//!
//! Walks the root, selects files by extension, and adds or replaces them in
//! the target archive, then commits the archive once.
//!
//! Per-file failures never stop a run: they are logged, handed to the
//! [`RunObserver`] and collected in the [`RunReport`]. An invalid root or an
//! archive that cannot be opened ends the run before anything is staged, and
//! a failed commit is returned as an error since none of the staged work
//! reached the disk.

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::reconcile::{stage_file, StageOutcome};
use crate::session::{ArchiveSession, CommitSummary};
use crate::utils::entry_name;
use crate::walk::TreeWalker;

/// Receives progress events during a run
///
/// All methods do nothing by default.
pub trait RunObserver {
    /// A matching file is about to be staged
    fn on_file(&mut self, _entry_name: &str, _path: &Path) {}

    /// A matching file was staged
    fn on_staged(&mut self, _entry_name: &str, _outcome: StageOutcome) {}

    /// A matching file could not be staged
    fn on_file_error(&mut self, _path: &Path, _error: &Error) {}

    /// Part of the tree could not be read
    fn on_walk_error(&mut self, _error: &Error) {}

    /// All files are staged and the archive is about to be written
    fn on_finalize(&mut self, _archive: &Path) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// A file that matched but could not be staged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    /// Path of the file on disk
    pub path: PathBuf,
    /// Human-readable reason
    pub message: String,
}

/// Result of a completed run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Files staged for add or replace
    pub processed: usize,
    /// Files staged as new entries
    pub added: usize,
    /// Files staged as replacements
    pub replaced: usize,
    /// Matching files that could not be staged
    pub failed: Vec<FileFailure>,
    /// Traversal errors (unreadable directories, vanished entries, loops)
    pub walk_errors: usize,
    /// What the commit wrote
    pub commit: CommitSummary,
}

impl RunReport {
    /// Check whether any file or directory could not be processed
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty() || self.walk_errors > 0
    }
}

/// Add or update the selected files of `config.root` in `config.archive`
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use selectzip::{update_archive, RunConfig, NoopObserver};
///
/// let config = RunConfig::resolve("C:/Data", "txt;cpp", "C:/Backup/data.zip", Path::new("."));
/// let report = update_archive(&config, &mut NoopObserver)?;
/// println!("Done! Total {} files processed.", report.processed);
/// # Ok::<(), selectzip::Error>(())
/// ```
pub fn update_archive(config: &RunConfig, observer: &mut dyn RunObserver) -> Result<RunReport> {
    info!(
        root = %config.root.display(),
        extensions = %config.extensions,
        archive = %config.archive.display(),
        "starting run"
    );

    let walker = TreeWalker::new(&config.root, &config.walk).inspect_err(|e| error!("{}", e))?;
    let mut session = ArchiveSession::open(&config.archive, config.session.clone())
        .inspect_err(|e| error!("{}", e))?;

    let mut report = RunReport::default();

    for candidate in walker {
        let candidate = match candidate {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!("{}", e);
                observer.on_walk_error(&e);
                report.walk_errors += 1;
                continue;
            }
        };

        if !candidate.is_regular_file || !config.extensions.matches(&candidate.path) {
            continue;
        }

        // The archive itself may live inside the root
        if candidate.path == config.archive {
            debug!(path = %candidate.path.display(), "skipping target archive");
            continue;
        }

        let Some(name) = entry_name(&config.root, &candidate.path) else {
            continue;
        };

        observer.on_file(&name, &candidate.path);
        match stage_file(&mut session, &name, &candidate.path) {
            Ok(outcome) => {
                report.processed += 1;
                match outcome {
                    StageOutcome::Added => report.added += 1,
                    StageOutcome::Replaced => report.replaced += 1,
                }
                observer.on_staged(&name, outcome);
            }
            Err(e) => {
                warn!(entry = %name, "{}", e);
                observer.on_file_error(&candidate.path, &e);
                report.failed.push(FileFailure {
                    path: candidate.path,
                    message: e.to_string(),
                });
            }
        }
    }

    observer.on_finalize(&config.archive);
    report.commit = session.finalize().inspect_err(|e| error!("{}", e))?;

    info!(
        processed = report.processed,
        added = report.added,
        replaced = report.replaced,
        failed = report.failed.len(),
        "run complete"
    );
    Ok(report)
}
