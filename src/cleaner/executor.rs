use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::trash;
use crate::common::errors::SweepError;
use crate::common::safety;
use crate::scanner::patterns::Removal;
use crate::scanner::size;
use crate::scanner::walker::MatchRecord;

/// Filesystem removal primitives. The executor does the traversal; this only
/// unlinks single entries, so tests can inject failures.
pub trait Remover {
    fn remove_file(&self, path: &Path) -> io::Result<()>;
    fn remove_dir(&self, path: &Path) -> io::Result<()>;
}

/// Real filesystem removal
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRemover;

impl Remover for FsRemover {
    fn remove_file(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_dir(path)
    }
}

/// One thing to delete
#[derive(Debug, Clone, PartialEq)]
pub struct DeletionTarget {
    pub path: PathBuf,
    pub removal: Removal,
}

impl From<&MatchRecord> for DeletionTarget {
    fn from(record: &MatchRecord) -> Self {
        Self {
            path: record.path.clone(),
            removal: record.removal,
        }
    }
}

/// An entry that could not be removed
#[derive(Debug, Clone, Serialize)]
pub struct DeletionFailure {
    pub path: PathBuf,
    pub reason: String,
    pub permission_denied: bool,
}

impl DeletionFailure {
    fn from_io(path: &Path, err: io::Error) -> Self {
        let permission_denied = err.kind() == io::ErrorKind::PermissionDenied;
        Self {
            path: path.to_path_buf(),
            reason: SweepError::from_io(path, err).to_string(),
            permission_denied,
        }
    }
}

/// Before/after accounting for one target
#[derive(Debug, Clone, Serialize)]
pub struct SpaceFreedReport {
    pub path: PathBuf,
    pub before_kb: u64,
    pub after_kb: u64,
    /// `before - after`, never negative
    pub freed_kb: u64,
    pub dry_run: bool,
    /// Trash re-verified as empty after deletion
    pub verified_empty: bool,
    pub failures: Vec<DeletionFailure>,
}

impl SpaceFreedReport {
    pub fn new(path: PathBuf, before_kb: u64, after_kb: u64, dry_run: bool) -> Self {
        Self {
            path,
            before_kb,
            after_kb,
            freed_kb: before_kb.saturating_sub(after_kb),
            dry_run,
            verified_empty: false,
            failures: Vec::new(),
        }
    }

    /// What this target frees, or would free in a dry run
    pub fn reclaimable_kb(&self) -> u64 {
        if self.dry_run {
            self.before_kb
        } else {
            self.freed_kb
        }
    }

    /// A verified-empty trash counts as success even with failures logged on the way
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty() || self.verified_empty
    }
}

/// How a category (or group) ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Completed,
    CompletedWithWarnings,
    Failed,
    Skipped,
    /// Stopped before its first target
    Interrupted,
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeStatus::Completed => write!(f, "completed"),
            OutcomeStatus::CompletedWithWarnings => write!(f, "completed with warnings"),
            OutcomeStatus::Failed => write!(f, "failed"),
            OutcomeStatus::Skipped => write!(f, "skipped"),
            OutcomeStatus::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Result of cleaning one confirmed subject
#[derive(Debug, Clone, Serialize)]
pub struct CategoryOutcome {
    pub subject: String,
    pub status: OutcomeStatus,
    pub reports: Vec<SpaceFreedReport>,
    pub interrupted: bool,
}

impl CategoryOutcome {
    pub fn skipped(subject: &str) -> Self {
        Self {
            subject: subject.to_string(),
            status: OutcomeStatus::Skipped,
            reports: Vec::new(),
            interrupted: false,
        }
    }

    pub fn freed_kb(&self) -> u64 {
        self.reports.iter().map(|r| r.freed_kb).sum()
    }

    pub fn reclaimable_kb(&self) -> u64 {
        self.reports.iter().map(|r| r.reclaimable_kb()).sum()
    }

    /// Everything that could not be processed, across all targets
    pub fn failures(&self) -> impl Iterator<Item = &DeletionFailure> {
        self.reports
            .iter()
            .filter(|r| !r.verified_empty)
            .flat_map(|r| r.failures.iter())
    }

    fn status_of(reports: &[SpaceFreedReport], interrupted: bool) -> OutcomeStatus {
        if reports.is_empty() && interrupted {
            OutcomeStatus::Interrupted
        } else if reports.iter().all(SpaceFreedReport::succeeded) {
            OutcomeStatus::Completed
        } else if reports.iter().any(|r| r.succeeded() || r.freed_kb > 0) {
            OutcomeStatus::CompletedWithWarnings
        } else {
            OutcomeStatus::Failed
        }
    }
}

/// Removes targets and reports space freed. Per-entry failures are collected,
/// never raised; one bad path never stops its siblings.
pub struct DeletionExecutor<R: Remover = FsRemover> {
    remover: R,
    root: PathBuf,
    dry_run: bool,
    cancel: Option<Arc<AtomicBool>>,
}

impl DeletionExecutor<FsRemover> {
    pub fn new(root: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self::with_remover(FsRemover, root, dry_run)
    }
}

impl<R: Remover> DeletionExecutor<R> {
    pub fn with_remover(remover: R, root: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            remover,
            root: root.into(),
            dry_run,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|c| c.load(Ordering::Relaxed))
    }

    /// Measure, remove (unless dry run), measure again
    pub fn execute(&self, target: &DeletionTarget) -> SpaceFreedReport {
        let path = &target.path;

        let before = match size::measure(path) {
            Some(kb) => kb,
            None => {
                // vanished since the scan: already clean
                tracing::debug!(path = %path.display(), "target already gone");
                return SpaceFreedReport::new(path.clone(), 0, 0, self.dry_run);
            }
        };

        if !safety::is_deletable_under(path, &self.root) {
            let mut report = SpaceFreedReport::new(path.clone(), before, before, self.dry_run);
            report.failures.push(DeletionFailure {
                path: path.clone(),
                reason: format!("Refusing to delete protected path: {}", path.display()),
                permission_denied: false,
            });
            return report;
        }

        if self.dry_run {
            let report = SpaceFreedReport::new(path.clone(), before, before, true);
            self.log(&report);
            return report;
        }

        let mut failures = Vec::new();
        let mut verified_empty = false;
        match target.removal {
            Removal::RemoveEntirely => {
                self.remove_tree(path, &mut failures);
            }
            Removal::EmptyContents => self.empty_dir(path, &mut failures),
            Removal::EmptyTrash => {
                verified_empty = trash::empty_trash(self, path, &mut failures);
            }
        }

        let after = size::measure(path).unwrap_or(0);
        let mut report = SpaceFreedReport::new(path.clone(), before, after, false);
        report.failures = failures;
        report.verified_empty = verified_empty;
        self.log(&report);
        report
    }

    /// Clean every target of one subject, strictly in order
    pub fn execute_all(&self, subject: &str, targets: &[DeletionTarget]) -> CategoryOutcome {
        let mut reports = Vec::with_capacity(targets.len());
        let mut interrupted = false;

        for target in targets {
            if self.is_cancelled() {
                interrupted = true;
                break;
            }
            reports.push(self.execute(target));
        }

        let status = CategoryOutcome::status_of(&reports, interrupted);
        CategoryOutcome {
            subject: subject.to_string(),
            status,
            reports,
            interrupted,
        }
    }

    /// Remove `path` and everything below it. Returns whether it is gone.
    pub(super) fn remove_tree(&self, path: &Path, failures: &mut Vec<DeletionFailure>) -> bool {
        let metadata = match std::fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return true,
            Err(e) => {
                failures.push(DeletionFailure::from_io(path, e));
                return false;
            }
        };

        if !metadata.is_dir() {
            return self.unlink(path, false, failures);
        }

        let mut children_gone = true;
        match std::fs::read_dir(path) {
            Ok(entries) => {
                for entry in entries {
                    match entry {
                        Ok(e) => children_gone &= self.remove_tree(&e.path(), failures),
                        Err(e) => {
                            failures.push(DeletionFailure::from_io(path, e));
                            children_gone = false;
                        }
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => return true,
            Err(e) => {
                failures.push(DeletionFailure::from_io(path, e));
                return false;
            }
        }

        // a child already failed; the directory can't be empty
        if !children_gone {
            return false;
        }
        self.unlink(path, true, failures)
    }

    /// Remove the children of `path`, keep `path`
    pub(super) fn empty_dir(&self, path: &Path, failures: &mut Vec<DeletionFailure>) {
        match std::fs::read_dir(path) {
            Ok(entries) => {
                for entry in entries {
                    match entry {
                        Ok(e) => {
                            self.remove_tree(&e.path(), failures);
                        }
                        Err(e) => failures.push(DeletionFailure::from_io(path, e)),
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => failures.push(DeletionFailure::from_io(path, e)),
        }
    }

    fn unlink(&self, path: &Path, is_dir: bool, failures: &mut Vec<DeletionFailure>) -> bool {
        let result = if is_dir {
            self.remover.remove_dir(path)
        } else {
            self.remover.remove_file(path)
        };
        match result {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "could not remove");
                failures.push(DeletionFailure::from_io(path, e));
                false
            }
        }
    }

    fn log(&self, report: &SpaceFreedReport) {
        tracing::info!(
            target: "spacesweep::audit",
            path = %report.path.display(),
            before_kb = report.before_kb,
            after_kb = report.after_kb,
            freed_kb = report.freed_kb,
            dry_run = report.dry_run,
            failures = report.failures.len(),
            "deleted"
        );
    }
}
