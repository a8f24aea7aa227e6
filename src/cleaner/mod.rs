pub mod confirm;
pub mod executor;
mod trash;

pub use confirm::{CleanupDecision, Confirm, ConfirmRequest, ConfirmationGate};
pub use executor::{
    CategoryOutcome, DeletionExecutor, DeletionFailure, DeletionTarget, FsRemover, OutcomeStatus,
    Remover, SpaceFreedReport,
};

use serde::Serialize;

use crate::common::format;
use crate::scanner::aggregate;
use crate::scanner::walker::MatchRecord;
use crate::scanner::ScanResults;

/// How the cleanup loop asks for confirmation
#[derive(Debug, Clone)]
pub struct CleanupOptions {
    /// Confirm each logical group instead of each category
    pub per_group: bool,
    /// Member paths shown in each prompt
    pub preview_items: usize,
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            per_group: false,
            preview_items: 5,
        }
    }
}

/// Everything one cleanup run decided and did
#[derive(Debug, Clone, Serialize)]
pub struct CleanupSummary {
    /// Nothing matched; the gate and executor were never involved
    pub clean_system: bool,
    pub dry_run: bool,
    pub decisions: Vec<CleanupDecision>,
    pub outcomes: Vec<CategoryOutcome>,
    /// Stopped by an interrupt before every subject was handled
    pub interrupted: bool,
}

impl CleanupSummary {
    pub fn total_freed_kb(&self) -> u64 {
        self.outcomes.iter().map(|o| o.freed_kb()).sum()
    }

    /// Freed space, or in a dry run what would have been freed
    pub fn total_reclaimable_kb(&self) -> u64 {
        self.outcomes.iter().map(|o| o.reclaimable_kb()).sum()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.failures().count()).sum()
    }
}

/// One prompt's worth of work
struct Subject<'a> {
    name: String,
    description: String,
    records: Vec<&'a MatchRecord>,
}

fn subjects<'a>(results: &'a ScanResults, per_group: bool) -> Vec<Subject<'a>> {
    let mut subjects = Vec::new();
    for (category, records) in results.by_category() {
        if !per_group {
            subjects.push(Subject {
                name: category.to_string(),
                description: category.description().to_string(),
                records,
            });
            continue;
        }
        for group in results.groups_in(category) {
            subjects.push(Subject {
                name: group.key.clone(),
                description: category.to_string(),
                records: records
                    .iter()
                    .copied()
                    .filter(|r| aggregate::group_key(r) == group.key)
                    .collect(),
            });
        }
    }
    subjects
}

/// Walk categories (or groups) in order: confirm, then delete what was
/// approved. A clean scan returns immediately, and so does an interrupted
/// one: partial results are never offered for deletion.
pub fn run_cleanup<C: Confirm, R: Remover>(
    results: &ScanResults,
    gate: &mut C,
    executor: &DeletionExecutor<R>,
    options: &CleanupOptions,
) -> CleanupSummary {
    let mut summary = CleanupSummary {
        clean_system: results.is_clean(),
        dry_run: executor.is_dry_run(),
        decisions: Vec::new(),
        outcomes: Vec::new(),
        interrupted: results.cancelled,
    };
    if summary.interrupted {
        tracing::info!(target: "spacesweep::audit", root = %results.root.display(), "scan interrupted; nothing cleaned");
        return summary;
    }
    if summary.clean_system {
        tracing::info!(target: "spacesweep::audit", root = %results.root.display(), "system is clean");
        return summary;
    }

    for subject in subjects(results, options.per_group) {
        if executor.is_cancelled() {
            summary.interrupted = true;
            break;
        }

        let request = ConfirmRequest {
            subject: subject.name.clone(),
            description: subject.description,
            preview: subject
                .records
                .iter()
                .take(options.preview_items)
                .map(|r| format!("{}  {}", format::format_path(&r.path), r.human_size))
                .collect(),
            member_count: subject.records.len(),
            size_kb: subject.records.iter().map(|r| r.size_kb).sum(),
        };

        let decision = gate.confirm(&request);
        let approved = decision.approved;
        summary.decisions.push(decision);

        if !approved {
            summary.outcomes.push(CategoryOutcome::skipped(&subject.name));
            continue;
        }

        let targets: Vec<DeletionTarget> = subject.records.iter().map(|r| DeletionTarget::from(*r)).collect();
        let outcome = executor.execute_all(&subject.name, &targets);
        tracing::info!(
            target: "spacesweep::audit",
            subject = %outcome.subject,
            status = %outcome.status,
            freed_kb = outcome.freed_kb(),
            "cleanup finished"
        );
        summary.interrupted |= outcome.interrupted;
        summary.outcomes.push(outcome);
        if summary.interrupted {
            break;
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::patterns;
    use crate::scanner::walker::ScanOptions;
    use std::cell::Cell;
    use std::io;
    use std::path::Path;
    use tempfile::TempDir;

    /// Records every request and answers from a fixed script
    struct ScriptedGate {
        answers: Vec<bool>,
        asked: Vec<String>,
    }

    impl Confirm for ScriptedGate {
        fn confirm(&mut self, request: &ConfirmRequest) -> CleanupDecision {
            let approved = self.answers.get(self.asked.len()).copied().unwrap_or(false);
            self.asked.push(request.subject.clone());
            CleanupDecision {
                subject: request.subject.clone(),
                approved,
            }
        }
    }

    struct CountingRemover {
        calls: Cell<usize>,
    }

    impl Remover for CountingRemover {
        fn remove_file(&self, path: &Path) -> io::Result<()> {
            self.calls.set(self.calls.get() + 1);
            std::fs::remove_file(path)
        }

        fn remove_dir(&self, path: &Path) -> io::Result<()> {
            self.calls.set(self.calls.get() + 1);
            std::fs::remove_dir(path)
        }
    }

    fn write_kb(path: &Path, kb: usize) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, vec![1u8; kb * 1024]).unwrap();
    }

    fn scan(root: &Path) -> ScanResults {
        crate::scanner::run_scan(root, &patterns::catalog(), ScanOptions::default(), false).unwrap()
    }

    #[test]
    fn test_clean_system_never_prompts_or_deletes() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("readme.md"), "hi").unwrap();
        let results = scan(dir.path());

        let mut gate = ScriptedGate { answers: vec![true], asked: Vec::new() };
        let executor = DeletionExecutor::with_remover(
            CountingRemover { calls: Cell::new(0) },
            dir.path(),
            false,
        );
        let summary = run_cleanup(&results, &mut gate, &executor, &CleanupOptions::default());

        assert!(summary.clean_system);
        assert!(gate.asked.is_empty());
        assert!(summary.outcomes.is_empty());
        assert_eq!(summary.total_freed_kb(), 0);
    }

    #[test]
    fn test_declined_category_is_skipped() {
        let dir = TempDir::new().unwrap();
        write_kb(&dir.path().join("web/node_modules/x.js"), 200);
        write_kb(&dir.path().join("py/__pycache__/m.pyc"), 8);
        let results = scan(dir.path());

        // categories come in order: Dependencies, then Build Caches
        let mut gate = ScriptedGate { answers: vec![false, true], asked: Vec::new() };
        let executor = DeletionExecutor::new(dir.path(), false);
        let summary = run_cleanup(&results, &mut gate, &executor, &CleanupOptions::default());

        assert_eq!(gate.asked, vec!["Dependencies", "Build Caches"]);
        assert_eq!(summary.outcomes[0].status, OutcomeStatus::Skipped);
        assert_eq!(summary.outcomes[1].status, OutcomeStatus::Completed);
        assert!(dir.path().join("web/node_modules/x.js").exists());
        assert!(!dir.path().join("py/__pycache__").exists());
        assert_eq!(summary.total_freed_kb(), 8);
    }

    #[test]
    fn test_dry_run_reports_without_deleting() {
        let dir = TempDir::new().unwrap();
        write_kb(&dir.path().join("a/node_modules/x.js"), 150);
        write_kb(&dir.path().join("b/node_modules/y.js"), 250);
        let results = scan(dir.path());

        let mut gate = ScriptedGate { answers: vec![true], asked: Vec::new() };
        let executor = DeletionExecutor::new(dir.path(), true);
        let summary = run_cleanup(&results, &mut gate, &executor, &CleanupOptions::default());

        assert!(summary.dry_run);
        assert_eq!(summary.total_freed_kb(), 0);
        assert_eq!(summary.total_reclaimable_kb(), 400);
        assert!(dir.path().join("a/node_modules/x.js").exists());
        assert!(dir.path().join("b/node_modules/y.js").exists());
    }

    #[test]
    fn test_per_group_asks_once_per_key() {
        let dir = TempDir::new().unwrap();
        write_kb(&dir.path().join("a/node_modules/x.js"), 150);
        write_kb(&dir.path().join("b/node_modules/y.js"), 250);
        write_kb(&dir.path().join("c/bower_components/z.js"), 300);
        let results = scan(dir.path());

        let mut gate = ScriptedGate { answers: vec![true, false], asked: Vec::new() };
        let executor = DeletionExecutor::new(dir.path(), false);
        let options = CleanupOptions { per_group: true, preview_items: 2 };
        let summary = run_cleanup(&results, &mut gate, &executor, &options);

        // node_modules totals 400 KB and outranks bower_components
        assert_eq!(gate.asked, vec!["node_modules", "bower_components"]);
        assert_eq!(summary.outcomes[0].reports.len(), 2);
        assert!(!dir.path().join("a/node_modules").exists());
        assert!(dir.path().join("c/bower_components/z.js").exists());
    }

    #[test]
    fn test_interrupted_scan_is_not_a_clean_system() {
        let dir = TempDir::new().unwrap();
        write_kb(&dir.path().join("web/node_modules/x.js"), 500);

        let cancel = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(true));
        let options = ScanOptions {
            cancel: Some(cancel),
            ..Default::default()
        };
        let results =
            crate::scanner::run_scan(dir.path(), &patterns::catalog(), options, false).unwrap();
        assert!(results.cancelled);
        assert!(!results.is_clean());

        let mut gate = ScriptedGate { answers: vec![true], asked: Vec::new() };
        let executor = DeletionExecutor::new(dir.path(), false);
        let summary = run_cleanup(&results, &mut gate, &executor, &CleanupOptions::default());

        assert!(summary.interrupted);
        assert!(!summary.clean_system);
        assert!(gate.asked.is_empty());
        assert!(dir.path().join("web/node_modules/x.js").exists());
    }

    #[test]
    fn test_per_group_offers_every_record() {
        let dir = TempDir::new().unwrap();
        write_kb(&dir.path().join("home/dev/.cache/pip/wheel"), 2048);
        write_kb(&dir.path().join("work/proj/.cache/build.bin"), 300);

        let mut catalog = patterns::catalog();
        catalog.push(patterns::ArtifactPattern::dir(
            ".cache",
            patterns::Category::BuildCache,
        ));
        let results = crate::scanner::run_scan(dir.path(), &catalog, ScanOptions::default(), false)
            .unwrap();
        assert_eq!(results.records.len(), 2);

        let mut gate = ScriptedGate { answers: vec![true, true], asked: Vec::new() };
        let executor = DeletionExecutor::new(dir.path(), true);
        let options = CleanupOptions { per_group: true, preview_items: 2 };
        let summary = run_cleanup(&results, &mut gate, &executor, &options);

        // Build Caches sorts before User Caches
        assert_eq!(gate.asked, vec![".cache", "User cache"]);
        let offered: usize = summary.outcomes.iter().map(|o| o.reports.len()).sum();
        assert_eq!(offered, results.records.len());
        assert_eq!(summary.total_reclaimable_kb(), 2048 + 300);
    }

    #[test]
    fn test_interrupt_stops_before_next_subject() {
        let dir = TempDir::new().unwrap();
        write_kb(&dir.path().join("web/node_modules/x.js"), 200);
        let results = scan(dir.path());

        let cancel = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(true));
        let mut gate = ScriptedGate { answers: vec![true], asked: Vec::new() };
        let executor = DeletionExecutor::new(dir.path(), false).with_cancel(cancel);
        let summary = run_cleanup(&results, &mut gate, &executor, &CleanupOptions::default());

        assert!(summary.interrupted);
        assert!(gate.asked.is_empty());
        assert!(dir.path().join("web/node_modules/x.js").exists());
    }
}
