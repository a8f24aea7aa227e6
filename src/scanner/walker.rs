use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use walkdir::WalkDir;

use super::patterns::{Category, CompiledPattern, Removal};
use super::size;
use crate::common::format;

/// A pattern hit with its measured size
#[derive(Debug, Clone, Serialize)]
pub struct MatchRecord {
    pub path: PathBuf,
    pub size_kb: u64,
    pub human_size: String,
    /// Name of the pattern that matched
    pub pattern: String,
    /// Glob text when the match came from a glob pattern
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glob: Option<String>,
    pub category: Category,
    pub removal: Removal,
}

impl MatchRecord {
    pub fn new(path: PathBuf, size_kb: u64, pattern: &CompiledPattern) -> Self {
        Self {
            path,
            size_kb,
            human_size: format::format_kb(size_kb),
            pattern: pattern.pattern.name.clone(),
            glob: pattern.glob_text().map(String::from),
            category: pattern.pattern.category,
            removal: pattern.pattern.removal,
        }
    }
}

/// A path the walk could not enter
#[derive(Debug, Clone, Serialize)]
pub struct SkippedPath {
    pub path: PathBuf,
    pub reason: String,
}

/// Knobs for one scan
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Running with elevated privileges (enables system-location patterns)
    pub elevated: bool,
    /// Floor for patterns without their own
    pub default_min_size_kb: u64,
    /// Optional depth limit for the name/glob walk
    pub max_depth: Option<usize>,
    /// Subtrees never to enter: absolute paths, or substrings of the path
    /// relative to the scan root
    pub exclude: Vec<String>,
    /// Set to stop the walk at the next entry
    pub cancel: Option<Arc<AtomicBool>>,
}

impl ScanOptions {
    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|c| c.load(Ordering::Relaxed))
    }

    /// The root's own name never counts, so an exclusion that happens to
    /// occur in the root path cannot hide the whole tree.
    fn is_excluded(&self, root: &Path, path: &Path) -> bool {
        if self.exclude.is_empty() {
            return false;
        }
        let relative = path.strip_prefix(root).unwrap_or(path).to_string_lossy();
        self.exclude.iter().any(|e| {
            let excluded = Path::new(e);
            if excluded.is_absolute() {
                path.starts_with(excluded)
            } else {
                relative.contains(e.as_str())
            }
        })
    }
}

/// Outcome of a full scan
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub records: Vec<MatchRecord>,
    pub skipped: Vec<SkippedPath>,
    pub cancelled: bool,
}

/// Directories that own per-user fixed locations: the root itself plus every
/// home directory found below it.
pub fn owner_dirs(root: &Path) -> Vec<PathBuf> {
    let mut owners = vec![root.to_path_buf()];

    for pattern in ["home/*", "Users/*"] {
        let full = root.join(pattern);
        if let Ok(entries) = glob::glob(&full.to_string_lossy()) {
            owners.extend(entries.filter_map(|e| e.ok()).filter(|p| p.is_dir()));
        }
    }

    let root_home = root.join("root");
    if root_home.is_dir() {
        owners.push(root_home);
    }

    owners.sort();
    owners.dedup();
    owners
}

/// An unsized match produced by the walk
#[derive(Debug, Clone)]
pub struct Candidate {
    pub path: PathBuf,
    pub pattern: usize,
}

/// Lazily walks `root` and yields pattern hits in discovery order.
///
/// Owner locations come first, then the name/glob/suffix walk. Matched
/// directories and owner locations are never descended into, so nothing is
/// counted twice.
pub struct Candidates<'a> {
    root: PathBuf,
    patterns: &'a [CompiledPattern],
    options: &'a ScanOptions,
    pending_owned: std::vec::IntoIter<Candidate>,
    claimed: HashSet<PathBuf>,
    walk: walkdir::IntoIter,
    skipped: Vec<SkippedPath>,
    cancelled: bool,
}

impl<'a> Candidates<'a> {
    pub fn new(root: &Path, patterns: &'a [CompiledPattern], options: &'a ScanOptions) -> Self {
        let mut owned = Vec::new();
        for owner in owner_dirs(root) {
            for (idx, compiled) in patterns.iter().enumerate() {
                if let super::patterns::PatternKind::OwnerLocation(rel) = &compiled.pattern.kind {
                    let path = owner.join(rel);
                    if path.is_dir() && !options.is_excluded(root, &path) {
                        owned.push(Candidate { path, pattern: idx });
                    }
                }
            }
        }
        // two owners can resolve to the same location (root == a home dir)
        let mut seen = HashSet::new();
        owned.retain(|c| seen.insert(c.path.clone()));
        let claimed: HashSet<PathBuf> = owned.iter().map(|c| c.path.clone()).collect();

        let mut walker = WalkDir::new(root).follow_links(false);
        if let Some(depth) = options.max_depth {
            walker = walker.max_depth(depth);
        }

        Self {
            root: root.to_path_buf(),
            patterns,
            options,
            pending_owned: owned.into_iter(),
            claimed,
            walk: walker.into_iter(),
            skipped: Vec::new(),
            cancelled: false,
        }
    }

    fn into_skipped(self) -> (Vec<SkippedPath>, bool) {
        (self.skipped, self.cancelled)
    }

    fn match_entry(&self, path: &Path, is_dir: bool) -> Option<usize> {
        self.patterns
            .iter()
            .position(|p| p.matches_entry(path, is_dir))
    }
}

impl Iterator for Candidates<'_> {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        if let Some(c) = self.pending_owned.next() {
            return Some(c);
        }

        loop {
            if self.options.cancelled() {
                self.cancelled = true;
                return None;
            }

            let entry = match self.walk.next()? {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    tracing::debug!(path = %path.display(), error = %err, "skipping unreadable path");
                    self.skipped.push(SkippedPath {
                        path,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            if entry.depth() == 0 {
                continue;
            }

            let path = entry.path();
            let is_dir = entry.file_type().is_dir();

            if self.options.is_excluded(&self.root, path) || self.claimed.contains(path) {
                if is_dir {
                    self.walk.skip_current_dir();
                }
                continue;
            }

            if let Some(idx) = self.match_entry(path, is_dir) {
                let path = path.to_path_buf();
                if is_dir {
                    self.walk.skip_current_dir();
                }
                return Some(Candidate { path, pattern: idx });
            }
        }
    }
}

/// Size a candidate and apply its floor
fn size_candidate(
    candidate: Candidate,
    patterns: &[CompiledPattern],
    options: &ScanOptions,
) -> Option<MatchRecord> {
    let compiled = &patterns[candidate.pattern];
    let size_kb = size::measure(&candidate.path)?;

    if size_kb < compiled.pattern.floor_kb(options.default_min_size_kb) {
        return None;
    }
    // an empty container is not worth offering, whatever its floor
    if compiled.pattern.is_owner_location() && size::count_entries(&candidate.path) == 0 {
        return None;
    }

    Some(MatchRecord::new(candidate.path, size_kb, compiled))
}

/// Lazy scan: walks and sizes one match at a time. Each call starts a fresh walk.
pub struct ScanIter<'a> {
    candidates: Candidates<'a>,
}

impl Iterator for ScanIter<'_> {
    type Item = MatchRecord;

    fn next(&mut self) -> Option<MatchRecord> {
        loop {
            let candidate = self.candidates.next()?;
            let (patterns, options) = (self.candidates.patterns, self.candidates.options);
            if let Some(record) = size_candidate(candidate, patterns, options) {
                return Some(record);
            }
        }
    }
}

/// Start a lazy scan of `root`
pub fn scan_iter<'a>(
    root: &Path,
    patterns: &'a [CompiledPattern],
    options: &'a ScanOptions,
) -> ScanIter<'a> {
    ScanIter {
        candidates: Candidates::new(root, patterns, options),
    }
}

/// Walk `root` once for all patterns, then size the hits in parallel.
///
/// Per-path failures end up in `skipped`; the scan itself never fails. A
/// cancelled walk still sizes what it found before the stop, and the outcome
/// is flagged as partial.
pub fn scan(root: &Path, patterns: &[CompiledPattern], options: &ScanOptions) -> ScanOutcome {
    let mut candidates = Candidates::new(root, patterns, options);
    let found: Vec<Candidate> = candidates.by_ref().collect();
    let (skipped, cancelled) = candidates.into_skipped();

    tracing::debug!(
        root = %root.display(),
        candidates = found.len(),
        skipped = skipped.len(),
        "walk finished"
    );

    let records = found
        .into_par_iter()
        .filter_map(|c| size_candidate(c, patterns, options))
        .collect();

    ScanOutcome {
        records,
        skipped,
        cancelled,
    }
}
