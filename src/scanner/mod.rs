pub mod aggregate;
pub mod largest;
pub mod patterns;
pub mod rank;
pub mod size;
pub mod walker;

use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use crate::common::config::Config;
use crate::common::errors::SweepError;
use crate::common::permissions;
use crate::progress;
use aggregate::GroupAggregate;
use patterns::{ArtifactPattern, Category};
use rank::RankedEntry;
use walker::{MatchRecord, ScanOptions, SkippedPath};

/// Everything one scan produced
#[derive(Debug, Clone, Serialize)]
pub struct ScanResults {
    /// When the scan was performed
    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// How long the scan took in seconds
    pub duration_secs: f64,

    pub root: PathBuf,

    /// Every match above its floor
    pub records: Vec<MatchRecord>,

    /// Matches grouped by logical identity (unordered)
    pub groups: Vec<GroupAggregate>,

    /// Total reclaimable space in KB
    pub total_kb: u64,

    /// Paths the walk could not enter
    pub skipped: Vec<SkippedPath>,

    /// Stopped early by an interrupt
    pub cancelled: bool,
}

impl ScanResults {
    pub fn new(root: PathBuf) -> Self {
        Self {
            timestamp: chrono::Utc::now(),
            duration_secs: 0.0,
            root,
            records: Vec::new(),
            groups: Vec::new(),
            total_kb: 0,
            skipped: Vec::new(),
            cancelled: false,
        }
    }

    /// Build results from scan records
    pub fn from_records(root: PathBuf, records: Vec<MatchRecord>) -> Self {
        let mut results = Self::new(root);
        results.groups = aggregate::aggregate(&records);
        results.records = records;
        results.recalculate();
        results
    }

    /// Recalculate totals from records
    pub fn recalculate(&mut self) {
        self.total_kb = self.records.iter().map(|r| r.size_kb).sum();
    }

    /// The whole tree was walked and nothing worth cleaning was found
    pub fn is_clean(&self) -> bool {
        !self.cancelled && self.records.is_empty()
    }

    /// Ranked, tiered view of the groups
    pub fn ranked(&self, display_limit: usize) -> Vec<RankedEntry> {
        rank::rank(self.groups.clone(), display_limit)
    }

    /// Records grouped by category, in category order
    pub fn by_category(&self) -> Vec<(Category, Vec<&MatchRecord>)> {
        let mut map: std::collections::BTreeMap<Category, Vec<&MatchRecord>> =
            std::collections::BTreeMap::new();
        for record in &self.records {
            map.entry(record.category).or_default().push(record);
        }
        map.into_iter().collect()
    }

    /// Groups belonging to one category, largest first
    pub fn groups_in(&self, category: Category) -> Vec<&GroupAggregate> {
        let mut groups: Vec<_> = self.groups.iter().filter(|g| g.category == category).collect();
        groups.sort_by(|a, b| {
            b.total_size_kb
                .cmp(&a.total_size_kb)
                .then_with(|| a.key.cmp(&b.key))
        });
        groups
    }
}

/// Pick the default root: the home directory, or the data volume when elevated
pub fn default_root(elevated: bool) -> PathBuf {
    if elevated {
        let mac_data = PathBuf::from("/System/Volumes/Data");
        if mac_data.is_dir() {
            return mac_data;
        }
        return PathBuf::from("/");
    }
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"))
}

/// Validate the root to analyze. A bad root is fatal.
pub fn resolve_root(root: Option<&Path>, elevated: bool) -> Result<PathBuf, SweepError> {
    let root = root.map(Path::to_path_buf).unwrap_or_else(|| default_root(elevated));

    let metadata = std::fs::metadata(&root).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => SweepError::RootInaccessible {
            hint: root_hint(&root, elevated),
            path: root.clone(),
        },
        _ => SweepError::InvalidRoot {
            path: root.clone(),
            hint: "Pass an existing directory to analyze.".into(),
        },
    })?;

    if !metadata.is_dir() {
        return Err(SweepError::InvalidRoot {
            path: root,
            hint: "The root must be a directory, not a file.".into(),
        });
    }

    if !permissions::can_read(&root) {
        return Err(SweepError::RootInaccessible {
            hint: root_hint(&root, elevated),
            path: root,
        });
    }

    root.canonicalize().map_err(|e| SweepError::from_io(&root, e))
}

fn root_hint(root: &Path, elevated: bool) -> String {
    if elevated {
        format!(
            "'{}' is unreadable even with elevated privileges; check that it is mounted.",
            root.display()
        )
    } else {
        "Retry with --elevated (e.g. under sudo).".to_string()
    }
}

/// Scan options derived from config plus run flags
pub fn options_from_config(
    config: &Config,
    elevated: bool,
    cancel: Option<Arc<AtomicBool>>,
) -> ScanOptions {
    ScanOptions {
        elevated,
        default_min_size_kb: config.default_min_size_kb,
        max_depth: config.max_depth,
        exclude: config.exclude_paths.clone(),
        cancel,
    }
}

/// Main scan orchestrator: one walk for all patterns, run in the background
/// behind a simulated progress bar, then aggregated.
pub fn run_scan(
    root: &Path,
    catalog: &[ArtifactPattern],
    options: ScanOptions,
    show_progress: bool,
) -> Result<ScanResults> {
    let start = Instant::now();
    let patterns = patterns::compile_catalog(catalog, options.elevated)?;
    let cancel = options
        .cancel
        .clone()
        .unwrap_or_else(|| Arc::new(AtomicBool::new(false)));

    let walk_root = root.to_path_buf();
    let outcome = progress::run_with_progress(
        "Scanning for reclaimable artifacts...",
        show_progress,
        cancel,
        move |_| walker::scan(&walk_root, &patterns, &options),
    )?;

    tracing::info!(
        root = %root.display(),
        matches = outcome.records.len(),
        skipped = outcome.skipped.len(),
        "scan complete"
    );

    let mut results = ScanResults::from_records(root.to_path_buf(), outcome.records);
    results.skipped = outcome.skipped;
    results.cancelled = outcome.cancelled;
    results.duration_secs = start.elapsed().as_secs_f64();
    Ok(results)
}
