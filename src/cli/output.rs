use colored::*;
use serde::Serialize;
use std::path::Path;

use crate::cleaner::{CategoryOutcome, CleanupSummary, OutcomeStatus, SpaceFreedReport};
use crate::common::format::{self, format_kb, format_kb_colored, format_path};
use crate::scanner::largest::LargestReport;
use crate::scanner::patterns::ArtifactPattern;
use crate::scanner::rank::RankedEntry;
use crate::scanner::walker::SkippedPath;
use crate::scanner::ScanResults;

const RULE_WIDTH: usize = 72;

fn rule() {
    println!("{}", "─".repeat(RULE_WIDTH).dimmed());
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing results: {}", e),
    }
}

// ─── Analyze ──────────────────────────────────────────────────────────────────

/// JSON shape of `analyze`
#[derive(Serialize)]
pub struct AnalyzeReport<'a> {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub root: &'a Path,
    pub duration_secs: f64,
    pub clean_system: bool,
    pub total_kb: u64,
    pub total_human: String,
    pub match_count: usize,
    pub entries: &'a [RankedEntry],
    pub skipped: &'a [SkippedPath],
    pub cancelled: bool,
}

impl<'a> AnalyzeReport<'a> {
    pub fn new(results: &'a ScanResults, entries: &'a [RankedEntry]) -> Self {
        Self {
            timestamp: results.timestamp,
            root: &results.root,
            duration_secs: results.duration_secs,
            clean_system: results.is_clean(),
            total_kb: results.total_kb,
            total_human: format_kb(results.total_kb),
            match_count: results.records.len(),
            entries,
            skipped: &results.skipped,
            cancelled: results.cancelled,
        }
    }
}

/// Ranked artifact listing
pub fn print_ranked(results: &ScanResults, entries: &[RankedEntry]) {
    println!();
    println!("{}  SpaceSweep Analysis", "🧹");
    rule();
    println!(
        "  {}  •  scanned in {}  •  {} reclaimable  •  {}",
        format_path(&results.root).bold(),
        format::format_duration(results.duration_secs).cyan(),
        format_kb_colored(results.total_kb),
        format::format_count(results.records.len()).dimmed()
    );
    rule();
    println!();

    if results.cancelled {
        println!("  {} Scan interrupted; results are partial.", "⚠".yellow());
        println!();
    }

    if results.is_clean() {
        print_clean_system();
        print_skipped(&results.skipped);
        return;
    }

    print_entries(entries);

    let hidden = results.groups.len().saturating_sub(entries.len());
    if hidden > 0 {
        println!(
            "    {} ... and {} smaller groups (raise with {})",
            " ".dimmed(),
            hidden,
            "--limit".cyan()
        );
        println!();
    }

    print_skipped(&results.skipped);

    rule();
    println!(
        "  {} Total reclaimable: {}",
        "💾",
        format_kb_colored(results.total_kb)
    );
    println!(
        "  {} Run {} to preview, then {} to clean",
        "💡",
        "spacesweep clean --dry-run".cyan(),
        "spacesweep clean".cyan()
    );
    println!();
}

fn print_entries(entries: &[RankedEntry]) {
    println!(
        "  {:>4}  {:<8}  {:>10}  {:<36} {}",
        "#".dimmed(),
        "Tier".dimmed(),
        "Size".dimmed(),
        "Group".dimmed(),
        "Count".dimmed()
    );
    println!("  {}", "─".repeat(RULE_WIDTH - 4).dimmed());

    for entry in entries {
        println!(
            "  {:>4}  {}  {:>10}  {:<36} {}",
            entry.rank,
            format::format_tier(entry.tier),
            format_kb(entry.group.total_size_kb),
            format::truncate(&entry.group.key, 36),
            format::format_count(entry.group.member_count).dimmed()
        );
    }
    println!();
}

/// One line per ranked entry: size, count, key
pub fn print_ranked_quiet(entries: &[RankedEntry]) {
    for entry in entries {
        println!(
            "{}\t{}\t{}",
            entry.group.total_size_kb, entry.group.member_count, entry.group.key
        );
    }
}

/// Largest-entries listing
pub fn print_largest(root: &Path, report: &LargestReport) {
    println!();
    println!("{}  Largest entries under {}", "📊", format_path(root).bold());
    rule();
    println!();

    if report.entries.is_empty() {
        println!("  Nothing to measure.");
        println!();
        return;
    }

    for entry in &report.entries {
        println!(
            "  {:>4}  {:>10}  {}",
            entry.rank,
            format_kb_colored(entry.group.total_size_kb),
            format_path(Path::new(&entry.group.key))
        );
    }
    println!();
    print_skipped(&report.skipped);
}

fn print_skipped(skipped: &[SkippedPath]) {
    if skipped.is_empty() {
        return;
    }
    println!(
        "  {} {} paths could not be read:",
        "⚠".yellow(),
        skipped.len()
    );
    for s in skipped.iter().take(5) {
        println!(
            "    {} {} {}",
            "→".dimmed(),
            format_path(&s.path).dimmed(),
            format!("({})", s.reason).dimmed()
        );
    }
    if skipped.len() > 5 {
        println!("    ... and {} more (see --verbose)", skipped.len() - 5);
    }
    println!();
}

pub fn print_clean_system() {
    println!("  {} Your system is clean! Nothing to reclaim.", "✨");
    println!();
}

// ─── Clean ────────────────────────────────────────────────────────────────────

/// JSON shape of `clean`
#[derive(Serialize)]
pub struct CleanReport<'a> {
    pub root: &'a Path,
    pub total_freed_kb: u64,
    pub total_reclaimable_kb: u64,
    pub failure_count: usize,
    #[serde(flatten)]
    pub summary: &'a CleanupSummary,
}

impl<'a> CleanReport<'a> {
    pub fn new(root: &'a Path, summary: &'a CleanupSummary) -> Self {
        Self {
            root,
            total_freed_kb: summary.total_freed_kb(),
            total_reclaimable_kb: summary.total_reclaimable_kb(),
            failure_count: summary.failure_count(),
            summary,
        }
    }
}

fn freed_text(report: &SpaceFreedReport) -> String {
    if report.dry_run {
        format!("would free {}", format_kb(report.reclaimable_kb()))
    } else if report.verified_empty && report.freed_kb == 0 {
        "0 B (verified empty)".to_string()
    } else {
        format!("freed {}", format_kb(report.freed_kb))
    }
}

fn print_outcome(outcome: &CategoryOutcome, dry_run: bool) {
    let (icon, label) = match outcome.status {
        OutcomeStatus::Completed => ("✓".green(), outcome.subject.bold()),
        OutcomeStatus::CompletedWithWarnings => ("⚠".yellow(), outcome.subject.yellow().bold()),
        OutcomeStatus::Failed => ("✗".red(), outcome.subject.red().bold()),
        OutcomeStatus::Skipped => ("–".dimmed(), outcome.subject.dimmed()),
        OutcomeStatus::Interrupted => ("⏹".yellow(), outcome.subject.dimmed()),
    };

    if matches!(outcome.status, OutcomeStatus::Skipped | OutcomeStatus::Interrupted) {
        println!("  {} {} {}", icon, label, outcome.status.to_string().dimmed());
        return;
    }

    let total = if dry_run {
        format!("would free {}", format_kb(outcome.reclaimable_kb()))
    } else {
        format!("freed {}", format_kb(outcome.freed_kb()))
    };
    println!(
        "  {} {}  {}  ({}, {})",
        icon,
        label,
        total.cyan(),
        format::format_count(outcome.reports.len()),
        outcome.status
    );

    for report in &outcome.reports {
        println!(
            "      {} {}  {}",
            "↳".dimmed(),
            format_path(&report.path).dimmed(),
            freed_text(report).dimmed()
        );
    }

    let failures: Vec<_> = outcome.failures().collect();
    for failure in failures.iter().take(10) {
        println!("      {} {}", "⚠".yellow(), failure.reason.dimmed());
    }
    if failures.len() > 10 {
        println!("      ... and {} more", failures.len() - 10);
    }
}

/// Per-category results plus the final summary
pub fn print_cleanup_summary(summary: &CleanupSummary) {
    println!();
    if summary.clean_system {
        print_clean_system();
        return;
    }
    if summary.interrupted && summary.outcomes.is_empty() {
        println!(
            "  {} Interrupted before cleanup; nothing was deleted.",
            "⚠".yellow()
        );
        println!();
        return;
    }

    let title = if summary.dry_run { "Dry run" } else { "Cleanup" };
    println!("{}  {}", "🧹", title.bold());
    rule();
    for outcome in &summary.outcomes {
        print_outcome(outcome, summary.dry_run);
    }
    rule();

    if summary.dry_run {
        println!(
            "  {} Would free {} {}",
            "ℹ️",
            format_kb_colored(summary.total_reclaimable_kb()),
            "(dry run, nothing was deleted)".dimmed()
        );
    } else {
        println!(
            "  {} Freed {}",
            "💾",
            format_kb_colored(summary.total_freed_kb())
        );
    }

    let failures = summary.failure_count();
    if failures > 0 {
        println!(
            "  {} {} entries could not be removed",
            "⚠".yellow(),
            failures
        );
        let denied = summary
            .outcomes
            .iter()
            .flat_map(|o| o.failures())
            .any(|f| f.permission_denied);
        if denied {
            println!("  {} Retry with {}", "💡", "--elevated".cyan());
        }
    }
    if summary.interrupted {
        println!("  {} Interrupted; remaining categories were not touched.", "⚠".yellow());
    }
    println!();
}

/// Freed (or would-free) KB and failure count on one line
pub fn print_cleanup_quiet(summary: &CleanupSummary) {
    let kb = if summary.dry_run {
        summary.total_reclaimable_kb()
    } else {
        summary.total_freed_kb()
    };
    println!("{}\t{}", kb, summary.failure_count());
}

// ─── Patterns & config ────────────────────────────────────────────────────────

pub fn print_patterns(patterns: &[ArtifactPattern], default_floor_kb: u64) {
    println!();
    println!("{}  Artifact patterns", "📋");
    rule();
    println!(
        "  {:<26} {:<9} {:<36} {:>9}",
        "Name".dimmed(),
        "Kind".dimmed(),
        "Matches".dimmed(),
        "Floor".dimmed()
    );

    let mut current = None;
    for pattern in patterns {
        if current != Some(pattern.category) {
            current = Some(pattern.category);
            println!();
            println!(
                "  {} {}",
                pattern.category.to_string().bold(),
                pattern.category.description().dimmed()
            );
        }
        let elevated = if pattern.requires_elevation {
            " (elevated)".red().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:<26} {:<9} {:<36} {:>9}{}",
            format::truncate(&pattern.name, 26),
            pattern.kind.label(),
            format::truncate(pattern.kind.text(), 36),
            format_kb(pattern.floor_kb(default_floor_kb)),
            elevated
        );
    }
    println!();
}
