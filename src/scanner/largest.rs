use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::aggregate::GroupAggregate;
use super::patterns::Category;
use super::rank::{self, RankedEntry};
use super::size;
use super::walker::SkippedPath;

/// The biggest directories and files at one depth below a root
#[derive(Debug, Clone, Default, Serialize)]
pub struct LargestReport {
    pub entries: Vec<RankedEntry>,
    pub skipped: Vec<SkippedPath>,
}

/// Measure every entry exactly `depth` levels below `root` and rank them.
///
/// Each entry becomes a one-member group keyed by its path, so ranking and
/// tiers behave the same as for artifact groups.
pub fn find_largest(root: &Path, depth: usize, display_limit: usize) -> LargestReport {
    let depth = depth.max(1);
    let mut skipped = Vec::new();
    let mut paths: Vec<PathBuf> = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .min_depth(depth)
        .max_depth(depth)
    {
        match entry {
            Ok(e) => paths.push(e.into_path()),
            Err(err) => skipped.push(SkippedPath {
                path: err.path().map(Path::to_path_buf).unwrap_or_default(),
                reason: err.to_string(),
            }),
        }
    }

    let groups: Vec<GroupAggregate> = paths
        .into_par_iter()
        .filter_map(|path| {
            let kb = size::measure(&path)?;
            let key = path.display().to_string();
            Some(GroupAggregate::single(key, Category::Other, path, kb))
        })
        .collect();

    LargestReport {
        entries: rank::rank(groups, display_limit),
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ranks_children_by_size() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("big/inner")).unwrap();
        std::fs::create_dir_all(root.join("small")).unwrap();
        std::fs::write(root.join("big/inner/blob"), vec![0u8; 64 * 1024]).unwrap();
        std::fs::write(root.join("small/file"), vec![0u8; 1024]).unwrap();
        std::fs::write(root.join("loose.bin"), vec![0u8; 8 * 1024]).unwrap();

        let report = find_largest(root, 1, 10);
        let order: Vec<_> = report
            .entries
            .iter()
            .map(|e| e.group.member_paths[0].clone())
            .collect();
        assert_eq!(
            order,
            vec![root.join("big"), root.join("loose.bin"), root.join("small")]
        );
        assert_eq!(report.entries[0].group.total_size_kb, 64);
    }

    #[test]
    fn test_deeper_level() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("a/b")).unwrap();
        std::fs::write(root.join("a/b/f"), vec![0u8; 2048]).unwrap();

        let report = find_largest(root, 2, 10);
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].group.member_paths[0], root.join("a/b"));
    }
}
