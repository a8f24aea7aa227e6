use std::path::Path;

use super::executor::{DeletionExecutor, DeletionFailure, Remover};
use crate::common::permissions;
use crate::scanner::size;

/// Empty a trash container.
///
/// Trash items are often read-only, so permissions are relaxed first. Returns
/// whether the container was verified empty afterwards; size accounting on
/// some filesystems lags the removal, so emptiness is the success signal.
pub(super) fn empty_trash<R: Remover>(
    executor: &DeletionExecutor<R>,
    path: &Path,
    failures: &mut Vec<DeletionFailure>,
) -> bool {
    let unrelaxed = permissions::relax_permissions(path);
    if unrelaxed > 0 {
        tracing::debug!(path = %path.display(), unrelaxed, "some trash entries kept their permissions");
    }

    executor.empty_dir(path, failures);

    let residual = size::count_entries(path);
    if residual > 0 {
        tracing::info!(
            target: "spacesweep::audit",
            path = %path.display(),
            residual,
            "trash not fully emptied"
        );
    }
    residual == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::executor::{DeletionTarget, OutcomeStatus};
    use crate::scanner::patterns::Removal;
    use tempfile::TempDir;

    #[cfg(unix)]
    fn make_read_only(path: &Path) {
        use std::os::unix::fs::PermissionsExt;
        let mode = if path.is_dir() { 0o555 } else { 0o444 };
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).unwrap();
    }

    #[cfg(not(unix))]
    fn make_read_only(path: &Path) {
        let mut perms = std::fs::metadata(path).unwrap().permissions();
        perms.set_readonly(true);
        std::fs::set_permissions(path, perms).unwrap();
    }

    #[test]
    fn test_trash_with_read_only_items_is_emptied_and_verified() {
        let dir = TempDir::new().unwrap();
        let trash = dir.path().join(".Trash");
        std::fs::create_dir(&trash).unwrap();

        for i in 0..8 {
            std::fs::write(trash.join(format!("item{i}.txt")), "x").unwrap();
        }
        let ro_file = trash.join("readonly.txt");
        std::fs::write(&ro_file, "x").unwrap();
        make_read_only(&ro_file);
        let ro_dir = trash.join("readonly-dir");
        std::fs::create_dir(&ro_dir).unwrap();
        std::fs::write(ro_dir.join("inner.txt"), "x").unwrap();
        make_read_only(&ro_dir);

        assert_eq!(std::fs::read_dir(&trash).unwrap().count(), 10);

        let exec = DeletionExecutor::new(dir.path(), false);
        let outcome = exec.execute_all(
            "Trash",
            &[DeletionTarget {
                path: trash.clone(),
                removal: Removal::EmptyTrash,
            }],
        );

        let report = &outcome.reports[0];
        assert!(trash.is_dir());
        assert_eq!(size::count_entries(&trash), 0);
        assert!(report.verified_empty);
        assert!(report.succeeded());
        // ten one-byte files: the whole trash is under 1 KB
        assert!(report.before_kb <= 1);
        assert_eq!(outcome.status, OutcomeStatus::Completed);
    }

    #[test]
    fn test_dry_run_leaves_trash_alone() {
        let dir = TempDir::new().unwrap();
        let trash = dir.path().join(".Trash");
        std::fs::create_dir(&trash).unwrap();
        std::fs::write(trash.join("a"), "x").unwrap();

        let exec = DeletionExecutor::new(dir.path(), true);
        let report = exec.execute(&DeletionTarget {
            path: trash.clone(),
            removal: Removal::EmptyTrash,
        });
        assert!(trash.join("a").exists());
        assert!(!report.verified_empty);
        assert_eq!(report.freed_kb, 0);
    }
}
