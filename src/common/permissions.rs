use std::path::Path;

/// System locations that are only readable with elevated privileges
const PRIVILEGED_PATHS: &[&str] = &[
    "/var/log",
    "/var/lib",
    "/private/var",
    "/Library/Caches",
    "/Library/Logs",
    "/root",
];

/// Check if a path usually needs elevated privileges to read or modify
pub fn requires_elevation(path: &Path) -> bool {
    PRIVILEGED_PATHS.iter().any(|p| path.starts_with(p))
}

/// Check if we can read a path
pub fn can_read(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(m) if m.is_dir() => std::fs::read_dir(path).is_ok(),
        Ok(_) => std::fs::File::open(path).is_ok(),
        Err(_) => false,
    }
}

/// Get a helpful message for permission issues
pub fn permission_hint(path: &Path) -> String {
    if requires_elevation(path) {
        format!(
            "'{}' is a protected system location. Retry with --elevated (e.g. under sudo).",
            path.display()
        )
    } else {
        format!(
            "Check file permissions for '{}', or retry with --elevated.",
            path.display()
        )
    }
}

/// Recursively grant the owner write access to every entry below `path`.
///
/// Applications often leave read-only items in trash folders; a read-only
/// directory blocks removal of its children. Returns the number of entries
/// whose permissions could not be changed.
pub fn relax_permissions(path: &Path) -> usize {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(_) => return 1,
    };
    if metadata.file_type().is_symlink() {
        return 0;
    }

    let mut failures = 0;
    // parent first, so a locked directory becomes listable before we descend
    if let Err(e) = make_writable(path) {
        tracing::debug!(path = %path.display(), error = %e, "could not relax permissions");
        failures += 1;
    }

    if metadata.is_dir() {
        match std::fs::read_dir(path) {
            Ok(entries) => {
                for entry in entries.filter_map(|e| e.ok()) {
                    failures += relax_permissions(&entry.path());
                }
            }
            Err(_) => failures += 1,
        }
    }

    failures
}

#[cfg(unix)]
fn make_writable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::symlink_metadata(path)?;
    let mut perms = metadata.permissions();
    let mode = perms.mode();
    // owner rwx on dirs so the walk can descend, owner rw on files
    let wanted = if metadata.is_dir() { mode | 0o700 } else { mode | 0o600 };
    if wanted != mode {
        perms.set_mode(wanted);
        std::fs::set_permissions(path, perms)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn make_writable(path: &Path) -> std::io::Result<()> {
    let mut perms = std::fs::symlink_metadata(path)?.permissions();
    if perms.readonly() {
        #[allow(clippy::permissions_set_readonly_false)]
        perms.set_readonly(false);
        std::fs::set_permissions(path, perms)?;
    }
    Ok(())
}
