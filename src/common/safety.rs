use std::path::Path;

/// Paths that must NEVER be deleted under any circumstances.
/// This is a critical safety net against overly broad patterns.
const PROTECTED_PATHS: &[&str] = &[
    "/",
    "/System",
    "/System/Volumes/Data",
    "/Applications",
    "/Users",
    "/Library",
    "/home",
    "/root",
    "/usr",
    "/bin",
    "/sbin",
    "/lib",
    "/boot",
    "/var",
    "/etc",
    "/opt",
    "/private",
    "/Volumes",
];

/// Paths under home that must never be deleted entirely
const PROTECTED_HOME_DIRS: &[&str] = &[
    "", // home dir itself
    "Desktop",
    "Documents",
    "Downloads",
    "Pictures",
    "Music",
    "Movies",
    "Library",
    ".ssh",
    ".gnupg",
];

/// Check if a path is protected and should NEVER be deleted
pub fn is_protected(path: &Path) -> bool {
    if PROTECTED_PATHS.iter().any(|p| path == Path::new(p)) {
        return true;
    }

    if let Some(home) = dirs::home_dir() {
        for dir in PROTECTED_HOME_DIRS {
            let protected_path = if dir.is_empty() {
                home.clone()
            } else {
                home.join(dir)
            };
            if path == protected_path {
                return true;
            }
        }
    }

    false
}

/// Check that `path` may be removed while cleaning below `root`: it must lie
/// strictly inside the root and must not be protected.
pub fn is_deletable_under(path: &Path, root: &Path) -> bool {
    path != root && path.starts_with(root) && !is_protected(path)
}
