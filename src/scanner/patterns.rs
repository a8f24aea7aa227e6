use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::common::errors::SweepError;

// ─── Core types ───────────────────────────────────────────────────────────────

/// Cleanup category. Categories are confirmed and cleaned one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Installed package folders
    Dependencies,
    /// Compiler and tool build caches
    BuildCache,
    /// Per-user application caches
    UserCache,
    /// Trash / recycle folders
    Trash,
    /// Log files
    Logs,
    /// System-wide caches (elevated only)
    SystemCache,
    #[default]
    Other,
}

impl Category {
    /// One-line description shown when asking for confirmation
    pub fn description(&self) -> &'static str {
        match self {
            Category::Dependencies => {
                "Installed dependency folders, reinstallable from the project's lockfile"
            }
            Category::BuildCache => "Build and tooling caches, regenerated on the next build",
            Category::UserCache => "Per-user application caches, rebuilt on demand",
            Category::Trash => "Items already moved to the trash",
            Category::Logs => "Large log files",
            Category::SystemCache => "System-wide package and application caches",
            Category::Other => "Custom artifact patterns",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Dependencies => write!(f, "Dependencies"),
            Category::BuildCache => write!(f, "Build Caches"),
            Category::UserCache => write!(f, "User Caches"),
            Category::Trash => write!(f, "Trash"),
            Category::Logs => write!(f, "Logs"),
            Category::SystemCache => write!(f, "System Caches"),
            Category::Other => write!(f, "Other"),
        }
    }
}

/// How a pattern finds its matches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// Any entry whose name is exactly this
    DirName(String),
    /// Any entry whose name matches this glob (e.g. `*.log`)
    FileGlob(String),
    /// Any entry whose trailing components are this relative path (e.g. `vendor/bundle`)
    PathSuffix(String),
    /// A fixed location relative to each owner directory (e.g. `.cache`)
    OwnerLocation(String),
}

impl PatternKind {
    pub fn text(&self) -> &str {
        match self {
            PatternKind::DirName(s)
            | PatternKind::FileGlob(s)
            | PatternKind::PathSuffix(s)
            | PatternKind::OwnerLocation(s) => s,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PatternKind::DirName(_) => "name",
            PatternKind::FileGlob(_) => "glob",
            PatternKind::PathSuffix(_) => "suffix",
            PatternKind::OwnerLocation(_) => "location",
        }
    }
}

/// Whether a pattern applies to directories or regular files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AppliesTo {
    #[default]
    Directory,
    File,
}

/// What deleting a match means
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Removal {
    /// Remove the matched path itself
    #[default]
    RemoveEntirely,
    /// Remove the children, keep the container (caches)
    EmptyContents,
    /// Like `EmptyContents`, but relax permissions first and verify emptiness after
    EmptyTrash,
}

/// A named artifact matcher. The built-in catalog is static; config may append more.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactPattern {
    pub name: String,
    pub kind: PatternKind,

    /// Matches smaller than this are noise (test fixtures, empty folders).
    /// `None` uses the configured default floor.
    #[serde(default)]
    pub min_size_kb: Option<u64>,

    #[serde(default)]
    pub applies_to: AppliesTo,

    #[serde(default)]
    pub category: Category,

    /// Only scanned in elevated mode
    #[serde(default)]
    pub requires_elevation: bool,

    #[serde(default)]
    pub removal: Removal,
}

impl ArtifactPattern {
    pub fn new(name: &str, kind: PatternKind, category: Category) -> Self {
        Self {
            name: name.to_string(),
            kind,
            min_size_kb: None,
            applies_to: AppliesTo::Directory,
            category,
            requires_elevation: false,
            removal: Removal::RemoveEntirely,
        }
    }

    /// Pattern matching entries named exactly `name`
    pub fn dir(name: &str, category: Category) -> Self {
        Self::new(name, PatternKind::DirName(name.to_string()), category)
    }

    fn floor(mut self, kb: u64) -> Self {
        self.min_size_kb = Some(kb);
        self
    }

    fn removal(mut self, removal: Removal) -> Self {
        self.removal = removal;
        self
    }

    fn elevated(mut self) -> Self {
        self.requires_elevation = true;
        self
    }

    /// Effective size floor in KB
    pub fn floor_kb(&self, default_kb: u64) -> u64 {
        self.min_size_kb.unwrap_or(default_kb)
    }

    pub fn is_owner_location(&self) -> bool {
        matches!(self.kind, PatternKind::OwnerLocation(_))
    }
}

// ─── Catalog ──────────────────────────────────────────────────────────────────

/// The built-in artifact catalog
pub fn catalog() -> Vec<ArtifactPattern> {
    use Category::*;

    vec![
        // Dependencies
        ArtifactPattern::dir("node_modules", Dependencies).floor(100),
        ArtifactPattern::dir("bower_components", Dependencies).floor(100),
        ArtifactPattern::new(
            "Bundler vendor/bundle",
            PatternKind::PathSuffix("vendor/bundle".into()),
            Dependencies,
        )
        .floor(100),
        ArtifactPattern::dir(".venv", Dependencies).floor(1024),
        // Build caches
        ArtifactPattern::dir("__pycache__", BuildCache),
        ArtifactPattern::dir(".pytest_cache", BuildCache),
        ArtifactPattern::dir(".mypy_cache", BuildCache),
        ArtifactPattern::dir(".tox", BuildCache),
        ArtifactPattern::dir(".gradle", BuildCache),
        ArtifactPattern::dir(".next", BuildCache),
        ArtifactPattern::dir(".nuxt", BuildCache),
        ArtifactPattern::dir(".parcel-cache", BuildCache),
        ArtifactPattern::dir(".turbo", BuildCache),
        ArtifactPattern::new(
            "Xcode DerivedData",
            PatternKind::OwnerLocation("Library/Developer/Xcode/DerivedData".into()),
            BuildCache,
        )
        .removal(Removal::EmptyContents),
        // User caches
        ArtifactPattern::new(
            "User cache (XDG)",
            PatternKind::OwnerLocation(".cache".into()),
            UserCache,
        )
        .floor(1024)
        .removal(Removal::EmptyContents),
        ArtifactPattern::new(
            "User cache (macOS)",
            PatternKind::OwnerLocation("Library/Caches".into()),
            UserCache,
        )
        .floor(1024)
        .removal(Removal::EmptyContents),
        // Trash
        ArtifactPattern::new("Trash (macOS)", PatternKind::OwnerLocation(".Trash".into()), Trash)
            .floor(0)
            .removal(Removal::EmptyTrash),
        ArtifactPattern::new(
            "Trash (freedesktop)",
            PatternKind::OwnerLocation(".local/share/Trash".into()),
            Trash,
        )
        .floor(0)
        .removal(Removal::EmptyTrash),
        // Logs
        ArtifactPattern {
            applies_to: AppliesTo::File,
            ..ArtifactPattern::new("Log files", PatternKind::FileGlob("*.log".into()), Logs)
        }
        .floor(1024),
        // Elevated only
        ArtifactPattern::new(
            "System package cache",
            PatternKind::OwnerLocation("var/cache".into()),
            SystemCache,
        )
        .floor(1024)
        .removal(Removal::EmptyContents)
        .elevated(),
        ArtifactPattern::new(
            "Crash dumps",
            PatternKind::OwnerLocation("var/crash".into()),
            Logs,
        )
        .removal(Removal::EmptyContents)
        .elevated(),
    ]
}

/// The built-in catalog plus user patterns from config
pub fn catalog_with(extra: &[ArtifactPattern]) -> Vec<ArtifactPattern> {
    let mut patterns = catalog();
    patterns.extend(extra.iter().cloned());
    patterns
}

// ─── Matching ─────────────────────────────────────────────────────────────────

/// A pattern ready for matching (globs parsed once)
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub pattern: ArtifactPattern,
    glob: Option<glob::Pattern>,
}

impl CompiledPattern {
    pub fn compile(pattern: ArtifactPattern) -> Result<Self, SweepError> {
        let glob = match &pattern.kind {
            PatternKind::FileGlob(g) => Some(glob::Pattern::new(g).map_err(|e| {
                SweepError::InvalidConfiguration {
                    message: format!("Bad glob '{}' in pattern '{}': {}", g, pattern.name, e),
                }
            })?),
            _ => None,
        };
        Ok(Self { pattern, glob })
    }

    /// Match a walked entry. Owner locations never match here; they're resolved per owner.
    pub fn matches_entry(&self, path: &Path, is_dir: bool) -> bool {
        let wants_dir = self.pattern.applies_to == AppliesTo::Directory;
        if wants_dir != is_dir {
            return false;
        }

        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n,
            None => return false,
        };

        match &self.pattern.kind {
            PatternKind::DirName(exact) => name == exact,
            PatternKind::FileGlob(_) => self.glob.as_ref().is_some_and(|g| g.matches(name)),
            PatternKind::PathSuffix(suffix) => path.ends_with(suffix),
            PatternKind::OwnerLocation(_) => false,
        }
    }

    /// The glob text when this is a glob pattern
    pub fn glob_text(&self) -> Option<&str> {
        match &self.pattern.kind {
            PatternKind::FileGlob(g) => Some(g),
            _ => None,
        }
    }
}

/// Compile a catalog, dropping elevation-only patterns unless `elevated`
pub fn compile_catalog(
    patterns: &[ArtifactPattern],
    elevated: bool,
) -> Result<Vec<CompiledPattern>, SweepError> {
    patterns
        .iter()
        .filter(|p| elevated || !p.requires_elevation)
        .cloned()
        .map(CompiledPattern::compile)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiled(name: &str) -> CompiledPattern {
        let p = catalog().into_iter().find(|p| p.name == name).unwrap();
        CompiledPattern::compile(p).unwrap()
    }

    #[test]
    fn test_dir_name_matches_only_directories() {
        let p = compiled("node_modules");
        assert!(p.matches_entry(Path::new("/a/b/node_modules"), true));
        assert!(!p.matches_entry(Path::new("/a/b/node_modules"), false));
        assert!(!p.matches_entry(Path::new("/a/b/node_modules_old"), true));
    }

    #[test]
    fn test_glob_matches_files() {
        let p = compiled("Log files");
        assert!(p.matches_entry(Path::new("/srv/app/server.log"), false));
        assert!(!p.matches_entry(Path::new("/srv/app/server.log"), true));
        assert!(!p.matches_entry(Path::new("/srv/app/server.txt"), false));
    }

    #[test]
    fn test_path_suffix_matches_components() {
        let p = compiled("Bundler vendor/bundle");
        assert!(p.matches_entry(Path::new("/srv/app/vendor/bundle"), true));
        assert!(!p.matches_entry(Path::new("/srv/app/bundle"), true));
        assert!(!p.matches_entry(Path::new("/srv/app/myvendor/bundle"), true));
    }

    #[test]
    fn test_owner_locations_never_match_walk_entries() {
        let p = compiled("User cache (XDG)");
        assert!(!p.matches_entry(Path::new("/home/me/.cache"), true));
        assert!(p.pattern.is_owner_location());
    }

    #[test]
    fn test_elevated_patterns_filtered() {
        let normal = compile_catalog(&catalog(), false).unwrap();
        let elevated = compile_catalog(&catalog(), true).unwrap();
        assert!(elevated.len() > normal.len());
        assert!(normal.iter().all(|p| !p.pattern.requires_elevation));
    }

    #[test]
    fn test_bad_glob_is_config_error() {
        let bad = ArtifactPattern {
            applies_to: AppliesTo::File,
            ..ArtifactPattern::new("bad", PatternKind::FileGlob("[".into()), Category::Other)
        };
        let err = CompiledPattern::compile(bad).unwrap_err();
        assert!(matches!(err, SweepError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_user_pattern_from_toml() {
        let toml_str = r#"
            name = "elm-stuff"
            kind = { dir_name = "elm-stuff" }
            min_size_kb = 10
            category = "build_cache"
        "#;
        let p: ArtifactPattern = toml::from_str(toml_str).unwrap();
        assert_eq!(p.kind, PatternKind::DirName("elm-stuff".into()));
        assert_eq!(p.category, Category::BuildCache);
        assert_eq!(p.removal, Removal::RemoveEntirely);
        assert_eq!(p.floor_kb(100), 10);
    }
}
