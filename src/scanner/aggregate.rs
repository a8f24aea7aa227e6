use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::patterns::Category;
use super::walker::MatchRecord;

/// Multi-segment identities whose terminal name is ambiguous on its own.
/// A path ending in the given components, matched in the given category,
/// aggregates under the given key.
pub const KEY_RULES: &[(&str, &str, Category)] = &[
    ("vendor/bundle", "vendor/bundle", Category::Dependencies),
    (
        "Library/Developer/Xcode/DerivedData",
        "Xcode DerivedData",
        Category::BuildCache,
    ),
    (".local/share/Trash", "Trash", Category::Trash),
    (".Trash", "Trash", Category::Trash),
    ("Library/Caches", "User cache", Category::UserCache),
    (".cache", "User cache", Category::UserCache),
];

/// Logical identity of a match: what it *is*, not where it lives
pub fn group_key(record: &MatchRecord) -> String {
    group_key_for(&record.path, record.glob.as_deref(), record.category)
}

/// Key derivation on raw parts: special-cased suffixes of the same category
/// first, then the glob that matched (so `a.log` and `b.log` land together),
/// then the last component.
pub fn group_key_for(path: &Path, glob: Option<&str>, category: Category) -> String {
    if let Some((_, key, _)) = KEY_RULES
        .iter()
        .find(|(suffix, _, rule_category)| *rule_category == category && path.ends_with(suffix))
    {
        return key.to_string();
    }
    if let Some(glob) = glob {
        return glob.to_string();
    }
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// All matches sharing one logical key
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroupAggregate {
    pub key: String,
    pub category: Category,
    pub total_size_kb: u64,
    pub member_count: usize,
    pub member_paths: Vec<PathBuf>,
}

impl GroupAggregate {
    fn new(key: String, category: Category) -> Self {
        Self {
            key,
            category,
            total_size_kb: 0,
            member_count: 0,
            member_paths: Vec::new(),
        }
    }

    fn absorb(&mut self, path: PathBuf, size_kb: u64) {
        self.total_size_kb = self.total_size_kb.saturating_add(size_kb);
        self.member_count += 1;
        self.member_paths.push(path);
    }

    /// A single-member group, used for the largest-entries view
    pub fn single(key: String, category: Category, path: PathBuf, size_kb: u64) -> Self {
        let mut group = Self::new(key, category);
        group.absorb(path, size_kb);
        group
    }
}

/// Fold match records into per-key totals. A group never spans categories, so
/// a user pattern that shares a key with a catalog pattern stays separate.
/// Output order is unspecified.
pub fn aggregate<'a, I>(records: I) -> Vec<GroupAggregate>
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    records
        .into_iter()
        .fold(HashMap::<(Category, String), GroupAggregate>::new(), |mut acc, record| {
            let key = group_key(record);
            acc.entry((record.category, key.clone()))
                .or_insert_with(|| GroupAggregate::new(key, record.category))
                .absorb(record.path.clone(), record.size_kb);
            acc
        })
        .into_values()
        .collect()
}
