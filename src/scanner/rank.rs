use serde::Serialize;

use super::aggregate::GroupAggregate;

/// Smallest and largest number of ranked entries we will display
pub const MIN_DISPLAY_LIMIT: usize = 10;
pub const MAX_DISPLAY_LIMIT: usize = 500;

/// Presentation bucket derived from rank position, not absolute size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Urgent,
    Moderate,
    Informational,
}

impl Tier {
    /// Tier for a 1-based rank among `n` entries.
    /// Urgent: top ⌈n/5⌉. Moderate: up to ⌈n/2⌉. The rest informational.
    pub fn for_rank(rank: usize, n: usize) -> Self {
        if rank <= n.div_ceil(5) {
            Tier::Urgent
        } else if rank <= n.div_ceil(2) {
            Tier::Moderate
        } else {
            Tier::Informational
        }
    }
}

/// A group with its position in the listing
#[derive(Debug, Clone, Serialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub tier: Tier,
    #[serde(flatten)]
    pub group: GroupAggregate,
}

/// Out-of-range display counts are clamped, never rejected
pub fn clamp_display_limit(limit: usize) -> usize {
    limit.clamp(MIN_DISPLAY_LIMIT, MAX_DISPLAY_LIMIT)
}

/// Sort groups by size (desc, ties by key asc), keep the top `display_limit`
/// (after clamping) and assign contiguous ranks and tiers.
pub fn rank(mut groups: Vec<GroupAggregate>, display_limit: usize) -> Vec<RankedEntry> {
    groups.sort_by(|a, b| {
        b.total_size_kb
            .cmp(&a.total_size_kb)
            .then_with(|| a.key.cmp(&b.key))
            .then_with(|| a.category.cmp(&b.category))
    });
    groups.truncate(clamp_display_limit(display_limit));

    let n = groups.len();
    groups
        .into_iter()
        .enumerate()
        .map(|(i, group)| RankedEntry {
            rank: i + 1,
            tier: Tier::for_rank(i + 1, n),
            group,
        })
        .collect()
}
