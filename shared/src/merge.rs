use std::collections::HashSet;

use crate::banner::{Banner, BannerId};

/// Merge banner result sets into one list, keeping the first occurrence of
/// each id, then stable-sort by title.
///
/// The output only depends on the set of banners, not on which set delivered
/// a banner first, as long as duplicate ids carry identical attributes.
pub fn merge_banners<I>(sets: I) -> Vec<Banner>
where
    I: IntoIterator<Item = Vec<Banner>>,
{
    let mut seen: HashSet<BannerId> = HashSet::new();
    let mut merged = Vec::new();
    for set in sets {
        for banner in set {
            if seen.insert(banner.id) {
                merged.push(banner);
            }
        }
    }
    sort_by_title(&mut merged);
    merged
}

/// Merge `extra` into an already merged list.
pub fn extend_sorted(current: Vec<Banner>, extra: Vec<Banner>) -> Vec<Banner> {
    merge_banners([current, extra])
}

fn sort_by_title(banners: &mut [Banner]) {
    // `sort_by` is stable, so equal titles keep insertion order.
    banners.sort_by(|a, b| a.title.cmp(&b.title));
}
