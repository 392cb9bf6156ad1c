//! List-level clean-up between parsing and indexing: `$badfilter`
//! cancellation and removal of duplicate filters.

use std::collections::HashSet;

use sieve_core::filters::{CosmeticFilter, Filter, NetworkFilter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptimizeStats {
    pub before: usize,
    pub after: usize,
    pub deduped: usize,
    pub badfilter_rules: usize,
    pub badfiltered_rules: usize,
}

/// Drop `$badfilter` filters together with the filters they cancel, then
/// drop filters whose id was already seen. The first occurrence is kept.
pub fn optimize_filters(network: &mut Vec<NetworkFilter>, cosmetic: &mut Vec<CosmeticFilter>) -> OptimizeStats {
    let before = network.len() + cosmetic.len();

    let badfilter_ids: HashSet<u32> = network
        .iter()
        .filter(|filter| filter.is_badfilter())
        .map(NetworkFilter::id_without_badfilter)
        .collect();
    let badfilter_rules = network.iter().filter(|filter| filter.is_badfilter()).count();

    let mut badfiltered_rules = 0usize;
    network.retain(|filter| {
        if filter.is_badfilter() {
            return false;
        }
        if badfilter_ids.contains(&filter.id()) {
            badfiltered_rules += 1;
            return false;
        }
        true
    });
    if badfiltered_rules > 0 {
        log::warn!(
            "$badfilter removed {} filters ({} badfilter rules)",
            badfiltered_rules,
            badfilter_rules
        );
    }

    let mut deduped = 0usize;
    let mut seen: HashSet<u32> = HashSet::new();
    network.retain(|filter| {
        let fresh = seen.insert(filter.id());
        if !fresh {
            deduped += 1;
        }
        fresh
    });
    seen.clear();
    cosmetic.retain(|filter| {
        let fresh = seen.insert(filter.id());
        if !fresh {
            deduped += 1;
        }
        fresh
    });

    let after = network.len() + cosmetic.len();
    log::debug!("optimized filters: {before} -> {after} ({deduped} duplicates)");

    OptimizeStats {
        before,
        after,
        deduped,
        badfilter_rules,
        badfiltered_rules,
    }
}
