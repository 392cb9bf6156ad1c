//! Reverse token index
//!
//! Maps a token hash to the sorted positions of the filters indexed under
//! it. Filters without a usable token live in a catch-all list that every
//! lookup visits.

use std::collections::HashMap;

use crate::hash::hash_token;

/// Tokens so common in URLs that indexing under them buys nothing.
const BAD_TOKENS: &[&str] = &["http", "https", "www", "com", "js"];

/// Extra weight given to [`BAD_TOKENS`] when picking a bucket.
const BAD_TOKEN_PENALTY: u32 = 1 << 20;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReverseIndex {
    buckets: HashMap<u32, Vec<u32>>,
    catch_all: Vec<u32>,
}

impl ReverseIndex {
    /// Build an index from `(position, token groups)` pairs.
    ///
    /// Each group is stored under its least frequent token so buckets stay
    /// small; a filter with several groups lands in several buckets. Empty
    /// groups go to the catch-all list.
    pub fn build(entries: &[(u32, Vec<Vec<u32>>)]) -> Self {
        let mut histogram: HashMap<u32, u32> = HashMap::new();
        for (_, groups) in entries {
            for token in groups.iter().flatten() {
                *histogram.entry(*token).or_insert(0) += 1;
            }
        }
        for bad in BAD_TOKENS {
            if let Some(count) = histogram.get_mut(&hash_token(bad)) {
                *count = count.saturating_add(BAD_TOKEN_PENALTY);
            }
        }

        let mut index = Self::default();
        for (position, groups) in entries {
            if groups.is_empty() {
                index.catch_all.push(*position);
                continue;
            }
            for group in groups {
                let best = group
                    .iter()
                    .copied()
                    .min_by_key(|token| histogram.get(token).copied().unwrap_or(0));
                match best {
                    Some(token) => index.buckets.entry(token).or_default().push(*position),
                    None => index.catch_all.push(*position),
                }
            }
        }

        for postings in index.buckets.values_mut() {
            postings.sort_unstable();
            postings.dedup();
        }
        index.catch_all.sort_unstable();
        index.catch_all.dedup();

        index
    }

    /// Rebuild an index from stored buckets.
    pub fn from_parts(buckets: HashMap<u32, Vec<u32>>, catch_all: Vec<u32>) -> Self {
        Self { buckets, catch_all }
    }

    /// Append the positions of every filter that may match `tokens`,
    /// in no particular order and possibly repeated.
    pub fn collect_candidates(&self, tokens: &[u32], out: &mut Vec<u32>) {
        for token in tokens {
            if let Some(postings) = self.buckets.get(token) {
                out.extend_from_slice(postings);
            }
        }
        out.extend_from_slice(&self.catch_all);
    }

    /// Candidate positions for `tokens`, ascending and de-duplicated.
    pub fn candidates(&self, tokens: &[u32]) -> Vec<u32> {
        let mut out = Vec::new();
        self.collect_candidates(tokens, &mut out);
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Buckets ordered by token, for deterministic serialization.
    pub fn sorted_buckets(&self) -> Vec<(u32, &[u32])> {
        let mut buckets: Vec<(u32, &[u32])> = self
            .buckets
            .iter()
            .map(|(token, postings)| (*token, postings.as_slice()))
            .collect();
        buckets.sort_unstable_by_key(|(token, _)| *token);
        buckets
    }

    pub fn catch_all(&self) -> &[u32] {
        &self.catch_all
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty() && self.catch_all.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picks_least_frequent_token() {
        let common = hash_token("ads");
        let rare_a = hash_token("banner");
        let rare_b = hash_token("popup");
        let index = ReverseIndex::build(&[
            (0, vec![vec![common, rare_a]]),
            (1, vec![vec![common, rare_b]]),
            (2, vec![vec![common]]),
        ]);

        assert_eq!(index.sorted_buckets().len(), 3);
        assert_eq!(index.candidates(&[rare_a]), vec![0]);
        assert_eq!(index.candidates(&[rare_b]), vec![1]);
        assert_eq!(index.candidates(&[common]), vec![2]);
    }

    #[test]
    fn test_bad_tokens_are_avoided() {
        let com = hash_token("com");
        let tracker = hash_token("tracker");
        let index = ReverseIndex::build(&[(0, vec![vec![com, tracker]])]);
        assert_eq!(index.candidates(&[tracker]), vec![0]);
        assert!(index.candidates(&[com]).is_empty());
    }

    #[test]
    fn test_catch_all_always_visited() {
        let index = ReverseIndex::build(&[(0, vec![vec![]]), (1, vec![]), (2, vec![vec![7]])]);
        assert_eq!(index.catch_all(), &[0, 1]);
        assert_eq!(index.candidates(&[]), vec![0, 1]);
        assert_eq!(index.candidates(&[7]), vec![0, 1, 2]);
    }

    #[test]
    fn test_filter_with_several_groups() {
        let index = ReverseIndex::build(&[(4, vec![vec![10], vec![20]])]);
        assert_eq!(index.candidates(&[10]), vec![4]);
        assert_eq!(index.candidates(&[20]), vec![4]);
        assert_eq!(index.candidates(&[10, 20]), vec![4]);
    }

    #[test]
    fn test_sorted_buckets_are_ordered() {
        let index = ReverseIndex::build(&[(0, vec![vec![30]]), (1, vec![vec![10]]), (2, vec![vec![20]])]);
        let tokens: Vec<u32> = index.sorted_buckets().iter().map(|(token, _)| *token).collect();
        assert_eq!(tokens, vec![10, 20, 30]);
    }
}
