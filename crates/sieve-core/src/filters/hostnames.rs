//! Lazily parsed hostname restriction lists.

use std::sync::OnceLock;

use crate::domain::host_matches_domain;

/// A comma-joined list of hostnames, optionally negated with `~`.
///
/// The raw text is kept as the canonical form. The split list is built on
/// first use and ordered by descending length, so the most specific entry
/// that matches a hostname is always found first.
#[derive(Debug, Default)]
pub struct HostnameList {
    raw: String,
    sorted: OnceLock<Vec<(usize, usize)>>,
}

impl HostnameList {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            sorted: OnceLock::new(),
        }
    }

    /// The comma-joined source text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn ranges(&self) -> &[(usize, usize)] {
        self.sorted.get_or_init(|| {
            let mut ranges = Vec::new();
            let mut start = 0;
            for part in self.raw.split(',') {
                if !part.is_empty() {
                    ranges.push((start, start + part.len()));
                }
                start += part.len() + 1;
            }
            // Stable: entries of equal length keep their source order.
            ranges.sort_by(|a, b| (b.1 - b.0).cmp(&(a.1 - a.0)));
            ranges
        })
    }

    /// Entries, longest first, with `~` prefixes preserved.
    pub fn entries(&self) -> impl Iterator<Item = &str> + '_ {
        self.ranges().iter().map(move |&(start, end)| &self.raw[start..end])
    }

    /// Non-negated entries, longest first.
    pub fn positive(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries().filter(|entry| !entry.starts_with('~'))
    }

    pub fn has_positive(&self) -> bool {
        self.positive().next().is_some()
    }

    /// Check whether `hostname` passes this restriction.
    ///
    /// The longest entry covering the hostname decides: a positive entry
    /// admits it, a negated one rejects it. When no entry covers it, only
    /// lists made purely of negations admit it.
    pub fn matches(&self, hostname: &str) -> bool {
        let mut has_positive = false;
        for entry in self.entries() {
            match entry.strip_prefix('~') {
                Some(negated) => {
                    if host_matches_domain(hostname, negated) {
                        return false;
                    }
                }
                None => {
                    has_positive = true;
                    if host_matches_domain(hostname, entry) {
                        return true;
                    }
                }
            }
        }
        !has_positive
    }
}

impl Clone for HostnameList {
    fn clone(&self) -> Self {
        Self::new(self.raw.clone())
    }
}

impl PartialEq for HostnameList {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for HostnameList {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_sorted_by_length_descending() {
        let list = HostnameList::new("a.com,longer.com,b.com,~neg.example.com");
        let entries: Vec<&str> = list.entries().collect();
        assert_eq!(entries, vec!["~neg.example.com", "longer.com", "a.com", "b.com"]);
    }

    #[test]
    fn test_positive_entries() {
        let list = HostnameList::new("a.com,~b.com");
        assert_eq!(list.positive().collect::<Vec<_>>(), vec!["a.com"]);
        assert!(list.has_positive());
        assert!(!HostnameList::new("~a.com").has_positive());
    }

    #[test]
    fn test_matches_positive() {
        let list = HostnameList::new("example.com,other.org");
        assert!(list.matches("example.com"));
        assert!(list.matches("www.example.com"));
        assert!(list.matches("other.org"));
        assert!(!list.matches("notexample.com"));
    }

    #[test]
    fn test_matches_negated_only() {
        let list = HostnameList::new("~example.com");
        assert!(!list.matches("example.com"));
        assert!(!list.matches("a.example.com"));
        assert!(list.matches("site.com"));
    }

    #[test]
    fn test_matches_mixed_prefers_specific() {
        let list = HostnameList::new("example.com,~sub.example.com");
        assert!(list.matches("example.com"));
        assert!(!list.matches("sub.example.com"));
        assert!(!list.matches("site.com"));

        let list = HostnameList::new("~example.com,sub.example.com");
        assert!(list.matches("sub.example.com"));
        assert!(!list.matches("www.example.com"));
    }
}
