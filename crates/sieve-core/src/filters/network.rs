//! Network (request) filters.

use std::fmt;
use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};

use crate::bits::TokenBuffer;
use crate::domain::host_matches_domain;
use crate::hash::{hash_token, FilterIdHasher};
use crate::tokenizer::tokenize_pattern;
use crate::types::{Request, RequestType};
use crate::url::{host_range, is_separator};

use super::{Filter, FilterKind, HostnameList};

bitflags::bitflags! {
    /// Option bits of a network filter.
    ///
    /// The low 16 bits are the request types the filter applies to and use
    /// the same layout as [`RequestType`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NetworkFilterMask: u32 {
        const FROM_ANY = RequestType::ALL.bits();

        const FIRST_PARTY = 1 << 16;
        const THIRD_PARTY = 1 << 17;
        /// `@@` exception
        const IS_EXCEPTION = 1 << 18;
        /// `|pattern`
        const IS_LEFT_ANCHOR = 1 << 19;
        /// `pattern|`
        const IS_RIGHT_ANCHOR = 1 << 20;
        /// `||pattern`
        const IS_HOSTNAME_ANCHOR = 1 << 21;
        /// `/pattern/`
        const IS_REGEX = 1 << 22;
        /// `$match-case`
        const MATCH_CASE = 1 << 23;
        /// `$csp=...`
        const IS_CSP = 1 << 24;
        /// `$redirect=...`
        const IS_REDIRECT = 1 << 25;
        /// `$redirect-rule=...`
        const IS_REDIRECT_RULE = 1 << 26;
        /// `$badfilter`
        const IS_BADFILTER = 1 << 27;

        const ANY_PARTY = Self::FIRST_PARTY.bits() | Self::THIRD_PARTY.bits();
        /// Mask of a filter without options.
        const DEFAULT = Self::FROM_ANY.bits() | Self::ANY_PARTY.bits();
    }
}

/// A parsed network filter.
///
/// `pattern` holds the URL pattern without its anchors: a literal with `*`
/// wildcards and `^` separators, or a regex source when `IS_REGEX` is set.
#[derive(Debug)]
pub struct NetworkFilter {
    mask: NetworkFilterMask,
    pattern: String,
    domains: Option<HostnameList>,
    denyallow: Option<HostnameList>,
    option_value: Option<String>,
    raw_line: Option<String>,
    id: OnceLock<u32>,
    regex: OnceLock<Option<Regex>>,
}

impl NetworkFilter {
    pub fn new(mask: NetworkFilterMask, pattern: impl Into<String>) -> Self {
        Self {
            mask,
            pattern: pattern.into(),
            domains: None,
            denyallow: None,
            option_value: None,
            raw_line: None,
            id: OnceLock::new(),
            regex: OnceLock::new(),
        }
    }

    /// Restrict to source hostnames (`domain=`), given comma-joined.
    pub fn with_domains(mut self, domains: Option<String>) -> Self {
        self.domains = domains.map(HostnameList::new);
        self
    }

    /// Exclude request hostnames (`denyallow=`), given comma-joined.
    pub fn with_denyallow(mut self, denyallow: Option<String>) -> Self {
        self.denyallow = denyallow.map(HostnameList::new);
        self
    }

    /// Value of `redirect=`, `redirect-rule=` or `csp=`.
    pub fn with_option_value(mut self, value: Option<String>) -> Self {
        self.option_value = value;
        self
    }

    pub fn with_raw_line(mut self, raw_line: impl Into<String>) -> Self {
        self.raw_line = Some(raw_line.into());
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn mask(&self) -> NetworkFilterMask {
        self.mask
    }

    #[inline]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn domains(&self) -> Option<&HostnameList> {
        self.domains.as_ref()
    }

    pub fn denyallow(&self) -> Option<&HostnameList> {
        self.denyallow.as_ref()
    }

    pub fn option_value(&self) -> Option<&str> {
        self.option_value.as_deref()
    }

    pub fn raw_line(&self) -> Option<&str> {
        self.raw_line.as_deref()
    }

    #[inline]
    pub fn request_types(&self) -> RequestType {
        RequestType::from_bits_truncate(self.mask.bits())
    }

    #[inline]
    pub fn is_exception(&self) -> bool {
        self.mask.contains(NetworkFilterMask::IS_EXCEPTION)
    }

    #[inline]
    pub fn is_left_anchor(&self) -> bool {
        self.mask.contains(NetworkFilterMask::IS_LEFT_ANCHOR)
    }

    #[inline]
    pub fn is_right_anchor(&self) -> bool {
        self.mask.contains(NetworkFilterMask::IS_RIGHT_ANCHOR)
    }

    #[inline]
    pub fn is_hostname_anchor(&self) -> bool {
        self.mask.contains(NetworkFilterMask::IS_HOSTNAME_ANCHOR)
    }

    #[inline]
    pub fn is_regex(&self) -> bool {
        self.mask.contains(NetworkFilterMask::IS_REGEX)
    }

    #[inline]
    pub fn is_match_case(&self) -> bool {
        self.mask.contains(NetworkFilterMask::MATCH_CASE)
    }

    #[inline]
    pub fn is_csp(&self) -> bool {
        self.mask.contains(NetworkFilterMask::IS_CSP)
    }

    #[inline]
    pub fn is_redirect(&self) -> bool {
        self.mask.contains(NetworkFilterMask::IS_REDIRECT)
    }

    #[inline]
    pub fn is_redirect_rule(&self) -> bool {
        self.mask.contains(NetworkFilterMask::IS_REDIRECT_RULE)
    }

    #[inline]
    pub fn is_badfilter(&self) -> bool {
        self.mask.contains(NetworkFilterMask::IS_BADFILTER)
    }

    #[inline]
    pub fn first_party(&self) -> bool {
        self.mask.contains(NetworkFilterMask::FIRST_PARTY)
    }

    #[inline]
    pub fn third_party(&self) -> bool {
        self.mask.contains(NetworkFilterMask::THIRD_PARTY)
    }

    /// Id of the filter a `$badfilter` version of this filter disables.
    pub fn id_without_badfilter(&self) -> u32 {
        self.compute_id(self.mask - NetworkFilterMask::IS_BADFILTER)
    }

    fn compute_id(&self, mask: NetworkFilterMask) -> u32 {
        let mut hasher = FilterIdHasher::new(mask.bits());
        hasher.write_field(Some(&self.pattern));
        hasher.write_field(self.domains.as_ref().map(HostnameList::as_str));
        hasher.write_field(self.denyallow.as_ref().map(HostnameList::as_str));
        hasher.write_field(self.option_value.as_deref());
        hasher.finish()
    }

    /// Compiled form of a `/regex/` pattern. `None` for literal patterns and
    /// for sources the regex engine rejects.
    pub fn regex(&self) -> Option<&Regex> {
        if !self.is_regex() {
            return None;
        }
        self.regex
            .get_or_init(|| {
                RegexBuilder::new(&self.pattern)
                    .case_insensitive(!self.is_match_case())
                    .build()
                    .ok()
            })
            .as_ref()
    }

    // =========================================================================
    // Matching
    // =========================================================================

    /// Evaluate the full predicate of this filter against a request.
    pub fn matches(&self, request: &Request) -> bool {
        if !self.request_types().intersects(request.request_type) {
            return false;
        }

        let party_ok = if request.is_third_party {
            self.third_party()
        } else {
            self.first_party()
        };
        if !party_ok {
            return false;
        }

        if let Some(domains) = &self.domains {
            if !domains.matches(&request.source_hostname) {
                return false;
            }
        }

        if let Some(denyallow) = &self.denyallow {
            if denyallow
                .positive()
                .any(|domain| host_matches_domain(&request.hostname, domain))
            {
                return false;
            }
        }

        self.matches_pattern(request)
    }

    fn matches_pattern(&self, request: &Request) -> bool {
        if self.is_regex() {
            return self.regex().map_or(false, |re| re.is_match(&request.url));
        }

        let url = if self.is_match_case() {
            request.url.as_bytes()
        } else {
            request.url_lower.as_bytes()
        };
        let pattern = self.pattern.as_bytes();
        let right = self.is_right_anchor();

        if self.is_hostname_anchor() {
            let Some(host) = host_range(&request.url_lower) else {
                return false;
            };
            let mut label_starts =
                std::iter::once(host.start).chain(host.clone().filter(|&i| url[i] == b'.').map(|i| i + 1));
            return label_starts.any(|start| wildcard_match(pattern, &url[start..], true, right));
        }

        wildcard_match(pattern, url, self.is_left_anchor(), right)
    }
}

/// Match `pattern` against `input`. `*` matches any run of bytes and `^` a
/// separator byte or the end of the input. Unanchored ends may leave input
/// unconsumed.
///
/// Each `*`-free segment is placed at its leftmost position after the previous
/// one, which is enough for glob patterns, so the cost stays within
/// `input.len() * pattern.len()`.
fn wildcard_match(pattern: &[u8], input: &[u8], left_anchor: bool, right_anchor: bool) -> bool {
    let mut segments = pattern.split(|&b| b == b'*');
    let mut pos = 0;

    if left_anchor {
        match segment_len(segments.next().unwrap_or_default(), input) {
            Some(consumed) => pos = consumed,
            None => return false,
        }
    }

    // Every remaining segment follows a `*` (or an unanchored start).
    let mut segments = segments.peekable();
    while let Some(segment) = segments.next() {
        if right_anchor && segments.peek().is_none() {
            return (pos..=input.len())
                .any(|start| segment_len(segment, &input[start..]) == Some(input.len() - start));
        }
        match find_segment(segment, input, pos) {
            Some(end) => pos = end,
            None => return false,
        }
    }

    !right_anchor || pos == input.len()
}

/// Bytes consumed when `segment` matches at the start of `input`.
fn segment_len(segment: &[u8], input: &[u8]) -> Option<usize> {
    let mut consumed = 0;
    for &p in segment {
        match input.get(consumed) {
            Some(&c) if p == b'^' => {
                if !is_separator(c) {
                    return None;
                }
                consumed += 1;
            }
            None if p == b'^' => {}
            Some(&c) if c == p => consumed += 1,
            _ => return None,
        }
    }
    Some(consumed)
}

/// End offset of the leftmost match of `segment` at or after `from`.
fn find_segment(segment: &[u8], input: &[u8], from: usize) -> Option<usize> {
    (from..=input.len()).find_map(|start| segment_len(segment, &input[start..]).map(|n| start + n))
}

impl Filter for NetworkFilter {
    fn id(&self) -> u32 {
        *self.id.get_or_init(|| self.compute_id(self.mask))
    }

    fn tokens(&self) -> Vec<Vec<u32>> {
        let mut buffer = TokenBuffer::new();
        if !self.is_regex() {
            let skip_first = !(self.is_left_anchor() || self.is_hostname_anchor());
            tokenize_pattern(&self.pattern, skip_first, !self.is_right_anchor(), &mut buffer);
        }

        if buffer.is_empty() {
            if let Some(domains) = self.domains.as_ref().filter(|list| list.has_positive()) {
                return domains.positive().map(|domain| vec![hash_token(domain)]).collect();
            }
        }

        vec![buffer.as_slice().to_vec()]
    }

    fn kind(&self) -> FilterKind {
        FilterKind::Network
    }
}

impl Clone for NetworkFilter {
    fn clone(&self) -> Self {
        Self {
            mask: self.mask,
            pattern: self.pattern.clone(),
            domains: self.domains.clone(),
            denyallow: self.denyallow.clone(),
            option_value: self.option_value.clone(),
            raw_line: self.raw_line.clone(),
            id: self.id.clone(),
            regex: OnceLock::new(),
        }
    }
}

impl PartialEq for NetworkFilter {
    fn eq(&self, other: &Self) -> bool {
        self.mask == other.mask
            && self.pattern == other.pattern
            && self.domains == other.domains
            && self.denyallow == other.denyallow
            && self.option_value == other.option_value
    }
}

/// Human-readable form, mostly for debugging.
impl fmt::Display for NetworkFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_exception() {
            f.write_str("@@")?;
        }
        if self.is_hostname_anchor() {
            f.write_str("||")?;
        } else if self.is_left_anchor() {
            f.write_str("|")?;
        }
        if self.is_regex() {
            write!(f, "/{}/", self.pattern)?;
        } else {
            f.write_str(&self.pattern)?;
        }
        if self.is_right_anchor() {
            f.write_str("|")?;
        }

        let mut options = Vec::new();
        if self.request_types() != RequestType::ALL {
            options.push(format!("types={:#06x}", self.request_types().bits()));
        }
        if !self.first_party() {
            options.push("third-party".to_string());
        }
        if !self.third_party() {
            options.push("first-party".to_string());
        }
        if self.is_match_case() {
            options.push("match-case".to_string());
        }
        if let Some(domains) = &self.domains {
            options.push(format!("domain={}", domains.as_str().replace(',', "|")));
        }
        if let Some(denyallow) = &self.denyallow {
            options.push(format!("denyallow={}", denyallow.as_str().replace(',', "|")));
        }
        let value = self.option_value.as_deref().unwrap_or("");
        if self.is_csp() {
            options.push(format!("csp={value}"));
        }
        if self.is_redirect() {
            options.push(format!("redirect={value}"));
        }
        if self.is_redirect_rule() {
            options.push(format!("redirect-rule={value}"));
        }
        if self.is_badfilter() {
            options.push("badfilter".to_string());
        }

        if !options.is_empty() {
            write!(f, "${}", options.join(","))?;
        }
        Ok(())
    }
}
