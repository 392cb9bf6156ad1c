//! Hostname helpers: registrable domain, party checks and suffix walking.
//!
//! ```
//! use sieve_core::domain::get_etld1;
//!
//! assert_eq!(get_etld1("cdn.news.example.co.uk"), "example.co.uk");
//! assert_eq!(get_etld1("tracker.net"), "tracker.net");
//! ```

/// Public suffixes made of two labels that are common enough to matter for
/// party checks. Everything else is treated as a one-label suffix.
const TWO_LABEL_SUFFIXES: &[&str] = &[
    "ac.jp", "ac.uk", "co.in", "co.jp", "co.kr", "co.nz", "co.uk", "co.za", "com.ar", "com.au", "com.br",
    "com.cn", "com.hk", "com.mx", "com.sg", "com.tr", "com.tw", "gov.au", "gov.uk", "ne.jp", "net.au",
    "net.nz", "or.jp", "org.au", "org.uk",
];

/// Registrable domain (eTLD+1) of a lowercased hostname.
///
/// Hosts with fewer labels than the suffix needs are returned unchanged.
pub fn get_etld1(host: &str) -> &str {
    let host = host.trim_end_matches('.');
    let mut dots = host.rmatch_indices('.').map(|(index, _)| index);

    let (Some(_), Some(second)) = (dots.next(), dots.next()) else {
        return host;
    };
    if TWO_LABEL_SUFFIXES.binary_search(&&host[second + 1..]).is_err() {
        return &host[second + 1..];
    }
    match dots.next() {
        Some(third) => &host[third + 1..],
        None => host,
    }
}

/// A request is third-party when its host and the page host have different
/// registrable domains.
pub fn is_third_party(page_host: &str, request_host: &str) -> bool {
    get_etld1(page_host) != get_etld1(request_host)
}

/// `host` followed by each parent domain, down to the top-level label.
///
/// `a.b.example.com` yields `a.b.example.com`, `b.example.com`,
/// `example.com` and `com`.
pub fn walk_host_suffixes(host: &str) -> impl Iterator<Item = &str> {
    let first = (!host.is_empty()).then_some(host);
    std::iter::successors(first, |current| {
        current
            .split_once('.')
            .map(|(_, parent)| parent)
            .filter(|parent| !parent.is_empty())
    })
}

/// `host` is `domain` or one of its subdomains.
#[inline]
pub fn host_matches_domain(host: &str, domain: &str) -> bool {
    match host.strip_suffix(domain) {
        Some(prefix) => prefix.is_empty() || prefix.ends_with('.'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_table_is_sorted() {
        assert!(TWO_LABEL_SUFFIXES.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_etld1() {
        assert_eq!(get_etld1("tracker.net"), "tracker.net");
        assert_eq!(get_etld1("a.b.tracker.net"), "tracker.net");
        assert_eq!(get_etld1("tracker.net."), "tracker.net");
        assert_eq!(get_etld1("localhost"), "localhost");
    }

    #[test]
    fn test_etld1_two_label_suffix() {
        assert_eq!(get_etld1("www.shop.com.au"), "shop.com.au");
        assert_eq!(get_etld1("shop.com.au"), "shop.com.au");
        assert_eq!(get_etld1("com.au"), "com.au");
    }

    #[test]
    fn test_is_third_party() {
        assert!(!is_third_party("www.news.com", "static.news.com"));
        assert!(is_third_party("news.com", "ads.tracker.net"));
        assert!(is_third_party("a.co.uk", "b.co.uk"));
    }

    #[test]
    fn test_walk_host_suffixes() {
        let suffixes: Vec<&str> = walk_host_suffixes("x.news.com").collect();
        assert_eq!(suffixes, vec!["x.news.com", "news.com", "com"]);
        assert_eq!(walk_host_suffixes("com").collect::<Vec<_>>(), vec!["com"]);
        assert_eq!(walk_host_suffixes("").count(), 0);
    }

    #[test]
    fn test_host_matches_domain() {
        assert!(host_matches_domain("news.com", "news.com"));
        assert!(host_matches_domain("img.news.com", "news.com"));
        assert!(!host_matches_domain("fakenews.com", "news.com"));
        assert!(!host_matches_domain("news.com", "img.news.com"));
    }
}
