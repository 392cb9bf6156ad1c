//! Network filter lines: URL patterns with anchors and wildcards, `@@`
//! exceptions, `$option` lists and hosts-file entries.

use std::net::IpAddr;

use sieve_core::bits::has_unicode;
use sieve_core::filters::{NetworkFilter, NetworkFilterMask};
use sieve_core::types::RequestType;

/// Reasons a network line is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkFilterError {
    #[error("empty filter")]
    EmptyFilter,
    #[error("unrecognised option: {0}")]
    UnrecognisedOption(String),
    #[error("unsupported option: {0}")]
    UnsupportedOption(String),
    #[error("negated option: {0}")]
    NegatedOption(String),
    #[error("empty value for option: {0}")]
    EmptyOptionValue(String),
    #[error("invalid value for option: {0}")]
    InvalidOptionValue(String),
    #[error("multiple modifier options")]
    MultipleModifierOptions,
    #[error("options exclude every request type")]
    NoRequestTypes,
    #[error("options exclude every party")]
    NoParty,
    #[error("invalid regex: {0}")]
    InvalidRegex(String),
    #[error("hosts entry without a domain")]
    InvalidHostsEntry,
    #[error("hostname cannot be converted to punycode")]
    PunycodeError,
}

/// Parse one network filter line. The line is expected to be trimmed.
pub fn parse_network_filter(line: &str, keep_raw: bool) -> Result<NetworkFilter, NetworkFilterError> {
    if line.is_empty() {
        return Err(NetworkFilterError::EmptyFilter);
    }

    let filter = match parse_hosts_file_domain(line)? {
        Some(host) => NetworkFilter::new(
            NetworkFilterMask::DEFAULT | NetworkFilterMask::IS_HOSTNAME_ANCHOR,
            format!("{host}^"),
        ),
        None => parse_filter_body(line)?,
    };

    Ok(if keep_raw { filter.with_raw_line(line) } else { filter })
}

fn parse_filter_body(line: &str) -> Result<NetworkFilter, NetworkFilterError> {
    let mut mask = NetworkFilterMask::DEFAULT;
    let mut rest = line;
    if let Some(stripped) = rest.strip_prefix("@@") {
        mask |= NetworkFilterMask::IS_EXCEPTION;
        rest = stripped;
    }

    let (pattern_part, options_text) = split_rule_options(rest);
    let options = match options_text {
        Some(text) => parse_options(text, mask.contains(NetworkFilterMask::IS_EXCEPTION))?,
        None => ParsedOptions::default(),
    };
    mask = (mask - NetworkFilterMask::FROM_ANY - NetworkFilterMask::ANY_PARTY) | options.mask;

    let mut pattern = pattern_part;
    if is_regex_pattern(pattern) {
        let source = &pattern[1..pattern.len() - 1];
        regex::RegexBuilder::new(source)
            .case_insensitive(!mask.contains(NetworkFilterMask::MATCH_CASE))
            .build()
            .map_err(|err| NetworkFilterError::InvalidRegex(err.to_string()))?;
        return Ok(NetworkFilter::new(mask | NetworkFilterMask::IS_REGEX, source)
            .with_domains(options.domains)
            .with_denyallow(options.denyallow)
            .with_option_value(options.value));
    }

    if let Some(stripped) = pattern.strip_prefix("||") {
        mask |= NetworkFilterMask::IS_HOSTNAME_ANCHOR;
        pattern = stripped;
    } else if let Some(stripped) = pattern.strip_prefix('|') {
        mask |= NetworkFilterMask::IS_LEFT_ANCHOR;
        pattern = stripped;
    }
    if let Some(stripped) = pattern.strip_suffix('|') {
        mask |= NetworkFilterMask::IS_RIGHT_ANCHOR;
        pattern = stripped;
    }

    if pattern.is_empty() && options_text.is_none() {
        return Err(NetworkFilterError::EmptyFilter);
    }

    let pattern = if mask.contains(NetworkFilterMask::IS_HOSTNAME_ANCHOR) {
        normalize_anchored_host(pattern, mask.contains(NetworkFilterMask::MATCH_CASE))?
    } else if mask.contains(NetworkFilterMask::MATCH_CASE) {
        pattern.to_string()
    } else {
        pattern.to_ascii_lowercase()
    };

    Ok(NetworkFilter::new(mask, pattern)
        .with_domains(options.domains)
        .with_denyallow(options.denyallow)
        .with_option_value(options.value))
}

/// `/.../` with something between the slashes.
fn is_regex_pattern(pattern: &str) -> bool {
    pattern.len() > 2 && pattern.starts_with('/') && pattern.ends_with('/')
}

/// Split at the last `$`, unless the whole remainder is a regex literal.
fn split_rule_options(line: &str) -> (&str, Option<&str>) {
    if is_regex_pattern(line) {
        return (line, None);
    }
    match line.rfind('$') {
        Some(pos) => (&line[..pos], Some(&line[pos + 1..])),
        None => (line, None),
    }
}

/// Punycode the host part of a `||host/path` pattern and lowercase it.
fn normalize_anchored_host(pattern: &str, match_case: bool) -> Result<String, NetworkFilterError> {
    let host_end = pattern
        .find(|c: char| matches!(c, '/' | '^' | '*' | '?' | '#' | ':' | '|'))
        .unwrap_or(pattern.len());
    let (host, path) = pattern.split_at(host_end);

    let host = if has_unicode(host) {
        idna::domain_to_ascii(host).map_err(|_| NetworkFilterError::PunycodeError)?
    } else {
        host.to_ascii_lowercase()
    };
    let path = if match_case { path.to_string() } else { path.to_ascii_lowercase() };
    Ok(host + &path)
}

/// `0.0.0.0 example.com` style lines.
fn parse_hosts_file_domain(line: &str) -> Result<Option<String>, NetworkFilterError> {
    let mut parts = line.split_whitespace();
    let (Some(first), Some(second)) = (parts.next(), parts.next()) else {
        return Ok(None);
    };
    if first.parse::<IpAddr>().is_err() {
        return Ok(None);
    }

    let host = second.trim_matches('.');
    if !host.contains('.') || host.parse::<IpAddr>().is_ok() {
        return Err(NetworkFilterError::InvalidHostsEntry);
    }
    if has_unicode(host) {
        return idna::domain_to_ascii(host)
            .map(Some)
            .map_err(|_| NetworkFilterError::PunycodeError);
    }
    if !host
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-' || b == b'_')
    {
        return Err(NetworkFilterError::InvalidHostsEntry);
    }
    Ok(Some(host.to_ascii_lowercase()))
}

// =============================================================================
// Options
// =============================================================================

struct ParsedOptions {
    /// Request type and party bits plus option flags
    mask: NetworkFilterMask,
    domains: Option<String>,
    denyallow: Option<String>,
    value: Option<String>,
}

impl Default for ParsedOptions {
    fn default() -> Self {
        Self {
            mask: NetworkFilterMask::FROM_ANY | NetworkFilterMask::ANY_PARTY,
            domains: None,
            denyallow: None,
            value: None,
        }
    }
}

fn parse_options(text: &str, is_exception: bool) -> Result<ParsedOptions, NetworkFilterError> {
    let mut flags = NetworkFilterMask::empty();
    let mut type_include = RequestType::empty();
    let mut type_exclude = RequestType::empty();
    let mut first_party = true;
    let mut third_party = true;
    let mut domains: Option<String> = None;
    let mut denyallow: Option<String> = None;
    let mut value: Option<String> = None;

    for raw in text.split(',') {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        let (name, option_value) = match raw.split_once('=') {
            Some((name, option_value)) => (name.trim().to_ascii_lowercase(), Some(option_value.trim())),
            None => (raw.to_ascii_lowercase(), None),
        };
        let (negated, name) = match name.strip_prefix('~') {
            Some(rest) => (true, rest.to_string()),
            None => (false, name),
        };

        let modifier = match name.as_str() {
            "csp" => Some(NetworkFilterMask::IS_CSP),
            "redirect" => Some(NetworkFilterMask::IS_REDIRECT),
            "redirect-rule" => Some(NetworkFilterMask::IS_REDIRECT_RULE),
            _ => None,
        };
        if let Some(modifier) = modifier {
            if negated {
                return Err(NetworkFilterError::NegatedOption(name));
            }
            if value.is_some() || flags.intersects(modifier_bits()) {
                return Err(NetworkFilterError::MultipleModifierOptions);
            }
            let option_value = option_value.unwrap_or("");
            if option_value.is_empty() && !is_exception {
                return Err(NetworkFilterError::EmptyOptionValue(name));
            }
            flags |= modifier;
            value = Some(option_value.to_string());
            continue;
        }

        match name.as_str() {
            "domain" | "denyallow" => {
                if negated {
                    return Err(NetworkFilterError::NegatedOption(name));
                }
                let list = parse_domain_list(option_value.unwrap_or(""), &name)?;
                if name == "domain" {
                    domains = Some(list);
                } else {
                    if list.split(',').any(|entry| entry.starts_with('~')) {
                        return Err(NetworkFilterError::InvalidOptionValue(name));
                    }
                    denyallow = Some(list);
                }
            }
            _ if option_value.is_some() => return Err(NetworkFilterError::UnrecognisedOption(name)),
            "match-case" => {
                if negated {
                    return Err(NetworkFilterError::NegatedOption(name));
                }
                flags |= NetworkFilterMask::MATCH_CASE;
            }
            "badfilter" => {
                if negated {
                    return Err(NetworkFilterError::NegatedOption(name));
                }
                flags |= NetworkFilterMask::IS_BADFILTER;
            }
            "third-party" | "3p" => {
                if negated {
                    third_party = false;
                } else {
                    first_party = false;
                }
            }
            "first-party" | "1p" => {
                if negated {
                    first_party = false;
                } else {
                    third_party = false;
                }
            }
            "important" => return Err(NetworkFilterError::UnsupportedOption(name)),
            _ => {
                let types = request_type_option(&name).ok_or_else(|| NetworkFilterError::UnrecognisedOption(name.clone()))?;
                if negated {
                    type_exclude |= types;
                } else {
                    type_include |= types;
                }
            }
        }
    }

    let types = if type_include.is_empty() {
        RequestType::ALL - type_exclude
    } else {
        type_include - type_exclude
    };
    if types.is_empty() {
        return Err(NetworkFilterError::NoRequestTypes);
    }
    if !first_party && !third_party {
        return Err(NetworkFilterError::NoParty);
    }

    let mut mask = flags | NetworkFilterMask::from_bits_retain(types.bits());
    if first_party {
        mask |= NetworkFilterMask::FIRST_PARTY;
    }
    if third_party {
        mask |= NetworkFilterMask::THIRD_PARTY;
    }

    Ok(ParsedOptions {
        mask,
        domains,
        denyallow,
        value,
    })
}

fn modifier_bits() -> NetworkFilterMask {
    NetworkFilterMask::IS_CSP | NetworkFilterMask::IS_REDIRECT | NetworkFilterMask::IS_REDIRECT_RULE
}

/// `a.com|~b.com` to `a.com,~b.com`, lowercased and punycoded.
fn parse_domain_list(value: &str, option: &str) -> Result<String, NetworkFilterError> {
    let mut entries = Vec::new();
    for raw in value.split('|') {
        let raw = raw.trim();
        let (negated, domain) = match raw.strip_prefix('~') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let domain = domain.trim_matches('.');
        if domain.is_empty() {
            continue;
        }

        let domain = if has_unicode(domain) {
            idna::domain_to_ascii(domain).map_err(|_| NetworkFilterError::PunycodeError)?
        } else {
            domain.to_ascii_lowercase()
        };
        if domain.contains(',') {
            return Err(NetworkFilterError::InvalidOptionValue(option.to_string()));
        }
        entries.push(if negated { format!("~{domain}") } else { domain });
    }

    if entries.is_empty() {
        return Err(NetworkFilterError::EmptyOptionValue(option.to_string()));
    }
    Ok(entries.join(","))
}

fn request_type_option(name: &str) -> Option<RequestType> {
    let types = match name {
        "script" => RequestType::SCRIPT,
        "image" => RequestType::IMAGE,
        "stylesheet" | "css" => RequestType::STYLESHEET,
        "object" => RequestType::OBJECT,
        "subdocument" | "frame" => RequestType::SUBDOCUMENT,
        "document" | "doc" => RequestType::MAIN_FRAME,
        "xmlhttprequest" | "xhr" => RequestType::XMLHTTPREQUEST | RequestType::FETCH,
        "media" => RequestType::MEDIA,
        "font" => RequestType::FONT,
        "ping" | "beacon" => RequestType::PING | RequestType::BEACON,
        "websocket" => RequestType::WEBSOCKET,
        "other" => RequestType::OTHER | RequestType::CSP_REPORT | RequestType::SPECULATIVE,
        _ => return None,
    };
    Some(types)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sieve_core::filters::Filter;
    use sieve_core::types::Request;

    fn parse(line: &str) -> Result<NetworkFilter, NetworkFilterError> {
        parse_network_filter(line, false)
    }

    fn request(url: &str, source: &str, cpt: &str) -> Request {
        Request::from_urls(url, source, cpt)
    }

    #[test]
    fn test_parse_plain_pattern() {
        let filter = parse("/Banner/Ads.").unwrap();
        assert_eq!(filter.pattern(), "/banner/ads.");
        assert_eq!(filter.mask(), NetworkFilterMask::DEFAULT);
        assert!(filter.matches(&request("https://a.com/BANNER/ads.png", "https://b.com/", "image")));
    }

    #[test]
    fn test_parse_anchors() {
        let host = parse("||ads.example.com^").unwrap();
        assert!(host.is_hostname_anchor());
        assert_eq!(host.pattern(), "ads.example.com^");

        let left = parse("|https://tracker.").unwrap();
        assert!(left.is_left_anchor());
        assert_eq!(left.pattern(), "https://tracker.");

        let right = parse("/pixel.gif|").unwrap();
        assert!(right.is_right_anchor());
        assert_eq!(right.pattern(), "/pixel.gif");
    }

    #[test]
    fn test_parse_exception() {
        let filter = parse("@@||cdn.example.com^$script").unwrap();
        assert!(filter.is_exception());
        assert_eq!(filter.request_types(), RequestType::SCRIPT);
    }

    #[test]
    fn test_parse_regex() {
        let filter = parse("/banner\\d+\\.gif/$image").unwrap();
        assert!(filter.is_regex());
        assert_eq!(filter.pattern(), "banner\\d+\\.gif");
        assert!(filter.matches(&request("https://a.com/Banner12.gif", "https://b.com/", "image")));

        assert!(matches!(parse("/ads(/"), Err(NetworkFilterError::InvalidRegex(_))));
    }

    #[test]
    fn test_regex_keeps_dollar_inside() {
        let filter = parse("/track$/").unwrap();
        assert!(filter.is_regex());
        assert_eq!(filter.pattern(), "track$");
    }

    #[test]
    fn test_parse_hosts_file_lines() {
        let filter = parse("0.0.0.0 Ads.Example.com").unwrap();
        assert!(filter.is_hostname_anchor());
        assert_eq!(filter.pattern(), "ads.example.com^");
        assert_eq!(filter.id(), parse("||ads.example.com^").unwrap().id());

        assert_eq!(parse("127.0.0.1 localhost").unwrap_err(), NetworkFilterError::InvalidHostsEntry);
    }

    #[test]
    fn test_parse_type_options() {
        let filter = parse("/ads/$script,image").unwrap();
        assert_eq!(filter.request_types(), RequestType::SCRIPT | RequestType::IMAGE);

        let negated = parse("/ads/$~script").unwrap();
        assert_eq!(negated.request_types(), RequestType::ALL - RequestType::SCRIPT);

        let xhr = parse("/api/$xhr").unwrap();
        assert_eq!(xhr.request_types(), RequestType::XMLHTTPREQUEST | RequestType::FETCH);

        assert_eq!(parse("/ads/$script,~script").unwrap_err(), NetworkFilterError::NoRequestTypes);
    }

    #[test]
    fn test_parse_party_options() {
        let third = parse("||ads.net^$third-party").unwrap();
        assert!(third.third_party());
        assert!(!third.first_party());

        let first = parse("||ads.net^$~3p").unwrap();
        assert!(first.first_party());
        assert!(!first.third_party());

        assert_eq!(parse("/x$3p,1p").unwrap_err(), NetworkFilterError::NoParty);
    }

    #[test]
    fn test_parse_domain_options() {
        let filter = parse("/ads/$domain=Example.com|~sub.example.com").unwrap();
        assert_eq!(filter.domains().unwrap().as_str(), "example.com,~sub.example.com");

        let denyallow = parse("*$script,denyallow=cdn.com|static.net,domain=a.com").unwrap();
        assert_eq!(denyallow.denyallow().unwrap().as_str(), "cdn.com,static.net");

        assert_eq!(
            parse("/ads/$domain=").unwrap_err(),
            NetworkFilterError::EmptyOptionValue("domain".to_string())
        );
        assert_eq!(
            parse("*$denyallow=~a.com").unwrap_err(),
            NetworkFilterError::InvalidOptionValue("denyallow".to_string())
        );
    }

    #[test]
    fn test_parse_modifier_options() {
        let csp = parse("||example.com^$csp=script-src 'self'").unwrap();
        assert!(csp.is_csp());
        assert_eq!(csp.option_value(), Some("script-src 'self'"));

        let redirect = parse("||ads.net/ad.js$script,redirect=noop.js").unwrap();
        assert!(redirect.is_redirect());
        assert_eq!(redirect.option_value(), Some("noop.js"));

        let rule = parse("||ads.net^$redirect-rule=1x1.gif").unwrap();
        assert!(rule.is_redirect_rule());

        let cancel_all = parse("@@||example.com^$csp").unwrap();
        assert!(cancel_all.is_csp());
        assert_eq!(cancel_all.option_value(), Some(""));

        assert_eq!(parse("||a.com^$csp").unwrap_err(), NetworkFilterError::EmptyOptionValue("csp".to_string()));
        assert_eq!(
            parse("||a.com^$redirect=a.js,csp=x").unwrap_err(),
            NetworkFilterError::MultipleModifierOptions
        );
    }

    #[test]
    fn test_parse_flag_options() {
        let filter = parse("/Ads.js$match-case").unwrap();
        assert!(filter.is_match_case());
        assert_eq!(filter.pattern(), "/Ads.js");

        let bad = parse("||ads.net^$badfilter").unwrap();
        assert!(bad.is_badfilter());
        assert_eq!(bad.id_without_badfilter(), parse("||ads.net^").unwrap().id());

        assert_eq!(
            parse("/ads/$~match-case").unwrap_err(),
            NetworkFilterError::NegatedOption("match-case".to_string())
        );
    }

    #[test]
    fn test_reject_unknown_options() {
        assert_eq!(
            parse("||ads.net^$important").unwrap_err(),
            NetworkFilterError::UnsupportedOption("important".to_string())
        );
        assert_eq!(
            parse("||ads.net^$removeparam=utm").unwrap_err(),
            NetworkFilterError::UnrecognisedOption("removeparam".to_string())
        );
        assert_eq!(
            parse("||ads.net^$popup").unwrap_err(),
            NetworkFilterError::UnrecognisedOption("popup".to_string())
        );
    }

    #[test]
    fn test_reject_empty_filters() {
        assert_eq!(parse("").unwrap_err(), NetworkFilterError::EmptyFilter);
        assert_eq!(parse("@@").unwrap_err(), NetworkFilterError::EmptyFilter);
        assert_eq!(parse("||").unwrap_err(), NetworkFilterError::EmptyFilter);
        assert!(parse("$script,domain=a.com").is_ok());
    }

    #[test]
    fn test_punycode_anchored_hosts() {
        let filter = parse("||bücher.de^").unwrap();
        assert_eq!(filter.pattern(), "xn--bcher-kva.de^");
    }

    #[test]
    fn test_keep_raw_line_on_request() {
        let filter = parse_network_filter("||ads.net^$script", true).unwrap();
        assert_eq!(filter.raw_line(), Some("||ads.net^$script"));
    }
}
