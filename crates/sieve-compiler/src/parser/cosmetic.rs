//! Cosmetic filter lines: `hostnames##selector`, `hostnames#@#selector`,
//! `hostnames##script:inject(...)`, `hostnames##script:contains(...)` and
//! `hostnames##+js(...)`.

use sieve_core::bits::{fast_starts_with_from, has_unicode};
use sieve_core::filters::{CosmeticFilter, CosmeticFilterMask};

/// Reasons a cosmetic line is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CosmeticFilterError {
    #[error("no cosmetic marker")]
    MissingMarker,
    #[error("unsupported cosmetic syntax")]
    UnsupportedSyntax,
    #[error("empty selector")]
    EmptySelector,
    #[error("selector ends with a style block")]
    StyleBlock,
    #[error("selector contains a second cosmetic marker")]
    NestedMarker,
    #[error("exception without hostnames")]
    UnhideWithoutHostnames,
    #[error("script filter without closing parenthesis")]
    UnclosedScript,
    #[error("hostname cannot be converted to punycode")]
    PunycodeError,
}

/// Parse one cosmetic filter line. The line is expected to be trimmed.
pub fn parse_cosmetic_filter(line: &str, keep_raw: bool) -> Result<CosmeticFilter, CosmeticFilterError> {
    let sharp_index = line.find('#').ok_or(CosmeticFilterError::MissingMarker)?;

    // hostname1,hostname2#@#.selector
    //                    ^^ ^
    //                    || suffix_start
    //                    |after_sharp
    //                    sharp_index
    let after_sharp = sharp_index + 1;
    let mut suffix_start = after_sharp + 1;
    let mut mask = CosmeticFilterMask::empty();

    let bytes = line.as_bytes();
    match bytes.get(after_sharp) {
        Some(b'#') => {}
        Some(b'@') if bytes.get(after_sharp + 1) == Some(&b'#') => {
            mask |= CosmeticFilterMask::UNHIDE;
            suffix_start += 1;
        }
        Some(b'@' | b'?' | b'$' | b'%') => return Err(CosmeticFilterError::UnsupportedSyntax),
        _ => return Err(CosmeticFilterError::MissingMarker),
    }

    let hostnames = if sharp_index > 0 {
        normalize_hostnames(&line[..sharp_index])?
    } else {
        None
    };

    let selector = if fast_starts_with_from(line, "script:", suffix_start) {
        //      script:inject(.......)
        //                    ^      ^
        //   script:contains(/......./)
        //                    ^      ^
        let method_start = suffix_start + 7;
        let body = line[method_start..]
            .strip_suffix(')')
            .ok_or(CosmeticFilterError::UnclosedScript)?;

        if let Some(inner) = body.strip_prefix("inject(") {
            mask |= CosmeticFilterMask::SCRIPT_INJECT;
            inner
        } else if let Some(inner) = body.strip_prefix("contains(") {
            mask |= CosmeticFilterMask::SCRIPT_BLOCK;
            match inner.strip_prefix('/').and_then(|rest| rest.strip_suffix('/')) {
                Some(regex) => regex,
                None => inner,
            }
        } else {
            body
        }
    } else if fast_starts_with_from(line, "+js(", suffix_start) {
        mask |= CosmeticFilterMask::SCRIPT_INJECT;
        line[suffix_start + 4..]
            .strip_suffix(')')
            .ok_or(CosmeticFilterError::UnclosedScript)?
    } else {
        line.get(suffix_start..).unwrap_or("")
    };

    if selector.is_empty() {
        return Err(CosmeticFilterError::EmptySelector);
    }
    if selector.ends_with('}') {
        return Err(CosmeticFilterError::StyleBlock);
    }
    if selector.contains("##") || selector.contains("#@#") {
        return Err(CosmeticFilterError::NestedMarker);
    }
    if mask.contains(CosmeticFilterMask::UNHIDE) && hostnames.is_none() {
        return Err(CosmeticFilterError::UnhideWithoutHostnames);
    }

    let filter = CosmeticFilter::new(mask, selector, hostnames);
    Ok(if keep_raw { filter.with_raw_line(line) } else { filter })
}

/// Lowercase the comma-separated hostname list and punycode non-ASCII
/// entries. Empty entries are dropped; `None` when nothing is left.
fn normalize_hostnames(raw: &str) -> Result<Option<String>, CosmeticFilterError> {
    let mut entries = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        let (negated, host) = match part.strip_prefix('~') {
            Some(rest) => (true, rest),
            None => (false, part),
        };
        if host.is_empty() {
            continue;
        }

        let host = if has_unicode(host) {
            idna::domain_to_ascii(host).map_err(|_| CosmeticFilterError::PunycodeError)?
        } else {
            host.to_ascii_lowercase()
        };
        entries.push(if negated { format!("~{host}") } else { host });
    }

    Ok(if entries.is_empty() { None } else { Some(entries.join(",")) })
}
