//! URL slicing for the matching hot path. Nothing here allocates; every
//! result borrows from or indexes into the input.

use std::ops::Range;

/// Byte offset just past the scheme separator: `://`, or `:` for `data:`
/// and `about:` style URLs.
pub fn scheme_end(url: &str) -> Option<usize> {
    let colon = url.find(':')?;
    let scheme = &url.as_bytes()[..colon];
    if scheme.is_empty() || !scheme.iter().all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.')) {
        return None;
    }

    if url[colon + 1..].starts_with("//") {
        Some(colon + 3)
    } else if scheme.eq_ignore_ascii_case(b"data") || scheme.eq_ignore_ascii_case(b"about") {
        Some(colon + 1)
    } else {
        None
    }
}

/// Byte range of the hostname: userinfo and port are excluded.
pub fn host_range(url: &str) -> Option<Range<usize>> {
    let start = scheme_end(url)?;
    let authority_len = url[start..]
        .find(|c: char| matches!(c, '/' | '?' | '#'))
        .unwrap_or(url.len() - start);
    let authority = &url[start..start + authority_len];

    let host_start = authority.rfind('@').map_or(start, |at| start + at + 1);
    let host_len = url[host_start..start + authority_len]
        .find(':')
        .unwrap_or(start + authority_len - host_start);
    Some(host_start..host_start + host_len)
}

/// Hostname of `url`, as a slice of it.
#[inline]
pub fn extract_host(url: &str) -> Option<&str> {
    host_range(url).map(|range| &url[range])
}

/// The `^` placeholder: anything but a letter, a digit or one of `_ - . %`.
#[inline]
pub fn is_separator(c: u8) -> bool {
    !(c.is_ascii_alphanumeric() || matches!(c, b'_' | b'-' | b'.' | b'%'))
}
