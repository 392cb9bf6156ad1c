//! Tokenizers feeding the reverse index.
//!
//! URLs, network filter patterns and CSS selectors are split into runs of
//! identifier characters and each run is hashed with [`hash_token_bytes`].
//! A filter is only ever indexed under tokens that the matching side is
//! guaranteed to produce as well.

use crate::bits::TokenBuffer;
use crate::hash::hash_token_bytes;

/// Shortest URL / pattern token kept for indexing.
pub const MIN_TOKEN_LEN: usize = 2;

#[inline]
fn is_url_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric()
}

/// CSS identifiers: letters, digits, `_`, `-` and any non-ASCII byte.
#[inline]
fn is_css_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b >= 0x80
}

/// Hash a token, lowercasing ASCII letters first.
#[inline]
fn hash_lowercase(token: &[u8]) -> u32 {
    if token.iter().any(u8::is_ascii_uppercase) {
        hash_token_bytes(&token.to_ascii_lowercase())
    } else {
        hash_token_bytes(token)
    }
}

/// Iterate `(start, end)` byte ranges of maximal runs accepted by `allowed`.
fn runs(bytes: &[u8], allowed: fn(u8) -> bool) -> impl Iterator<Item = (usize, usize)> + '_ {
    let mut pos = 0;
    std::iter::from_fn(move || {
        while pos < bytes.len() && !allowed(bytes[pos]) {
            pos += 1;
        }
        if pos >= bytes.len() {
            return None;
        }
        let start = pos;
        while pos < bytes.len() && allowed(bytes[pos]) {
            pos += 1;
        }
        Some((start, pos))
    })
}

// =============================================================================
// CSS
// =============================================================================

/// Tokenize a fragment of a CSS selector.
///
/// Identifiers keep their case since class and id names are case-sensitive.
pub fn tokenize_css(selector: &str, buffer: &mut TokenBuffer) {
    let bytes = selector.as_bytes();
    for (start, end) in runs(bytes, is_css_token_char) {
        if !buffer.push(hash_token_bytes(&bytes[start..end])) {
            break;
        }
    }
}

// =============================================================================
// URLs
// =============================================================================

/// Tokenize a lowercased URL, appending to `buffer`.
pub fn tokenize_url(url: &str, buffer: &mut TokenBuffer) {
    let bytes = url.as_bytes();
    for (start, end) in runs(bytes, is_url_token_char) {
        if end - start < MIN_TOKEN_LEN {
            continue;
        }
        if !buffer.push(hash_token_bytes(&bytes[start..end])) {
            break;
        }
    }
}

// =============================================================================
// Filter Patterns
// =============================================================================

/// Tokenize the literal parts of a network filter pattern.
///
/// A token touching a `*` wildcard is dropped since the URL may continue it.
/// `skip_first` drops a token starting the pattern and `skip_last` drops one
/// ending it, for patterns whose edges are not anchored.
pub fn tokenize_pattern(
    pattern: &str,
    skip_first: bool,
    skip_last: bool,
    buffer: &mut TokenBuffer,
) {
    let bytes = pattern.as_bytes();
    for (start, end) in runs(bytes, is_url_token_char) {
        if end - start < MIN_TOKEN_LEN {
            continue;
        }
        if skip_first && start == 0 {
            continue;
        }
        if skip_last && end == bytes.len() {
            continue;
        }
        if start > 0 && bytes[start - 1] == b'*' {
            continue;
        }
        if end < bytes.len() && bytes[end] == b'*' {
            continue;
        }
        if !buffer.push(hash_lowercase(&bytes[start..end])) {
            break;
        }
    }
}
