//! Small helpers shared by the parsers and tokenizers.

/// Maximum number of tokens a single [`TokenBuffer`] holds.
pub const TOKENS_BUFFER_SIZE: usize = 200;

#[inline]
pub const fn get_bit(n: u32, mask: u32) -> bool {
    n & mask != 0
}

#[inline]
pub const fn set_bit(n: u32, mask: u32) -> u32 {
    n | mask
}

#[inline]
pub const fn clear_bit(n: u32, mask: u32) -> u32 {
    n & !mask
}

/// Check whether `haystack` contains `needle` starting at byte offset `start`.
#[inline]
pub fn fast_starts_with_from(haystack: &str, needle: &str, start: usize) -> bool {
    haystack
        .as_bytes()
        .get(start..start + needle.len())
        .map_or(false, |slice| slice == needle.as_bytes())
}

/// Check whether a string contains any non-ASCII character.
#[inline]
pub fn has_unicode(s: &str) -> bool {
    !s.is_ascii()
}

// =============================================================================
// Token Buffer
// =============================================================================

/// Fixed-capacity scratch space for token hashes.
///
/// Tokenizers append into the buffer and hand back a view of it. The view is
/// only valid until the next fill, so each worker owns its own buffer.
#[derive(Clone)]
pub struct TokenBuffer {
    tokens: [u32; TOKENS_BUFFER_SIZE],
    len: usize,
}

impl TokenBuffer {
    pub const fn new() -> Self {
        Self {
            tokens: [0; TOKENS_BUFFER_SIZE],
            len: 0,
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Append a token. Returns `false` once the buffer is full; the token is
    /// dropped in that case.
    #[inline]
    pub fn push(&mut self, token: u32) -> bool {
        if self.len == TOKENS_BUFFER_SIZE {
            return false;
        }
        self.tokens[self.len] = token;
        self.len += 1;
        true
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[u32] {
        &self.tokens[..self.len]
    }
}

impl Default for TokenBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TokenBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_helpers() {
        let n = set_bit(0, 1 << 3);
        assert!(get_bit(n, 1 << 3));
        assert!(!get_bit(n, 1 << 2));
        assert_eq!(clear_bit(n, 1 << 3), 0);
    }

    #[test]
    fn test_fast_starts_with_from() {
        assert!(fast_starts_with_from("##script:inject(a)", "script:", 2));
        assert!(!fast_starts_with_from("##script:inject(a)", "script:", 3));
        assert!(!fast_starts_with_from("##scr", "script:", 2));
        assert!(!fast_starts_with_from("ab", "b", 10));
    }

    #[test]
    fn test_has_unicode() {
        assert!(!has_unicode("example.com"));
        assert!(has_unicode("bücher.de"));
    }

    #[test]
    fn test_token_buffer_capacity() {
        let mut buffer = TokenBuffer::new();
        for i in 0..TOKENS_BUFFER_SIZE as u32 {
            assert!(buffer.push(i + 1));
        }
        assert!(!buffer.push(42));
        assert_eq!(buffer.len(), TOKENS_BUFFER_SIZE);

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.as_slice(), &[] as &[u32]);
    }
}
