//! Hash functions for sieve
//!
//! Tokens and hostnames are hashed with Murmur3 32-bit. Filter ids use a
//! cheap rolling hash over the filter's content so identical filters collide
//! on purpose and can be de-duplicated.
//!
//! # Sentinel Handling
//!
//! Token hash `0` is reserved as the "no token" sentinel. `hash_token`
//! never returns it.

/// Seed for token hashes.
const TOKEN_SEED: u32 = 0x811c9dc5;

/// Seed for filter ids.
const FILTER_ID_SEED: u32 = 5408 * 33;

/// Murmur3 32-bit hash implementation.
/// Optimized for short strings (typical token and domain lengths).
#[inline]
pub fn murmur3_32(data: &[u8], seed: u32) -> u32 {
    let len = data.len();
    let mut h = seed;

    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        let k = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);

        let k = k.wrapping_mul(0xcc9e2d51);
        let k = k.rotate_left(15);
        let k = k.wrapping_mul(0x1b873593);

        h ^= k;
        h = h.rotate_left(13);
        h = h.wrapping_mul(5).wrapping_add(0xe6546b64);
    }

    let tail = chunks.remainder();
    let mut k: u32 = 0;
    if tail.len() >= 3 {
        k ^= (tail[2] as u32) << 16;
    }
    if tail.len() >= 2 {
        k ^= (tail[1] as u32) << 8;
    }
    if !tail.is_empty() {
        k ^= tail[0] as u32;
        let k = k.wrapping_mul(0xcc9e2d51);
        let k = k.rotate_left(15);
        let k = k.wrapping_mul(0x1b873593);
        h ^= k;
    }

    // Finalization
    h ^= len as u32;
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;

    h
}

/// Compute a 32-bit hash for a token given as raw bytes.
/// Ensures result is never 0 (sentinel value).
#[inline]
pub fn hash_token_bytes(token: &[u8]) -> u32 {
    let h = murmur3_32(token, TOKEN_SEED);
    if h == 0 {
        1
    } else {
        h
    }
}

/// Compute a 32-bit hash for tokens, hostnames and DOM identifiers.
///
/// The input is hashed as-is: callers lowercase URLs and hostnames before
/// hashing, CSS identifiers keep their case.
#[inline]
pub fn hash_token(token: &str) -> u32 {
    hash_token_bytes(token.as_bytes())
}

// =============================================================================
// Filter Ids
// =============================================================================

/// Rolling content hash used for filter ids.
///
/// The hash starts from a fixed seed folded with the filter mask, then
/// absorbs every character of each string field in order.
#[derive(Debug, Clone, Copy)]
pub struct FilterIdHasher {
    state: u32,
}

impl FilterIdHasher {
    /// Start a new id computation for the given option mask.
    #[inline]
    pub fn new(mask: u32) -> Self {
        Self {
            state: FILTER_ID_SEED ^ mask,
        }
    }

    /// Absorb an optional string field.
    #[inline]
    pub fn write_field(&mut self, field: Option<&str>) {
        if let Some(field) = field {
            for c in field.chars() {
                self.state = self.state.wrapping_mul(33) ^ c as u32;
            }
        }
    }

    #[inline]
    pub fn finish(self) -> u32 {
        self.state
    }
}

// =============================================================================
// CRC32
// =============================================================================

static CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut c = i as u32;
        let mut j = 0;
        while j < 8 {
            c = if c & 1 != 0 {
                0xedb88320 ^ (c >> 1)
            } else {
                c >> 1
            };
            j += 1;
        }
        table[i] = c;
        i += 1;
    }
    table
};

/// Compute CRC32 over several slices as if they were concatenated.
/// Uses the standard CRC32 polynomial (IEEE 802.3).
pub fn crc32_parts(parts: &[&[u8]]) -> u32 {
    let mut crc = 0xffffffff_u32;
    for part in parts {
        for &byte in *part {
            crc = CRC32_TABLE[((crc ^ byte as u32) & 0xff) as usize] ^ (crc >> 8);
        }
    }
    crc ^ 0xffffffff
}

/// Compute CRC32 for snapshot integrity checking.
#[inline]
pub fn crc32(data: &[u8]) -> u32 {
    crc32_parts(&[data])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_murmur3_consistent() {
        let h1 = murmur3_32(b"example.com", 0);
        let h2 = murmur3_32(b"example.com", 0);
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_murmur3_different_strings() {
        assert_ne!(murmur3_32(b"example.com", 0), murmur3_32(b"example.org", 0));
    }

    #[test]
    fn test_murmur3_different_seeds() {
        assert_ne!(murmur3_32(b"example.com", 0), murmur3_32(b"example.com", 1));
    }

    #[test]
    fn test_murmur3_known_vectors() {
        assert_eq!(murmur3_32(b"", 0), 0);
        assert_eq!(murmur3_32(b"", 1), 0x514e28b7);
        assert_eq!(murmur3_32(b"test", 0), 0xba6bd213);
    }

    #[test]
    fn test_hash_token_never_zero() {
        assert_ne!(hash_token("script"), 0);
        assert_ne!(hash_token(""), 0);
    }

    #[test]
    fn test_hash_token_matches_bytes() {
        assert_eq!(hash_token("banner"), hash_token_bytes(b"banner"));
    }

    #[test]
    fn test_filter_id_depends_on_every_field() {
        let id = |mask: u32, a: Option<&str>, b: Option<&str>| {
            let mut hasher = FilterIdHasher::new(mask);
            hasher.write_field(a);
            hasher.write_field(b);
            hasher.finish()
        };

        let base = id(0, Some(".ad"), Some("a.com"));
        assert_eq!(base, id(0, Some(".ad"), Some("a.com")));
        assert_ne!(base, id(1, Some(".ad"), Some("a.com")));
        assert_ne!(base, id(0, Some(".ads"), Some("a.com")));
        assert_ne!(base, id(0, Some(".ad"), Some("b.com")));
    }

    #[test]
    fn test_filter_id_seed() {
        assert_eq!(FilterIdHasher::new(0).finish(), 5408 * 33);
    }

    #[test]
    fn test_crc32_known_vector() {
        assert_eq!(crc32(b"123456789"), 0xcbf43926);
    }

    #[test]
    fn test_crc32_parts_matches_concatenation() {
        assert_eq!(crc32_parts(&[b"1234", b"56789"]), crc32(b"123456789"));
    }

    #[test]
    fn test_crc32_detects_changes() {
        assert_ne!(crc32(&[1u8, 2, 3]), crc32(&[1u8, 2, 4]));
    }
}
