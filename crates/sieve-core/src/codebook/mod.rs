//! Codebook substitution compression
//!
//! Filter text fields are stored as byte codes against static dictionaries
//! of frequent substrings:
//!
//! - `code < table.len()`: the table entry at that index
//! - `254`: one verbatim byte follows
//! - `255`: a count `n` follows, then `n + 1` verbatim bytes
//!
//! Encoding is greedy: at every position the longest entry starting there
//! wins. Tables are ordered longest-first, so the first hit is the longest
//! and the output is deterministic.

mod tables;

use std::sync::OnceLock;

use crate::hash::crc32_parts;

pub use tables::{COSMETIC_SELECTOR, NETWORK_CSP, NETWORK_FILTER, RAW_NETWORK};

/// Escape code for a single verbatim byte.
const ESCAPE_BYTE: u8 = 254;
/// Escape code for a run of verbatim bytes.
const ESCAPE_RUN: u8 = 255;
/// Longest run a single `ESCAPE_RUN` can carry.
const MAX_RUN: usize = 256;

/// Error type for codebook decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodebookError {
    #[error("Unknown code {code} at byte {position}")]
    UnknownCode { code: u8, position: usize },
    #[error("Truncated escape sequence at byte {position}")]
    Truncated { position: usize },
    #[error("Decoded text is not valid UTF-8")]
    InvalidUtf8,
}

/// A static substitution dictionary.
pub struct Codebook {
    name: &'static str,
    table: &'static [&'static str],
    /// Entry indices grouped by first byte, preserving table order.
    by_first_byte: OnceLock<Vec<Vec<u8>>>,
}

impl Codebook {
    pub const fn new(name: &'static str, table: &'static [&'static str]) -> Self {
        Self {
            name,
            table,
            by_first_byte: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn table(&self) -> &'static [&'static str] {
        self.table
    }

    fn index(&self) -> &[Vec<u8>] {
        self.by_first_byte.get_or_init(|| {
            let mut index = vec![Vec::new(); 256];
            for (code, entry) in self.table.iter().enumerate() {
                if let Some(&first) = entry.as_bytes().first() {
                    index[first as usize].push(code as u8);
                }
            }
            index
        })
    }

    /// Encode `text`, appending the codes to `out`.
    pub fn encode_into(&self, text: &str, out: &mut Vec<u8>) {
        let bytes = text.as_bytes();
        let index = self.index();
        let mut pending_start = 0;
        let mut pos = 0;

        while pos < bytes.len() {
            let hit = index[bytes[pos] as usize].iter().copied().find(|&code| {
                bytes[pos..].starts_with(self.table[code as usize].as_bytes())
            });

            match hit {
                Some(code) => {
                    flush_verbatim(&bytes[pending_start..pos], out);
                    out.push(code);
                    pos += self.table[code as usize].len();
                    pending_start = pos;
                }
                None => pos += 1,
            }
        }

        flush_verbatim(&bytes[pending_start..], out);
    }

    pub fn encode(&self, text: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(text.len());
        self.encode_into(text, &mut out);
        out
    }

    pub fn decode(&self, codes: &[u8]) -> Result<String, CodebookError> {
        let mut out = Vec::with_capacity(codes.len() * 2);
        let mut pos = 0;

        while pos < codes.len() {
            let code = codes[pos];
            match code {
                ESCAPE_BYTE => {
                    let byte = *codes
                        .get(pos + 1)
                        .ok_or(CodebookError::Truncated { position: pos })?;
                    out.push(byte);
                    pos += 2;
                }
                ESCAPE_RUN => {
                    let count = *codes
                        .get(pos + 1)
                        .ok_or(CodebookError::Truncated { position: pos })? as usize
                        + 1;
                    let run = codes
                        .get(pos + 2..pos + 2 + count)
                        .ok_or(CodebookError::Truncated { position: pos })?;
                    out.extend_from_slice(run);
                    pos += 2 + count;
                }
                _ => {
                    let entry = self
                        .table
                        .get(code as usize)
                        .ok_or(CodebookError::UnknownCode { code, position: pos })?;
                    out.extend_from_slice(entry.as_bytes());
                    pos += 1;
                }
            }
        }

        String::from_utf8(out).map_err(|_| CodebookError::InvalidUtf8)
    }
}

impl std::fmt::Debug for Codebook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codebook")
            .field("name", &self.name)
            .field("entries", &self.table.len())
            .finish()
    }
}

fn flush_verbatim(bytes: &[u8], out: &mut Vec<u8>) {
    for chunk in bytes.chunks(MAX_RUN) {
        if chunk.len() == 1 {
            out.push(ESCAPE_BYTE);
            out.push(chunk[0]);
        } else {
            out.push(ESCAPE_RUN);
            out.push((chunk.len() - 1) as u8);
            out.extend_from_slice(chunk);
        }
    }
}

// =============================================================================
// Shipped Codebooks
// =============================================================================

/// `$csp=` directive values.
pub static CSP_CODEBOOK: Codebook = Codebook::new("network-csp", NETWORK_CSP);
/// Network filter patterns.
pub static PATTERN_CODEBOOK: Codebook = Codebook::new("network-filter", NETWORK_FILTER);
/// Hostnames, option values and raw filter lines.
pub static RAW_CODEBOOK: Codebook = Codebook::new("raw-network", RAW_NETWORK);
/// Cosmetic selectors and scriptlet arguments.
pub static SELECTOR_CODEBOOK: Codebook = Codebook::new("cosmetic-selector", COSMETIC_SELECTOR);

/// All shipped codebooks, in fingerprint order.
pub fn codebooks() -> [&'static Codebook; 4] {
    [&CSP_CODEBOOK, &PATTERN_CODEBOOK, &RAW_CODEBOOK, &SELECTOR_CODEBOOK]
}

/// CRC32 over every table entry. Compiled snapshots record this value and
/// refuse to load against different tables.
pub fn fingerprint() -> u32 {
    static FINGERPRINT: OnceLock<u32> = OnceLock::new();
    *FINGERPRINT.get_or_init(|| {
        let mut parts: Vec<&[u8]> = Vec::new();
        for codebook in codebooks() {
            parts.push(codebook.name.as_bytes());
            for entry in codebook.table {
                parts.push(b"\0");
                parts.push(entry.as_bytes());
            }
            parts.push(b"\n");
        }
        crc32_parts(&parts)
    })
}
