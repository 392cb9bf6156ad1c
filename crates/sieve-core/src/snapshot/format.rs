//! Snapshot layout, version 1
//!
//! A 64-byte header, a directory of 24-byte section entries, then the
//! sections themselves, each starting on an 8-byte boundary. Integers are
//! little-endian.

pub const SIEVE_MAGIC: [u8; 4] = *b"SIV1";

/// Bumped on any incompatible layout change.
pub const SIEVE_VERSION: u16 = 1;

pub const HEADER_SIZE: usize = 64;

pub const SECTION_ENTRY_SIZE: usize = 24;

/// Sections start on this boundary.
pub const SECTION_ALIGNMENT: usize = 8;

// =============================================================================
// Header
// =============================================================================

/// Byte offsets of the header fields. Bytes 32..64 are reserved and zero.
pub mod header {
    /// `[u8; 4]`
    pub const MAGIC: usize = 0;
    /// `u16`
    pub const VERSION: usize = 4;
    /// `u16`, see [`super::header_flags`]
    pub const FLAGS: usize = 6;
    /// `u32`, equal to `HEADER_SIZE`
    pub const HEADER_BYTES: usize = 8;
    pub const SECTION_COUNT: usize = 12;
    pub const SECTION_DIR_OFFSET: usize = 16;
    pub const SECTION_DIR_BYTES: usize = 20;
    /// `u32` from `codebook::fingerprint()` at write time
    pub const CODEBOOK_FINGERPRINT: usize = 24;
    /// `u32` CRC32 of the whole file with these four bytes left out
    pub const SNAPSHOT_CRC32: usize = 28;
}

pub mod header_flags {
    /// `header::SNAPSHOT_CRC32` is filled in and must be checked
    pub const HAS_CRC32: u16 = 1 << 0;
}

// =============================================================================
// Section Directory
// =============================================================================

/// Byte offsets inside one directory entry. Bytes 20..24 are reserved.
pub mod section_entry {
    /// `u16` [`super::SectionId`]
    pub const ID: usize = 0;
    /// `u16`, written as zero
    pub const FLAGS: usize = 2;
    /// `u32` absolute offset of the section
    pub const OFFSET: usize = 4;
    pub const LENGTH: usize = 8;
    /// `u32` filters or buckets in the section
    pub const ITEM_COUNT: usize = 12;
    /// `u32` CRC32 of the section bytes
    pub const CRC32: usize = 16;
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum SectionId {
    /// Network filter records
    NetworkFilters = 0x0001,
    /// Cosmetic filter records
    CosmeticFilters = 0x0002,
    /// Blocking filter index
    BlockIndex = 0x0003,
    /// Exception filter index
    ExceptionIndex = 0x0004,
    /// `redirect-rule` and redirect exception index
    RedirectIndex = 0x0005,
    /// `csp` filter index
    CspIndex = 0x0006,
    /// Hostname-specific cosmetic filter index
    CosmeticHostnameIndex = 0x0007,
    /// Generic cosmetic filter index
    CosmeticGenericIndex = 0x0008,
}

impl SectionId {
    /// Every section, in file order.
    pub const ALL: [SectionId; 8] = [
        Self::NetworkFilters,
        Self::CosmeticFilters,
        Self::BlockIndex,
        Self::ExceptionIndex,
        Self::RedirectIndex,
        Self::CspIndex,
        Self::CosmeticHostnameIndex,
        Self::CosmeticGenericIndex,
    ];
}

impl TryFrom<u16> for SectionId {
    type Error = ();

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x0001 => Ok(Self::NetworkFilters),
            0x0002 => Ok(Self::CosmeticFilters),
            0x0003 => Ok(Self::BlockIndex),
            0x0004 => Ok(Self::ExceptionIndex),
            0x0005 => Ok(Self::RedirectIndex),
            0x0006 => Ok(Self::CspIndex),
            0x0007 => Ok(Self::CosmeticHostnameIndex),
            0x0008 => Ok(Self::CosmeticGenericIndex),
            _ => Err(()),
        }
    }
}

// =============================================================================
// Record Layouts
// =============================================================================
//
// NetworkFilters:  varint count, then per filter
//                  u32 mask | u8 fields | strings present in `fields`
// CosmeticFilters: varint count, then per filter
//                  u8 mask | u8 fields | selector | strings present in `fields`
// *Index:          varint bucket count, then per bucket
//                  u32 token | varint n | n delta varints
//                  followed by varint n | n delta varints for the catch-all
//
// Strings are a varint byte length followed by codebook codes.

/// Optional string fields of a network filter record.
pub mod network_fields {
    pub const PATTERN: u32 = 1 << 0;
    pub const DOMAINS: u32 = 1 << 1;
    pub const DENYALLOW: u32 = 1 << 2;
    pub const OPTION_VALUE: u32 = 1 << 3;
    pub const RAW_LINE: u32 = 1 << 4;
    pub const ALL: u32 = 0x1f;
}

/// Optional string fields of a cosmetic filter record.
pub mod cosmetic_fields {
    pub const HOSTNAMES: u32 = 1 << 0;
    pub const RAW_LINE: u32 = 1 << 1;
    pub const ALL: u32 = 0x03;
}

// =============================================================================
// Helpers
// =============================================================================

/// Round `offset` up to a multiple of `alignment`, a power of two.
#[inline]
pub const fn align_offset(offset: usize, alignment: usize) -> usize {
    (offset + alignment - 1) & !(alignment - 1)
}

#[inline]
pub fn validate_magic(data: &[u8]) -> bool {
    data.len() >= 4 && data[..4] == SIEVE_MAGIC
}

/// Read u16 little-endian. Caller checks bounds.
#[inline]
pub fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

/// Read u32 little-endian. Caller checks bounds.
#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
}

/// Append a LEB128 varint.
pub fn write_varint(out: &mut Vec<u8>, mut value: u32) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Append a delta-encoded posting list. `postings` must be ascending.
pub fn write_posting_list(out: &mut Vec<u8>, postings: &[u32]) {
    write_varint(out, postings.len() as u32);
    let mut prev = 0u32;
    for &position in postings {
        write_varint(out, position.wrapping_sub(prev));
        prev = position;
    }
}
