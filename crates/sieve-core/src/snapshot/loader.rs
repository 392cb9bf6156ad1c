//! Sieve Snapshot Loader
//!
//! Reads a snapshot back into an [`Engine`]. Every read is bounds-checked;
//! malformed input of any kind fails the whole load.

use std::collections::HashMap;

use super::format::*;
use crate::bits::{clear_bit, get_bit};
use crate::codebook::{self, Codebook, CodebookError, CSP_CODEBOOK, PATTERN_CODEBOOK, RAW_CODEBOOK, SELECTOR_CODEBOOK};
use crate::engine::{Engine, EngineIndexes};
use crate::filters::{CosmeticFilter, CosmeticFilterMask, NetworkFilter, NetworkFilterMask};
use crate::hash::{crc32, crc32_parts};
use crate::index::ReverseIndex;

/// Error type for snapshot loading.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Data too short")]
    DataTooShort,
    #[error("Invalid magic bytes")]
    InvalidMagic,
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(u16),
    #[error("Codebook fingerprint mismatch: stored={stored:#010x}, expected={expected:#010x}")]
    CodebookMismatch { stored: u32, expected: u32 },
    #[error("CRC32 mismatch: stored={stored}, computed={computed}")]
    Crc32Mismatch { stored: u32, computed: u32 },
    #[error("Missing section: {0:?}")]
    MissingSection(SectionId),
    #[error("Truncated data at byte {offset}")]
    Truncated { offset: usize },
    #[error("Invalid record at byte {offset}: {reason}")]
    InvalidRecord { offset: usize, reason: &'static str },
    #[error("Bad codebook data at byte {offset}: {source}")]
    Codebook {
        offset: usize,
        #[source]
        source: CodebookError,
    },
}

/// Section metadata.
#[derive(Debug, Clone)]
pub struct SectionInfo {
    pub id: SectionId,
    pub flags: u16,
    pub offset: usize,
    pub length: usize,
    pub item_count: u32,
    pub crc32: u32,
}

// =============================================================================
// Byte Reader
// =============================================================================

/// Cursor over one section. Offsets in errors are absolute file offsets.
struct ByteReader<'a> {
    data: &'a [u8],
    base: usize,
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8], base: usize) -> Self {
        Self { data, base, pos: 0 }
    }

    #[inline]
    fn offset(&self) -> usize {
        self.base + self.pos
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8], SnapshotError> {
        let end = self.pos.checked_add(len).filter(|&end| end <= self.data.len());
        match end {
            Some(end) => {
                let slice = &self.data[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(SnapshotError::Truncated { offset: self.offset() }),
        }
    }

    fn u8(&mut self) -> Result<u8, SnapshotError> {
        Ok(self.bytes(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, SnapshotError> {
        let bytes = self.bytes(4)?;
        Ok(read_u32_le(bytes, 0))
    }

    fn varint(&mut self) -> Result<u32, SnapshotError> {
        let start = self.offset();
        let mut result: u32 = 0;
        let mut shift = 0;
        loop {
            let byte = self.u8()?;
            if shift == 28 && byte > 0x0f {
                return Err(SnapshotError::InvalidRecord {
                    offset: start,
                    reason: "varint overflows u32",
                });
            }
            result |= ((byte & 0x7f) as u32) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }
    }

    fn string(&mut self, codebook: &Codebook) -> Result<String, SnapshotError> {
        let len = self.varint()? as usize;
        let offset = self.offset();
        let codes = self.bytes(len)?;
        codebook
            .decode(codes)
            .map_err(|source| SnapshotError::Codebook { offset, source })
    }

    fn optional_string(&mut self, present: bool, codebook: &Codebook) -> Result<Option<String>, SnapshotError> {
        if present {
            self.string(codebook).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Read a delta-encoded posting list; every entry must be `< limit`.
    fn posting_list(&mut self, limit: usize) -> Result<Vec<u32>, SnapshotError> {
        let count = self.varint()? as usize;
        // Each posting takes at least one byte.
        if count > self.data.len() - self.pos {
            return Err(SnapshotError::Truncated { offset: self.offset() });
        }
        let mut postings = Vec::with_capacity(count);
        let mut prev: u32 = 0;
        for i in 0..count {
            let offset = self.offset();
            let delta = self.varint()?;
            if i > 0 && delta == 0 {
                return Err(SnapshotError::InvalidRecord {
                    offset,
                    reason: "posting list not strictly ascending",
                });
            }
            prev = prev.checked_add(delta).ok_or(SnapshotError::InvalidRecord {
                offset,
                reason: "posting overflows u32",
            })?;
            if prev as usize >= limit {
                return Err(SnapshotError::InvalidRecord {
                    offset,
                    reason: "posting out of range",
                });
            }
            postings.push(prev);
        }
        Ok(postings)
    }
}

// =============================================================================
// Snapshot View
// =============================================================================

/// Validated snapshot header and section directory.
pub struct Snapshot<'a> {
    data: &'a [u8],
    pub version: u16,
    pub flags: u16,
    pub codebook_fingerprint: u32,
    sections: HashMap<SectionId, SectionInfo>,
}

impl<'a> Snapshot<'a> {
    /// Validate the header, checksum and section directory.
    pub fn load(data: &'a [u8]) -> Result<Self, SnapshotError> {
        if data.len() < HEADER_SIZE {
            return Err(SnapshotError::DataTooShort);
        }

        if !validate_magic(data) {
            return Err(SnapshotError::InvalidMagic);
        }

        let version = read_u16_le(data, header::VERSION);
        if version != SIEVE_VERSION {
            return Err(SnapshotError::UnsupportedVersion(version));
        }

        let codebook_fingerprint = read_u32_le(data, header::CODEBOOK_FINGERPRINT);
        let expected = codebook::fingerprint();
        if codebook_fingerprint != expected {
            return Err(SnapshotError::CodebookMismatch {
                stored: codebook_fingerprint,
                expected,
            });
        }

        let flags = read_u16_le(data, header::FLAGS);
        if flags & header_flags::HAS_CRC32 != 0 {
            let stored = read_u32_le(data, header::SNAPSHOT_CRC32);
            let computed = snapshot_crc32(data);
            if stored != computed {
                return Err(SnapshotError::Crc32Mismatch { stored, computed });
            }
        }

        let section_count = read_u32_le(data, header::SECTION_COUNT) as usize;
        let section_dir_offset = read_u32_le(data, header::SECTION_DIR_OFFSET) as usize;
        let dir_end = section_count
            .checked_mul(SECTION_ENTRY_SIZE)
            .and_then(|bytes| bytes.checked_add(section_dir_offset))
            .filter(|&end| end <= data.len())
            .ok_or(SnapshotError::Truncated {
                offset: section_dir_offset,
            })?;

        let mut sections = HashMap::new();
        for entry_offset in (section_dir_offset..dir_end).step_by(SECTION_ENTRY_SIZE) {
            let id_raw = read_u16_le(data, entry_offset + section_entry::ID);
            let Ok(id) = SectionId::try_from(id_raw) else {
                log::debug!("skipping unknown section {id_raw:#06x}");
                continue;
            };

            let info = SectionInfo {
                id,
                flags: read_u16_le(data, entry_offset + section_entry::FLAGS),
                offset: read_u32_le(data, entry_offset + section_entry::OFFSET) as usize,
                length: read_u32_le(data, entry_offset + section_entry::LENGTH) as usize,
                item_count: read_u32_le(data, entry_offset + section_entry::ITEM_COUNT),
                crc32: read_u32_le(data, entry_offset + section_entry::CRC32),
            };

            if info.offset.checked_add(info.length).map_or(true, |end| end > data.len()) {
                return Err(SnapshotError::Truncated { offset: entry_offset });
            }
            let computed = crc32(&data[info.offset..info.offset + info.length]);
            if computed != info.crc32 {
                return Err(SnapshotError::Crc32Mismatch {
                    stored: info.crc32,
                    computed,
                });
            }

            sections.insert(id, info);
        }

        Ok(Self {
            data,
            version,
            flags,
            codebook_fingerprint,
            sections,
        })
    }

    pub fn section_info(&self, id: SectionId) -> Option<&SectionInfo> {
        self.sections.get(&id)
    }

    fn reader(&self, id: SectionId) -> Result<ByteReader<'a>, SnapshotError> {
        let info = self.sections.get(&id).ok_or(SnapshotError::MissingSection(id))?;
        let bytes = &self.data[info.offset..info.offset + info.length];
        log::debug!("loading section {:?}: {} bytes, {} items", id, info.length, info.item_count);
        Ok(ByteReader::new(bytes, info.offset))
    }

    // =========================================================================
    // Sections
    // =========================================================================

    pub fn network_filters(&self) -> Result<Vec<NetworkFilter>, SnapshotError> {
        let mut reader = self.reader(SectionId::NetworkFilters)?;
        let count = read_count(&mut reader)?;
        let mut filters = Vec::with_capacity(count);

        for _ in 0..count {
            let mask = NetworkFilterMask::from_bits_retain(reader.u32()?);
            let fields_offset = reader.offset();
            let fields = u32::from(reader.u8()?);
            if clear_bit(fields, network_fields::ALL) != 0 {
                return Err(SnapshotError::InvalidRecord {
                    offset: fields_offset,
                    reason: "unknown network field bits",
                });
            }

            let pattern = reader
                .optional_string(get_bit(fields, network_fields::PATTERN), &PATTERN_CODEBOOK)?
                .unwrap_or_default();
            let domains = reader.optional_string(get_bit(fields, network_fields::DOMAINS), &RAW_CODEBOOK)?;
            let denyallow = reader.optional_string(get_bit(fields, network_fields::DENYALLOW), &RAW_CODEBOOK)?;
            let value_codebook = if mask.contains(NetworkFilterMask::IS_CSP) {
                &CSP_CODEBOOK
            } else {
                &RAW_CODEBOOK
            };
            let option_value = reader.optional_string(get_bit(fields, network_fields::OPTION_VALUE), value_codebook)?;
            let raw_line = reader.optional_string(get_bit(fields, network_fields::RAW_LINE), &RAW_CODEBOOK)?;

            let mut filter = NetworkFilter::new(mask, pattern)
                .with_domains(domains)
                .with_denyallow(denyallow)
                .with_option_value(option_value);
            if let Some(raw_line) = raw_line {
                filter = filter.with_raw_line(raw_line);
            }
            filters.push(filter);
        }

        expect_end(&reader)?;
        Ok(filters)
    }

    pub fn cosmetic_filters(&self) -> Result<Vec<CosmeticFilter>, SnapshotError> {
        let mut reader = self.reader(SectionId::CosmeticFilters)?;
        let count = read_count(&mut reader)?;
        let mut filters = Vec::with_capacity(count);

        for _ in 0..count {
            let mask_offset = reader.offset();
            let mask = CosmeticFilterMask::from_bits(reader.u8()?).ok_or(SnapshotError::InvalidRecord {
                offset: mask_offset,
                reason: "unknown cosmetic mask bits",
            })?;
            let fields_offset = reader.offset();
            let fields = u32::from(reader.u8()?);
            if clear_bit(fields, cosmetic_fields::ALL) != 0 {
                return Err(SnapshotError::InvalidRecord {
                    offset: fields_offset,
                    reason: "unknown cosmetic field bits",
                });
            }

            let selector = reader.string(&SELECTOR_CODEBOOK)?;
            let hostnames = reader.optional_string(get_bit(fields, cosmetic_fields::HOSTNAMES), &RAW_CODEBOOK)?;
            let raw_line = reader.optional_string(get_bit(fields, cosmetic_fields::RAW_LINE), &RAW_CODEBOOK)?;

            let mut filter = CosmeticFilter::new(mask, selector, hostnames);
            if let Some(raw_line) = raw_line {
                filter = filter.with_raw_line(raw_line);
            }
            filters.push(filter);
        }

        expect_end(&reader)?;
        Ok(filters)
    }

    /// Read an index section whose postings point into a list of `limit` filters.
    pub fn index(&self, id: SectionId, limit: usize) -> Result<ReverseIndex, SnapshotError> {
        let mut reader = self.reader(id)?;
        let bucket_count = read_count(&mut reader)?;
        let mut buckets = HashMap::with_capacity(bucket_count);

        for _ in 0..bucket_count {
            let token_offset = reader.offset();
            let token = reader.u32()?;
            let postings = reader.posting_list(limit)?;
            if buckets.insert(token, postings).is_some() {
                return Err(SnapshotError::InvalidRecord {
                    offset: token_offset,
                    reason: "duplicate index bucket",
                });
            }
        }
        let catch_all = reader.posting_list(limit)?;

        expect_end(&reader)?;
        Ok(ReverseIndex::from_parts(buckets, catch_all))
    }

    /// Decode every section into an engine.
    pub fn into_engine(self) -> Result<Engine, SnapshotError> {
        let network = self.network_filters()?;
        let cosmetic = self.cosmetic_filters()?;

        let indexes = EngineIndexes {
            blocks: self.index(SectionId::BlockIndex, network.len())?,
            exceptions: self.index(SectionId::ExceptionIndex, network.len())?,
            redirects: self.index(SectionId::RedirectIndex, network.len())?,
            csp: self.index(SectionId::CspIndex, network.len())?,
            cosmetic_hostnames: self.index(SectionId::CosmeticHostnameIndex, cosmetic.len())?,
            cosmetic_generic: self.index(SectionId::CosmeticGenericIndex, cosmetic.len())?,
        };

        log::info!(
            "snapshot loaded: {} network filters, {} cosmetic filters, {} bytes",
            network.len(),
            cosmetic.len(),
            self.data.len()
        );

        Ok(Engine::from_parts(network, cosmetic, indexes))
    }
}

/// CRC32 over the whole snapshot with the CRC field itself skipped.
pub fn snapshot_crc32(data: &[u8]) -> u32 {
    crc32_parts(&[
        &data[..header::SNAPSHOT_CRC32],
        &data[header::SNAPSHOT_CRC32 + 4..],
    ])
}

/// Read a record count, rejecting counts the remaining bytes cannot hold.
fn read_count(reader: &mut ByteReader<'_>) -> Result<usize, SnapshotError> {
    let offset = reader.offset();
    let count = reader.varint()? as usize;
    if count > reader.data.len() - reader.pos {
        return Err(SnapshotError::Truncated { offset });
    }
    Ok(count)
}

fn expect_end(reader: &ByteReader<'_>) -> Result<(), SnapshotError> {
    if reader.is_at_end() {
        Ok(())
    } else {
        Err(SnapshotError::InvalidRecord {
            offset: reader.offset(),
            reason: "trailing bytes after section records",
        })
    }
}

/// Load an engine from snapshot bytes.
pub fn load_engine(data: &[u8]) -> Result<Engine, SnapshotError> {
    Snapshot::load(data)?.into_engine()
}

impl Engine {
    /// Rebuild an engine from bytes produced by the compiler's serializer.
    pub fn deserialize(data: &[u8]) -> Result<Engine, SnapshotError> {
        load_engine(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(version: u16, fingerprint: u32) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_SIZE];
        data[..4].copy_from_slice(&SIEVE_MAGIC);
        data[header::VERSION..header::VERSION + 2].copy_from_slice(&version.to_le_bytes());
        data[header::HEADER_BYTES..header::HEADER_BYTES + 4].copy_from_slice(&(HEADER_SIZE as u32).to_le_bytes());
        data[header::SECTION_DIR_OFFSET..header::SECTION_DIR_OFFSET + 4]
            .copy_from_slice(&(HEADER_SIZE as u32).to_le_bytes());
        data[header::CODEBOOK_FINGERPRINT..header::CODEBOOK_FINGERPRINT + 4].copy_from_slice(&fingerprint.to_le_bytes());
        data
    }

    #[test]
    fn test_rejects_short_data() {
        assert!(matches!(Engine::deserialize(&[]), Err(SnapshotError::DataTooShort)));
        assert!(matches!(Engine::deserialize(b"SIV1"), Err(SnapshotError::DataTooShort)));
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut data = header_bytes(SIEVE_VERSION, codebook::fingerprint());
        data[0] = b'X';
        assert!(matches!(Engine::deserialize(&data), Err(SnapshotError::InvalidMagic)));
    }

    #[test]
    fn test_rejects_other_version() {
        let data = header_bytes(SIEVE_VERSION + 1, codebook::fingerprint());
        assert!(matches!(
            Engine::deserialize(&data),
            Err(SnapshotError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn test_rejects_other_codebooks() {
        let data = header_bytes(SIEVE_VERSION, codebook::fingerprint() ^ 1);
        assert!(matches!(
            Engine::deserialize(&data),
            Err(SnapshotError::CodebookMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_crc() {
        let mut data = header_bytes(SIEVE_VERSION, codebook::fingerprint());
        data[header::FLAGS..header::FLAGS + 2].copy_from_slice(&header_flags::HAS_CRC32.to_le_bytes());
        let crc = snapshot_crc32(&data);
        data[header::SNAPSHOT_CRC32..header::SNAPSHOT_CRC32 + 4].copy_from_slice(&(crc ^ 0xdead).to_le_bytes());
        assert!(matches!(
            Engine::deserialize(&data),
            Err(SnapshotError::Crc32Mismatch { .. })
        ));
    }

    #[test]
    fn test_missing_sections() {
        let data = header_bytes(SIEVE_VERSION, codebook::fingerprint());
        assert!(matches!(
            Engine::deserialize(&data),
            Err(SnapshotError::MissingSection(SectionId::NetworkFilters))
        ));
    }

    #[test]
    fn test_directory_past_end() {
        let mut data = header_bytes(SIEVE_VERSION, codebook::fingerprint());
        data[header::SECTION_COUNT..header::SECTION_COUNT + 4].copy_from_slice(&3u32.to_le_bytes());
        assert!(matches!(
            Engine::deserialize(&data),
            Err(SnapshotError::Truncated { offset: HEADER_SIZE })
        ));
    }

    #[test]
    fn test_reader_varint_and_bounds() {
        let mut reader = ByteReader::new(&[0xac, 0x02, 0x80], 100);
        assert_eq!(reader.varint().unwrap(), 300);
        assert!(matches!(reader.varint(), Err(SnapshotError::Truncated { offset: 103 })));

        let mut overflow = ByteReader::new(&[0xff, 0xff, 0xff, 0xff, 0x7f], 0);
        assert!(matches!(overflow.varint(), Err(SnapshotError::InvalidRecord { offset: 0, .. })));
    }

    #[test]
    fn test_reader_posting_list() {
        let mut out = Vec::new();
        write_posting_list(&mut out, &[1, 4, 9]);
        let mut reader = ByteReader::new(&out, 0);
        assert_eq!(reader.posting_list(10).unwrap(), vec![1, 4, 9]);

        let mut reader = ByteReader::new(&out, 0);
        assert!(matches!(reader.posting_list(9), Err(SnapshotError::InvalidRecord { .. })));
    }

    #[test]
    fn test_reader_string_reports_codebook_offset() {
        let unknown = SELECTOR_CODEBOOK.table().len() as u8;
        let bytes = [1, unknown];
        let mut reader = ByteReader::new(&bytes, 40);
        match reader.string(&SELECTOR_CODEBOOK) {
            Err(SnapshotError::Codebook { offset, .. }) => assert_eq!(offset, 41),
            other => panic!("unexpected {other:?}"),
        }
    }
}
