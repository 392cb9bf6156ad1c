//! Engine compilation and snapshot writing.
//!
//! The snapshot layout is described in `sieve_core::snapshot`. Output is
//! deterministic: filters keep their engine order and index buckets are
//! written in ascending token order.

use sieve_core::bits::set_bit;
use sieve_core::codebook::{self, Codebook, CSP_CODEBOOK, PATTERN_CODEBOOK, RAW_CODEBOOK, SELECTOR_CODEBOOK};
use sieve_core::engine::Engine;
use sieve_core::filters::{CosmeticFilter, HostnameList, NetworkFilter};
use sieve_core::hash::crc32;
use sieve_core::index::ReverseIndex;
use sieve_core::snapshot::{
    align_offset, cosmetic_fields, header, header_flags, network_fields, section_entry, snapshot_crc32,
    write_posting_list, write_varint, SectionId, HEADER_SIZE, SECTION_ALIGNMENT, SECTION_ENTRY_SIZE,
    SIEVE_MAGIC, SIEVE_VERSION,
};

use crate::optimizer::optimize_filters;
use crate::parser::{parse_filter_list, ParseOptions};

/// Parse, clean up and index a filter list.
pub fn compile(text: &str, options: &ParseOptions) -> Engine {
    let parsed = parse_filter_list(text, options);
    let (mut network, mut cosmetic) = (parsed.network, parsed.cosmetic);
    let stats = optimize_filters(&mut network, &mut cosmetic);

    let engine = Engine::new(network, cosmetic);
    log::info!(
        "compiled {} network and {} cosmetic filters ({} rejected lines, {} duplicates, {} badfiltered)",
        engine.network_filters().len(),
        engine.cosmetic_filters().len(),
        parsed.rejected.len(),
        stats.deduped,
        stats.badfiltered_rules
    );
    engine
}

/// Write an engine as a snapshot.
pub fn serialize(engine: &Engine) -> Vec<u8> {
    let indexes = engine.indexes();
    let network = engine.network_filters();
    let cosmetic = engine.cosmetic_filters();

    let sections = vec![
        SectionData::new(SectionId::NetworkFilters, network.len(), build_network_section(network)),
        SectionData::new(SectionId::CosmeticFilters, cosmetic.len(), build_cosmetic_section(cosmetic)),
        SectionData::index(SectionId::BlockIndex, &indexes.blocks),
        SectionData::index(SectionId::ExceptionIndex, &indexes.exceptions),
        SectionData::index(SectionId::RedirectIndex, &indexes.redirects),
        SectionData::index(SectionId::CspIndex, &indexes.csp),
        SectionData::index(SectionId::CosmeticHostnameIndex, &indexes.cosmetic_hostnames),
        SectionData::index(SectionId::CosmeticGenericIndex, &indexes.cosmetic_generic),
    ];

    let buffer = assemble(sections);
    log::info!("serialized snapshot: {} bytes", buffer.len());
    buffer
}

fn assemble(mut sections: Vec<SectionData>) -> Vec<u8> {
    let section_count = sections.len();
    let section_dir_offset = HEADER_SIZE;
    let section_dir_bytes = section_count * SECTION_ENTRY_SIZE;
    let mut data_offset = align_offset(section_dir_offset + section_dir_bytes, SECTION_ALIGNMENT);

    for section in &mut sections {
        section.offset = data_offset;
        data_offset = align_offset(data_offset + section.data.len(), SECTION_ALIGNMENT);
    }

    let total_size = data_offset;
    let mut buffer = vec![0u8; total_size];

    buffer[header::MAGIC..header::MAGIC + 4].copy_from_slice(&SIEVE_MAGIC);
    write_u16_le(&mut buffer, header::VERSION, SIEVE_VERSION);
    write_u16_le(&mut buffer, header::FLAGS, header_flags::HAS_CRC32);
    write_u32_le(&mut buffer, header::HEADER_BYTES, HEADER_SIZE as u32);
    write_u32_le(&mut buffer, header::SECTION_COUNT, section_count as u32);
    write_u32_le(&mut buffer, header::SECTION_DIR_OFFSET, section_dir_offset as u32);
    write_u32_le(&mut buffer, header::SECTION_DIR_BYTES, section_dir_bytes as u32);
    write_u32_le(&mut buffer, header::CODEBOOK_FINGERPRINT, codebook::fingerprint());

    for (index, section) in sections.iter().enumerate() {
        log::debug!(
            "section {:?}: {} bytes at {}, {} items",
            section.id,
            section.data.len(),
            section.offset,
            section.item_count
        );
        let entry_offset = section_dir_offset + index * SECTION_ENTRY_SIZE;
        write_u16_le(&mut buffer, entry_offset + section_entry::ID, section.id as u16);
        write_u16_le(&mut buffer, entry_offset + section_entry::FLAGS, 0);
        write_u32_le(&mut buffer, entry_offset + section_entry::OFFSET, section.offset as u32);
        write_u32_le(&mut buffer, entry_offset + section_entry::LENGTH, section.data.len() as u32);
        write_u32_le(&mut buffer, entry_offset + section_entry::ITEM_COUNT, section.item_count as u32);
        write_u32_le(&mut buffer, entry_offset + section_entry::CRC32, crc32(&section.data));

        let end = section.offset + section.data.len();
        buffer[section.offset..end].copy_from_slice(&section.data);
    }

    let crc = snapshot_crc32(&buffer);
    write_u32_le(&mut buffer, header::SNAPSHOT_CRC32, crc);

    buffer
}

struct SectionData {
    id: SectionId,
    item_count: usize,
    data: Vec<u8>,
    offset: usize,
}

impl SectionData {
    fn new(id: SectionId, item_count: usize, data: Vec<u8>) -> Self {
        Self {
            id,
            item_count,
            data,
            offset: 0,
        }
    }

    fn index(id: SectionId, index: &ReverseIndex) -> Self {
        Self::new(id, index.bucket_count(), build_index_section(index))
    }
}

// =============================================================================
// Sections
// =============================================================================

fn build_network_section(filters: &[NetworkFilter]) -> Vec<u8> {
    let mut buf = Vec::new();
    write_varint(&mut buf, filters.len() as u32);

    for filter in filters {
        let pattern = Some(filter.pattern()).filter(|pattern| !pattern.is_empty());
        let domains = filter.domains().map(HostnameList::as_str);
        let denyallow = filter.denyallow().map(HostnameList::as_str);
        let option_value = filter.option_value();
        let raw_line = filter.raw_line();

        let mut fields = 0u32;
        for (present, bit) in [
            (pattern.is_some(), network_fields::PATTERN),
            (domains.is_some(), network_fields::DOMAINS),
            (denyallow.is_some(), network_fields::DENYALLOW),
            (option_value.is_some(), network_fields::OPTION_VALUE),
            (raw_line.is_some(), network_fields::RAW_LINE),
        ] {
            if present {
                fields = set_bit(fields, bit);
            }
        }

        buf.extend_from_slice(&filter.mask().bits().to_le_bytes());
        buf.push(fields as u8);
        write_optional_string(&mut buf, pattern, &PATTERN_CODEBOOK);
        write_optional_string(&mut buf, domains, &RAW_CODEBOOK);
        write_optional_string(&mut buf, denyallow, &RAW_CODEBOOK);
        let value_codebook = if filter.is_csp() { &CSP_CODEBOOK } else { &RAW_CODEBOOK };
        write_optional_string(&mut buf, option_value, value_codebook);
        write_optional_string(&mut buf, raw_line, &RAW_CODEBOOK);
    }

    buf
}

fn build_cosmetic_section(filters: &[CosmeticFilter]) -> Vec<u8> {
    let mut buf = Vec::new();
    write_varint(&mut buf, filters.len() as u32);

    for filter in filters {
        let hostnames = filter.hostname_list().map(HostnameList::as_str);
        let raw_line = filter.raw_line();

        let mut fields = 0u32;
        if hostnames.is_some() {
            fields = set_bit(fields, cosmetic_fields::HOSTNAMES);
        }
        if raw_line.is_some() {
            fields = set_bit(fields, cosmetic_fields::RAW_LINE);
        }

        buf.push(filter.mask().bits());
        buf.push(fields as u8);
        write_string(&mut buf, filter.selector(), &SELECTOR_CODEBOOK);
        write_optional_string(&mut buf, hostnames, &RAW_CODEBOOK);
        write_optional_string(&mut buf, raw_line, &RAW_CODEBOOK);
    }

    buf
}

fn build_index_section(index: &ReverseIndex) -> Vec<u8> {
    let buckets = index.sorted_buckets();
    let mut buf = Vec::new();
    write_varint(&mut buf, buckets.len() as u32);
    for (token, postings) in buckets {
        buf.extend_from_slice(&token.to_le_bytes());
        write_posting_list(&mut buf, postings);
    }
    write_posting_list(&mut buf, index.catch_all());
    buf
}

fn write_string(buf: &mut Vec<u8>, text: &str, codebook: &Codebook) {
    let codes = codebook.encode(text);
    write_varint(buf, codes.len() as u32);
    buf.extend_from_slice(&codes);
}

fn write_optional_string(buf: &mut Vec<u8>, text: Option<&str>, codebook: &Codebook) {
    if let Some(text) = text {
        write_string(buf, text, codebook);
    }
}

fn write_u16_le(data: &mut [u8], offset: usize, value: u16) {
    data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn write_u32_le(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}
