//! Filter list parsing.
//!
//! A list is split into lines; each line is classified as a comment, a
//! network filter or a cosmetic filter and handed to the matching parser.
//! Lines that fail to parse are collected with their reason and never stop
//! the rest of the list.

pub mod cosmetic;
pub mod network;

use sieve_core::filters::{CosmeticFilter, FilterKind, NetworkFilter};

pub use cosmetic::{parse_cosmetic_filter, CosmeticFilterError};
pub use network::{parse_network_filter, NetworkFilterError};

/// Which filters to keep and how much source text to retain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    pub network_filters: bool,
    pub cosmetic_filters: bool,
    /// Store each filter's source line alongside it
    pub keep_raw_lines: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            network_filters: true,
            cosmetic_filters: true,
            keep_raw_lines: false,
        }
    }
}

/// Why a line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterParseError {
    #[error("network filter: {0}")]
    Network(#[from] NetworkFilterError),
    #[error("cosmetic filter: {0}")]
    Cosmetic(#[from] CosmeticFilterError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    /// 1-based
    pub line_number: usize,
    pub line: String,
    pub reason: FilterParseError,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedFilterList {
    pub network: Vec<NetworkFilter>,
    pub cosmetic: Vec<CosmeticFilter>,
    pub rejected: Vec<RejectedLine>,
}

/// Classify a trimmed line. `None` for blank lines and comments.
pub fn detect_filter_kind(line: &str) -> Option<FilterKind> {
    if line.is_empty() || line.starts_with('!') || line.starts_with("[Adblock") || line.starts_with("[uBlock") {
        return None;
    }

    if let Some(sharp) = line.find('#') {
        let after = &line[sharp + 1..];
        let is_cosmetic = ["#", "@#", "?#", "@?#", "$#", "@$#", "%#", "@%#"]
            .iter()
            .any(|marker| after.starts_with(marker));
        if is_cosmetic {
            return Some(FilterKind::Cosmetic);
        }
        // Hosts-file style comment.
        if sharp == 0 {
            return None;
        }
    }

    Some(FilterKind::Network)
}

/// Parse a whole filter list.
pub fn parse_filter_list(text: &str, options: &ParseOptions) -> ParsedFilterList {
    let mut parsed = ParsedFilterList::default();

    for (index, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        let result = match detect_filter_kind(line) {
            None => continue,
            Some(FilterKind::Network) if options.network_filters => {
                parse_network_filter(line, options.keep_raw_lines)
                    .map(|filter| parsed.network.push(filter))
                    .map_err(FilterParseError::from)
            }
            Some(FilterKind::Cosmetic) if options.cosmetic_filters => {
                parse_cosmetic_filter(line, options.keep_raw_lines)
                    .map(|filter| parsed.cosmetic.push(filter))
                    .map_err(FilterParseError::from)
            }
            Some(_) => continue,
        };

        if let Err(reason) = result {
            log::debug!("line {}: rejected {:?}: {}", index + 1, line, reason);
            parsed.rejected.push(RejectedLine {
                line_number: index + 1,
                line: line.to_string(),
                reason,
            });
        }
    }

    log::info!(
        "parsed {} network and {} cosmetic filters ({} lines rejected)",
        parsed.network.len(),
        parsed.cosmetic.len(),
        parsed.rejected.len()
    );

    parsed
}
