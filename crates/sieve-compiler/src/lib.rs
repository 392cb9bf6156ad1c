//! Sieve Filter List Compiler
//!
//! This crate parses EasyList/uBlock style filter lists into `sieve-core`
//! filters, builds the matching engine and writes it as a snapshot.

pub mod builder;
pub mod optimizer;
pub mod parser;

pub use builder::{compile, serialize};
pub use optimizer::{optimize_filters, OptimizeStats};
pub use parser::{
    parse_cosmetic_filter, parse_filter_list, parse_network_filter, CosmeticFilterError, FilterParseError,
    NetworkFilterError, ParseOptions, ParsedFilterList, RejectedLine,
};
