//! Sieve Core Library
//!
//! This crate provides the filter data model and matching engine for the
//! sieve content blocker.
//!
//! # Architecture
//!
//! Filters are parsed by `sieve-compiler` into [`NetworkFilter`] and
//! [`CosmeticFilter`] values, indexed by token into an [`Engine`], and can be
//! stored as a compact binary snapshot whose strings are compressed against
//! static codebooks. Matching a request only visits the filters indexed under
//! one of the request's tokens.
//!
//! # Modules
//!
//! - `bits`: Bit helpers and the fixed-capacity token buffer
//! - `codebook`: Substitution compression for filter strings
//! - `dataset`: NDJSON request logs
//! - `domain`: Registrable domain heuristics and hostname suffixes
//! - `engine`: Request and page matching
//! - `filters`: Network and cosmetic filter types
//! - `hash`: Murmur3 token hashing, filter ids and CRC32
//! - `index`: Reverse token index
//! - `snapshot`: Binary snapshot format and loader
//! - `tokenizer`: URL, pattern and CSS tokenizers
//! - `types`: Requests and match results
//! - `url`: Fast URL parsing without allocations

pub mod bits;
pub mod codebook;
#[cfg(feature = "dataset")]
pub mod dataset;
pub mod domain;
pub mod engine;
pub mod filters;
pub mod hash;
pub mod index;
pub mod snapshot;
pub mod tokenizer;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use domain::{get_etld1, is_third_party};
pub use engine::{Engine, EngineHandle};
pub use filters::{CosmeticFilter, CosmeticFilterMask, Filter, NetworkFilter, NetworkFilterMask};
pub use hash::hash_token;
pub use snapshot::SnapshotError;
pub use types::{CosmeticsResult, Decision, MatchResult, Request, RequestType};
