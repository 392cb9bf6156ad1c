//! Filter data model
//!
//! Network and cosmetic filters share a small capability set: a stable
//! content id, the token groups used to index them, and their kind. Options
//! are packed into bit masks and read back through named accessors.

pub mod cosmetic;
pub mod hostnames;
pub mod network;

pub use cosmetic::{CosmeticFilter, CosmeticFilterMask};
pub use hostnames::HostnameList;
pub use network::{NetworkFilter, NetworkFilterMask};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Network,
    Cosmetic,
}

/// Capabilities shared by every filter type.
pub trait Filter {
    /// Stable content hash, computed on first access.
    fn id(&self) -> u32;

    /// Alternative token groups. The filter is a candidate for a request or
    /// page whenever every token of one group is present, so indexing it under
    /// any single token of each group is enough. An empty group means the
    /// filter has no usable token.
    fn tokens(&self) -> Vec<Vec<u32>>;

    fn kind(&self) -> FilterKind;
}
