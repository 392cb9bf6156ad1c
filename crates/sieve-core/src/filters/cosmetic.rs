//! Cosmetic (element hiding and scriptlet) filters.

use std::fmt;
use std::sync::OnceLock;

use crate::bits::TokenBuffer;
use crate::hash::FilterIdHasher;
use crate::tokenizer::tokenize_css;

use super::{Filter, FilterKind, HostnameList};

bitflags::bitflags! {
    /// Option bits of a cosmetic filter.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CosmeticFilterMask: u8 {
        /// `#@#` exception: cancels hiding/injection of the same selector
        const UNHIDE = 1 << 0;
        /// `script:inject(...)` / `+js(...)`: selector is a scriptlet to inject
        const SCRIPT_INJECT = 1 << 1;
        /// `script:contains(...)`: selector is a substring or regex of inline
        /// scripts to block
        const SCRIPT_BLOCK = 1 << 2;
    }
}

/// What a cosmetic filter does once it applies to a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CosmeticAction {
    Hide,
    InjectScript,
    BlockScript,
}

/// A parsed cosmetic filter.
///
/// Immutable after construction. The id is computed on first access.
#[derive(Debug)]
pub struct CosmeticFilter {
    mask: CosmeticFilterMask,
    selector: String,
    hostnames: Option<HostnameList>,
    raw_line: Option<String>,
    id: OnceLock<u32>,
}

impl CosmeticFilter {
    pub fn new(mask: CosmeticFilterMask, selector: impl Into<String>, hostnames: Option<String>) -> Self {
        Self {
            mask,
            selector: selector.into(),
            hostnames: hostnames.map(HostnameList::new),
            raw_line: None,
            id: OnceLock::new(),
        }
    }

    pub fn with_raw_line(mut self, raw_line: impl Into<String>) -> Self {
        self.raw_line = Some(raw_line.into());
        self
    }

    #[inline]
    pub fn mask(&self) -> CosmeticFilterMask {
        self.mask
    }

    #[inline]
    pub fn selector(&self) -> &str {
        &self.selector
    }

    #[inline]
    pub fn raw_line(&self) -> Option<&str> {
        self.raw_line.as_deref()
    }

    #[inline]
    pub fn is_unhide(&self) -> bool {
        self.mask.contains(CosmeticFilterMask::UNHIDE)
    }

    #[inline]
    pub fn is_script_inject(&self) -> bool {
        self.mask.contains(CosmeticFilterMask::SCRIPT_INJECT)
    }

    #[inline]
    pub fn is_script_block(&self) -> bool {
        self.mask.contains(CosmeticFilterMask::SCRIPT_BLOCK)
    }

    pub fn action(&self) -> CosmeticAction {
        if self.is_script_inject() {
            CosmeticAction::InjectScript
        } else if self.is_script_block() {
            CosmeticAction::BlockScript
        } else {
            CosmeticAction::Hide
        }
    }

    #[inline]
    pub fn has_hostnames(&self) -> bool {
        self.hostnames.is_some()
    }

    pub fn hostname_list(&self) -> Option<&HostnameList> {
        self.hostnames.as_ref()
    }

    /// Hostname restrictions, longest first.
    pub fn hostnames(&self) -> Vec<&str> {
        self.hostnames
            .as_ref()
            .map(|list| list.entries().collect())
            .unwrap_or_default()
    }

    /// Check the hostname restriction against a page hostname.
    pub fn matches_hostname(&self, hostname: &str) -> bool {
        self.hostnames.as_ref().map_or(true, |list| list.matches(hostname))
    }

    /// Tokens of the selector, written into `buffer`.
    ///
    /// Only the compound selector after the last `+`, `>` or `~` combinator
    /// is tokenized and attribute brackets are skipped. Scriptlet and
    /// script-blocking filters have no selector tokens.
    pub fn tokens_selector<'b>(&self, buffer: &'b mut TokenBuffer) -> &'b [u32] {
        buffer.clear();
        if self.is_script_inject() || self.is_script_block() {
            return buffer.as_slice();
        }

        let selector = self.selector.as_bytes();
        let sep_index = selector
            .iter()
            .rposition(|&c| matches!(c, b'+' | b'>' | b'~'))
            .unwrap_or(0);

        let mut depth = 0usize;
        let mut start = sep_index;
        for (i, &c) in selector.iter().enumerate().skip(sep_index) {
            match c {
                b'[' => {
                    if depth == 0 && start < i {
                        tokenize_css(&self.selector[start..i], buffer);
                    }
                    depth += 1;
                }
                b']' => {
                    depth = depth.saturating_sub(1);
                    start = i + 1;
                }
                _ => {}
            }
        }

        if depth == 0 && start < selector.len() {
            tokenize_css(&self.selector[start..], buffer);
        }

        buffer.as_slice()
    }
}

impl Filter for CosmeticFilter {
    fn id(&self) -> u32 {
        *self.id.get_or_init(|| {
            let mut hasher = FilterIdHasher::new(self.mask.bits() as u32);
            hasher.write_field(Some(&self.selector));
            hasher.write_field(self.hostnames.as_ref().map(HostnameList::as_str));
            hasher.finish()
        })
    }

    fn tokens(&self) -> Vec<Vec<u32>> {
        let mut buffer = TokenBuffer::new();
        vec![self.tokens_selector(&mut buffer).to_vec()]
    }

    fn kind(&self) -> FilterKind {
        FilterKind::Cosmetic
    }
}

impl Clone for CosmeticFilter {
    fn clone(&self) -> Self {
        Self {
            mask: self.mask,
            selector: self.selector.clone(),
            hostnames: self.hostnames.clone(),
            raw_line: self.raw_line.clone(),
            id: self.id.clone(),
        }
    }
}

impl PartialEq for CosmeticFilter {
    fn eq(&self, other: &Self) -> bool {
        self.mask == other.mask && self.selector == other.selector && self.hostnames == other.hostnames
    }
}

/// Human-readable form, mostly for debugging.
impl fmt::Display for CosmeticFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(hostnames) = &self.hostnames {
            f.write_str(hostnames.as_str())?;
        }
        f.write_str(if self.is_unhide() { "#@#" } else { "##" })?;
        match self.action() {
            CosmeticAction::InjectScript => write!(f, "script:inject({})", self.selector),
            CosmeticAction::BlockScript => write!(f, "script:contains({})", self.selector),
            CosmeticAction::Hide => f.write_str(&self.selector),
        }
    }
}
