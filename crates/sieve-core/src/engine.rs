//! Core matching engine
//!
//! The engine owns every compiled filter and the reverse indexes over them.
//! It is read-only once built, so one engine can serve any number of threads;
//! rebuilding goes through [`EngineHandle`], which swaps whole engines.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use crate::bits::TokenBuffer;
use crate::domain::walk_host_suffixes;
use crate::filters::cosmetic::CosmeticAction;
use crate::filters::{CosmeticFilter, Filter, NetworkFilter};
use crate::hash::hash_token;
use crate::index::ReverseIndex;
use crate::tokenizer::tokenize_url;
use crate::types::{CosmeticsResult, Decision, MatchResult, Request, RequestType};

/// Reverse indexes of an engine. Postings are positions in the engine's
/// network or cosmetic filter list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineIndexes {
    /// Blocking network filters, including `$redirect=` ones
    pub blocks: ReverseIndex,
    /// `@@` network filters
    pub exceptions: ReverseIndex,
    /// `$redirect-rule=` directives and redirect exceptions
    pub redirects: ReverseIndex,
    /// `$csp=` filters and their exceptions
    pub csp: ReverseIndex,
    /// Cosmetic filters keyed by their positive hostnames
    pub cosmetic_hostnames: ReverseIndex,
    /// Cosmetic filters without positive hostnames, keyed by selector tokens
    pub cosmetic_generic: ReverseIndex,
}

/// Compiled filter set.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    network: Vec<NetworkFilter>,
    cosmetic: Vec<CosmeticFilter>,
    indexes: EngineIndexes,
}

impl Engine {
    /// Build an engine and its indexes from parsed filters.
    ///
    /// `$badfilter` filters are kept in the filter list but never indexed.
    pub fn new(network: Vec<NetworkFilter>, cosmetic: Vec<CosmeticFilter>) -> Self {
        let mut blocks = Vec::new();
        let mut exceptions = Vec::new();
        let mut redirects = Vec::new();
        let mut csp = Vec::new();

        for (position, filter) in network.iter().enumerate() {
            if filter.is_badfilter() {
                continue;
            }
            let entry = (position as u32, filter.tokens());
            if filter.is_csp() {
                csp.push(entry);
            } else if filter.is_redirect_rule() || (filter.is_exception() && filter.is_redirect()) {
                redirects.push(entry);
            } else if filter.is_exception() {
                exceptions.push(entry);
            } else {
                blocks.push(entry);
            }
        }

        let mut hostnames = Vec::new();
        let mut generic = Vec::new();
        for (position, filter) in cosmetic.iter().enumerate() {
            match filter.hostname_list().filter(|list| list.has_positive()) {
                Some(list) => {
                    let groups = list.positive().map(|host| vec![hash_token(host)]).collect();
                    hostnames.push((position as u32, groups));
                }
                None => generic.push((position as u32, filter.tokens())),
            }
        }

        let indexes = EngineIndexes {
            blocks: ReverseIndex::build(&blocks),
            exceptions: ReverseIndex::build(&exceptions),
            redirects: ReverseIndex::build(&redirects),
            csp: ReverseIndex::build(&csp),
            cosmetic_hostnames: ReverseIndex::build(&hostnames),
            cosmetic_generic: ReverseIndex::build(&generic),
        };

        log::debug!(
            "engine built: {} network filters ({} block, {} exception, {} redirect, {} csp), {} cosmetic filters",
            network.len(),
            blocks.len(),
            exceptions.len(),
            redirects.len(),
            csp.len(),
            cosmetic.len()
        );

        Self {
            network,
            cosmetic,
            indexes,
        }
    }

    /// Assemble an engine from stored filters and indexes.
    pub fn from_parts(network: Vec<NetworkFilter>, cosmetic: Vec<CosmeticFilter>, indexes: EngineIndexes) -> Self {
        Self {
            network,
            cosmetic,
            indexes,
        }
    }

    pub fn network_filters(&self) -> &[NetworkFilter] {
        &self.network
    }

    pub fn cosmetic_filters(&self) -> &[CosmeticFilter] {
        &self.cosmetic
    }

    pub fn indexes(&self) -> &EngineIndexes {
        &self.indexes
    }

    // =========================================================================
    // Network Matching
    // =========================================================================

    /// Tokens of a request: its source hostname suffixes (for filters
    /// dispatched by `domain=`) followed by the URL tokens.
    fn request_tokens(request: &Request, buffer: &mut TokenBuffer) {
        buffer.clear();
        for suffix in walk_host_suffixes(&request.source_hostname) {
            buffer.push(hash_token(suffix));
        }
        tokenize_url(&request.url_lower, buffer);
    }

    /// First matching filter of `index`, in filter order.
    fn first_match<'e>(
        &'e self,
        index: &ReverseIndex,
        tokens: &[u32],
        request: &Request,
        accept: impl Fn(&NetworkFilter) -> bool,
    ) -> Option<&'e NetworkFilter> {
        index
            .candidates(tokens)
            .into_iter()
            .filter_map(|position| self.network.get(position as usize))
            .find(|filter| accept(*filter) && filter.matches(request))
    }

    /// Match a network request.
    ///
    /// A matching exception always wins over matching block filters. A
    /// blocked request may carry a redirect resource from its own
    /// `$redirect=` option or from a matching `$redirect-rule=` directive,
    /// unless a redirect exception disables that resource.
    pub fn match_request(&self, request: &Request) -> MatchResult {
        let mut buffer = TokenBuffer::new();
        Self::request_tokens(request, &mut buffer);
        let tokens = buffer.as_slice();

        let Some(block) = self.first_match(&self.indexes.blocks, tokens, request, |_| true) else {
            return MatchResult::default();
        };

        if let Some(exception) = self.first_match(&self.indexes.exceptions, tokens, request, |_| true) {
            return MatchResult {
                decision: Decision::Allow,
                filter_id: Some(exception.id()),
                redirect: None,
            };
        }

        MatchResult {
            decision: Decision::Block,
            filter_id: Some(block.id()),
            redirect: self.redirect_for(block, tokens, request),
        }
    }

    fn redirect_for(&self, block: &NetworkFilter, tokens: &[u32], request: &Request) -> Option<String> {
        let resource = if block.is_redirect() {
            block.option_value()
        } else {
            self.first_match(&self.indexes.redirects, tokens, request, |filter| !filter.is_exception())
                .and_then(NetworkFilter::option_value)
        }?;

        let disabled = self
            .first_match(&self.indexes.redirects, tokens, request, |filter| {
                filter.is_exception()
                    && filter
                        .option_value()
                        .map_or(true, |value| value.is_empty() || value == resource)
            })
            .is_some();

        (!disabled).then(|| resource.to_string())
    }

    /// Final decision for a request.
    pub fn check(&self, request: &Request) -> Decision {
        self.match_request(request).decision
    }

    /// Content-Security-Policy directives to inject for a document request.
    ///
    /// An exception with a value cancels that directive; one without a value
    /// cancels every directive.
    pub fn csp_directives(&self, request: &Request) -> Option<String> {
        if !request.request_type.intersects(RequestType::DOCUMENT) {
            return None;
        }

        let mut buffer = TokenBuffer::new();
        Self::request_tokens(request, &mut buffer);

        let mut directives: Vec<&str> = Vec::new();
        let mut cancelled: HashSet<&str> = HashSet::new();
        for position in self.indexes.csp.candidates(buffer.as_slice()) {
            let Some(filter) = self.network.get(position as usize) else {
                continue;
            };
            if !filter.matches(request) {
                continue;
            }
            let value = filter.option_value().unwrap_or("");
            if filter.is_exception() {
                if value.is_empty() {
                    return None;
                }
                cancelled.insert(value);
            } else if !value.is_empty() && !directives.contains(&value) {
                directives.push(value);
            }
        }

        directives.retain(|directive| !cancelled.contains(directive));
        if directives.is_empty() {
            None
        } else {
            Some(directives.join("; "))
        }
    }

    // =========================================================================
    // Cosmetic Matching
    // =========================================================================

    /// Cosmetic actions for a page.
    ///
    /// `dom_tokens` are the class names, ids and tag names seen in the page.
    /// Hostname-specific filters apply by hostname alone, generic ones when
    /// one of their selector tokens is present. A matching `#@#` filter
    /// cancels every filter with the same selector and action.
    pub fn cosmetics_for_page(&self, hostname: &str, dom_tokens: &[&str]) -> CosmeticsResult {
        let hostname = hostname.to_ascii_lowercase();
        let host_tokens: Vec<u32> = walk_host_suffixes(&hostname).map(hash_token).collect();
        let dom_tokens: Vec<u32> = dom_tokens.iter().map(|token| hash_token(token)).collect();

        let mut positions = Vec::new();
        self.indexes
            .cosmetic_hostnames
            .collect_candidates(&host_tokens, &mut positions);
        self.indexes
            .cosmetic_generic
            .collect_candidates(&dom_tokens, &mut positions);
        positions.sort_unstable();
        positions.dedup();

        let matched: Vec<&CosmeticFilter> = positions
            .into_iter()
            .filter_map(|position| self.cosmetic.get(position as usize))
            .filter(|filter| filter.matches_hostname(&hostname))
            .collect();

        let unhidden: HashSet<(CosmeticAction, &str)> = matched
            .iter()
            .filter(|filter| filter.is_unhide())
            .map(|filter| (filter.action(), filter.selector()))
            .collect();

        let mut result = CosmeticsResult::default();
        let mut seen: HashSet<(CosmeticAction, &str)> = HashSet::new();
        for filter in matched {
            if filter.is_unhide() {
                continue;
            }
            let key = (filter.action(), filter.selector());
            if unhidden.contains(&key) || !seen.insert(key) {
                continue;
            }
            let target = match filter.action() {
                CosmeticAction::Hide => &mut result.selectors_to_hide,
                CosmeticAction::InjectScript => &mut result.scripts_to_inject,
                CosmeticAction::BlockScript => &mut result.script_substrings_to_block,
            };
            target.push(filter.selector().to_string());
        }

        result
    }
}

// =============================================================================
// Engine Handle
// =============================================================================

/// Shared, swappable engine.
///
/// Readers take a snapshot `Arc` and keep using it while a replacement is
/// installed; they never see a partially built engine.
#[derive(Debug, Default)]
pub struct EngineHandle {
    current: RwLock<Arc<Engine>>,
}

impl EngineHandle {
    pub fn new(engine: Engine) -> Self {
        Self {
            current: RwLock::new(Arc::new(engine)),
        }
    }

    /// The engine currently installed.
    pub fn current(&self) -> Arc<Engine> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Install a fully built engine, returning the previous one.
    pub fn replace(&self, engine: Engine) -> Arc<Engine> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(engine))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{CosmeticFilterMask, NetworkFilterMask};

    fn assert_send_sync<T: Send + Sync>() {}

    fn hostname_rule(host: &str, mask: NetworkFilterMask) -> NetworkFilter {
        NetworkFilter::new(
            NetworkFilterMask::DEFAULT | NetworkFilterMask::IS_HOSTNAME_ANCHOR | mask,
            format!("{host}^"),
        )
    }

    fn script(url: &str) -> Request {
        Request::from_urls(url, "https://site.com/", "script")
    }

    #[test]
    fn test_engine_is_send_sync() {
        assert_send_sync::<Engine>();
        assert_send_sync::<EngineHandle>();
    }

    #[test]
    fn test_block_and_exception() {
        let engine = Engine::new(
            vec![
                hostname_rule("ads.com", NetworkFilterMask::empty()),
                NetworkFilter::new(
                    NetworkFilterMask::DEFAULT | NetworkFilterMask::IS_EXCEPTION,
                    "/ads.com/allowed/",
                ),
            ],
            vec![],
        );

        let blocked = engine.match_request(&script("https://ads.com/banner.js"));
        assert_eq!(blocked.decision, Decision::Block);
        assert_eq!(blocked.filter_id, Some(engine.network_filters()[0].id()));

        let allowed = engine.match_request(&script("https://ads.com/allowed/banner.js"));
        assert_eq!(allowed.decision, Decision::Allow);
        assert_eq!(allowed.filter_id, Some(engine.network_filters()[1].id()));

        let nothing = engine.match_request(&script("https://news.com/app.js"));
        assert_eq!(nothing, MatchResult::default());
    }

    #[test]
    fn test_exception_wins_regardless_of_order() {
        let block = hostname_rule("ads.com", NetworkFilterMask::empty());
        let exception = hostname_rule("ads.com", NetworkFilterMask::IS_EXCEPTION);

        let engine = Engine::new(vec![exception.clone(), block.clone()], vec![]);
        assert_eq!(engine.check(&script("https://ads.com/a.js")), Decision::Allow);

        let engine = Engine::new(vec![block, exception], vec![]);
        assert_eq!(engine.check(&script("https://ads.com/a.js")), Decision::Allow);
    }

    #[test]
    fn test_domain_dispatched_filter() {
        let filter = NetworkFilter::new(NetworkFilterMask::DEFAULT, "").with_domains(Some("site.com".to_string()));
        let engine = Engine::new(vec![filter], vec![]);
        assert_eq!(engine.check(&script("https://cdn.net/x.js")), Decision::Block);

        let other = Request::from_urls("https://cdn.net/x.js", "https://other.com/", "script");
        assert_eq!(engine.check(&other), Decision::Allow);
    }

    #[test]
    fn test_redirects() {
        let engine = Engine::new(
            vec![
                hostname_rule("ads.com", NetworkFilterMask::IS_REDIRECT).with_option_value(Some("noop.js".into())),
                hostname_rule("track.com", NetworkFilterMask::empty()),
                hostname_rule("track.com", NetworkFilterMask::IS_REDIRECT_RULE)
                    .with_option_value(Some("1x1.gif".into())),
                hostname_rule("quiet.com", NetworkFilterMask::IS_REDIRECT_RULE)
                    .with_option_value(Some("noop.js".into())),
            ],
            vec![],
        );

        let result = engine.match_request(&script("https://ads.com/a.js"));
        assert_eq!(result.decision, Decision::Block);
        assert_eq!(result.redirect.as_deref(), Some("noop.js"));

        let result = engine.match_request(&script("https://track.com/p"));
        assert_eq!(result.redirect.as_deref(), Some("1x1.gif"));

        // redirect-rule alone never blocks
        let result = engine.match_request(&script("https://quiet.com/a.js"));
        assert_eq!(result.decision, Decision::Allow);
        assert_eq!(result.redirect, None);
    }

    #[test]
    fn test_redirect_exception_keeps_block() {
        let engine = Engine::new(
            vec![
                hostname_rule("ads.com", NetworkFilterMask::IS_REDIRECT).with_option_value(Some("noop.js".into())),
                hostname_rule(
                    "ads.com",
                    NetworkFilterMask::IS_EXCEPTION | NetworkFilterMask::IS_REDIRECT_RULE,
                )
                .with_option_value(Some("noop.js".into())),
            ],
            vec![],
        );

        let result = engine.match_request(&script("https://ads.com/a.js"));
        assert_eq!(result.decision, Decision::Block);
        assert_eq!(result.redirect, None);
    }

    #[test]
    fn test_csp_directives() {
        let csp = |mask: NetworkFilterMask, value: &str| {
            hostname_rule("site.com", NetworkFilterMask::IS_CSP | mask).with_option_value(Some(value.to_string()))
        };
        let document = Request::from_urls("https://site.com/", "https://site.com/", "main_frame");

        let engine = Engine::new(
            vec![csp(NetworkFilterMask::empty(), "script-src 'none'"), csp(NetworkFilterMask::empty(), "img-src 'none'")],
            vec![],
        );
        assert_eq!(
            engine.csp_directives(&document).as_deref(),
            Some("script-src 'none'; img-src 'none'")
        );
        assert_eq!(engine.csp_directives(&script("https://site.com/a.js")), None);
        // csp filters never block
        assert_eq!(engine.check(&document), Decision::Allow);

        let engine = Engine::new(
            vec![
                csp(NetworkFilterMask::empty(), "script-src 'none'"),
                csp(NetworkFilterMask::empty(), "img-src 'none'"),
                csp(NetworkFilterMask::IS_EXCEPTION, "img-src 'none'"),
            ],
            vec![],
        );
        assert_eq!(engine.csp_directives(&document).as_deref(), Some("script-src 'none'"));

        let engine = Engine::new(
            vec![csp(NetworkFilterMask::empty(), "script-src 'none'"), csp(NetworkFilterMask::IS_EXCEPTION, "")],
            vec![],
        );
        assert_eq!(engine.csp_directives(&document), None);
    }

    #[test]
    fn test_cosmetics_for_page() {
        let cosmetic = vec![
            CosmeticFilter::new(CosmeticFilterMask::empty(), ".ad", None),
            CosmeticFilter::new(CosmeticFilterMask::empty(), ".promo", Some("news.com".into())),
            CosmeticFilter::new(CosmeticFilterMask::UNHIDE, ".ad", Some("blog.com".into())),
            CosmeticFilter::new(CosmeticFilterMask::SCRIPT_INJECT, "set-constant.js, x, 1", Some("news.com".into())),
            CosmeticFilter::new(CosmeticFilterMask::SCRIPT_BLOCK, "adsbygoogle", Some("news.com".into())),
            CosmeticFilter::new(CosmeticFilterMask::empty(), ".sidebar", Some("~news.com".into())),
        ];
        let engine = Engine::new(vec![], cosmetic);

        let news = engine.cosmetics_for_page("www.news.com", &["ad", "sidebar", "div"]);
        assert_eq!(news.selectors_to_hide, vec![".ad", ".promo"]);
        assert_eq!(news.scripts_to_inject, vec!["set-constant.js, x, 1"]);
        assert_eq!(news.script_substrings_to_block, vec!["adsbygoogle"]);

        let blog = engine.cosmetics_for_page("blog.com", &["ad", "sidebar"]);
        assert_eq!(blog.selectors_to_hide, vec![".sidebar"]);
        assert!(blog.scripts_to_inject.is_empty());

        let other = engine.cosmetics_for_page("other.org", &["div"]);
        assert!(other.selectors_to_hide.is_empty());
    }

    #[test]
    fn test_engine_handle_swap() {
        let handle = EngineHandle::new(Engine::default());
        let before = handle.current();
        assert_eq!(before.check(&script("https://ads.com/a.js")), Decision::Allow);

        let previous = handle.replace(Engine::new(vec![hostname_rule("ads.com", NetworkFilterMask::empty())], vec![]));
        assert!(Arc::ptr_eq(&previous, &before));
        assert_eq!(handle.current().check(&script("https://ads.com/a.js")), Decision::Block);
        assert_eq!(before.check(&script("https://ads.com/a.js")), Decision::Allow);
    }
}
