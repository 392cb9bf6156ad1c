//! Core type definitions shared by the filters and the engine.

use crate::domain::is_third_party;
use crate::url::extract_host;

// =============================================================================
// Request Types
// =============================================================================

bitflags::bitflags! {
    /// Resource types a request can have. A network filter stores the set
    /// of types it applies to in the low 16 bits of its option mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RequestType: u32 {
        const OTHER = 1 << 0;
        const SCRIPT = 1 << 1;
        const IMAGE = 1 << 2;
        const STYLESHEET = 1 << 3;
        const OBJECT = 1 << 4;
        const SUBDOCUMENT = 1 << 5;
        const MAIN_FRAME = 1 << 6;
        const XMLHTTPREQUEST = 1 << 7;
        const WEBSOCKET = 1 << 8;
        const FONT = 1 << 9;
        const MEDIA = 1 << 10;
        const PING = 1 << 11;
        const CSP_REPORT = 1 << 12;
        const BEACON = 1 << 13;
        const FETCH = 1 << 14;
        const SPECULATIVE = 1 << 15;

        const ALL = 0xFFFF;
        /// Top-level and framed documents, the targets of `$csp`
        const DOCUMENT = Self::MAIN_FRAME.bits() | Self::SUBDOCUMENT.bits();
    }
}

impl RequestType {
    /// Parse from a browser request type string.
    ///
    /// Accepts both the WebExtension names (`main_frame`, `sub_frame`, ...)
    /// and the DevTools/puppeteer names recorded in request logs
    /// (`document`, `xhr`, `fetch`, ...).
    pub fn from_str(s: &str) -> Self {
        match s {
            "main_frame" | "document" => Self::MAIN_FRAME,
            "sub_frame" | "subdocument" => Self::SUBDOCUMENT,
            "stylesheet" => Self::STYLESHEET,
            "script" => Self::SCRIPT,
            "image" | "imageset" => Self::IMAGE,
            "font" => Self::FONT,
            "object" => Self::OBJECT,
            "xmlhttprequest" | "xhr" => Self::XMLHTTPREQUEST,
            "fetch" => Self::FETCH,
            "ping" => Self::PING,
            "beacon" => Self::BEACON,
            "csp_report" | "cspviolationreport" => Self::CSP_REPORT,
            "media" => Self::MEDIA,
            "websocket" => Self::WEBSOCKET,
            "speculative" | "prefetch" => Self::SPECULATIVE,
            _ => Self::OTHER,
        }
    }
}

// =============================================================================
// Request
// =============================================================================

/// A network request to match.
#[derive(Debug, Clone)]
pub struct Request {
    /// Full request URL, as given
    pub url: String,
    /// Lowercased URL used for tokenizing and case-insensitive matching
    pub url_lower: String,
    /// Request hostname (extracted from URL, lowercased)
    pub hostname: String,
    /// Hostname of the page or frame that issued the request
    pub source_hostname: String,
    pub request_type: RequestType,
    /// Registrable domains of `hostname` and `source_hostname` differ
    pub is_third_party: bool,
}

impl Request {
    /// Build a request with an explicit party flag.
    pub fn new(url: &str, request_type: RequestType, source_hostname: &str, is_third_party: bool) -> Self {
        let url_lower = url.to_ascii_lowercase();
        let hostname = extract_host(&url_lower).unwrap_or_default().to_string();
        Self {
            url: url.to_string(),
            url_lower,
            hostname,
            source_hostname: source_hostname.to_ascii_lowercase(),
            request_type,
            is_third_party,
        }
    }

    /// Build a request from its URL and the URL of the page that issued it.
    /// The party flag is derived by comparing registrable domains.
    pub fn from_urls(url: &str, source_url: &str, request_type: &str) -> Self {
        let source_hostname = extract_host(source_url).unwrap_or_default().to_ascii_lowercase();
        let mut request = Self::new(url, RequestType::from_str(request_type), &source_hostname, false);
        request.is_third_party =
            !request.source_hostname.is_empty() && is_third_party(&request.source_hostname, &request.hostname);
        request
    }
}

// =============================================================================
// Results
// =============================================================================

/// Outcome of matching a network request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// No block filter matched, or an exception overrode it
    Allow,
    Block,
}

/// Decision plus the filter behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub decision: Decision,
    /// Id of the filter that determined the decision
    pub filter_id: Option<u32>,
    /// Redirect resource name when a blocked request should be redirected
    pub redirect: Option<String>,
}

impl Default for MatchResult {
    fn default() -> Self {
        Self {
            decision: Decision::Allow,
            filter_id: None,
            redirect: None,
        }
    }
}

/// Cosmetic actions that apply to a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CosmeticsResult {
    pub selectors_to_hide: Vec<String>,
    pub scripts_to_inject: Vec<String>,
    pub script_substrings_to_block: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_type_from_str() {
        assert_eq!(RequestType::from_str("main_frame"), RequestType::MAIN_FRAME);
        assert_eq!(RequestType::from_str("document"), RequestType::MAIN_FRAME);
        assert_eq!(RequestType::from_str("xhr"), RequestType::XMLHTTPREQUEST);
        assert_eq!(RequestType::from_str("texttrack"), RequestType::OTHER);
    }

    #[test]
    fn test_request_new_lowercases() {
        let request = Request::new("https://Ads.Example.com/Banner.js", RequestType::SCRIPT, "Site.com", true);
        assert_eq!(request.url, "https://Ads.Example.com/Banner.js");
        assert_eq!(request.url_lower, "https://ads.example.com/banner.js");
        assert_eq!(request.hostname, "ads.example.com");
        assert_eq!(request.source_hostname, "site.com");
    }

    #[test]
    fn test_request_from_urls_party() {
        let first = Request::from_urls("https://cdn.example.com/a.js", "https://www.example.com/", "script");
        assert!(!first.is_third_party);

        let third = Request::from_urls("https://tracker.net/p.gif", "https://www.example.com/", "image");
        assert!(third.is_third_party);
        assert_eq!(third.request_type, RequestType::IMAGE);
    }
}
