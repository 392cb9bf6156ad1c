//! Replays a recorded request log against a small filter list, before and
//! after a snapshot round trip.

use sieve_compiler::{compile, parse_filter_list, serialize, ParseOptions};
use sieve_core::dataset::{read_request_log, RequestLogRecord};
use sieve_core::{Decision, Engine};

const FILTERS: &str = include_str!("fixtures/filters.txt");
const REQUESTS: &str = include_str!("fixtures/requests.ndjson");

fn requests() -> Vec<RequestLogRecord> {
    read_request_log(REQUESTS.as_bytes()).expect("request log")
}

fn engines() -> (Engine, Engine) {
    let compiled = compile(FILTERS, &ParseOptions::default());
    let loaded = Engine::deserialize(&serialize(&compiled)).expect("snapshot");
    (compiled, loaded)
}

#[test]
fn test_fixture_list_parses() {
    let parsed = parse_filter_list(FILTERS, &ParseOptions::default());
    assert_eq!(parsed.network.len(), 9);
    assert_eq!(parsed.cosmetic.len(), 3);

    let rejected: Vec<&str> = parsed.rejected.iter().map(|line| line.line.as_str()).collect();
    assert_eq!(rejected, vec!["||broken.com^$important", "127.0.0.1 localhost"]);
}

#[test]
fn test_recorded_decisions() {
    let (engine, _) = engines();
    let decisions: Vec<Decision> = requests()
        .iter()
        .map(|record| engine.check(&record.to_request()))
        .collect();

    use Decision::{Allow, Block};
    assert_eq!(
        decisions,
        vec![Block, Block, Allow, Allow, Block, Allow, Block, Block, Allow, Block, Allow, Allow]
    );
}

#[test]
fn test_round_trip_keeps_every_result() {
    let (compiled, loaded) = engines();
    for record in requests() {
        let request = record.to_request();
        assert_eq!(
            compiled.match_request(&request),
            loaded.match_request(&request),
            "{}",
            record.url
        );
        assert_eq!(compiled.csp_directives(&request), loaded.csp_directives(&request));
    }
}

#[test]
fn test_redirect_and_csp() {
    let (_, engine) = engines();
    let records = requests();

    let tracker = engine.match_request(&records[6].to_request());
    assert_eq!(tracker.decision, Decision::Block);
    assert_eq!(tracker.redirect.as_deref(), Some("noop.js"));

    let document = records[10].to_request();
    assert_eq!(engine.csp_directives(&document).as_deref(), Some("script-src 'self'"));
    assert_eq!(engine.csp_directives(&records[0].to_request()), None);
}

#[test]
fn test_cosmetics() {
    let (_, engine) = engines();

    let news = engine.cosmetics_for_page("www.news.com", &["ad-banner", "div"]);
    assert_eq!(news.selectors_to_hide, vec![".ad-banner", ".sponsored"]);
    assert_eq!(news.scripts_to_inject, vec!["set-constant, adsEnabled, false"]);

    let other = engine.cosmetics_for_page("blog.com", &["div"]);
    assert!(other.selectors_to_hide.is_empty());
    assert!(other.scripts_to_inject.is_empty());
}
