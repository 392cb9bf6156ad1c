use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use sieve_compiler::{compile, parse_filter_list, serialize, ParseOptions};
use sieve_core::dataset::read_request_log;
use sieve_core::{Engine, Request};

const FILTERS: &str = include_str!("../tests/fixtures/filters.txt");
const REQUESTS: &str = include_str!("../tests/fixtures/requests.ndjson");

fn load_requests() -> Vec<Request> {
    read_request_log(REQUESTS.as_bytes())
        .expect("request log")
        .iter()
        .map(|record| record.to_request())
        .collect()
}

fn bench_match_requests(engine: &Engine, requests: &[Request]) -> (u32, u32) {
    let mut blocked = 0;
    let mut allowed = 0;
    for request in requests {
        match engine.check(request) {
            sieve_core::Decision::Block => blocked += 1,
            sieve_core::Decision::Allow => allowed += 1,
        }
    }
    (blocked, allowed)
}

fn rule_match(c: &mut Criterion) {
    let engine = compile(FILTERS, &ParseOptions::default());
    let requests = load_requests();

    let mut group = c.benchmark_group("rule-match");
    group.throughput(Throughput::Elements(requests.len() as u64));
    group.bench_function("compiled", |b| b.iter(|| bench_match_requests(&engine, black_box(&requests))));

    let loaded = Engine::deserialize(&serialize(&engine)).expect("snapshot");
    group.bench_function("deserialized", |b| b.iter(|| bench_match_requests(&loaded, black_box(&requests))));
    group.finish();
}

fn list_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Bytes(FILTERS.len() as u64));
    group.bench_function("filter-list", |b| {
        b.iter(|| parse_filter_list(black_box(FILTERS), &ParseOptions::default()))
    });
    group.finish();
}

fn snapshot(c: &mut Criterion) {
    let engine = compile(FILTERS, &ParseOptions::default());
    let bytes = serialize(&engine);

    let mut group = c.benchmark_group("snapshot");
    group.bench_function("serialize", |b| b.iter(|| serialize(black_box(&engine))));
    group.bench_function("deserialize", |b| b.iter(|| Engine::deserialize(black_box(&bytes))));
    group.finish();
}

criterion_group!(benches, rule_match, list_parse, snapshot);
criterion_main!(benches);
