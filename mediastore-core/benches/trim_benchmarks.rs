//! Query compilation and trimming benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mediastore_core::query::attribute::*;
use mediastore_core::{
    Constraint, Content, ContentQuery, ContentQueryExecutor, ContentStore, Encoding, Item, ItemKind,
    Location, MemoryStore, Publisher, QueryCompiler, ResultTrimmer, TransportType, Version,
};

fn item(id: usize) -> Content {
    let transports = [TransportType::Link, TransportType::Embed, TransportType::Download];
    let mut item = Item::new(format!("http://bench/item/{}", id), ItemKind::Episode);
    item.described.publisher = Some(Publisher::Bbc);
    item.versions = (0..4)
        .map(|v| Version {
            duration: Some(((id * 7 + v * 13) % 3600) as i64),
            manifested_as: vec![Encoding {
                available_at: (0..3)
                    .map(|l| Location {
                        available: (id + l) % 2 == 0,
                        transport_type: Some(transports[(v + l) % transports.len()]),
                        ..Default::default()
                    })
                    .collect(),
                ..Default::default()
            }],
            ..Default::default()
        })
        .collect();
    item.into()
}

fn query() -> ContentQuery {
    ContentQuery::new(vec![
        Constraint::greater_than(VERSION_DURATION, vec![600i64]).unwrap(),
        Constraint::equals(LOCATION_AVAILABLE, vec![true]).unwrap(),
        Constraint::equals(LOCATION_TRANSPORT_TYPE, vec!["link", "embed"]).unwrap(),
        Constraint::beginning(TITLE, vec!["East"]).unwrap().soft(),
    ])
}

fn bench_compile(c: &mut Criterion) {
    let compiler = QueryCompiler::new();
    let query = query();

    c.bench_function("compile_nested_query", |b| {
        b.iter(|| compiler.compile(black_box(&query)).unwrap());
    });
}

fn bench_trim(c: &mut Criterion) {
    let mut group = c.benchmark_group("trim");
    let trimmer = ResultTrimmer::new();
    let query = query();

    for size in [10usize, 100, 1000] {
        let contents: Vec<Content> = (0..size).map(item).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &contents, |b, contents| {
            b.iter(|| trimmer.trim(contents.clone(), black_box(&query), true));
        });
    }

    group.finish();
}

fn bench_discover(c: &mut Criterion) {
    let store = MemoryStore::new();
    let content_store = ContentStore::in_memory(&store);
    for id in 0..1000 {
        content_store.write(&item(id)).unwrap();
    }
    let executor = ContentQueryExecutor::new(content_store);
    let query = query();

    c.bench_function("discover_1000_items", |b| {
        b.iter(|| executor.discover(black_box(&query)).unwrap());
    });
}

criterion_group!(benches, bench_compile, bench_trim, bench_discover);
criterion_main!(benches);
