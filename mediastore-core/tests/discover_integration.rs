//! End-to-end content queries over the in-memory store

use chrono::{TimeZone, Utc};
use mediastore_core::query::attribute::*;
use mediastore_core::{
    Broadcast, Constraint, Container, ContainerKind, Content, ContentQuery, ContentQueryExecutor,
    ContentStore, ContentStoreError, Encoding, ExecutorError, Item, ItemKind, Location, MemoryStore,
    Publisher, QueryParamParser, StoreConfig, TransportType, Version,
};

fn location(transport: TransportType, available: bool) -> Location {
    Location {
        uri: Some(format!("http://play/{:?}/{}", transport, available)),
        available,
        transport_type: Some(transport),
        ..Default::default()
    }
}

fn version(duration: i64, locations: Vec<Location>, broadcasts: Vec<Broadcast>) -> Version {
    Version {
        duration: Some(duration),
        broadcasts,
        manifested_as: vec![Encoding {
            available_at: locations,
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn episode(uri: &str, number: i64, versions: Vec<Version>) -> Item {
    let mut item = Item::new(uri, ItemKind::Episode);
    item.described.publisher = Some(Publisher::Bbc);
    item.described.curie = Some(format!("bbc:{}", number));
    item.episode_number = Some(number);
    item.versions = versions;
    item
}

/// A brand with two episodes: one playable as a link, one only downloadable
fn seeded_executor() -> ContentQueryExecutor {
    let evening = Utc.with_ymd_and_hms(2010, 3, 1, 20, 0, 0).unwrap();
    let morning = Utc.with_ymd_and_hms(2010, 3, 1, 8, 0, 0).unwrap();

    let first = episode(
        "http://bbc/ep1",
        1,
        vec![
            version(
                1800,
                vec![
                    location(TransportType::Link, true),
                    location(TransportType::Embed, true),
                ],
                vec![Broadcast::new("bbcone", evening, evening + chrono::Duration::minutes(30))],
            ),
            version(600, vec![location(TransportType::Link, false)], vec![]),
        ],
    );
    let second = episode(
        "http://bbc/ep2",
        2,
        vec![version(
            1800,
            vec![location(TransportType::Download, true)],
            vec![Broadcast::new("bbctwo", morning, morning + chrono::Duration::minutes(30))],
        )],
    );

    let mut brand = Container::new("http://bbc/brand", ContainerKind::Brand);
    brand.described.publisher = Some(Publisher::Bbc);
    brand.described.title = Some("EastEnders".to_string());
    brand.contents = vec![first.into(), second.into()];

    let store = MemoryStore::new();
    let content_store = ContentStore::in_memory(&store);
    content_store.write(&brand.into()).unwrap();
    ContentQueryExecutor::new(content_store)
}

fn as_item(content: &Content) -> &Item {
    match content {
        Content::Item(item) => item,
        other => panic!("expected item, got {:?}", other),
    }
}

#[test]
fn test_discover_trims_to_matching_locations() {
    let executor = seeded_executor();
    let query = ContentQuery::new(vec![
        Constraint::equals(LOCATION_AVAILABLE, vec![true]).unwrap(),
        Constraint::equals(LOCATION_TRANSPORT_TYPE, vec!["link"]).unwrap(),
    ]);

    let results = executor.discover(&query).unwrap();
    assert_eq!(results.len(), 1);

    let item = as_item(&results[0]);
    assert_eq!(item.described.canonical_uri, "http://bbc/ep1");
    assert_eq!(item.container.as_deref(), Some("http://bbc/brand"));
    assert_eq!(item.versions.len(), 1);
    assert_eq!(item.versions[0].duration, Some(1800));

    let locations = &item.versions[0].manifested_as[0].available_at;
    assert_eq!(locations.len(), 1);
    assert_eq!(locations[0].transport_type, Some(TransportType::Link));
}

#[test]
fn test_discover_by_broadcast_time() {
    let executor = seeded_executor();
    let query = QueryParamParser::new()
        .parse_pairs(["broadcast.transmissionTime-after=2010-03-01T12:00:00Z"])
        .unwrap();

    let results = executor.discover(&query).unwrap();
    assert_eq!(results.len(), 1);

    let item = as_item(&results[0]);
    assert_eq!(item.described.canonical_uri, "http://bbc/ep1");
    // the version without broadcasts cannot satisfy a broadcast constraint
    assert_eq!(item.versions.len(), 1);
    assert_eq!(item.versions[0].broadcasts[0].broadcast_on, "bbcone");
}

#[test]
fn test_discover_container_by_title() {
    let executor = seeded_executor();
    let query = ContentQuery::new(vec![Constraint::beginning(BRAND_TITLE, vec!["eastend"]).unwrap()]);

    let results = executor.discover(&query).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].canonical_uri(), "http://bbc/brand");
    assert_eq!(results[0].contents().len(), 2);
}

#[test]
fn test_uri_query_extracts_embedded_items_in_request_order() {
    let executor = seeded_executor();
    let requested = vec!["bbc:2".to_string(), "http://bbc/ep1".to_string()];

    let results = executor
        .execute_uri_query(&requested, &ContentQuery::new(vec![]))
        .unwrap();
    let uris: Vec<&str> = results.iter().map(Content::canonical_uri).collect();
    assert_eq!(uris, vec!["http://bbc/ep2", "http://bbc/ep1"]);
}

#[test]
fn test_publisher_gate_on_uri_queries() {
    let executor = seeded_executor();
    let query = ContentQuery::new(vec![]).with_publishers([Publisher::C4]);

    let results = executor
        .execute_uri_query(&["http://bbc/ep1".to_string()], &query)
        .unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_too_many_results() {
    let store = MemoryStore::new();
    let mut config = StoreConfig::default();
    config.query.max_results = 1;

    let content_store = ContentStore::in_memory(&store);
    for number in 0..2 {
        content_store
            .write(&episode(&format!("http://bbc/ep{}", number), number, vec![version(60, vec![], vec![])]).into())
            .unwrap();
    }
    let executor = ContentQueryExecutor::from_config(content_store, &config).unwrap();

    let query = ContentQuery::new(vec![Constraint::equals(VERSION_DURATION, vec![60i64]).unwrap()]);
    assert!(matches!(
        executor.discover(&query),
        Err(ExecutorError::ContentStore(ContentStoreError::TooManyResults { limit: 1 }))
    ));
}
