//! Content query execution
//!
//! Runs discover queries (compile, fetch, trim) and uri lookups against a
//! content store, applying the configured publisher allow-list.

use crate::config::StoreConfig;
use crate::content_store::{ContentStore, ContentStoreError};
use crate::document::{FilterDocument, Value};
use crate::logging::SlowQueryLogger;
use crate::model::{Content, EnumKey, Publisher};
use crate::query::{ContentQuery, QueryCompiler, QueryError, ResultTrimmer};
use std::collections::BTreeSet;
use tracing::debug;

/// Executes content queries against a content store
pub struct ContentQueryExecutor {
    store: ContentStore,
    compiler: QueryCompiler,
    trimmer: ResultTrimmer,
    /// Trim uri query results the way discover results are trimmed
    filter_uri_queries: bool,
    /// None allows every publisher
    allowed_publishers: Option<BTreeSet<Publisher>>,
    slow_queries: SlowQueryLogger,
}

impl ContentQueryExecutor {
    pub fn new(store: ContentStore) -> Self {
        Self {
            store,
            compiler: QueryCompiler::new(),
            trimmer: ResultTrimmer::new(),
            filter_uri_queries: false,
            allowed_publishers: None,
            slow_queries: SlowQueryLogger::disabled(),
        }
    }

    /// Executor configured from a store configuration
    pub fn from_config(store: ContentStore, config: &StoreConfig) -> anyhow::Result<Self> {
        let mut executor = Self::new(store.with_max_results(config.query.max_results))
            .with_filter_uri_queries(config.query.filter_uri_queries)
            .with_slow_query_logger(config.logging_config().slow_query_logger());
        if let Some(publishers) = config.allowed_publishers()? {
            executor = executor.with_allowed_publishers(publishers);
        }
        Ok(executor)
    }

    pub fn with_filter_uri_queries(mut self, filter_uri_queries: bool) -> Self {
        self.filter_uri_queries = filter_uri_queries;
        self
    }

    pub fn with_allowed_publishers(mut self, publishers: impl IntoIterator<Item = Publisher>) -> Self {
        self.allowed_publishers = Some(publishers.into_iter().collect());
        self
    }

    pub fn with_slow_query_logger(mut self, logger: SlowQueryLogger) -> Self {
        self.slow_queries = logger;
        self
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn slow_queries(&self) -> &SlowQueryLogger {
        &self.slow_queries
    }

    /// Find content matching a query
    pub fn discover(&self, query: &ContentQuery) -> Result<Vec<Content>, ExecutorError> {
        if query.is_matches_nothing() {
            return Ok(Vec::new());
        }

        let tracker = self.slow_queries.start_query(query.to_string(), "discover");
        let query = self.restrict_publishers(query);

        let mut filter = self.compiler.compile(&query)?;
        if let Some(publishers) = query.publishers() {
            add_publisher_condition(&mut filter, publishers);
        }

        let found = self.store.discover(&filter, query.selection())?;
        let results = self.trimmer.trim(found, &query, true);

        self.slow_queries.finish_query(tracker, results.len());
        Ok(results)
    }

    /// Fetch content by uri, curie or alias, ordered as requested
    pub fn execute_uri_query(&self, uris: &[String], query: &ContentQuery) -> Result<Vec<Content>, ExecutorError> {
        if query.is_matches_nothing() {
            return Ok(Vec::new());
        }

        let tracker = self.slow_queries.start_query(format!("{} {}", uris.join(","), query), "uri");
        let query = self.restrict_publishers(query);

        let found = self.store.find_by_uris(uris)?;
        let mut results = self.trimmer.trim(found, &query, self.filter_uri_queries);
        results.sort_by_key(|content| request_position(content, uris));

        debug!(requested = uris.len(), returned = results.len(), "Executed uri query");
        self.slow_queries.finish_query(tracker, results.len());
        Ok(results)
    }

    /// Narrow the query's publishers to the configured allow-list
    fn restrict_publishers(&self, query: &ContentQuery) -> ContentQuery {
        let Some(allowed) = &self.allowed_publishers else {
            return query.clone();
        };
        let publishers: Vec<Publisher> = match query.publishers() {
            Some(requested) => requested.intersection(allowed).copied().collect(),
            None => allowed.iter().copied().collect(),
        };
        query.clone().with_publishers(publishers)
    }
}

/// Restrict the filter to the given publishers. A publisher condition the
/// query compiled to is kept alongside the restriction under `$and`.
fn add_publisher_condition(filter: &mut FilterDocument, publishers: &BTreeSet<Publisher>) {
    let keys = publishers.iter().map(|p| Value::from(p.key())).collect();
    let mut condition = FilterDocument::new();
    condition.insert("$in".to_string(), Value::Array(keys));

    let Some(compiled) = filter.remove("publisher") else {
        filter.insert("publisher".to_string(), Value::Object(condition));
        return;
    };

    let clauses = [compiled, Value::Object(condition)].map(|c| {
        let mut clause = FilterDocument::new();
        clause.insert("publisher".to_string(), c);
        Value::Object(clause)
    });
    match filter.get_mut("$and") {
        Some(Value::Array(existing)) => existing.extend(clauses),
        _ => {
            filter.insert("$and".to_string(), Value::Array(clauses.into()));
        }
    }
}

/// Index of the first requested uri naming this content
fn request_position(content: &Content, uris: &[String]) -> usize {
    let described = content.described();
    uris.iter()
        .position(|uri| described.is_known_as(uri))
        .unwrap_or(usize::MAX)
}

/// Executor errors
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Content store error: {0}")]
    ContentStore(#[from] ContentStoreError),
}
