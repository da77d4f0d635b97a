//! Content repository over the document store
//!
//! Items and containers live in the content collection, content groups in
//! the groups collection. Containers embed their items; each embedded item
//! is also stored on its own so item-level filters can find it.

use crate::codec::{self, CodecError, CANONICAL_URI, LOOKUP, TYPE};
use crate::document::{filter_to_json, FilterDocument, Value};
use crate::model::Content;
use crate::store::{DocumentCollection, MemoryStore, Selection, StoreError, Update};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error};

pub const CONTENT_COLLECTION: &str = "content";
pub const GROUPS_COLLECTION: &str = "groups";

/// Largest result set a discover query may load
pub const MAX_RESULTS: usize = 20_000;

/// Content repository
pub struct ContentStore {
    content: Arc<dyn DocumentCollection>,
    groups: Arc<dyn DocumentCollection>,
    max_results: usize,
}

impl ContentStore {
    pub fn new(content: Arc<dyn DocumentCollection>, groups: Arc<dyn DocumentCollection>) -> Self {
        Self {
            content,
            groups,
            max_results: MAX_RESULTS,
        }
    }

    /// Repository over the standard collections of an in-memory store
    pub fn in_memory(store: &MemoryStore) -> Self {
        Self::new(
            store.collection(CONTENT_COLLECTION),
            store.collection(GROUPS_COLLECTION),
        )
    }

    /// Override the discover result cap
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Create or replace content, keyed by canonical uri
    pub fn write(&self, content: &Content) -> Result<(), ContentStoreError> {
        match content {
            Content::Group(_) => self.upsert(self.groups.as_ref(), content),
            Content::Item(_) => self.upsert(self.content.as_ref(), content),
            Content::Container(container) => {
                for child in &container.contents {
                    if let Content::Item(item) = child {
                        let mut item = item.clone();
                        item.container = Some(container.described.canonical_uri.clone());
                        self.upsert(self.content.as_ref(), &Content::Item(item))?;
                    }
                }
                self.upsert(self.content.as_ref(), content)
            }
        }
    }

    fn upsert(&self, collection: &dyn DocumentCollection, content: &Content) -> Result<(), ContentStoreError> {
        let by_uri = uri_filter(content.canonical_uri());
        let document = codec::to_document(content);

        if let Some(existing) = collection.find_one(&by_uri)? {
            let existing_type = existing.get(TYPE).and_then(Value::as_str).unwrap_or_default();
            let incoming_type = document.get(TYPE).and_then(Value::as_str).unwrap_or_default();
            if category(existing_type) != category(incoming_type) {
                return Err(ContentStoreError::KindConflict {
                    uri: content.canonical_uri().to_string(),
                    existing: existing_type.to_string(),
                    incoming: incoming_type.to_string(),
                });
            }
        }

        let result = collection.update(&by_uri, Update::Replace(document), true, false)?;
        debug!(
            collection = collection.name(),
            uri = content.canonical_uri(),
            inserted = result.upserted.is_some(),
            "Wrote content"
        );
        Ok(())
    }

    /// Find content by canonical uri, curie or alias. A uri belonging to an
    /// item embedded in a container resolves to that item.
    pub fn find_by_uris(&self, uris: &[String]) -> Result<Vec<Content>, ContentStoreError> {
        let mut filter = FilterDocument::new();
        let lookup: Vec<Value> = uris.iter().map(|u| Value::from(u.as_str())).collect();
        let mut condition = FilterDocument::new();
        condition.insert("$in".to_string(), Value::Array(lookup));
        filter.insert(LOOKUP.to_string(), Value::Object(condition));

        let requested: HashSet<&str> = uris.iter().map(String::as_str).collect();
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        for collection in [&self.content, &self.groups] {
            for document in collection.find(&filter, Selection::all())? {
                let content = extract_item_if_internal(codec::from_document(&document)?, &requested);
                if seen.insert(content.canonical_uri().to_string()) {
                    found.push(content);
                }
            }
        }

        Ok(found)
    }

    /// Run a compiled filter against the content collection
    pub fn discover(&self, filter: &FilterDocument, selection: Selection) -> Result<Vec<Content>, ContentStoreError> {
        let cursor = self.content.find(filter, selection)?;
        let mut results = Vec::with_capacity(cursor.remaining().min(self.max_results));

        for document in cursor {
            results.push(codec::from_document(&document)?);
            if results.len() > self.max_results {
                error!(
                    filter = %filter_to_json(filter),
                    offset = selection.offset,
                    limit = ?selection.limit,
                    max_results = self.max_results,
                    "Too many results for query"
                );
                return Err(ContentStoreError::TooManyResults {
                    limit: self.max_results,
                });
            }
        }

        Ok(results)
    }
}

fn uri_filter(uri: &str) -> FilterDocument {
    let mut filter = FilterDocument::new();
    filter.insert(CANONICAL_URI.to_string(), Value::from(uri));
    filter
}

/// Items and containers may not replace one another
fn category(content_type: &str) -> &'static str {
    match content_type {
        "Item" | "Episode" | "Clip" | "Film" => "item",
        "Brand" | "Series" | "Container" => "container",
        _ => "other",
    }
}

fn extract_item_if_internal(content: Content, requested: &HashSet<&str>) -> Content {
    if content.described().all_uris().any(|uri| requested.contains(uri)) {
        return content;
    }
    match content {
        Content::Container(mut container) => {
            let matched = container
                .contents
                .iter()
                .position(|child| child.described().all_uris().any(|uri| requested.contains(uri)));
            match matched {
                Some(index) => match container.contents.swap_remove(index) {
                    Content::Item(mut item) => {
                        item.container.get_or_insert(container.described.canonical_uri);
                        Content::Item(item)
                    }
                    child => child,
                },
                None => Content::Container(container),
            }
        }
        other => other,
    }
}

/// Content store errors
#[derive(Debug, thiserror::Error)]
pub enum ContentStoreError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Too many results for query (limit {limit})")]
    TooManyResults { limit: usize },

    #[error("Cannot write {incoming} {uri}: already stored as {existing}")]
    KindConflict {
        uri: String,
        existing: String,
        incoming: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Container, ContainerKind, ContentGroup, Item, ItemKind, Publisher, Version};

    fn episode(uri: &str, duration: i64) -> Item {
        let mut item = Item::new(uri, ItemKind::Episode);
        item.described.publisher = Some(Publisher::Bbc);
        item.versions.push(Version {
            duration: Some(duration),
            ..Default::default()
        });
        item
    }

    fn brand_with(items: Vec<Item>) -> Content {
        let mut brand = Container::new("http://brand", ContainerKind::Brand);
        brand.described.publisher = Some(Publisher::Bbc);
        brand.contents = items.into_iter().map(Content::from).collect();
        brand.into()
    }

    #[test]
    fn test_write_container_stores_items() {
        let store = MemoryStore::new();
        let content_store = ContentStore::in_memory(&store);
        content_store
            .write(&brand_with(vec![episode("http://ep1", 10), episode("http://ep2", 20)]))
            .unwrap();

        assert_eq!(store.collection(CONTENT_COLLECTION).len(), 3);

        let found = content_store.find_by_uris(&["http://ep1".to_string()]).unwrap();
        assert_eq!(found.len(), 1);
        match &found[0] {
            Content::Item(item) => assert_eq!(item.container.as_deref(), Some("http://brand")),
            other => panic!("expected item, got {:?}", other),
        }
    }

    #[test]
    fn test_write_is_idempotent_and_rejects_kind_changes() {
        let store = MemoryStore::new();
        let content_store = ContentStore::in_memory(&store);
        let item = Content::from(episode("http://brand", 10));

        content_store.write(&item).unwrap();
        content_store.write(&item).unwrap();
        assert_eq!(store.collection(CONTENT_COLLECTION).len(), 1);

        assert!(matches!(
            content_store.write(&brand_with(vec![])),
            Err(ContentStoreError::KindConflict { .. })
        ));
    }

    #[test]
    fn test_groups_live_in_their_own_collection() {
        let store = MemoryStore::new();
        let content_store = ContentStore::in_memory(&store);
        let mut group = ContentGroup::new("http://group");
        group.described.curie = Some("mb:group".to_string());
        content_store.write(&group.into()).unwrap();

        assert_eq!(store.collection(GROUPS_COLLECTION).len(), 1);
        let found = content_store.find_by_uris(&["mb:group".to_string()]).unwrap();
        assert_eq!(found[0].canonical_uri(), "http://group");
    }

    #[test]
    fn test_discover_caps_results() {
        let store = MemoryStore::new();
        let content_store = ContentStore::in_memory(&store).with_max_results(2);
        for i in 0..3 {
            content_store.write(&episode(&format!("http://ep{}", i), 10).into()).unwrap();
        }

        assert!(matches!(
            content_store.discover(&FilterDocument::new(), Selection::all()),
            Err(ContentStoreError::TooManyResults { limit: 2 })
        ));
        assert_eq!(
            content_store.discover(&FilterDocument::new(), Selection::new(0, 2)).unwrap().len(),
            2
        );
    }
}
