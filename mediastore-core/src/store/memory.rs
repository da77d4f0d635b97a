//! In-memory document collections

use super::filter::{FilterError, FilterExpr};
use super::Selection;
use crate::document::{Document, DocumentError, DocumentId, FilterDocument, Value};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Collection-scoped document operations
pub trait DocumentCollection: Send + Sync {
    /// Collection name
    fn name(&self) -> &str;

    /// Find documents matching a filter
    fn find(&self, filter: &FilterDocument, selection: Selection) -> Result<DocumentCursor, StoreError>;

    /// Find the first document matching a filter
    fn find_one(&self, filter: &FilterDocument) -> Result<Option<Document>, StoreError> {
        Ok(self.find(filter, Selection::new(0, 1))?.next())
    }

    /// Replace or patch matching documents, optionally inserting when none match
    fn update(
        &self,
        filter: &FilterDocument,
        update: Update,
        upsert: bool,
        multi: bool,
    ) -> Result<UpdateResult, StoreError>;

    /// Remove matching documents, returning how many were removed
    fn remove(&self, filter: &FilterDocument) -> Result<usize, StoreError>;
}

/// Cursor over a result set
#[derive(Debug)]
pub struct DocumentCursor {
    documents: std::vec::IntoIter<Document>,
}

impl DocumentCursor {
    fn new(documents: Vec<Document>) -> Self {
        Self {
            documents: documents.into_iter(),
        }
    }

    /// Number of documents left in the cursor
    pub fn remaining(&self) -> usize {
        self.documents.len()
    }
}

impl Iterator for DocumentCursor {
    type Item = Document;

    fn next(&mut self) -> Option<Document> {
        self.documents.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.documents.size_hint()
    }
}

/// Update applied to matching documents
#[derive(Debug, Clone)]
pub enum Update {
    /// Replace all fields, keeping the stored id
    Replace(Document),
    /// Set individual (possibly dotted) fields
    Set(BTreeMap<String, Value>),
}

/// Outcome of an update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateResult {
    /// Documents matched by the filter
    pub matched: usize,
    /// Documents modified
    pub modified: usize,
    /// Id of an inserted document when upserting
    pub upserted: Option<DocumentId>,
}

/// A single in-memory collection
pub struct MemoryCollection {
    name: String,
    documents: RwLock<Vec<Document>>,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl MemoryCollection {
    /// Create an empty collection
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: RwLock::new(Vec::new()),
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// Whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    /// Insert a document as-is
    pub fn insert(&self, doc: Document) -> Result<DocumentId, StoreError> {
        doc.validate()?;
        let id = doc.id;
        self.documents.write().push(doc);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(id)
    }

    /// Read and write counters
    pub fn stats(&self) -> (u64, u64) {
        (
            self.reads.load(Ordering::Relaxed),
            self.writes.load(Ordering::Relaxed),
        )
    }

    fn apply(target: &mut Document, update: &Update) -> Result<(), StoreError> {
        match update {
            Update::Replace(replacement) => {
                target.fields = replacement.fields.clone();
            }
            Update::Set(fields) => {
                for (path, value) in fields {
                    target.set_by_path(path, value.clone())?;
                }
            }
        }
        target.validate()?;
        Ok(())
    }

    fn upsert_document(filter: &FilterDocument, update: &Update) -> Result<Document, StoreError> {
        let mut doc = match update {
            Update::Replace(replacement) => replacement.clone(),
            Update::Set(_) => {
                // seed the new document with the filter's equality fields
                let mut doc = Document::new();
                for (field, value) in filter {
                    if !field.starts_with('$') && !matches!(value, Value::Object(_) | Value::Regex { .. }) {
                        doc.set_by_path(field, value.clone())?;
                    }
                }
                doc
            }
        };
        Self::apply(&mut doc, update)?;
        Ok(doc)
    }
}

impl DocumentCollection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn find(&self, filter: &FilterDocument, selection: Selection) -> Result<DocumentCursor, StoreError> {
        let expr = FilterExpr::parse(filter)?;
        self.reads.fetch_add(1, Ordering::Relaxed);

        let documents = self.documents.read();
        let results: Vec<Document> = selection
            .apply(documents.iter().filter(|doc| expr.matches(&doc.fields)))
            .cloned()
            .collect();

        trace!(collection = %self.name, results = results.len(), "find");
        Ok(DocumentCursor::new(results))
    }

    fn update(
        &self,
        filter: &FilterDocument,
        update: Update,
        upsert: bool,
        multi: bool,
    ) -> Result<UpdateResult, StoreError> {
        let expr = FilterExpr::parse(filter)?;
        let mut documents = self.documents.write();
        let mut result = UpdateResult::default();

        for doc in documents.iter_mut().filter(|doc| expr.matches(&doc.fields)) {
            result.matched += 1;
            let mut updated = doc.clone();
            Self::apply(&mut updated, &update)?;
            if updated != *doc {
                *doc = updated;
                result.modified += 1;
            }
            if !multi {
                break;
            }
        }

        if result.matched == 0 && upsert {
            let doc = Self::upsert_document(filter, &update)?;
            result.upserted = Some(doc.id);
            documents.push(doc);
        }

        if result.modified > 0 || result.upserted.is_some() {
            self.writes.fetch_add(1, Ordering::Relaxed);
        }

        debug!(
            collection = %self.name,
            matched = result.matched,
            modified = result.modified,
            upserted = result.upserted.is_some(),
            "update"
        );
        Ok(result)
    }

    fn remove(&self, filter: &FilterDocument) -> Result<usize, StoreError> {
        let expr = FilterExpr::parse(filter)?;
        let mut documents = self.documents.write();
        let before = documents.len();
        documents.retain(|doc| !expr.matches(&doc.fields));
        let removed = before - documents.len();
        if removed > 0 {
            self.writes.fetch_add(1, Ordering::Relaxed);
        }
        Ok(removed)
    }
}

/// Named in-memory collections
#[derive(Default)]
pub struct MemoryStore {
    collections: DashMap<String, Arc<MemoryCollection>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a collection, creating it on first use
    pub fn collection(&self, name: &str) -> Arc<MemoryCollection> {
        self.collections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryCollection::new(name)))
            .clone()
    }

    /// Names of existing collections
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

/// Document store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid filter: {0}")]
    Filter(#[from] FilterError),

    #[error("Invalid document: {0}")]
    Document(#[from] DocumentError),
}
