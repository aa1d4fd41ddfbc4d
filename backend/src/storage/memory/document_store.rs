use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::storage::document::{Document, EqualityFilter, FieldValue, FieldWrite, FieldWrites, Fields};
use crate::storage::traits::DocumentStore;

/// Clock used to resolve server timestamps
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// In-process document store used in demo mode and tests
///
/// Documents are kept per collection in insertion order. Server timestamps
/// are resolved with the store's clock at write time.
#[derive(Clone)]
pub struct MemoryDocumentStore {
    collections: Arc<RwLock<HashMap<String, Vec<Document>>>>,
    clock: Clock,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(Utc::now))
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Number of documents currently stored in a collection
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .map(|c| c.get(collection).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Fetch a document by id, bypassing filters
    pub fn get(&self, collection: &str, id: &str) -> Option<Document> {
        let collections = self.collections.read().ok()?;
        collections
            .get(collection)?
            .iter()
            .find(|doc| doc.id == id)
            .cloned()
    }

    fn resolve(&self, writes: FieldWrites) -> Fields {
        let now = (self.clock)();
        writes
            .into_iter()
            .map(|(name, write)| {
                let value = match write {
                    FieldWrite::Value(value) => value,
                    FieldWrite::ServerTimestamp => FieldValue::Timestamp(now),
                };
                (name, value)
            })
            .collect()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn query(&self, collection: &str, filter: &EqualityFilter) -> Result<Vec<Document>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;

        let docs: Vec<Document> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| filter.matches(&doc.fields))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        debug!(
            "query {} where {} == {:?}: {} documents",
            collection,
            filter.field,
            filter.value,
            docs.len()
        );
        Ok(docs)
    }

    async fn insert(&self, collection: &str, fields: FieldWrites) -> Result<String> {
        let id = Uuid::new_v4().simple().to_string();
        let document = Document::new(id.clone(), self.resolve(fields));

        let mut collections = self
            .collections
            .write()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(document);

        debug!("insert {}/{}", collection, id);
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, fields: FieldWrites) -> Result<()> {
        let resolved = self.resolve(fields);

        let mut collections = self
            .collections
            .write()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        let Some(document) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| doc.id == id))
        else {
            bail!("No document to update: {}/{}", collection, id);
        };

        document.fields.extend(resolved);
        debug!("update {}/{}", collection, id);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        if let Some(docs) = collections.get_mut(collection) {
            docs.retain(|doc| doc.id != id);
        }
        debug!("delete {}/{}", collection, id);
        Ok(())
    }
}
