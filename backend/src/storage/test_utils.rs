//! Test utilities shared by the domain and io tests
//!
//! Provides stores that record or reject calls, so tests can assert that an
//! action did (or did not) reach the backend.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::document::{Document, EqualityFilter, FieldWrites};
use super::memory::{Clock, MemoryDocumentStore};
use super::traits::DocumentStore;

/// Store operations, as recorded by [`RecordingStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Query(String),
    Insert(String),
    Update(String, String),
    Delete(String, String),
}

/// Memory store that records every call made to it
#[derive(Clone)]
pub struct RecordingStore {
    pub inner: MemoryDocumentStore,
    calls: Arc<Mutex<Vec<StoreCall>>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::wrap(MemoryDocumentStore::new())
    }

    pub fn wrap(inner: MemoryDocumentStore) -> Self {
        Self {
            inner,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls other than queries
    pub fn writes(&self) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, StoreCall::Query(_)))
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn query(&self, collection: &str, filter: &EqualityFilter) -> Result<Vec<Document>> {
        self.record(StoreCall::Query(collection.to_string()));
        self.inner.query(collection, filter).await
    }

    async fn insert(&self, collection: &str, fields: FieldWrites) -> Result<String> {
        self.record(StoreCall::Insert(collection.to_string()));
        self.inner.insert(collection, fields).await
    }

    async fn update(&self, collection: &str, id: &str, fields: FieldWrites) -> Result<()> {
        self.record(StoreCall::Update(collection.to_string(), id.to_string()));
        self.inner.update(collection, id, fields).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.record(StoreCall::Delete(collection.to_string(), id.to_string()));
        self.inner.delete(collection, id).await
    }
}

/// Store whose every call fails, counting attempts
#[derive(Clone, Default)]
pub struct FailingStore {
    attempts: Arc<AtomicUsize>,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn fail<T>(&self, op: &str) -> Result<T> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        bail!("{} failed: service unavailable", op)
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn query(&self, _collection: &str, _filter: &EqualityFilter) -> Result<Vec<Document>> {
        self.fail("query")
    }

    async fn insert(&self, _collection: &str, _fields: FieldWrites) -> Result<String> {
        self.fail("insert")
    }

    async fn update(&self, _collection: &str, _id: &str, _fields: FieldWrites) -> Result<()> {
        self.fail("update")
    }

    async fn delete(&self, _collection: &str, _id: &str) -> Result<()> {
        self.fail("delete")
    }
}

/// Clock that advances one minute on every reading, starting at `start`
pub fn stepping_clock(start: DateTime<Utc>) -> Clock {
    let ticks = Arc::new(AtomicI64::new(0));
    Arc::new(move || start + Duration::minutes(ticks.fetch_add(1, Ordering::SeqCst)))
}

/// Memory store with a stepping clock starting 2024-01-01 06:00 UTC
pub fn stepping_store() -> MemoryDocumentStore {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 6, 0, 0).unwrap();
    MemoryDocumentStore::with_clock(stepping_clock(start))
}
