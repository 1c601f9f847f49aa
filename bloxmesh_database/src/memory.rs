use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{error::DatabaseError, DocumentStore};

/// Process-local store. Used when no database is configured and in tests.
#[derive(Default)]
pub struct MemoryStore {
    documents: DashMap<(String, String), Value>,
    writes: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set` calls served so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, DatabaseError> {
        Ok(self
            .documents
            .get(&(collection.to_string(), id.to_string()))
            .map(|d| d.value().clone()))
    }

    async fn set(&self, collection: &str, id: &str, value: Value) -> Result<(), DatabaseError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.documents
            .insert((collection.to_string(), id.to_string()), value);
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, DatabaseError> {
        let mut documents = self
            .documents
            .iter()
            .filter(|d| d.key().0 == collection)
            .map(|d| (d.key().1.clone(), d.value().clone()))
            .collect::<Vec<_>>();
        documents.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(documents)
    }
}
