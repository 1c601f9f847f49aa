#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod memory;
mod postgres;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

pub use crate::{
    error::{DatabaseError, ErrorKind},
    memory::MemoryStore,
    postgres::PostgresStore,
};

/// A collection/document store. No cross-document transactions are assumed.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, DatabaseError>;

    /// Replaces the whole document, creating it if needed.
    async fn set(&self, collection: &str, id: &str, value: Value) -> Result<(), DatabaseError>;

    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, DatabaseError>;
}

pub struct DatabaseInner {
    store: Arc<dyn DocumentStore>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Typed access to the document store plus per-document locks used to
/// serialize read-modify-write cycles within the process.
#[derive(Clone)]
pub struct Database(Arc<DatabaseInner>);

impl Database {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self(Arc::new(DatabaseInner {
            store,
            locks: DashMap::new(),
        }))
    }

    /// Reads a document.
    ///
    /// # Errors
    ///
    /// Returns Err if the store fails or the document does not match `T`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>, DatabaseError> {
        match self.0.store.get(collection, id).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Writes a document, replacing what was there.
    ///
    /// # Errors
    ///
    /// Returns Err if the store fails or `T` cannot be serialized.
    pub async fn set<T: Serialize>(
        &self,
        collection: &str,
        id: &str,
        document: &T,
    ) -> Result<(), DatabaseError> {
        let value = serde_json::to_value(document)?;
        self.0.store.set(collection, id, value).await
    }

    /// Lists every document of a collection. A document that fails to
    /// deserialize is reported per entry so one bad document does not hide the
    /// others.
    ///
    /// # Errors
    ///
    /// Returns Err if the store fails.
    pub async fn list<T: DeserializeOwned>(
        &self,
        collection: &str,
    ) -> Result<Vec<(String, Result<T, DatabaseError>)>, DatabaseError> {
        let documents = self.0.store.list(collection).await?;
        Ok(documents
            .into_iter()
            .map(|(id, value)| (id, serde_json::from_value(value).map_err(DatabaseError::from)))
            .collect())
    }

    /// Waits for exclusive access to a document. Hold the guard across the read
    /// and the write of a read-modify-write cycle.
    pub async fn lock(&self, collection: &str, id: &str) -> OwnedMutexGuard<()> {
        let mutex = Arc::clone(&self.0.locks.entry(format!("{collection}/{id}")).or_default());
        mutex.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::time::Duration;

    #[derive(Debug, Default, Deserialize, PartialEq, Serialize)]
    struct Counter {
        value: u32,
    }

    #[tokio::test]
    async fn typed_round_trip_through_the_store() {
        let store = Arc::new(MemoryStore::new());
        let database = Database::new(store.clone());

        assert_eq!(database.get::<Counter>("counters", "a").await.unwrap(), None);
        database
            .set("counters", "a", &Counter { value: 3 })
            .await
            .unwrap();
        assert_eq!(
            database.get::<Counter>("counters", "a").await.unwrap(),
            Some(Counter { value: 3 })
        );
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test]
    async fn malformed_document_does_not_hide_the_rest() {
        let store = Arc::new(MemoryStore::new());
        store
            .set("counters", "bad", serde_json::json!({"value": "nope"}))
            .await
            .unwrap();
        store
            .set("counters", "good", serde_json::json!({"value": 1}))
            .await
            .unwrap();
        let database = Database::new(store);

        let documents = database.list::<Counter>("counters").await.unwrap();
        assert_eq!(documents.len(), 2);
        assert!(documents[0].1.is_err());
        assert_eq!(documents[1].1.as_ref().unwrap().value, 1);
    }

    #[tokio::test]
    async fn lock_serializes_access_per_document() {
        let database = Database::new(Arc::new(MemoryStore::new()));
        let guard = database.lock("counters", "a").await;

        let other = database.clone();
        let mut waiter = tokio::spawn(async move {
            let _guard = other.lock("counters", "a").await;
        });
        assert!(tokio::time::timeout(Duration::from_millis(50), &mut waiter)
            .await
            .is_err());

        // A different document is not blocked.
        let _b = database.lock("counters", "b").await;

        drop(guard);
        waiter.await.unwrap();
    }
}
