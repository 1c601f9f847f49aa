use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use serde_json::Value;
use tokio_postgres::{types::Json, Config as PostgresConfig, NoTls};

use crate::{error::DatabaseError, DocumentStore};

/// Documents kept as JSONB rows keyed by `(collection, id)`.
pub struct PostgresStore {
    pool: Pool,
}

impl PostgresStore {
    /// Connects to the database and makes sure the documents table exists.
    ///
    /// # Errors
    ///
    /// Returns Err if the connection string is invalid or the table cannot be created.
    pub async fn connect(connection_string: &str, max_size: usize) -> Result<Self, DatabaseError> {
        let config = connection_string.parse::<PostgresConfig>()?;
        let manager = Manager::from_config(
            config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let pool = Pool::builder(manager).max_size(max_size).build()?;

        let client = pool.get().await?;
        client
            .batch_execute(
                r"CREATE TABLE IF NOT EXISTS documents (
                    collection TEXT NOT NULL,
                    id TEXT NOT NULL,
                    data JSONB NOT NULL,
                    PRIMARY KEY (collection, id)
                )",
            )
            .await?;
        tracing::debug!(max_size, "documents table ready");

        Ok(Self { pool })
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, DatabaseError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT data FROM documents WHERE collection = $1 AND id = $2",
                &[&collection, &id],
            )
            .await?;
        match row {
            Some(row) => {
                let data = row.try_get::<_, Json<Value>>("data")?;
                Ok(Some(data.0))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, collection: &str, id: &str, value: Value) -> Result<(), DatabaseError> {
        let client = self.pool.get().await?;
        client
            .execute(
                r"INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)
                ON CONFLICT (collection, id) DO UPDATE SET data = EXCLUDED.data",
                &[&collection, &id, &Json(&value)],
            )
            .await?;
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, DatabaseError> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT id, data FROM documents WHERE collection = $1 ORDER BY id",
                &[&collection],
            )
            .await?;
        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.try_get::<_, String>("id")?;
            let data = row.try_get::<_, Json<Value>>("data")?;
            documents.push((id, data.0));
        }
        Ok(documents)
    }
}
