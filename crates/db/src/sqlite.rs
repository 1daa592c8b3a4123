use std::str::FromStr;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use crate::{new_document_id, Document, DocumentStore, StoreResult};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS documents (
    seq        INTEGER PRIMARY KEY AUTOINCREMENT,
    collection TEXT NOT NULL,
    id         TEXT NOT NULL,
    body       TEXT NOT NULL,
    UNIQUE (collection, id)
)";

/// Documents persisted as JSON text in a single SQLite table.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `endpoint` and ensure the
    /// schema exists.
    pub async fn connect(endpoint: &str, max_connections: u32) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(endpoint)?.create_if_missing(true);

        let pool = pool_options(endpoint, max_connections)
            .connect_with(options)
            .await?;

        sqlx::query(SCHEMA).execute(&pool).await?;

        Ok(Self { pool })
    }

    fn row_to_document(row: &sqlx::sqlite::SqliteRow) -> StoreResult<Document> {
        let id: String = row.try_get("id")?;
        let body: String = row.try_get("body")?;
        Ok(Document {
            id,
            body: serde_json::from_str(&body)?,
        })
    }
}

/// An in-memory database lives only as long as its connection, and every
/// connection gets its own empty copy: pin exactly one and never reap it.
fn pool_options(endpoint: &str, max_connections: u32) -> SqlitePoolOptions {
    if is_in_memory(endpoint) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections.max(1))
    }
}

fn is_in_memory(endpoint: &str) -> bool {
    endpoint.contains(":memory:") || endpoint.contains("mode=memory")
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn find_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let rows = sqlx::query("SELECT id, body FROM documents WHERE collection = ? ORDER BY seq")
            .bind(collection)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_document).collect()
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let row = sqlx::query("SELECT id, body FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_document).transpose()
    }

    async fn insert(&self, collection: &str, body: Value) -> StoreResult<Document> {
        let document = Document {
            id: new_document_id(),
            body,
        };

        sqlx::query("INSERT INTO documents (collection, id, body) VALUES (?, ?, ?)")
            .bind(collection)
            .bind(&document.id)
            .bind(serde_json::to_string(&document.body)?)
            .execute(&self.pool)
            .await?;

        Ok(document)
    }

    async fn save(&self, collection: &str, document: &Document) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO documents (collection, id, body) VALUES (?, ?, ?)
             ON CONFLICT (collection, id) DO UPDATE SET body = excluded.body",
        )
        .bind(collection)
        .bind(&document.id)
        .bind(serde_json::to_string(&document.body)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
