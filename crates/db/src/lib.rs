//! Document store used by shelf modules.
//!
//! Documents are schemaless JSON bodies grouped into named collections and
//! addressed by an opaque identifier that the store assigns on insert. Two
//! backends are provided: [`MemoryStore`] for `memory://` endpoints and
//! [`SqliteStore`] for `sqlite:` endpoints. [`connect`] picks one from the
//! configured endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use shelf_kernel::settings::DatabaseSettings;
use shelf_kernel::{InitCtx, Module};
use thiserror::Error;

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// A stored JSON document and its store-assigned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub body: Value,
}

/// Errors raised by document store backends
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Backend(#[from] sqlx::Error),

    #[error("document serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unsupported database endpoint '{0}'; expected memory:// or sqlite:")]
    UnsupportedEndpoint(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations over collections of JSON documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document in `collection`, oldest first
    async fn find_all(&self, collection: &str) -> StoreResult<Vec<Document>>;

    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Store `body` as a new document and return it with its assigned id
    async fn insert(&self, collection: &str, body: Value) -> StoreResult<Document>;

    /// Insert or overwrite the document with `document.id`
    async fn save(&self, collection: &str, document: &Document) -> StoreResult<()>;

    /// Remove every document matching `id`; returns how many were removed
    async fn delete_by_id(&self, collection: &str, id: &str) -> StoreResult<u64>;

    /// Round-trip to the backend
    async fn ping(&self) -> StoreResult<()>;
}

/// Identifier for a freshly inserted document. Time-ordered so ids sort
/// roughly by creation.
pub(crate) fn new_document_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Open the store described by `settings.endpoint`.
pub async fn connect(settings: &DatabaseSettings) -> StoreResult<Arc<dyn DocumentStore>> {
    let endpoint = settings.endpoint.as_str();

    if endpoint.starts_with("memory:") {
        tracing::info!(target: "shelf-db", "using in-memory document store");
        return Ok(Arc::new(MemoryStore::new()));
    }

    if endpoint.starts_with("sqlite:") {
        let store = SqliteStore::connect(endpoint, settings.max_connections).await?;
        tracing::info!(target: "shelf-db", endpoint, "connected to sqlite document store");
        return Ok(Arc::new(store));
    }

    Err(StoreError::UnsupportedEndpoint(endpoint.to_string()))
}

/// Core module exposing the document store to the lifecycle and `/healthz`.
pub struct DbModule {
    store: Arc<dyn DocumentStore>,
}

impl DbModule {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for DbModule {
    fn name(&self) -> &'static str {
        "db"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        self.store.ping().await?;
        tracing::info!(
            module = self.name(),
            endpoint = %ctx.settings.database.endpoint,
            "document store reachable"
        );
        Ok(())
    }

    async fn health(&self) -> anyhow::Result<()> {
        self.store.ping().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_endpoint_selects_memory_store() {
        let settings = DatabaseSettings {
            endpoint: "memory://".to_string(),
            max_connections: 1,
        };
        let store = connect(&settings).await.unwrap();
        store.ping().await.unwrap();
    }

    #[tokio::test]
    async fn unknown_scheme_is_rejected() {
        let settings = DatabaseSettings {
            endpoint: "mongodb://localhost:27017".to_string(),
            max_connections: 1,
        };
        let err = connect(&settings).await.err().unwrap();
        assert!(matches!(err, StoreError::UnsupportedEndpoint(_)));
    }

    #[tokio::test]
    async fn db_module_health_pings_store() {
        let module = DbModule::new(Arc::new(MemoryStore::new()));
        assert_eq!(module.name(), "db");
        module.health().await.unwrap();
    }
}
