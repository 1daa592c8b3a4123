use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{new_document_id, Document, DocumentStore, StoreResult};

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == id))
            .cloned())
    }

    async fn insert(&self, collection: &str, body: Value) -> StoreResult<Document> {
        let document = Document {
            id: new_document_id(),
            body,
        };
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(document.clone());
        Ok(document)
    }

    async fn save(&self, collection: &str, document: &Document) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|doc| doc.id == document.id) {
            Some(existing) => existing.body = document.body.clone(),
            None => docs.push(document.clone()),
        }
        Ok(())
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> StoreResult<u64> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|doc| doc.id != id);
        Ok((before - docs.len()) as u64)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
