use std::sync::Arc;

use shelf_db::{Document, DocumentStore, StoreResult};

use super::models::{Book, BookFields};

const COLLECTION: &str = "books";

/// Typed access to the `books` collection.
#[derive(Clone)]
pub struct BookRepository {
    store: Arc<dyn DocumentStore>,
}

impl BookRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn find_all(&self) -> StoreResult<Vec<Book>> {
        let documents = self.store.find_all(COLLECTION).await?;
        let books = documents
            .into_iter()
            .map(Book::from_document)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(books)
    }

    pub async fn find_by_id(&self, id: &str) -> StoreResult<Option<Book>> {
        match self.store.find_by_id(COLLECTION, id).await? {
            Some(document) => Ok(Some(Book::from_document(document)?)),
            None => Ok(None),
        }
    }

    pub async fn create(&self, fields: BookFields) -> StoreResult<Book> {
        let body = serde_json::to_value(&fields)?;
        let document = self.store.insert(COLLECTION, body).await?;
        Ok(Book::from_document(document)?)
    }

    /// Overwrite the fields of an existing book. `None` when no book has `id`.
    ///
    /// The read and the write are separate store calls; a concurrent edit
    /// between them is silently overwritten.
    pub async fn update(&self, id: &str, fields: BookFields) -> StoreResult<Option<Book>> {
        let Some(mut book) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        book.apply(fields);
        let document = Document {
            id: book.id.clone(),
            body: serde_json::to_value(book.fields())?,
        };
        self.store.save(COLLECTION, &document).await?;

        Ok(Some(book))
    }

    /// Remove the book with `id`, returning how many records matched.
    pub async fn delete(&self, id: &str) -> StoreResult<u64> {
        self.store.delete_by_id(COLLECTION, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shelf_db::{MemoryStore, StoreError};

    fn fields(title: &str, price: f64) -> BookFields {
        BookFields {
            title: title.to_string(),
            author: "Herbert".to_string(),
            genre: "SciFi".to_string(),
            price,
        }
    }

    #[tokio::test]
    async fn create_then_list() {
        let repo = BookRepository::new(Arc::new(MemoryStore::new()));
        let dune = repo.create(fields("Dune", 12.5)).await.unwrap();
        let messiah = repo.create(fields("Dune Messiah", 10.0)).await.unwrap();

        let books = repo.find_all().await.unwrap();
        assert_eq!(books, vec![dune.clone(), messiah]);
        assert_eq!(repo.find_by_id(&dune.id).await.unwrap(), Some(dune));
    }

    #[tokio::test]
    async fn update_touches_only_the_target() {
        let repo = BookRepository::new(Arc::new(MemoryStore::new()));
        let first = repo.create(fields("Dune", 12.5)).await.unwrap();
        let second = repo.create(fields("Emma", 3.0)).await.unwrap();

        let updated = repo
            .update(&first.id, fields("Dune (revised)", 14.0))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, first.id);
        assert_eq!(updated.title, "Dune (revised)");

        assert_eq!(repo.find_by_id(&second.id).await.unwrap(), Some(second));
        assert_eq!(repo.find_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_missing_book_is_none() {
        let repo = BookRepository::new(Arc::new(MemoryStore::new()));
        assert!(repo.update("nope", fields("X", 1.0)).await.unwrap().is_none());
        assert!(repo.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn undecodable_document_is_a_store_error() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert(COLLECTION, json!({"title": "no price"}))
            .await
            .unwrap();

        let repo = BookRepository::new(store);
        let err = repo.find_all().await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
