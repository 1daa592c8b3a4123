pub mod flash;
pub mod models;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod views;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use shelf_db::DocumentStore;
use shelf_kernel::settings::FlashSettings;
use shelf_kernel::{InitCtx, Module};

use flash::FlashStore;
use repository::BookRepository;
use routes::BooksState;

/// Book catalogue pages mounted under `/books`
pub struct BooksModule {
    state: BooksState,
}

impl BooksModule {
    pub fn new(store: Arc<dyn DocumentStore>, flash: &FlashSettings) -> Self {
        Self {
            state: BooksState {
                books: BookRepository::new(store),
                flash: Arc::new(FlashStore::new(flash)),
            },
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            flash_ttl_secs = ctx.settings.flash.ttl_secs,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi::document())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        match self.state.books.find_all().await {
            Ok(books) => {
                tracing::info!(module = self.name(), books = books.len(), "books module started")
            }
            // The list page reports this per request; don't refuse to boot.
            Err(e) => tracing::warn!(
                module = self.name(),
                error = %e,
                "books module started but the collection could not be read"
            ),
        }
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(store: Arc<dyn DocumentStore>, flash: &FlashSettings) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store, flash))
}
