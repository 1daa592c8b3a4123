pub mod books;

use std::sync::Arc;

use shelf_db::{DbModule, DocumentStore};
use shelf_kernel::settings::Settings;
use shelf_kernel::ModuleRegistry;

/// Register the store as a core module and every project module on top of it
pub fn register_all(
    registry: &mut ModuleRegistry,
    store: Arc<dyn DocumentStore>,
    settings: &Settings,
) {
    registry.register_core(Arc::new(DbModule::new(store.clone())));
    registry.register_custom(books::create_module(store, &settings.flash));
}
