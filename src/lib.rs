//! shelf application library
//!
//! Wires the document store and the project modules into the kernel
//! lifecycle and serves them over HTTP.

pub mod modules;

use anyhow::Context;
use shelf_kernel::settings::Settings;
use shelf_kernel::{InitCtx, ModuleRegistry};

/// Run the application until the server shuts down.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let store = shelf_db::connect(&settings.database)
        .await
        .with_context(|| format!("failed to open store at '{}'", settings.database.endpoint))?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, store, &settings);
    tracing::info!(
        core = registry.core_module_count(),
        custom = registry.custom_module_count(),
        "modules registered"
    );

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_core_modules(&ctx).await?;
    registry.init_custom_modules(&ctx).await?;
    registry.start_core_modules(&ctx).await?;
    registry.start_custom_modules(&ctx).await?;

    let served = shelf_http::start_server(&registry, &settings).await;

    registry.stop_custom_modules().await?;
    registry.stop_core_modules().await?;

    served
}
