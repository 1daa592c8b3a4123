//! HTTP server facade for shelf with Axum, error pages, and OpenAPI support.

use std::sync::Arc;

use anyhow::Context;
use axum::{extract::State, http::StatusCode, routing::get, Router};

use shelf_kernel::{settings::Settings, Module, ModuleRegistry};

pub mod error;
pub mod html;
pub mod router;

use router::RouterBuilder;

/// Start the HTTP server and serve until Ctrl-C
pub async fn start_server(registry: &ModuleRegistry, settings: &Settings) -> anyhow::Result<()> {
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    tracing::info!("starting HTTP server on {}", addr);

    let app = build_router(registry, settings);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    tracing::info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Build the main HTTP router with all module routes mounted
pub fn build_router(registry: &ModuleRegistry, settings: &Settings) -> Router {
    let mut router_builder = RouterBuilder::new().route(
        "/healthz",
        get(health_check).with_state(registry.module_handles()),
    );

    for module in registry.modules() {
        tracing::info!(module = module.name(), "mounting module routes");
        router_builder = router_builder.mount_module(module.routes());
    }

    // Layers wrap only the routes registered before them
    router_builder
        .with_openapi(registry)
        .with_timeout(settings.server.request_timeout_ms)
        .with_cors()
        .with_request_id()
        .with_tracing()
        .build()
}

/// Health check endpoint; polls every module
async fn health_check(State(modules): State<Vec<Arc<dyn Module>>>) -> (StatusCode, String) {
    let mut failures = Vec::new();
    for module in &modules {
        if let Err(e) = module.health().await {
            tracing::warn!(module = module.name(), error = %e, "module unhealthy");
            failures.push(format!("{}: {e}", module.name()));
        }
    }

    if failures.is_empty() {
        (StatusCode::OK, "ok".to_string())
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, failures.join("\n"))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        // No signal handler: serve until killed.
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    struct SickModule;

    #[async_trait::async_trait]
    impl Module for SickModule {
        fn name(&self) -> &'static str {
            "sick"
        }

        async fn health(&self) -> anyhow::Result<()> {
            anyhow::bail!("backend down")
        }
    }

    #[tokio::test]
    async fn healthz_is_ok_without_modules() {
        let registry = ModuleRegistry::new();
        let app = build_router(&registry, &Settings::default());

        let response = app
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn healthz_reports_unhealthy_module() {
        let mut registry = ModuleRegistry::new();
        registry.register_custom(Arc::new(SickModule));
        let app = build_router(&registry, &Settings::default());

        let response = app
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8_lossy(&body).contains("sick: backend down"));
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let registry = ModuleRegistry::new();
        let app = build_router(&registry, &Settings::default());

        let response = app
            .oneshot(
                Request::get("/docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
