use axum::{Router, middleware, routing::get};
use axum_helpers::server::{create_production_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_image_search::ImageSearchService;
use observability::{metrics_handler, metrics_middleware};
use std::sync::Arc;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

const DEFAULT_LOG_DIRECTIVES: &str =
    "image_search_api=debug,domain_image_search=debug,axum_helpers=info,tower_http=info";

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output
    install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    init_tracing(&config.environment, DEFAULT_LOG_DIRECTIVES);

    observability::init_metrics()
        .map_err(|e| eyre::eyre!("Failed to install metrics recorder: {}", e))?;

    info!(
        vision = %config.image_search.vision.endpoint,
        index = %config.image_search.search.index_name,
        "Configuring downstream services"
    );

    let service = ImageSearchService::from_config(config.image_search.clone())?;

    let state = AppState {
        config,
        service: Arc::new(service),
    };

    let app = build_app(&state)?;

    info!(
        "Starting {} v{} (shutdown timeout {:?})",
        state.config.app.name, state.config.app.version, state.config.server.shutdown_timeout
    );

    let server_config = state.config.server.clone();
    create_production_app(app, &server_config, async move {
        info!("Shutting down: releasing downstream clients");
        drop(state);
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Image search API shutdown complete");
    Ok(())
}

/// Domain routes (served at the root and under /api) plus health, readiness and metrics.
fn build_app(state: &AppState) -> std::io::Result<Router> {
    let router = create_router::<openapi::ApiDoc>(api::routes(state), &state.config.server)?;

    Ok(router
        .merge(health_router(state.config.app))
        .merge(api::health::router(state.clone()))
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(metrics_middleware)))
}
