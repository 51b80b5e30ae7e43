//! API routes module
//!
//! Domain routes are mounted at the root and under /api by axum_helpers::create_router.

pub mod health;

use axum::Router;

use crate::state::AppState;

/// Create all API routes
pub fn routes(state: &AppState) -> Router {
    domain_image_search::handlers::router(state.service.clone())
}
