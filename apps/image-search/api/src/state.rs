//! Application state management.
//!
//! This module defines the shared application state passed to the app-level
//! handlers (readiness). Domain handlers carry their own state.

use domain_image_search::ImageSearchService;
use std::sync::Arc;

/// Shared application state.
///
/// Cloned per handler; both fields are cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// Search pipeline, shared with the domain router
    pub service: Arc<ImageSearchService>,
}
