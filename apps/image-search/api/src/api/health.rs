//! Readiness endpoint

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use axum_helpers::{HealthCheckFuture, run_health_checks};
use serde_json::Value;

use crate::state::AppState;

/// Create the readiness router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(readiness_check))
        .with_state(state)
}

/// Readiness check - verifies the vision endpoint accepts our key
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let service = state.service.clone();

    let checks: Vec<(&str, HealthCheckFuture)> = vec![(
        "vision",
        Box::pin(async move { service.check_readiness().await.map_err(|e| e.to_string()) }),
    )];

    match run_health_checks(checks).await {
        Ok(ready) => ready,
        Err(not_ready) => not_ready,
    }
}
