//! Axum router configuration
//!
//! ```text
//! /
//! ├── /inject         - flag injection & verification (scoring engine access)
//! └── /health/live    - liveness probe
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{health, inject};
use crate::state::AppState;

/// Build the complete Axum router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/inject", post(inject::inject))
        .nest("/health", health_router())
        .with_state(state)
}

/// Health check routes
fn health_router() -> Router<AppState> {
    Router::new().route("/live", get(health::live))
}
