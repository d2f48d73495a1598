//! Health check handlers.

use axum::http::StatusCode;

/// Liveness probe: the process is up and serving.
pub async fn live() -> StatusCode {
    StatusCode::OK
}
