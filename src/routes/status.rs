//! Aggregated status snapshot.
//!
//! Serves the latest published snapshot as pretty-printed JSON. The HTTP
//! status carries the binary verdict for load balancers: 200 when every
//! service is up, the configured unhealthy code (404 by default) otherwise.
//! Workload roll-up does not affect the status code.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use http::header::CONTENT_TYPE;
use http::StatusCode;

use crate::state::AppState;

pub async fn status(State(state): State<AppState>) -> Response {
    let snapshot = state.snapshot();
    let code = if snapshot.is_healthy() {
        StatusCode::OK
    } else {
        state.unhealthy_status
    };

    match serde_json::to_string_pretty(snapshot.as_ref()) {
        Ok(body) => (code, [(CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode snapshot");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
