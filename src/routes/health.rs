//! Liveness endpoint for the probe process itself.
//!
//! Returns 200 OK whenever the process can answer HTTP, regardless of the
//! health of the services it watches. Use `/` for the aggregated verdict.

/// Health check handler.
pub async fn health() -> &'static str {
    "ok"
}
