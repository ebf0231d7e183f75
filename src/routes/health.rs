// src/routes/health.rs
//! API health check endpoint for the flood risk service.
//!
//! Used by container orchestrators and CI to verify the service responds.
//! Also reports the size and load time of the active historical index so an
//! operator can tell whether a reload took effect.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use super::AppState;
use crate::IndexSummary;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(flatten)]
    index: IndexSummary,
}

/// Handle `GET /health`.
///
/// Only reads the current snapshot; never touches the data file or the
/// upstream district feed.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        index: state.index.snapshot().summary(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
