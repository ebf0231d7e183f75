use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use tracing::{error, info};

use super::{error_response, AppState};

// ---

pub fn router() -> Router<AppState> {
    Router::new().route("/reload", post(handler))
}

/// Handle `POST /reload`: re-read the data file and swap in a new snapshot.
///
/// Requests already holding the previous snapshot finish against it.
async fn handler(State(state): State<AppState>) -> impl IntoResponse {
    // ---
    let path = state.config.data_file.clone();
    info!("POST /reload - {}", path.display());

    let index = state.index.clone();
    let reloaded = tokio::task::spawn_blocking(move || index.reload_from(&path)).await;

    match reloaded {
        Ok(Ok(summary)) => {
            info!(
                "Reload complete: {} observations across {} locations",
                summary.observations, summary.locations
            );
            (StatusCode::OK, Json(summary)).into_response()
        }
        Ok(Err(e)) => {
            error!("Reload failed, keeping previous snapshot: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e))
        }
        Err(e) => {
            error!("Reload task failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "reload task failed")
        }
    }
}
