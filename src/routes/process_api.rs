use axum::{
    extract::Query, extract::State, http::StatusCode, response::IntoResponse, routing::get, Json,
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{error_response, AppState};
use crate::{classify, RiskResponse};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/", get(root))
        .route("/process_api", get(handler))
}

#[derive(Serialize)]
struct RootResponse {
    message: &'static str,
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Flood Prediction API is running. Use /process_api with query parameters.",
    })
}

/// Query parameters for a classification request.
#[derive(Debug, Deserialize)]
pub struct ProcessQuery {
    location: String,
    rainfall: f64,
    river_level: f64,
    dam_release: f64,
}

async fn handler(
    Query(params): Query<ProcessQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // ---
    info!("GET /process_api - {:?}", params);

    let index = state.index.snapshot();
    let result = match classify(
        &index,
        &params.location,
        params.rainfall,
        params.river_level,
        params.dam_release,
    ) {
        Ok(result) => result,
        Err(e) => {
            warn!("Rejected readings for {:?}: {}", params.location, e);
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string());
        }
    };

    debug!("GET /process_api - {:?}", result);
    let body = RiskResponse::build(
        &params.location,
        params.rainfall,
        params.river_level,
        params.dam_release,
        &result,
    );
    (StatusCode::OK, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    // ---
    use super::super::{router as app, test_support};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_root_message() {
        // ---
        let app = app(test_support::riverton_state());
        let (status, json) = test_support::send(app, "GET", "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json["message"],
            "Flood Prediction API is running. Use /process_api with query parameters."
        );
    }

    #[tokio::test]
    async fn test_likely_for_riverton() {
        // ---
        let app = app(test_support::riverton_state());
        let uri = "/process_api?location=%20riverton&rainfall=115&river_level=6&dam_release=450";
        let (status, json) = test_support::send(app, "GET", uri).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["location"], "Riverton");
        assert_eq!(json["rainfall"], 115.0);
        assert_eq!(json["river_level"], 6.0);
        assert_eq!(json["dam_release"], 450.0);
        assert_eq!(json["flood_risk"], "Likely");
        assert_eq!(json["time_left_hours"], 30);
        assert_eq!(json["color_code"], "orange");
        assert_eq!(
            json["message"],
            "Flood risk: Likely. Estimated time left: 30 hours."
        );
    }

    #[tokio::test]
    async fn test_unknown_location() {
        // ---
        let app = app(test_support::riverton_state());
        let uri = "/process_api?location=nowhere&rainfall=1&river_level=1&dam_release=1";
        let (status, json) = test_support::send(app, "GET", uri).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["location"], "Nowhere");
        assert_eq!(json["flood_risk"], "Unknown");
        assert_eq!(json["time_left_hours"], "N/A");
        assert_eq!(json["color_code"], "gray");
        assert_eq!(json["message"], "No flood expected.");
    }

    #[tokio::test]
    async fn test_negative_reading_rejected() {
        // ---
        let app = app(test_support::riverton_state());
        let uri = "/process_api?location=Riverton&rainfall=-5&river_level=6&dam_release=450";
        let (status, json) = test_support::send(app, "GET", uri).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json["error"].as_str().unwrap().contains("rainfall"));
    }

    #[tokio::test]
    async fn test_nan_reading_rejected() {
        // ---
        let app = app(test_support::riverton_state());
        let uri = "/process_api?location=Riverton&rainfall=1&river_level=NaN&dam_release=450";
        let (status, _) = test_support::send(app, "GET", uri).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_malformed_query_rejected() {
        // ---
        let app = app(test_support::riverton_state());
        let uri = "/process_api?location=Riverton&rainfall=lots&river_level=6&dam_release=450";
        let (status, _) = test_support::send(app.clone(), "GET", uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = test_support::send(app, "GET", "/process_api?rainfall=1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
