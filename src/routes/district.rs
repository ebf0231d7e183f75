//! Classification from the live district sensor feed.
//!
//! Fetches the current rainfall, river level and dam release for a district
//! from the upstream feed configured in `DISTRICT_API_URL`, then classifies
//! them against the district's history exactly like `/process_api`.

use axum::{
    extract::Query, extract::State, http::StatusCode, response::IntoResponse, routing::get, Json,
    Router,
};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use super::{error_response, AppState};
use crate::{classify_readings, Readings, RiskResponse};

// ---

pub fn router() -> Router<AppState> {
    Router::new().route("/district_risk", get(handler))
}

#[derive(Debug, Deserialize)]
pub struct DistrictQuery {
    district: String,
}

/// Current readings as published by the district feed.
#[derive(Debug, Deserialize)]
struct DistrictReadings {
    rainfall_mm: f64,
    river_level_m: f64,
    dam_release_cumecs: f64,
}

/// Ways a district feed request can fail, each with its HTTP status.
#[derive(Debug)]
enum FeedError {
    Disabled,
    Rejected(StatusCode, String),
    Upstream(String),
}

async fn handler(
    Query(params): Query<DistrictQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // ---
    info!("GET /district_risk - district={:?}", params.district);

    let raw = match fetch_district_readings(&state, &params.district).await {
        Ok(raw) => raw,
        Err(FeedError::Disabled) => {
            return error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "district feed is not configured",
            );
        }
        Err(FeedError::Rejected(status, msg)) => {
            warn!("District feed rejected {:?}: {}", params.district, msg);
            return error_response(status, msg);
        }
        Err(FeedError::Upstream(msg)) => {
            error!("District feed failed for {:?}: {}", params.district, msg);
            return error_response(StatusCode::BAD_GATEWAY, msg);
        }
    };
    debug!("GET /district_risk - upstream readings {:?}", raw);

    let readings = match Readings::new(raw.rainfall_mm, raw.river_level_m, raw.dam_release_cumecs)
    {
        Ok(readings) => readings,
        Err(e) => {
            error!("District feed sent invalid readings: {}", e);
            return error_response(
                StatusCode::BAD_GATEWAY,
                format!("district feed sent invalid readings: {}", e),
            );
        }
    };

    let index = state.index.snapshot();
    let result = classify_readings(&index, &params.district, &readings);
    let body = RiskResponse::build(
        &params.district,
        readings.rainfall,
        readings.river_level,
        readings.dam_release,
        &result,
    );
    (StatusCode::OK, Json(body)).into_response()
}

async fn fetch_district_readings(
    state: &AppState,
    district: &str,
) -> Result<DistrictReadings, FeedError> {
    // ---
    let base_url = state
        .config
        .district_api_url
        .as_deref()
        .ok_or(FeedError::Disabled)?;

    let mut request = state.http.get(base_url).query(&[("district", district)]);
    if let Some(key) = &state.config.district_api_key {
        request = request.header(reqwest::header::AUTHORIZATION, key);
    }

    debug!("Fetching district readings from: {}", base_url);
    let response = request
        .send()
        .await
        .map_err(|e| FeedError::Upstream(format!("request failed: {}", e)))?;

    let status = response.status();
    if status == reqwest::StatusCode::FORBIDDEN {
        return Err(FeedError::Rejected(
            StatusCode::FORBIDDEN,
            "district feed rejected the API key".to_string(),
        ));
    }
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(FeedError::Rejected(
            StatusCode::NOT_FOUND,
            format!("district '{}' not found", district),
        ));
    }
    if !status.is_success() {
        return Err(FeedError::Upstream(format!(
            "district feed returned {}",
            status
        )));
    }

    response
        .json::<DistrictReadings>()
        .await
        .map_err(|e| FeedError::Upstream(format!("unreadable district payload: {}", e)))
}
