//! Route gateway for the flood risk API.
//!
//! Each sibling module exports a subrouter over [`AppState`]; this gateway
//! merges them so `main.rs` only needs [`router`].

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json, Router};
use serde::Serialize;

use crate::{Config, SharedIndex};

mod district;
mod health;
mod process_api;
mod reload;

// ---

/// State shared by every route.
#[derive(Clone)]
pub struct AppState {
    // ---
    pub index: SharedIndex,
    pub config: Config,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(index: SharedIndex, config: Config) -> anyhow::Result<Self> {
        // ---
        let http = reqwest::Client::builder()
            .timeout(config.district_api_timeout)
            .build()?;
        Ok(AppState {
            index,
            config,
            http,
        })
    }
}

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(process_api::router())
        .merge(district::router())
        .merge(reload::router())
        .merge(health::router())
        .with_state(state)
}

/// JSON error body shared by all routes.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: error.into(),
        }),
    )
        .into_response()
}
