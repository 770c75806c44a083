//! Weather ingestion endpoints.
//!
//! `POST /api/trigger` runs the same upload the scheduled job runs;
//! `GET /api/curah-hujan` returns the per-location weather mapping verbatim,
//! with per-location fetch failures embedded as `error` objects.

use std::collections::BTreeMap;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::{weather, AppState};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/trigger", post(trigger))
        .route("/curah-hujan", get(curah_hujan))
}

async fn trigger(State(state): State<AppState>) -> Response {
    // ---
    info!("POST /api/trigger");

    match weather::upload_weather(&state.store, &state.weather).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "message": "Weather data uploaded to the store",
            })),
        )
            .into_response(),
        Err(e) => {
            error!("Weather upload failed: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "error",
                    "message": format!("Upload failed: {e:#}"),
                })),
            )
                .into_response()
        }
    }
}

async fn curah_hujan(State(state): State<AppState>) -> Json<BTreeMap<String, Value>> {
    // ---
    info!("GET /api/curah-hujan");

    let data = state.weather.fetch_all_locations().await;
    info!(
        "Fetched locations: {:?}",
        data.keys().collect::<Vec<_>>()
    );
    Json(data)
}
