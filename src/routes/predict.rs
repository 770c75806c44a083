//! Flood prediction endpoint.
//!
//! `GET /api/predict` reads every feature's latest value from the store;
//! `POST /api/predict` takes the vector from the request body instead, with
//! missing keys defaulting to 0. Both paths run the same pipeline, so a
//! request and a concurrent scheduled firing behave identically.

use axum::{
    body::Bytes, extract::State, http::StatusCode, response::IntoResponse, response::Response,
    routing::get, Json, Router,
};
use serde_json::{json, Map, Value};
use tracing::{error, info};

use crate::{pipeline, AppState, PredictionResult};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/predict", get(predict_get).post(predict_post))
}

async fn predict_get(State(state): State<AppState>) -> Response {
    // ---
    info!("GET /api/predict");
    respond(pipeline::run(&state.store, &state.model, state.variant, None).await)
}

async fn predict_post(State(state): State<AppState>, body: Bytes) -> Response {
    // ---
    info!("POST /api/predict");

    // Strip control characters before parsing; some upstream clients embed
    // them in otherwise valid bodies.
    let raw = String::from_utf8_lossy(&body);
    let clean: String = raw.chars().filter(|&c| c as u32 > 0x1f).collect();

    let payload: Map<String, Value> = match serde_json::from_str::<Value>(&clean) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            error!("Failed to decode JSON payload");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid JSON payload" })),
            )
                .into_response();
        }
    };

    respond(pipeline::run(&state.store, &state.model, state.variant, Some(&payload)).await)
}

/// Map a pipeline outcome to the HTTP response. Store and model failures are
/// server-side; the pipeline never reports a client error (the payload was
/// already validated above).
fn respond(result: anyhow::Result<PredictionResult>) -> Response {
    // ---
    match result {
        Ok(prediction) => (StatusCode::OK, Json(prediction)).into_response(),
        Err(e) => {
            error!("Prediction pipeline failed: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Prediction failed" })),
            )
                .into_response()
        }
    }
}
