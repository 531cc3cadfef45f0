//! Sample listing and prediction endpoints

use crate::{
    dataset::SampleRow,
    error::Error,
    models::Prediction,
    server::state::ServerState,
    service::ModelInfo,
};
use axum::{
    extract::{rejection::JsonRejection, Json, State},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Create inference router
pub fn create_router() -> Router<ServerState> {
    Router::new()
        .route("/samples", get(list_samples))
        .route("/predict", post(predict))
        .route("/model", get(model_info))
}

/// Request to predict one row
#[derive(Debug, Deserialize)]
struct PredictRequest {
    row: Value,
}

#[derive(Debug, Serialize)]
struct SamplesResponse {
    samples: Vec<SampleRow>,
}

/// List the cached dataset rows
async fn list_samples(State(state): State<ServerState>) -> Json<SamplesResponse> {
    Json(SamplesResponse {
        samples: state.service.samples().to_vec(),
    })
}

/// Predict a single feature row
async fn predict(
    State(state): State<ServerState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<Prediction>, Error> {
    let row = match payload {
        Ok(Json(request)) => request.row,
        Err(rejection) => {
            // A missing model outranks a malformed body
            state.service.ensure_ready()?;
            debug!("Rejected predict body: {}", rejection.body_text());
            return Err(Error::InvalidInput(rejection.body_text()));
        }
    };

    let prediction = state
        .service
        .predict(&row)
        .inspect_err(|e| warn!("Predict request failed: {}", e))?;
    Ok(Json(prediction))
}

/// Describe the loaded model
async fn model_info(State(state): State<ServerState>) -> Json<ModelInfo> {
    Json(state.service.model_info())
}
