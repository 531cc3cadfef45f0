//! Inference service context
//!
//! [`InferenceService`] owns the model and the sample cache. It is built once
//! at startup, never mutated afterwards, and shared by all request handlers.

use crate::config::AssetConfig;
use crate::dataset::{load_samples, SampleRow};
use crate::error::{Error, Result};
use crate::models::{Capability, Model, Prediction};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

/// Immutable model + sample cache
#[derive(Debug, Default)]
pub struct InferenceService {
    model: Option<Model>,
    samples: Vec<SampleRow>,
}

/// Summary of the loaded model, as reported by `/model`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub loaded: bool,
    pub estimator: Option<&'static str>,
    pub capability: Option<Capability>,
    pub feature_names: Option<Vec<String>>,
}

impl InferenceService {
    pub fn new(model: Option<Model>, samples: Vec<SampleRow>) -> Self {
        Self { model, samples }
    }

    /// Load model and samples from the configured paths. Failures are logged
    /// and leave the service degraded instead of aborting startup.
    pub fn load(assets: &AssetConfig) -> Self {
        let model_path = assets.model_file();
        let model = match Model::load(&model_path) {
            Ok(model) => {
                info!(
                    "Loaded {} model from {} (capability: {}, {} declared features)",
                    model.estimator(),
                    model_path.display(),
                    model.capability(),
                    model.feature_names().map(|n| n.len()).unwrap_or(0)
                );
                Some(model)
            }
            Err(e) => {
                error!("Failed to load model: {}", e);
                None
            }
        };

        let dataset_path = assets.dataset_file();
        let samples = match load_samples(&dataset_path, assets.sample_count) {
            Ok(samples) => {
                info!(
                    "Loaded {} sample rows from {}",
                    samples.len(),
                    dataset_path.display()
                );
                samples
            }
            Err(e) => {
                warn!("Failed to load samples: {}", e);
                Vec::new()
            }
        };

        Self::new(model, samples)
    }

    pub fn samples(&self) -> &[SampleRow] {
        &self.samples
    }

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.model.is_some()
    }

    pub fn model_info(&self) -> ModelInfo {
        match &self.model {
            Some(model) => ModelInfo {
                loaded: true,
                estimator: Some(model.estimator()),
                capability: Some(model.capability()),
                feature_names: model.feature_names().map(<[String]>::to_vec),
            },
            None => ModelInfo {
                loaded: false,
                estimator: None,
                capability: None,
                feature_names: None,
            },
        }
    }

    /// The loaded model, or `ServiceUnavailable`
    pub fn ensure_ready(&self) -> Result<&Model> {
        self.model
            .as_ref()
            .ok_or_else(|| Error::ServiceUnavailable("Model not loaded".to_string()))
    }

    /// Predict a single row. The model check precedes input validation.
    pub fn predict(&self, row: &Value) -> Result<Prediction> {
        let model = self.ensure_ready()?;

        let row = row
            .as_object()
            .ok_or_else(|| Error::InvalidInput("row must be a JSON object".to_string()))?;

        model.predict_row(row).map_err(|e| match e {
            Error::Inference(msg) => Error::Prediction(msg),
            other => Error::Prediction(other.to_string()),
        })
    }
}
