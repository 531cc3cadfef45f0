//! Trained classifier artifacts and inference dispatch
//!
//! A model artifact is a JSON document tagged by `"type"`. Loading it yields a
//! [`Model`] whose [`Classifier`] variant fixes, once, which prediction
//! interface is used for every request:
//!
//! - probability-capable estimators (`logistic_regression`, `decision_tree`)
//! - the raw gradient-boosted `booster`, fed through a [`DMatrix`]
//! - label-only estimators (`linear_svc`)
//!
//! A file written by XGBoost's own `save_model` (no `"type"`, a top-level
//! `"learner"` object) is also accepted and loaded as a `booster`.

pub mod booster;
pub mod linear;
pub mod tree;
pub mod xgboost;

pub use booster::{Booster, BoosterNode, BoosterOutput, DMatrix, Objective, RegTree};
pub use linear::{LinearSvc, LinearWeights, LogisticRegression};
pub use tree::{DecisionTreeClassifier, TreeNode};
pub use xgboost::XgbModelFile;

use crate::error::{Error, Result};
use crate::features::clean_and_align;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Estimator exposing a class-probability vector
pub trait ProbabilisticClassifier: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Input width the estimator was fitted on
    fn n_features(&self) -> usize;

    /// Class probabilities for a single dense row
    fn predict_proba(&self, x: &[f64]) -> Result<Vec<f64>>;
}

/// Estimator exposing only a class label
pub trait LabelClassifier: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn n_features(&self) -> usize;

    fn predict(&self, x: &[f64]) -> Result<i64>;
}

/// Prediction interface of a loaded model, decided at load time
#[derive(Debug)]
pub enum Classifier {
    Probabilistic(Box<dyn ProbabilisticClassifier>),
    RawBooster(Booster),
    LabelOnly(Box<dyn LabelClassifier>),
}

/// Capability tag reported by `/model` and in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Probability,
    RawBooster,
    LabelOnly,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Probability => write!(f, "probability"),
            Capability::RawBooster => write!(f, "raw_booster"),
            Capability::LabelOnly => write!(f, "label_only"),
        }
    }
}

/// Result of a single prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub prediction: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
}

impl Prediction {
    /// Arg-max class index plus the probability of class 1 (or of the only
    /// class when the vector has a single entry).
    pub fn from_probabilities(proba: &[f64]) -> Result<Self> {
        if proba.is_empty() {
            return Err(Error::Inference(
                "estimator returned no class probabilities".to_string(),
            ));
        }

        let mut best = 0;
        for (idx, p) in proba.iter().enumerate().skip(1) {
            if *p > proba[best] {
                best = idx;
            }
        }

        let probability = if proba.len() > 1 { proba[1] } else { proba[0] };
        Ok(Self {
            prediction: best as i64,
            probability: Some(probability),
        })
    }

    /// Threshold a single positive-class score at 0.5
    pub fn from_score(score: f64) -> Self {
        Self {
            prediction: if score >= 0.5 { 1 } else { 0 },
            probability: Some(score),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ModelArtifact {
    #[serde(default)]
    feature_names: Option<Vec<String>>,
    #[serde(flatten)]
    estimator: Estimator,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Estimator {
    LogisticRegression(LogisticRegression),
    DecisionTree(DecisionTreeClassifier),
    Booster(Booster),
    LinearSvc(LinearSvc),
}

/// A loaded, validated classifier
#[derive(Debug)]
pub struct Model {
    estimator: &'static str,
    feature_names: Option<Vec<String>>,
    classifier: Classifier,
}

impl Model {
    /// Read and validate a model artifact from disk
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!(
                "Model not found at {}",
                path.display()
            )));
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parse and validate a model artifact
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        let artifact = if value.get("learner").is_some() {
            let (booster, feature_names) = XgbModelFile::deserialize(value)?.into_booster()?;
            ModelArtifact {
                feature_names,
                estimator: Estimator::Booster(booster),
            }
        } else {
            ModelArtifact::deserialize(value)?
        };
        let feature_names = artifact.feature_names;

        let (estimator, width, classifier) = match artifact.estimator {
            Estimator::LogisticRegression(model) => {
                model.validate()?;
                let width = model.n_features();
                ("logistic_regression", width, Classifier::Probabilistic(Box::new(model)))
            }
            Estimator::DecisionTree(model) => {
                model.validate()?;
                let width = model.n_features();
                ("decision_tree", width, Classifier::Probabilistic(Box::new(model)))
            }
            Estimator::Booster(model) => {
                let model = model.with_feature_names(feature_names.clone());
                model.validate()?;
                ("booster", model.num_feature, Classifier::RawBooster(model))
            }
            Estimator::LinearSvc(model) => {
                model.validate()?;
                let width = model.n_features();
                ("linear_svc", width, Classifier::LabelOnly(Box::new(model)))
            }
        };

        if let Some(names) = &feature_names {
            if names.len() != width {
                return Err(Error::InvalidModel(format!(
                    "{} feature names declared for an estimator with {} inputs",
                    names.len(),
                    width
                )));
            }
            let unique: HashSet<&String> = names.iter().collect();
            if unique.len() != names.len() {
                return Err(Error::InvalidModel(
                    "feature names must be unique".to_string(),
                ));
            }
        }

        Ok(Self {
            estimator,
            feature_names,
            classifier,
        })
    }

    /// Artifact `type` of the underlying estimator
    pub fn estimator(&self) -> &'static str {
        self.estimator
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    pub fn capability(&self) -> Capability {
        match self.classifier {
            Classifier::Probabilistic(_) => Capability::Probability,
            Classifier::RawBooster(_) => Capability::RawBooster,
            Classifier::LabelOnly(_) => Capability::LabelOnly,
        }
    }

    /// Clean, align and predict one request row
    pub fn predict_row(&self, row: &Map<String, Value>) -> Result<Prediction> {
        let frame = clean_and_align(row, self.feature_names());
        debug!(columns = ?frame.columns(), "Aligned request row");

        match &self.classifier {
            Classifier::Probabilistic(estimator) => {
                let proba = estimator.predict_proba(&frame.to_dense()?)?;
                Prediction::from_probabilities(&proba)
            }
            Classifier::RawBooster(booster) => {
                let dmatrix = DMatrix::from_frame(&frame)?;
                match booster.predict(&dmatrix)? {
                    BoosterOutput::Scores(scores) => scores
                        .first()
                        .map(|score| Prediction::from_score(*score))
                        .ok_or_else(|| Error::Inference("booster returned no rows".to_string())),
                    BoosterOutput::Probabilities(rows) => match rows.first() {
                        Some(proba) => Prediction::from_probabilities(proba),
                        None => Err(Error::Inference("booster returned no rows".to_string())),
                    },
                }
            }
            Classifier::LabelOnly(estimator) => Ok(Prediction {
                prediction: estimator.predict(&frame.to_dense()?)?,
                probability: None,
            }),
        }
    }
}

/// Reject rows whose width differs from the fitted width
pub(crate) fn check_width(name: &str, expected: usize, x: &[f64]) -> Result<()> {
    if x.len() != expected {
        return Err(Error::Inference(format!(
            "X has {} features, but {} is expecting {} features as input",
            x.len(),
            name,
            expected
        )));
    }
    Ok(())
}

/// Reject NaN and infinite values for estimators without missing-value support
pub(crate) fn check_finite(x: &[f64]) -> Result<()> {
    if x.iter().any(|v| v.is_nan()) {
        return Err(Error::Inference("Input X contains NaN.".to_string()));
    }
    if x.iter().any(|v| v.is_infinite()) {
        return Err(Error::Inference(
            "Input X contains infinity or a value too large for dtype('float64').".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

pub(crate) fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exp: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exp.iter().sum();
    exp.into_iter().map(|e| e / sum).collect()
}
