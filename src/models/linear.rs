//! Linear estimators: logistic regression and linear SVC

use super::{check_finite, check_width, sigmoid, softmax, LabelClassifier, ProbabilisticClassifier};
use crate::error::{Error, Result};
use serde::Deserialize;

/// Fitted weights shared by the linear estimators.
///
/// Binary problems carry a single coefficient row (decision for `classes[1]`);
/// multiclass problems carry one row per class.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearWeights {
    pub classes: Vec<i64>,
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

impl LinearWeights {
    pub fn validate(&self) -> Result<()> {
        if self.classes.len() < 2 {
            return Err(Error::InvalidModel(format!(
                "at least 2 classes required, got {}",
                self.classes.len()
            )));
        }

        let expected_rows = if self.classes.len() == 2 {
            1
        } else {
            self.classes.len()
        };
        if self.coef.len() != expected_rows {
            return Err(Error::InvalidModel(format!(
                "expected {} coefficient rows for {} classes, got {}",
                expected_rows,
                self.classes.len(),
                self.coef.len()
            )));
        }
        if self.intercept.len() != expected_rows {
            return Err(Error::InvalidModel(format!(
                "expected {} intercepts, got {}",
                expected_rows,
                self.intercept.len()
            )));
        }

        let width = self.coef[0].len();
        if self.coef.iter().any(|row| row.len() != width) {
            return Err(Error::InvalidModel(
                "coefficient rows have different widths".to_string(),
            ));
        }
        Ok(())
    }

    pub fn n_features(&self) -> usize {
        self.coef.first().map(Vec::len).unwrap_or(0)
    }

    /// Signed distance to each decision hyperplane
    pub fn decision_function(&self, x: &[f64]) -> Vec<f64> {
        self.coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, b)| row.iter().zip(x).map(|(w, v)| w * v).sum::<f64>() + b)
            .collect()
    }
}

/// Logistic regression (sigmoid for binary, softmax for multinomial)
#[derive(Debug, Clone, Deserialize)]
pub struct LogisticRegression {
    #[serde(flatten)]
    pub weights: LinearWeights,
}

impl LogisticRegression {
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()
    }
}

impl ProbabilisticClassifier for LogisticRegression {
    fn name(&self) -> &'static str {
        "LogisticRegression"
    }

    fn n_features(&self) -> usize {
        self.weights.n_features()
    }

    fn predict_proba(&self, x: &[f64]) -> Result<Vec<f64>> {
        check_width(self.name(), self.n_features(), x)?;
        check_finite(x)?;

        let scores = self.weights.decision_function(x);
        if scores.len() == 1 {
            let p = sigmoid(scores[0]);
            Ok(vec![1.0 - p, p])
        } else {
            Ok(softmax(&scores))
        }
    }
}

/// Linear support vector classifier; produces labels only
#[derive(Debug, Clone, Deserialize)]
pub struct LinearSvc {
    #[serde(flatten)]
    pub weights: LinearWeights,
}

impl LinearSvc {
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()
    }
}

impl LabelClassifier for LinearSvc {
    fn name(&self) -> &'static str {
        "LinearSVC"
    }

    fn n_features(&self) -> usize {
        self.weights.n_features()
    }

    fn predict(&self, x: &[f64]) -> Result<i64> {
        check_width(self.name(), self.n_features(), x)?;
        check_finite(x)?;

        let scores = self.weights.decision_function(x);
        let idx = if scores.len() == 1 {
            usize::from(scores[0] > 0.0)
        } else {
            let mut best = 0;
            for (i, s) in scores.iter().enumerate().skip(1) {
                if *s > scores[best] {
                    best = i;
                }
            }
            best
        };
        Ok(self.weights.classes[idx])
    }
}
