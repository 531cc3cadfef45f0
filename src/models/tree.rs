//! Single decision tree classifier

use super::{check_finite, check_width, ProbabilisticClassifier};
use crate::error::{Error, Result};
use serde::Deserialize;

/// Tree node in depth-first layout; children always follow their parent.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// `x[feature] <= threshold` goes left
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Per-class weights (sample counts or fractions)
    Leaf { value: Vec<f64> },
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecisionTreeClassifier {
    pub classes: Vec<i64>,
    pub n_features: usize,
    pub nodes: Vec<TreeNode>,
}

impl DecisionTreeClassifier {
    pub fn validate(&self) -> Result<()> {
        if self.classes.is_empty() {
            return Err(Error::InvalidModel("tree has no classes".to_string()));
        }
        if self.nodes.is_empty() {
            return Err(Error::InvalidModel("tree has no nodes".to_string()));
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= self.n_features {
                        return Err(Error::InvalidModel(format!(
                            "node {} splits on feature {} of {}",
                            idx, feature, self.n_features
                        )));
                    }
                    for child in [*left, *right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(Error::InvalidModel(format!(
                                "node {} has invalid child {}",
                                idx, child
                            )));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.len() != self.classes.len() {
                        return Err(Error::InvalidModel(format!(
                            "leaf {} has {} weights for {} classes",
                            idx,
                            value.len(),
                            self.classes.len()
                        )));
                    }
                    if value.iter().any(|w| *w < 0.0) || value.iter().sum::<f64>() <= 0.0 {
                        return Err(Error::InvalidModel(format!(
                            "leaf {} has invalid class weights",
                            idx
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn leaf(&self, x: &[f64]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[*feature] <= *threshold { *left } else { *right };
                }
                TreeNode::Leaf { value } => return value,
            }
        }
    }
}

impl ProbabilisticClassifier for DecisionTreeClassifier {
    fn name(&self) -> &'static str {
        "DecisionTreeClassifier"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, x: &[f64]) -> Result<Vec<f64>> {
        check_width(self.name(), self.n_features, x)?;
        check_finite(x)?;

        let weights = self.leaf(x);
        let total: f64 = weights.iter().sum();
        Ok(weights.iter().map(|w| w / total).collect())
    }
}
