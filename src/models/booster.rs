//! Gradient-boosted tree ensemble with an explicit inference matrix
//!
//! The booster never sees request rows directly: callers wrap features in a
//! [`DMatrix`], which carries the column names the booster checks against its
//! own before predicting. Output is either one score per row (binary
//! objectives) or one probability vector per row (`multi:softprob`).

use super::{sigmoid, softmax};
use crate::error::{Error, Result};
use crate::features::FeatureFrame;
use serde::{Deserialize, Serialize};

/// Learning objective, which fixes how margins are transformed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Objective {
    #[serde(rename = "binary:logistic")]
    BinaryLogistic,
    #[serde(rename = "binary:logitraw")]
    BinaryLogitRaw,
    #[serde(rename = "multi:softprob")]
    MultiSoftprob,
}

/// Regression tree node. Missing values (NaN) follow `missing`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BoosterNode {
    /// `x[feature] < threshold` goes to `yes`
    Split {
        feature: usize,
        threshold: f64,
        yes: usize,
        no: usize,
        missing: usize,
    },
    Leaf { leaf: f64 },
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegTree {
    pub nodes: Vec<BoosterNode>,
}

impl RegTree {
    fn validate(&self, tree_idx: usize, num_feature: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(Error::InvalidModel(format!("tree {} has no nodes", tree_idx)));
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let BoosterNode::Split {
                feature,
                yes,
                no,
                missing,
                ..
            } = node
            {
                if *feature >= num_feature {
                    return Err(Error::InvalidModel(format!(
                        "tree {} node {} splits on feature {} of {}",
                        tree_idx, idx, feature, num_feature
                    )));
                }
                for child in [*yes, *no, *missing] {
                    if child <= idx || child >= self.nodes.len() {
                        return Err(Error::InvalidModel(format!(
                            "tree {} node {} has invalid child {}",
                            tree_idx, idx, child
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn leaf_value(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                BoosterNode::Split {
                    feature,
                    threshold,
                    yes,
                    no,
                    missing,
                } => {
                    let value = row[*feature];
                    idx = if value.is_nan() {
                        *missing
                    } else if value < *threshold {
                        *yes
                    } else {
                        *no
                    };
                }
                BoosterNode::Leaf { leaf } => return *leaf,
            }
        }
    }
}

/// Raw booster output
#[derive(Debug, Clone, PartialEq)]
pub enum BoosterOutput {
    /// One value per row
    Scores(Vec<f64>),
    /// One class-probability vector per row
    Probabilities(Vec<Vec<f64>>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Booster {
    pub objective: Objective,
    #[serde(default = "default_base_score")]
    pub base_score: f64,
    #[serde(default = "default_num_class")]
    pub num_class: usize,
    pub num_feature: usize,
    pub trees: Vec<RegTree>,
    /// Class group of each tree; round-robin over classes when empty
    #[serde(default)]
    pub tree_info: Vec<usize>,
    #[serde(skip)]
    feature_names: Option<Vec<String>>,
}

fn default_base_score() -> f64 {
    0.5
}

fn default_num_class() -> usize {
    1
}

impl Booster {
    pub fn new(
        objective: Objective,
        base_score: f64,
        num_class: usize,
        num_feature: usize,
        trees: Vec<RegTree>,
        tree_info: Vec<usize>,
    ) -> Self {
        Self {
            objective,
            base_score,
            num_class,
            num_feature,
            trees,
            tree_info,
            feature_names: None,
        }
    }

    /// Attach the column names a [`DMatrix`] must carry
    pub fn with_feature_names(mut self, feature_names: Option<Vec<String>>) -> Self {
        self.feature_names = feature_names;
        self
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn num_groups(&self) -> usize {
        match self.objective {
            Objective::MultiSoftprob => self.num_class,
            _ => 1,
        }
    }

    fn group_of(&self, tree_idx: usize) -> usize {
        match self.tree_info.get(tree_idx) {
            Some(group) => *group,
            None => tree_idx % self.num_groups(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self.objective {
            Objective::MultiSoftprob if self.num_class < 2 => {
                return Err(Error::InvalidModel(format!(
                    "multi:softprob requires num_class >= 2, got {}",
                    self.num_class
                )));
            }
            Objective::BinaryLogistic if !(self.base_score > 0.0 && self.base_score < 1.0) => {
                return Err(Error::InvalidModel(format!(
                    "binary:logistic base_score must be in (0, 1), got {}",
                    self.base_score
                )));
            }
            _ => {}
        }

        if !self.tree_info.is_empty() {
            if self.tree_info.len() != self.trees.len() {
                return Err(Error::InvalidModel(format!(
                    "tree_info has {} entries for {} trees",
                    self.tree_info.len(),
                    self.trees.len()
                )));
            }
            if let Some(group) = self.tree_info.iter().find(|g| **g >= self.num_groups()) {
                return Err(Error::InvalidModel(format!(
                    "tree_info group {} out of range for {} output groups",
                    group,
                    self.num_groups()
                )));
            }
        }

        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate(idx, self.num_feature)?;
        }
        Ok(())
    }

    fn base_margin(&self) -> f64 {
        match self.objective {
            Objective::BinaryLogistic => (self.base_score / (1.0 - self.base_score)).ln(),
            _ => self.base_score,
        }
    }

    /// Sum tree outputs per output group for one row
    fn margins(&self, row: &[f64]) -> Vec<f64> {
        let mut margins = vec![self.base_margin(); self.num_groups()];
        for (idx, tree) in self.trees.iter().enumerate() {
            margins[self.group_of(idx)] += tree.leaf_value(row);
        }
        margins
    }

    pub fn predict(&self, dmatrix: &DMatrix) -> Result<BoosterOutput> {
        if let Some(expected) = &self.feature_names {
            if dmatrix.feature_names() != expected.as_slice() {
                return Err(Error::Inference(format!(
                    "feature_names mismatch: {:?} {:?}",
                    expected,
                    dmatrix.feature_names()
                )));
            }
        }
        if dmatrix.num_col() != self.num_feature {
            return Err(Error::Inference(format!(
                "Feature shape mismatch, expected: {}, got {}",
                self.num_feature,
                dmatrix.num_col()
            )));
        }

        let rows = (0..dmatrix.num_row()).map(|r| self.margins(dmatrix.row(r)));
        let output = match self.objective {
            Objective::BinaryLogistic => BoosterOutput::Scores(rows.map(|m| sigmoid(m[0])).collect()),
            Objective::BinaryLogitRaw => BoosterOutput::Scores(rows.map(|m| m[0]).collect()),
            Objective::MultiSoftprob => {
                BoosterOutput::Probabilities(rows.map(|m| softmax(&m)).collect())
            }
        };
        Ok(output)
    }
}

/// Dense row-major inference matrix with named columns
#[derive(Debug, Clone, PartialEq)]
pub struct DMatrix {
    feature_names: Vec<String>,
    data: Vec<f64>,
    num_row: usize,
    num_col: usize,
}

impl DMatrix {
    /// Wrap a single aligned row. Fails on cells that are not numeric.
    pub fn from_frame(frame: &FeatureFrame) -> Result<Self> {
        let data = frame.to_dense()?;
        Ok(Self {
            feature_names: frame.columns().to_vec(),
            num_col: data.len(),
            num_row: 1,
            data,
        })
    }

    pub fn from_rows(feature_names: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        let num_col = feature_names.len();
        if let Some(bad) = rows.iter().find(|r| r.len() != num_col) {
            return Err(Error::Inference(format!(
                "row has {} values for {} columns",
                bad.len(),
                num_col
            )));
        }
        Ok(Self {
            feature_names,
            num_row: rows.len(),
            num_col,
            data: rows.into_iter().flatten().collect(),
        })
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn num_row(&self) -> usize {
        self.num_row
    }

    pub fn num_col(&self) -> usize {
        self.num_col
    }

    pub fn row(&self, idx: usize) -> &[f64] {
        &self.data[idx * self.num_col..(idx + 1) * self.num_col]
    }
}
