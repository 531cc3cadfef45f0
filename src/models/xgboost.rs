//! XGBoost's native JSON model format
//!
//! `Booster.save_model("model.json")` writes the learner as parallel node
//! arrays per tree, with every scalar parameter stored as a string. This
//! module reads that layout and rebuilds it as a [`Booster`].

use super::booster::{Booster, BoosterNode, Objective, RegTree};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::str::FromStr;

/// Top-level document written by `save_model`
#[derive(Debug, Deserialize)]
pub struct XgbModelFile {
    learner: Learner,
    #[serde(default)]
    version: Vec<u32>,
}

#[derive(Debug, Deserialize)]
struct Learner {
    #[serde(default)]
    feature_names: Vec<String>,
    gradient_booster: GradientBooster,
    learner_model_param: LearnerModelParam,
    objective: ObjectiveConfig,
}

#[derive(Debug, Deserialize)]
struct GradientBooster {
    name: String,
    #[serde(default)]
    model: Option<GbTreeModel>,
}

#[derive(Debug, Deserialize)]
struct GbTreeModel {
    trees: Vec<XgbTree>,
    #[serde(default)]
    tree_info: Vec<usize>,
}

/// One tree as parallel arrays indexed by node id. Leaves have a left child
/// of -1 and keep their value in `split_conditions`.
#[derive(Debug, Deserialize)]
struct XgbTree {
    left_children: Vec<i64>,
    right_children: Vec<i64>,
    split_indices: Vec<usize>,
    split_conditions: Vec<f64>,
    default_left: Vec<Flag>,
}

/// `default_left` is written as 0/1 by recent releases and as booleans by
/// older ones
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(u8),
}

impl Flag {
    fn is_set(self) -> bool {
        match self {
            Flag::Bool(b) => b,
            Flag::Int(v) => v != 0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LearnerModelParam {
    base_score: String,
    #[serde(default)]
    num_class: Option<String>,
    num_feature: String,
}

#[derive(Debug, Deserialize)]
struct ObjectiveConfig {
    name: Objective,
}

fn parse_param<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    // 2.1+ writes base_score as a one-element vector, e.g. "[5E-1]"
    let trimmed = raw.trim().trim_start_matches('[').trim_end_matches(']');
    trimmed.parse().map_err(|_| {
        Error::InvalidModel(format!("invalid learner parameter {}: '{}'", name, raw))
    })
}

impl XgbTree {
    fn into_reg_tree(self, tree_idx: usize) -> Result<RegTree> {
        let len = self.left_children.len();
        let widths = [
            self.right_children.len(),
            self.split_indices.len(),
            self.split_conditions.len(),
            self.default_left.len(),
        ];
        if widths.iter().any(|w| *w != len) {
            return Err(Error::InvalidModel(format!(
                "tree {} has node arrays of differing lengths",
                tree_idx
            )));
        }

        let nodes = (0..len)
            .map(|idx| {
                let (left, right) = (self.left_children[idx], self.right_children[idx]);
                if left < 0 {
                    return Ok(BoosterNode::Leaf {
                        leaf: self.split_conditions[idx],
                    });
                }
                if right < 0 {
                    return Err(Error::InvalidModel(format!(
                        "tree {} node {} has a left child but no right child",
                        tree_idx, idx
                    )));
                }
                let (yes, no) = (left as usize, right as usize);
                Ok(BoosterNode::Split {
                    feature: self.split_indices[idx],
                    threshold: self.split_conditions[idx],
                    yes,
                    no,
                    missing: if self.default_left[idx].is_set() { yes } else { no },
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RegTree { nodes })
    }
}

impl XgbModelFile {
    /// Rebuild the learner as a [`Booster`], returning the declared feature
    /// names (if any) alongside it.
    pub fn into_booster(self) -> Result<(Booster, Option<Vec<String>>)> {
        let learner = self.learner;
        let model = match (learner.gradient_booster.name.as_str(), learner.gradient_booster.model) {
            ("gbtree", Some(model)) => model,
            (name, _) => {
                return Err(Error::InvalidModel(format!(
                    "unsupported gradient booster '{}'",
                    name
                )))
            }
        };

        let params = &learner.learner_model_param;
        let base_score: f64 = parse_param("base_score", &params.base_score)?;
        let num_feature: usize = parse_param("num_feature", &params.num_feature)?;
        // Binary models store num_class as 0
        let num_class = match &params.num_class {
            Some(raw) => parse_param::<usize>("num_class", raw)?.max(1),
            None => 1,
        };

        let trees = model
            .trees
            .into_iter()
            .enumerate()
            .map(|(idx, tree)| tree.into_reg_tree(idx))
            .collect::<Result<Vec<_>>>()?;

        let feature_names = if learner.feature_names.is_empty() {
            None
        } else {
            Some(learner.feature_names)
        };

        tracing::debug!(
            "Read XGBoost {:?} model: {} trees, objective {:?}",
            self.version,
            trees.len(),
            learner.objective.name
        );

        let booster = Booster::new(
            learner.objective.name,
            base_score,
            num_class,
            num_feature,
            trees,
            model.tree_info,
        );
        Ok((booster, feature_names))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{sigmoid, BoosterOutput, DMatrix};
    use serde_json::{json, Value};

    fn native_model(objective: &str, base_score: &str) -> Value {
        json!({
            "learner": {
                "attributes": {},
                "feature_names": ["spend", "visits"],
                "feature_types": ["float", "int"],
                "gradient_booster": {
                    "model": {
                        "gbtree_model_param": {"num_parallel_tree": "1", "num_trees": "2"},
                        "iteration_indptr": [0, 1, 2],
                        "tree_info": [0, 0],
                        "trees": [
                            {
                                "base_weights": [0.1, -1.0, 1.0],
                                "categories": [],
                                "categories_nodes": [],
                                "categories_segments": [],
                                "categories_sizes": [],
                                "default_left": [0, 0, 0],
                                "id": 0,
                                "left_children": [1, -1, -1],
                                "loss_changes": [3.2, 0.0, 0.0],
                                "parents": [2147483647, 0, 0],
                                "right_children": [2, -1, -1],
                                "split_conditions": [10.0, -1.0, 1.0],
                                "split_indices": [0, 0, 0],
                                "split_type": [0, 0, 0],
                                "sum_hessian": [4.0, 2.0, 2.0],
                                "tree_param": {
                                    "num_deleted": "0",
                                    "num_feature": "2",
                                    "num_nodes": "3",
                                    "size_leaf_vector": "1"
                                }
                            },
                            {
                                "base_weights": [0.0, -0.5, 0.5],
                                "default_left": [1, 0, 0],
                                "id": 1,
                                "left_children": [1, -1, -1],
                                "right_children": [2, -1, -1],
                                "split_conditions": [0.5, -0.5, 0.5],
                                "split_indices": [1, 0, 0],
                                "tree_param": {"num_feature": "2", "num_nodes": "3"}
                            }
                        ]
                    },
                    "name": "gbtree"
                },
                "learner_model_param": {
                    "base_score": base_score,
                    "boost_from_average": "1",
                    "num_class": "0",
                    "num_feature": "2",
                    "num_target": "1"
                },
                "objective": {
                    "name": objective,
                    "reg_loss_param": {"scale_pos_weight": "1"}
                }
            },
            "version": [2, 0, 3]
        })
    }

    fn names() -> Vec<String> {
        vec!["spend".to_string(), "visits".to_string()]
    }

    fn read(value: Value) -> Result<(Booster, Option<Vec<String>>)> {
        serde_json::from_value::<XgbModelFile>(value)?.into_booster()
    }

    #[test]
    fn test_native_binary_logistic() {
        let (booster, feature_names) = read(native_model("binary:logistic", "5E-1")).unwrap();
        assert_eq!(feature_names, Some(names()));
        assert_eq!(booster.num_class, 1);
        assert_eq!(booster.num_feature, 2);
        assert_eq!(booster.trees.len(), 2);

        let booster = booster.with_feature_names(feature_names);
        booster.validate().unwrap();

        let dmatrix =
            DMatrix::from_rows(names(), vec![vec![20.0, 1.0], vec![5.0, 0.0]]).unwrap();
        match booster.predict(&dmatrix).unwrap() {
            BoosterOutput::Scores(scores) => {
                assert!((scores[0] - sigmoid(1.5)).abs() < 1e-12);
                assert!((scores[1] - sigmoid(-1.5)).abs() < 1e-12);
            }
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[test]
    fn test_native_missing_values_follow_default_left() {
        let (booster, _) = read(native_model("binary:logistic", "5E-1")).unwrap();
        let dmatrix = DMatrix::from_rows(names(), vec![vec![f64::NAN, f64::NAN]]).unwrap();
        // tree 0 defaults right (+1.0), tree 1 defaults left (-0.5)
        assert_eq!(
            booster.predict(&dmatrix).unwrap(),
            BoosterOutput::Scores(vec![sigmoid(0.5)])
        );
    }

    #[test]
    fn test_threshold_is_strict_less_than() {
        let (booster, _) = read(native_model("binary:logitraw", "0")).unwrap();
        let dmatrix = DMatrix::from_rows(names(), vec![vec![10.0, 0.5]]).unwrap();
        assert_eq!(
            booster.predict(&dmatrix).unwrap(),
            BoosterOutput::Scores(vec![1.5])
        );
    }

    #[test]
    fn test_vector_base_score_and_boolean_default_left() {
        let mut model = native_model("binary:logistic", "[5E-1]");
        model["learner"]["gradient_booster"]["model"]["trees"][1]["default_left"] =
            json!([true, false, false]);
        let (booster, _) = read(model).unwrap();
        assert_eq!(booster.base_score, 0.5);
        match &booster.trees[1].nodes[0] {
            BoosterNode::Split { yes, missing, .. } => assert_eq!(yes, missing),
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_feature_names_optional() {
        let mut model = native_model("binary:logistic", "5E-1");
        model["learner"]["feature_names"] = json!([]);
        let (_, feature_names) = read(model).unwrap();
        assert!(feature_names.is_none());
    }

    #[test]
    fn test_rejects_dart_booster() {
        let mut model = native_model("binary:logistic", "5E-1");
        model["learner"]["gradient_booster"] = json!({"name": "dart", "gbtree": {}});
        let err = read(model).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid model artifact: unsupported gradient booster 'dart'"
        );
    }

    #[test]
    fn test_rejects_ragged_tree_arrays() {
        let mut model = native_model("binary:logistic", "5E-1");
        model["learner"]["gradient_booster"]["model"]["trees"][0]["split_conditions"] =
            json!([10.0, -1.0]);
        assert!(matches!(read(model), Err(Error::InvalidModel(_))));
    }

    #[test]
    fn test_rejects_unsupported_objective() {
        let model = native_model("reg:squarederror", "5E-1");
        assert!(matches!(read(model), Err(Error::Serialization(_))));
    }
}
