//! Common test utilities for driving the predictor router in-process

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use coupon_predictor::{
    config::{AssetConfig, ServerConfig},
    server::{create_app, state::ServerState},
    service::InferenceService,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;
use tower::ServiceExt;

pub const SAMPLES_CSV: &str = "id,age,income,visits,target\n\
                               7,30,50000,3,1\n\
                               8,41,62000,0,0\n\
                               9,25,18000,12,1\n";

/// logit(0.73) - 30 * 0.01 - 50000 * 0.00001
fn worked_example_intercept() -> f64 {
    (0.73f64 / 0.27).ln() - 0.3 - 0.5
}

/// Probability-capable model over `age` and `income`
pub fn logistic_model() -> String {
    json!({
        "type": "logistic_regression",
        "feature_names": ["age", "income"],
        "classes": [0, 1],
        "coef": [[0.01, 0.00001]],
        "intercept": [worked_example_intercept()]
    })
    .to_string()
}

/// The same coefficients as [`logistic_model`], without declared feature names
pub fn unnamed_logistic_model() -> String {
    json!({
        "type": "logistic_regression",
        "classes": [0, 1],
        "coef": [[0.01, 0.00001]],
        "intercept": [worked_example_intercept()]
    })
    .to_string()
}

/// A file as written by XGBoost's `save_model`, over `age` and `visits`
pub fn xgboost_native_model() -> String {
    json!({
        "learner": {
            "attributes": {},
            "feature_names": ["age", "visits"],
            "feature_types": ["int", "int"],
            "gradient_booster": {
                "model": {
                    "gbtree_model_param": {"num_parallel_tree": "1", "num_trees": "1"},
                    "tree_info": [0],
                    "trees": [{
                        "base_weights": [0.0, -0.8, 1.2],
                        "default_left": [1, 0, 0],
                        "id": 0,
                        "left_children": [1, -1, -1],
                        "loss_changes": [2.5, 0.0, 0.0],
                        "parents": [2147483647, 0, 0],
                        "right_children": [2, -1, -1],
                        "split_conditions": [5.0, -0.8, 1.2],
                        "split_indices": [1, 0, 0],
                        "split_type": [0, 0, 0],
                        "sum_hessian": [3.0, 1.5, 1.5],
                        "tree_param": {
                            "num_deleted": "0",
                            "num_feature": "2",
                            "num_nodes": "3",
                            "size_leaf_vector": "1"
                        }
                    }]
                },
                "name": "gbtree"
            },
            "learner_model_param": {
                "base_score": "5E-1",
                "boost_from_average": "1",
                "num_class": "0",
                "num_feature": "2",
                "num_target": "1"
            },
            "objective": {"name": "binary:logistic", "reg_loss_param": {"scale_pos_weight": "1"}}
        },
        "version": [2, 0, 3]
    })
    .to_string()
}

/// Three-feature booster emitting one probability per row
pub fn booster_model() -> String {
    json!({
        "type": "booster",
        "feature_names": ["age", "income", "visits"],
        "objective": "binary:logistic",
        "base_score": 0.5,
        "num_feature": 3,
        "trees": [
            {"nodes": [
                {"feature": 2, "threshold": 5.0, "yes": 1, "no": 2, "missing": 1},
                {"leaf": -0.8},
                {"leaf": 1.2}
            ]},
            {"nodes": [
                {"feature": 1, "threshold": 40000.0, "yes": 1, "no": 2, "missing": 2},
                {"leaf": -0.3},
                {"leaf": 0.4}
            ]}
        ]
    })
    .to_string()
}

/// Three-class booster emitting probability vectors
pub fn softprob_model() -> String {
    json!({
        "type": "booster",
        "objective": "multi:softprob",
        "base_score": 0.5,
        "num_class": 3,
        "num_feature": 1,
        "trees": [
            {"nodes": [{"leaf": 0.0}]},
            {"nodes": [
                {"feature": 0, "threshold": 10.0, "yes": 1, "no": 2, "missing": 1},
                {"leaf": 1.5},
                {"leaf": -1.5}
            ]},
            {"nodes": [{"leaf": 0.2}]}
        ]
    })
    .to_string()
}

/// Label-only model
pub fn svc_model() -> String {
    json!({
        "type": "linear_svc",
        "feature_names": ["age", "income"],
        "classes": [0, 1],
        "coef": [[0.1, 0.0]],
        "intercept": [-3.5]
    })
    .to_string()
}

/// A temporary installation root plus the router serving it
pub struct TestApp {
    pub dir: TempDir,
    pub app: Router,
}

impl TestApp {
    pub fn new(model: Option<&str>, csv: Option<&str>) -> Self {
        Self::with_sample_count(model, csv, 15)
    }

    pub fn with_sample_count(model: Option<&str>, csv: Option<&str>, sample_count: usize) -> Self {
        let dir = TempDir::new().unwrap();
        let mut assets = AssetConfig::with_root(dir.path());
        assets.sample_count = sample_count;

        if let Some(model) = model {
            fs::write(assets.model_file(), model).unwrap();
        }
        if let Some(csv) = csv {
            fs::write(assets.dataset_file(), csv).unwrap();
        }

        let service = InferenceService::load(&assets);
        let app = create_app(ServerState::new(service, ServerConfig::default()));
        Self { dir, app }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn predict(&self, body: &Value) -> (StatusCode, Value) {
        self.predict_raw(body.to_string()).await
    }

    pub async fn predict_raw(&self, body: impl Into<Body>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap();
        self.send(request).await
    }
}
