//! Coupon predictor: serves a trained tabular classifier over HTTP.
//!
//! The service loads a model artifact and the head of a reference dataset at
//! startup, then answers two requests: list the sample rows, and predict a
//! single submitted row after aligning it to the model's feature columns.

pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod models;
pub mod server;
pub mod service;

// Re-export commonly used types
pub use config::ServiceConfig;
pub use error::{Error, Result};
pub use models::{Capability, Model, Prediction};
pub use service::InferenceService;
