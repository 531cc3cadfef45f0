//! Error types for the coupon predictor service.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::error::Error as StdError;
use std::fmt;
use std::result;

/// A specialized Result type for predictor operations.
pub type Result<T> = result::Result<T, Error>;

/// The error type for predictor operations.
#[derive(Debug)]
pub enum Error {
    /// Arrow-related errors (CSV decoding, JSON encoding of record batches)
    Arrow(String),
    /// Configuration errors
    Config(String),
    /// I/O errors
    Io(std::io::Error),
    /// Serialization/deserialization errors
    Serialization(String),
    /// A required file is missing at startup
    NotFound(String),
    /// Model artifact failed validation
    InvalidModel(String),
    /// Failure raised by feature alignment or an estimator
    Inference(String),
    /// Malformed request payload
    InvalidInput(String),
    /// No model is loaded
    ServiceUnavailable(String),
    /// Any failure surfaced from the predict operation
    Prediction(String),
}

impl Error {
    /// HTTP status code used when the error reaches a client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Arrow(msg) => write!(f, "Arrow error: {}", msg),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Error::NotFound(msg) => write!(f, "{}", msg),
            Error::InvalidModel(msg) => write!(f, "Invalid model artifact: {}", msg),
            Error::Inference(msg) => write!(f, "{}", msg),
            Error::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Error::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            Error::Prediction(msg) => write!(f, "Prediction error: {}", msg),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<arrow::error::ArrowError> for Error {
    fn from(err: arrow::error::ArrowError) -> Self {
        Error::Arrow(err.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (
            status,
            Json(serde_json::json!({ "detail": self.to_string() })),
        )
            .into_response()
    }
}
