//! Configuration management for the coupon predictor service.
//!
//! Configuration is layered through the `config` crate:
//! 1. Default configuration (embedded in binary)
//! 2. User-specified configuration file (`--config`)
//! 3. Command-line arguments (`--host`, `--port`)
//!
//! Later sources override earlier ones. Environment variables are not a
//! configuration source.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,
    /// Model and dataset locations
    pub assets: AssetConfig,
}

/// Network settings for the HTTP server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors: CorsConfig,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins; `["*"]` permits every origin
    #[serde(default = "default_cors_origins")]
    pub allowed_origins: Vec<String>,

    /// Max age for preflight cache (in seconds)
    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,
}

/// Locations of the model artifact and the reference dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Installation root that relative paths resolve against
    #[serde(default = "default_root")]
    pub root: PathBuf,

    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,

    /// Number of leading dataset rows served as samples
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_cors_max_age() -> u64 {
    3600
}
fn default_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_model_path() -> PathBuf {
    PathBuf::from("xgb_model.json")
}
fn default_dataset_path() -> PathBuf {
    PathBuf::from("test_features_processed.csv")
}
fn default_sample_count() -> usize {
    15
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_cors_origins(),
            max_age: default_cors_max_age(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors: CorsConfig::default(),
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            model_path: default_model_path(),
            dataset_path: default_dataset_path(),
            sample_count: default_sample_count(),
        }
    }
}

impl AssetConfig {
    /// Create an asset config rooted at `root` with default file names
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn model_file(&self) -> PathBuf {
        self.resolve(&self.model_path)
    }

    pub fn dataset_file(&self) -> PathBuf {
        self.resolve(&self.dataset_path)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl ServiceConfig {
    /// Load configuration from the embedded defaults and an optional user file
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder().add_source(config::File::from_str(
            DEFAULT_CONFIG,
            config::FileFormat::Toml,
        ));

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let config: ServiceConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Apply command-line overrides
    pub fn with_overrides(mut self, host: Option<&str>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.server.host = host.to_string();
        }
        if let Some(port) = port {
            self.server.port = port;
        }
        self
    }

    /// Socket address string in `host:port` form
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
