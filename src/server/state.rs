//! Server state management

use crate::service::InferenceService;
use std::sync::Arc;

// Re-export config types so other server modules can access them via server::state
pub use crate::config::{CorsConfig, ServerConfig};

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    /// Model and sample cache, immutable after startup
    pub service: Arc<InferenceService>,

    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl ServerState {
    /// Create a new server state
    pub fn new(service: InferenceService, config: ServerConfig) -> Self {
        Self {
            service: Arc::new(service),
            config: Arc::new(config),
        }
    }
}
