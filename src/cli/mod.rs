//! Command-line interface module.
//!
//! This module provides the CLI functionality for:
//! - Server management
//! - Offline single-row prediction
//! - Logging configuration

pub mod commands;
pub mod handlers;

pub use handlers::{handle_predict, handle_server};
