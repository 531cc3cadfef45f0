//! HTTP route handlers

pub mod inference;
