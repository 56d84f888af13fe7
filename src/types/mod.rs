//! Core types for the predictor MCP server.
//!
//! This module provides foundational types used throughout the system:
//! - **IDs**: Strongly-typed identifiers (PredictionId, PredictorTag)
//! - **Errors**: Application error types with thiserror derives
//! - **Config**: Configuration structures for server, platform, search, and artifacts

mod config;
mod errors;
mod ids;

pub use config::{
    ArtifactConfig, Config, ObservabilityConfig, PlatformConfig, SearchConfig, ServerConfig,
    Transport, DEFAULT_SEARCHABLE_TAGS,
};
pub use errors::{Error, Result};
pub use ids::{PredictionId, PredictorTag};
