//! # Predictor MCP - prediction functions as agent tools
//!
//! Exposes a prediction platform to MCP hosts through two tools:
//! - `search_predictors`: resolve the searchable predictor catalog
//! - `create_prediction`: run a predictor on typed input values
//!
//! ## Architecture
//!
//! ```text
//!   JSON-RPC lines →  ┌──────────────────────────────────┐
//!                     │  mcp::Router → ToolCatalog       │
//!                     │        │                         │
//!                     │  ToolDispatcher                  │
//!                     │   ┌──────────┐  ┌─────────────┐  │
//!                     │   │ValueCodec│  │ Prediction  │  │
//!                     │   │+Artifacts│  │   Client    │──┼──→ platform API
//!                     │   └──────────┘  └─────────────┘  │
//!                     └──────────────────────────────────┘
//! ```
//!
//! Typed values cross the tool boundary as JSON; images and tensors travel by
//! file path and are materialized by the [`values::ValueCodec`].

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

pub mod dispatcher;
pub mod mcp;
pub mod platform;
pub mod prediction;
pub mod types;
pub mod values;

// Internal utilities
pub mod observability;

pub use types::{Config, Error, Result};
