//! Configuration structures.
//!
//! Configuration is loaded from an optional JSON file and then overridden by
//! environment variables. The binary applies CLI flags last.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::errors::{Error, Result};

/// Tags resolved by `search_predictors`, in result order.
pub const DEFAULT_SEARCHABLE_TAGS: [&str; 5] = [
    "@fxn/greeting",
    "@cuhk/modnet",
    "@natml/movenet-multipose",
    "@pytorch/resnet-50",
    "@yusuf/yolo-v8-nano",
];

/// Global server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Prediction platform client configuration.
    #[serde(default)]
    pub platform: PlatformConfig,

    /// Predictor search allow-list.
    #[serde(default)]
    pub search: SearchConfig,

    /// Artifact storage for encoded outputs.
    #[serde(default)]
    pub artifacts: ArtifactConfig,
}

/// Transport the MCP server speaks over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// Newline-delimited JSON-RPC on stdin/stdout.
    #[default]
    Stdio,
    /// Newline-delimited JSON-RPC on accepted TCP connections.
    Tcp,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: Transport,

    /// TCP bind address, used when `transport` is `tcp`.
    pub listen_addr: String,

    /// Maximum accepted size of a single protocol message in bytes.
    pub max_message_bytes: usize,

    /// Maximum concurrent TCP connections. Connections beyond this limit
    /// are rejected.
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: Transport::Stdio,
            listen_addr: "127.0.0.1:8765".to_string(),
            max_message_bytes: 4 * 1024 * 1024,
            max_connections: 64,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Tracing log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Prediction platform client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Base URL of the platform API.
    pub api_url: String,

    /// Access key sent as a bearer token, if any.
    pub access_key: Option<String>,

    /// Per-request timeout.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.muna.ai/v1".to_string(),
            access_key: None,
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Predictor search allow-list. Immutable once the server starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub searchable_tags: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            searchable_tags: DEFAULT_SEARCHABLE_TAGS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Artifact storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Directory that receives encoded outputs and retains them. When unset,
    /// a temporary directory is created and removed on shutdown.
    pub output_dir: Option<PathBuf>,
}

impl Config {
    /// Load from a JSON file. Missing sections take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::from_io_at(e, path))?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::validation(format!("invalid config {}: {}", path.display(), e)))
    }

    /// Apply `PREDICTOR_MCP_*` environment overrides.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("PREDICTOR_MCP_API_URL") {
            self.platform.api_url = url;
        }
        if let Some(key) = lookup("PREDICTOR_MCP_ACCESS_KEY") {
            self.platform.access_key = Some(key).filter(|k| !k.is_empty());
        }
        if let Some(addr) = lookup("PREDICTOR_MCP_LISTEN_ADDR") {
            self.server.listen_addr = addr;
        }
        if let Some(dir) = lookup("PREDICTOR_MCP_OUTPUT_DIR") {
            self.artifacts.output_dir = Some(PathBuf::from(dir));
        }
        if let Some(tags) = lookup("PREDICTOR_MCP_SEARCHABLE_TAGS") {
            self.search.searchable_tags = tags
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
        }
        self
    }
}
