//! Predictor MCP server - main entry point.
//!
//! Loads configuration (file, then environment, then flags), builds the
//! platform client and value codec, and serves MCP on stdio or TCP.

use clap::{Parser, ValueEnum};
use predictor_mcp::dispatcher::ToolDispatcher;
use predictor_mcp::mcp::{McpServer, Router};
use predictor_mcp::platform::HttpPredictionClient;
use predictor_mcp::types::Transport;
use predictor_mcp::values::{ArtifactStore, ValueCodec};
use predictor_mcp::Config;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TransportArg {
    Stdio,
    Tcp,
}

impl From<TransportArg> for Transport {
    fn from(arg: TransportArg) -> Self {
        match arg {
            TransportArg::Stdio => Transport::Stdio,
            TransportArg::Tcp => Transport::Tcp,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "predictor-mcp", version, about = "MCP server for prediction functions")]
struct Args {
    /// JSON configuration file.
    #[arg(long, env = "PREDICTOR_MCP_CONFIG")]
    config: Option<PathBuf>,

    /// Transport to serve on.
    #[arg(long, value_enum, env = "PREDICTOR_MCP_TRANSPORT")]
    transport: Option<TransportArg>,

    /// TCP bind address.
    #[arg(long)]
    listen_addr: Option<String>,

    /// Prediction platform base URL.
    #[arg(long)]
    api_url: Option<String>,

    /// Platform access key.
    #[arg(long, hide_env_values = true)]
    access_key: Option<String>,

    /// Directory to keep output artifacts in. Defaults to a temporary
    /// directory removed on exit.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Emit JSON logs.
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    fn load_config(&self) -> predictor_mcp::Result<Config> {
        let config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        let mut config = config.with_env_overrides();

        if let Some(transport) = self.transport {
            config.server.transport = transport.into();
        }
        if let Some(addr) = &self.listen_addr {
            config.server.listen_addr = addr.clone();
        }
        if let Some(url) = &self.api_url {
            config.platform.api_url = url.clone();
        }
        if let Some(key) = &self.access_key {
            config.platform.access_key = Some(key.clone());
        }
        if let Some(dir) = &self.output_dir {
            config.artifacts.output_dir = Some(dir.clone());
        }
        if self.json_logs {
            config.observability.json_logs = true;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = args.load_config()?;

    predictor_mcp::observability::init_tracing(&config.observability);

    let client = HttpPredictionClient::from_config(&config.platform)?;
    let artifacts = Arc::new(ArtifactStore::from_config(&config.artifacts)?);
    let codec = ValueCodec::new(artifacts.clone());
    let dispatcher = ToolDispatcher::new(Arc::new(client), codec, config.search.clone());
    let router = Arc::new(Router::new(Arc::new(dispatcher)));
    let server = McpServer::new(router, config.server.clone());

    tracing::info!(
        transport = ?config.server.transport,
        api_url = %config.platform.api_url,
        artifacts = %artifacts.root().display(),
        retained = artifacts.is_retained(),
        "Predictor MCP server starting"
    );

    let cancel = server.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, shutting down");
            cancel.cancel();
        }
    });

    server.run().await?;
    tracing::info!("Predictor MCP server stopped");
    Ok(())
}
