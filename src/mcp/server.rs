//! MCP server: stdio loop, TCP accept loop, and the per-connection handler.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tokio::net::TcpListener;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

use super::codec::{read_message, write_message, Frame};
use super::protocol::{JsonRpcError, JsonRpcResponse};
use super::router::Router;
use crate::types::{ServerConfig, Transport};

/// MCP server wrapping the router.
#[derive(Debug)]
pub struct McpServer {
    router: Arc<Router>,
    config: ServerConfig,
    cancel: CancellationToken,
}

impl McpServer {
    pub fn new(router: Arc<Router>, config: ServerConfig) -> Self {
        Self {
            router,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Serve on the configured transport until cancelled or the input closes.
    pub async fn run(&self) -> std::io::Result<()> {
        match self.config.transport {
            Transport::Stdio => self.serve_stdio().await,
            Transport::Tcp => {
                let addr: SocketAddr = self.config.listen_addr.parse().map_err(|e| {
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("invalid listen_addr {}: {}", self.config.listen_addr, e),
                    )
                })?;
                let listener = TcpListener::bind(addr).await?;
                self.serve_tcp(listener).await
            }
        }
    }

    /// Serve a single session on stdin/stdout.
    pub async fn serve_stdio(&self) -> std::io::Result<()> {
        tracing::info!("MCP server listening on stdio");
        let reader = BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();
        serve_connection(
            reader,
            writer,
            self.router.clone(),
            self.config.max_message_bytes,
            self.cancel.clone(),
        )
        .await
    }

    /// Accept TCP connections until cancelled.
    pub async fn serve_tcp(&self, listener: TcpListener) -> std::io::Result<()> {
        let conn_semaphore = Arc::new(Semaphore::new(self.config.max_connections));
        tracing::info!(
            "MCP server listening on {} (max_connections={})",
            listener.local_addr()?,
            self.config.max_connections,
        );

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("MCP server shutting down");
                    break;
                }
                accept = listener.accept() => {
                    let (stream, peer) = accept?;

                    let permit = match conn_semaphore.clone().try_acquire_owned() {
                        Ok(permit) => permit,
                        Err(_) => {
                            tracing::warn!(
                                "Connection from {} rejected: at max_connections ({})",
                                peer,
                                self.config.max_connections,
                            );
                            drop(stream);
                            continue;
                        }
                    };

                    tracing::debug!(
                        "MCP connection from {} (active={})",
                        peer,
                        self.config.max_connections - conn_semaphore.available_permits(),
                    );
                    let router = self.router.clone();
                    let cancel = self.cancel.clone();
                    let max_message_bytes = self.config.max_message_bytes;
                    tokio::spawn(async move {
                        if let Err(e) = handle_tcp(stream, router, max_message_bytes, cancel, permit).await {
                            tracing::warn!("Connection from {} error: {}", peer, e);
                        }
                    });
                }
            }
        }
        Ok(())
    }

    /// Request graceful shutdown.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

async fn handle_tcp(
    stream: tokio::net::TcpStream,
    router: Arc<Router>,
    max_message_bytes: usize,
    cancel: CancellationToken,
    _permit: OwnedSemaphorePermit,
) -> std::io::Result<()> {
    let (reader, writer) = stream.into_split();
    serve_connection(BufReader::new(reader), writer, router, max_message_bytes, cancel).await
}

/// Serve one session: read a line, route it, write the reply.
///
/// Requests on a connection are handled one at a time, in arrival order.
/// Returns on EOF or cancellation.
pub async fn serve_connection<R, W>(
    mut reader: R,
    mut writer: W,
    router: Arc<Router>,
    max_message_bytes: usize,
    cancel: CancellationToken,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break,
            frame = read_message(&mut reader, max_message_bytes) => match frame? {
                Some(frame) => frame,
                None => break,
            },
        };

        let response = match frame {
            Frame::Message(bytes) => router.handle_message(&bytes).await,
            Frame::Oversized(len) => {
                tracing::warn!(len, max_message_bytes, "Oversized message discarded");
                Some(JsonRpcResponse::failure(
                    serde_json::Value::Null,
                    JsonRpcError::parse_error(format!(
                        "Message of {} bytes exceeds limit of {} bytes",
                        len, max_message_bytes
                    )),
                ))
            }
        };

        if let Some(response) = response {
            write_message(&mut writer, &response).await?;
        }
    }
    Ok(())
}
