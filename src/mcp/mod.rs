//! Model Context Protocol surface.
//!
//! Newline-delimited JSON-RPC 2.0 over stdio or TCP. The router answers the
//! lifecycle methods and forwards `tools/call` to the [`ToolCatalog`], which
//! runs the prediction tools through the dispatcher.

pub mod codec;
pub mod protocol;
pub mod router;
pub mod server;
pub mod tools;

pub use protocol::{CallToolResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ToolDescriptor};
pub use router::Router;
pub use server::{serve_connection, McpServer};
pub use tools::{ToolCatalog, CREATE_PREDICTION, SEARCH_PREDICTORS};
