//! Top-level MCP router. Parses JSON-RPC messages and routes them by method.

use serde_json::Value;
use std::sync::Arc;

use super::protocol::{
    negotiate_protocol_version, CallToolParams, Implementation, InitializeParams, InitializeResult,
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION,
};
use super::tools::ToolCatalog;
use crate::dispatcher::ToolDispatcher;

const INSTRUCTIONS: &str = "Use search_predictors to discover prediction functions and their \
signatures, then call create_prediction with the predictor tag and typed input values. Image \
and tensor values are passed by file path.";

#[derive(Debug)]
pub struct Router {
    dispatcher: Arc<ToolDispatcher>,
    tools: ToolCatalog,
    server_info: Implementation,
}

impl Router {
    pub fn new(dispatcher: Arc<ToolDispatcher>) -> Self {
        Self {
            dispatcher,
            tools: ToolCatalog::new(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                title: Some("Prediction Functions".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    /// Handle one raw message. Returns `None` when no reply is due.
    pub async fn handle_message(&self, bytes: &[u8]) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_slice(bytes) {
            Ok(value) => value,
            Err(e) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::parse_error(format!("Invalid JSON: {}", e)),
                ))
            }
        };
        if value.is_array() {
            return Some(JsonRpcResponse::failure(
                Value::Null,
                JsonRpcError::invalid_request("Batch requests are not supported"),
            ));
        }

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::failure(
                    id,
                    JsonRpcError::invalid_request(format!("Invalid request: {}", e)),
                ))
            }
        };
        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::invalid_request(format!(
                    "Unsupported jsonrpc version: {}",
                    request.jsonrpc
                )),
            ));
        }
        self.handle(request).await
    }

    /// Route a parsed request. Notifications never produce a response.
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            tracing::debug!(method = %request.method, "Notification received");
            return None;
        };

        tracing::debug!(method = %request.method, id = %id, "Request received");
        let result = self.route(&request.method, request.params).await;
        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(error) => {
                tracing::debug!(method = %request.method, code = error.code, "Request failed");
                JsonRpcResponse::failure(id, error)
            }
        })
    }

    async fn route(&self, method: &str, params: Option<Value>) -> Result<Value, JsonRpcError> {
        match method {
            "initialize" => {
                let params: InitializeParams = parse_params(params)?;
                if let Some(client) = &params.client_info {
                    tracing::info!(
                        client = %client.name,
                        client_version = %client.version,
                        protocol = %params.protocol_version,
                        "Client initializing"
                    );
                }
                to_result(&InitializeResult {
                    protocol_version: negotiate_protocol_version(&params.protocol_version)
                        .to_string(),
                    capabilities: serde_json::json!({"tools": {"listChanged": false}}),
                    server_info: self.server_info.clone(),
                    instructions: Some(INSTRUCTIONS.to_string()),
                })
            }
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => Ok(serde_json::json!({ "tools": self.tools.list() })),
            "tools/call" => {
                let params: CallToolParams = parse_params(params)?;
                let result = self
                    .tools
                    .call(&self.dispatcher, &params.name, params.arguments)
                    .await?;
                to_result(&result)
            }
            _ => Err(JsonRpcError::method_not_found(method)),
        }
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> Result<T, JsonRpcError> {
    let params = params.unwrap_or_else(|| Value::Object(serde_json::Map::new()));
    serde_json::from_value(params)
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {}", e)))
}

fn to_result<T: serde::Serialize>(value: &T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value)
        .map_err(|e| JsonRpcError::internal(format!("Serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MockPredictionClient;
    use crate::types::SearchConfig;
    use crate::values::{ArtifactStore, ValueCodec};
    use serde_json::json;

    fn router(mock: MockPredictionClient) -> Router {
        let dispatcher = ToolDispatcher::new(
            Arc::new(mock),
            ValueCodec::new(Arc::new(ArtifactStore::temporary().unwrap())),
            SearchConfig::default(),
        );
        Router::new(Arc::new(dispatcher))
    }

    async fn call(router: &Router, message: Value) -> Option<Value> {
        let bytes = serde_json::to_vec(&message).unwrap();
        router
            .handle_message(&bytes)
            .await
            .map(|r| serde_json::to_value(r).unwrap())
    }

    #[tokio::test]
    async fn test_initialize_negotiates_and_advertises_tools() {
        let router = router(MockPredictionClient::new());
        let response = call(
            &router,
            json!({
                "jsonrpc": "2.0", "id": 1, "method": "initialize",
                "params": {
                    "protocolVersion": "2025-03-26",
                    "capabilities": {},
                    "clientInfo": {"name": "test-host", "version": "0.0.1"}
                }
            }),
        )
        .await
        .unwrap();

        assert_eq!(response["id"], json!(1));
        assert_eq!(response["result"]["protocolVersion"], json!("2025-03-26"));
        assert!(response["result"]["capabilities"]["tools"].is_object());
        assert_eq!(response["result"]["serverInfo"]["name"], json!("predictor-mcp"));
    }

    #[tokio::test]
    async fn test_notifications_get_no_reply() {
        let router = router(MockPredictionClient::new());
        let reply = call(
            &router,
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        )
        .await;
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn test_ping_and_unknown_method() {
        let router = router(MockPredictionClient::new());
        let pong = call(&router, json!({"jsonrpc": "2.0", "id": "a", "method": "ping"}))
            .await
            .unwrap();
        assert_eq!(pong["result"], json!({}));

        let missing = call(&router, json!({"jsonrpc": "2.0", "id": 2, "method": "resources/list"}))
            .await
            .unwrap();
        assert_eq!(missing["error"]["code"], json!(JsonRpcError::METHOD_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_malformed_messages() {
        let router = router(MockPredictionClient::new());

        let parse = router.handle_message(b"{not json").await.unwrap();
        assert_eq!(parse.error.unwrap().code, JsonRpcError::PARSE_ERROR);
        assert_eq!(parse.id, Value::Null);

        let batch = call(&router, json!([{"jsonrpc": "2.0", "id": 1, "method": "ping"}]))
            .await
            .unwrap();
        assert_eq!(batch["error"]["code"], json!(JsonRpcError::INVALID_REQUEST));

        let version = call(&router, json!({"jsonrpc": "1.0", "id": 7, "method": "ping"}))
            .await
            .unwrap();
        assert_eq!(version["id"], json!(7));
        assert_eq!(version["error"]["code"], json!(JsonRpcError::INVALID_REQUEST));
    }

    #[tokio::test]
    async fn test_tools_list() {
        let router = router(MockPredictionClient::new());
        let response = call(&router, json!({"jsonrpc": "2.0", "id": 3, "method": "tools/list"}))
            .await
            .unwrap();
        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0]["name"], json!("search_predictors"));
        assert!(tools[1]["inputSchema"].is_object());
        assert!(tools[1]["outputSchema"].is_object());
    }

    #[tokio::test]
    async fn test_unknown_tool_is_invalid_params() {
        let router = router(MockPredictionClient::new());
        let response = call(
            &router,
            json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call",
                   "params": {"name": "rm_rf", "arguments": {}}}),
        )
        .await
        .unwrap();
        assert_eq!(response["error"]["code"], json!(JsonRpcError::INVALID_PARAMS));
    }

    #[tokio::test]
    async fn test_tensor_input_is_tool_error() {
        let mut mock = MockPredictionClient::new();
        mock.expect_create().never();
        let router = router(mock);

        let response = call(
            &router,
            json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call", "params": {
                "name": "create_prediction",
                "arguments": {
                    "tag": "@fxn/greeting",
                    "inputs": {"x": {"kind": "tensor", "data": "/tmp/x.bin", "dtype": "float32", "shape": [1]}}
                }
            }}),
        )
        .await
        .unwrap();

        let result = &response["result"];
        assert_eq!(result["isError"], json!(true));
        assert!(result["content"][0]["text"].as_str().unwrap().contains("tensor"));
    }
}
