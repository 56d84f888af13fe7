//! Tool catalog: the two prediction tools, their schemas, and call handling.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::protocol::{CallToolResult, JsonRpcError, ToolDescriptor};
use crate::dispatcher::ToolDispatcher;
use crate::platform::{Acceleration, Predictor};
use crate::prediction::PredictionRecord;
use crate::types::{Error, Result};
use crate::values::TypedValue;

pub const SEARCH_PREDICTORS: &str = "search_predictors";
pub const CREATE_PREDICTION: &str = "create_prediction";

const SEARCH_DESCRIPTION: &str = "\
Search for prediction functions that solve a given task.

These predictors are stateless functions which accept data of common types (scalars, tensors, images, etc.).
The prediction function will provide its detailed signature, including arguments it accepts,
schemas for aforementioned arguments, and output types and schemas.";

const CREATE_DESCRIPTION: &str = "\
Create a prediction.

This tool can be used to invoke a prediction function, given its tag along with an input value map.
The prediction function can be invoked locally with varying kinds of hardware acceleration (`auto`, `cpu`, `gpu`, `npu`).
The prediction function can also be invoked on remote servers (`remote_auto`).";

// =============================================================================
// Arguments and outputs
// =============================================================================

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchPredictorsArgs {
    /// Task to find predictors for.
    pub query: String,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SearchPredictorsOutput {
    pub result: Vec<Predictor>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreatePredictionArgs {
    /// Predictor tag.
    pub tag: String,
    /// Input values keyed by parameter name. Kept raw so that each value's
    /// `kind` can be checked before it is parsed.
    #[schemars(with = "BTreeMap<String, TypedValue>")]
    pub inputs: Map<String, Value>,
    /// Execution backend and locality.
    #[serde(default)]
    pub acceleration: Acceleration,
}

impl CreatePredictionArgs {
    /// Parse every input, failing on the first bad value.
    pub fn typed_inputs(&self) -> Result<BTreeMap<String, TypedValue>> {
        self.inputs
            .iter()
            .map(|(name, raw)| TypedValue::from_json(raw.clone()).map(|value| (name.clone(), value)))
            .collect()
    }
}

fn schema_value<T: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T))
        .unwrap_or_else(|_| serde_json::json!({"type": "object"}))
}

fn parse_args<T: serde::de::DeserializeOwned>(
    tool: &str,
    arguments: Option<Value>,
) -> std::result::Result<T, JsonRpcError> {
    let arguments = arguments.unwrap_or_else(|| Value::Object(Map::new()));
    serde_json::from_value(arguments)
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid arguments for {}: {}", tool, e)))
}

// =============================================================================
// Tool catalog
// =============================================================================

/// Registered tool metadata, in advertisement order.
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    entries: Vec<ToolDescriptor>,
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self {
            entries: vec![
                ToolDescriptor {
                    name: SEARCH_PREDICTORS.to_string(),
                    title: "Search Predictors".to_string(),
                    description: SEARCH_DESCRIPTION.to_string(),
                    input_schema: schema_value::<SearchPredictorsArgs>(),
                    output_schema: Some(schema_value::<SearchPredictorsOutput>()),
                },
                ToolDescriptor {
                    name: CREATE_PREDICTION.to_string(),
                    title: "Create a Prediction".to_string(),
                    description: CREATE_DESCRIPTION.to_string(),
                    input_schema: schema_value::<CreatePredictionArgs>(),
                    output_schema: Some(schema_value::<PredictionRecord>()),
                },
            ],
        }
    }

    pub fn list(&self) -> &[ToolDescriptor] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Run a tool call.
    ///
    /// Protocol problems (unknown tool, malformed arguments) are returned as
    /// JSON-RPC errors. Failures while running the tool become an error
    /// result for the calling agent.
    pub async fn call(
        &self,
        dispatcher: &ToolDispatcher,
        name: &str,
        arguments: Option<Value>,
    ) -> std::result::Result<CallToolResult, JsonRpcError> {
        let outcome = match name {
            SEARCH_PREDICTORS => {
                let args: SearchPredictorsArgs = parse_args(name, arguments)?;
                search(dispatcher, args).await
            }
            CREATE_PREDICTION => {
                let args: CreatePredictionArgs = parse_args(name, arguments)?;
                create(dispatcher, args).await
            }
            _ => return Err(JsonRpcError::invalid_params(format!("Unknown tool: {}", name))),
        };

        Ok(match outcome {
            Ok(structured) => CallToolResult::structured(structured),
            Err(e) => {
                tracing::warn!(tool = name, code = e.code(), error = %e, "Tool call failed");
                CallToolResult::error(e.to_string())
            }
        })
    }
}

async fn search(dispatcher: &ToolDispatcher, args: SearchPredictorsArgs) -> Result<Value> {
    let result = dispatcher.search_predictors(&args.query).await?;
    Ok(serde_json::to_value(SearchPredictorsOutput { result })?)
}

async fn create(dispatcher: &ToolDispatcher, args: CreatePredictionArgs) -> Result<Value> {
    let inputs = args.typed_inputs()?;
    let prediction = dispatcher
        .create_prediction(&args.tag, inputs, args.acceleration)
        .await?;
    serde_json::to_value(&prediction).map_err(Error::from)
}
