//! Platform-side records: predictor descriptors, acceleration modes, and
//! prediction requests/responses in native form.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::types::{PredictionId, PredictorTag};
use crate::values::NativeValue;

// =============================================================================
// Acceleration
// =============================================================================

/// Where and on what hardware a prediction runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Acceleration {
    #[default]
    Auto,
    Cpu,
    Gpu,
    Npu,
    RemoteAuto,
}

impl Acceleration {
    pub fn as_str(self) -> &'static str {
        match self {
            Acceleration::Auto => "auto",
            Acceleration::Cpu => "cpu",
            Acceleration::Gpu => "gpu",
            Acceleration::Npu => "npu",
            Acceleration::RemoteAuto => "remote_auto",
        }
    }

    /// Remote modes run on platform servers rather than this host.
    pub fn is_remote(self) -> bool {
        self.as_str().starts_with("remote_")
    }
}

impl std::fmt::Display for Acceleration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Predictor descriptor
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PredictorStatus {
    Compiling,
    Active,
    Invalid,
    Archived,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessMode {
    Public,
    Private,
    Unlisted,
    #[serde(other)]
    Unknown,
}

/// Predictor owner profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Profile {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Named member of an enumerated parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EnumerationMember {
    pub name: String,
    pub value: Value,
}

/// One input or output of a predictor signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    /// Platform type name. Kept as text so types this server cannot
    /// decode still describe the predictor.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub dtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<(f64, f64)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enumeration: Option<Vec<EnumerationMember>>,
    #[serde(default, alias = "value_schema", skip_serializing_if = "Option::is_none")]
    pub value_schema: Option<Map<String, Value>>,
}

/// Predictor input/output signature.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Signature {
    #[serde(default)]
    pub inputs: Vec<Parameter>,
    #[serde(default)]
    pub outputs: Vec<Parameter>,
}

/// Descriptor of a prediction function, as returned by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Predictor {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Profile>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PredictorStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<AccessMode>,
    #[serde(default)]
    pub signature: Signature,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    /// Descriptor fields not modeled above, passed through to the host.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// =============================================================================
// Native prediction request/response
// =============================================================================

/// Prediction request with inputs already decoded to native values.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    pub tag: PredictorTag,
    pub inputs: BTreeMap<String, NativeValue>,
    pub acceleration: Acceleration,
}

/// Prediction as reported by the platform client.
///
/// `error` is set when the predictor ran and failed; the call itself
/// succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct NativePrediction {
    pub id: PredictionId,
    pub tag: PredictorTag,
    pub results: Option<Vec<NativeValue>>,
    pub latency: f64,
    pub error: Option<String>,
    pub logs: Option<String>,
    pub created: String,
}
