//! Protocol-level typed values.
//!
//! These are the shapes an MCP host sends as prediction inputs and receives
//! as prediction results. Binary payloads are never inlined; `tensor` and
//! `image` values reference files by path.

use crate::types::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

// =============================================================================
// Data types
// =============================================================================

/// Platform data type vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Dtype {
    Null,
    Float16,
    Float32,
    Float64,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Bool,
    String,
    List,
    Dict,
    Image,
    Binary,
}

impl Dtype {
    /// Size in bytes of one tensor element, or `None` if the type cannot
    /// describe a tensor.
    pub fn element_size(self) -> Option<usize> {
        match self {
            Dtype::Int8 | Dtype::Uint8 | Dtype::Bool => Some(1),
            Dtype::Float16 | Dtype::Int16 | Dtype::Uint16 => Some(2),
            Dtype::Float32 | Dtype::Int32 | Dtype::Uint32 => Some(4),
            Dtype::Float64 | Dtype::Int64 | Dtype::Uint64 => Some(8),
            Dtype::Null
            | Dtype::String
            | Dtype::List
            | Dtype::Dict
            | Dtype::Image
            | Dtype::Binary => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dtype::Null => "null",
            Dtype::Float16 => "float16",
            Dtype::Float32 => "float32",
            Dtype::Float64 => "float64",
            Dtype::Int8 => "int8",
            Dtype::Int16 => "int16",
            Dtype::Int32 => "int32",
            Dtype::Int64 => "int64",
            Dtype::Uint8 => "uint8",
            Dtype::Uint16 => "uint16",
            Dtype::Uint32 => "uint32",
            Dtype::Uint64 => "uint64",
            Dtype::Bool => "bool",
            Dtype::String => "string",
            Dtype::List => "list",
            Dtype::Dict => "dict",
            Dtype::Image => "image",
            Dtype::Binary => "binary",
        }
    }
}

impl std::fmt::Display for Dtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected tensor byte length for `dtype` and `shape`.
///
/// Fails if the dtype has no element size or the product overflows.
pub fn tensor_byte_len(dtype: Dtype, shape: &[usize]) -> Result<usize> {
    let element_size = dtype
        .element_size()
        .ok_or_else(|| Error::invalid_tensor(format!("dtype '{}' cannot describe a tensor", dtype)))?;
    shape
        .iter()
        .try_fold(element_size, |acc, &dim| acc.checked_mul(dim))
        .ok_or_else(|| Error::invalid_tensor(format!("shape {:?} overflows", shape)))
}

// =============================================================================
// Values
// =============================================================================

/// Scalar value payload.
///
/// Variant order matters for untagged deserialization: integers are tried
/// before floats so `3` stays an integer and `3.0` becomes a float. `UInt`
/// only holds integers above `i64::MAX`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ScalarData {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    Dict(Map<String, Value>),
}

/// Tensor value: raw row-major bytes on disk plus their layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TensorValue {
    /// Path to raw tensor data.
    pub data: PathBuf,
    /// Tensor data type.
    pub dtype: Dtype,
    /// Tensor shape.
    pub shape: Vec<usize>,
}

impl TensorValue {
    /// Expected byte length of the referenced data.
    pub fn byte_len(&self) -> Result<usize> {
        tensor_byte_len(self.dtype, &self.shape)
    }
}

/// Image value: path to an encoded image file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ImageValue {
    /// Path to image file.
    pub data: PathBuf,
}

/// Prediction value as exchanged with the MCP host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypedValue {
    Scalar {
        /// Scalar value.
        data: ScalarData,
    },
    Tensor(TensorValue),
    Image(ImageValue),
}

impl TypedValue {
    pub const KINDS: [&'static str; 3] = ["scalar", "tensor", "image"];

    pub fn scalar(data: ScalarData) -> Self {
        TypedValue::Scalar { data }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TypedValue::Scalar { .. } => "scalar",
            TypedValue::Tensor(_) => "tensor",
            TypedValue::Image(_) => "image",
        }
    }

    /// Parse a typed value from raw JSON.
    ///
    /// An unknown `kind` tag fails with `UnsupportedValueKind` carrying the
    /// tag; a known tag with a malformed body fails with `Validation`.
    pub fn from_json(value: Value) -> Result<Self> {
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::validation("typed value is missing a string 'kind' field"))?;
        if !Self::KINDS.contains(&kind) {
            return Err(Error::UnsupportedValueKind(kind.to_string()));
        }
        let kind = kind.to_string();
        serde_json::from_value(value)
            .map_err(|e| Error::validation(format!("invalid {} value: {}", kind, e)))
    }
}
