//! Native values exchanged with the prediction platform client.

use bytes::Bytes;
use image::DynamicImage;
use serde_json::{Map, Value};

use super::typed::{tensor_byte_len, Dtype};
use crate::types::{Error, Result};

/// Dense tensor with row-major element bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeTensor {
    dtype: Dtype,
    shape: Vec<usize>,
    data: Bytes,
}

impl NativeTensor {
    /// Build a tensor, checking that `data` holds exactly
    /// `product(shape) * sizeof(dtype)` bytes.
    pub fn new(dtype: Dtype, shape: Vec<usize>, data: impl Into<Bytes>) -> Result<Self> {
        let data = data.into();
        let expected = tensor_byte_len(dtype, &shape)?;
        if data.len() != expected {
            return Err(Error::invalid_tensor(format!(
                "{} tensor of shape {:?} needs {} bytes, got {}",
                dtype,
                shape,
                expected,
                data.len()
            )));
        }
        Ok(Self { dtype, shape, data })
    }

    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

/// In-process value as produced or consumed by the platform client.
#[derive(Debug, Clone)]
pub enum NativeValue {
    Float(f64),
    Int(i64),
    UInt(u64),
    Bool(bool),
    Text(String),
    List(Vec<Value>),
    Dict(Map<String, Value>),
    Image(DynamicImage),
    Tensor(NativeTensor),
    /// A platform value whose type has no typed-value mapping.
    Unrecognized { type_name: String },
}

impl NativeValue {
    /// Observed runtime type name, used in error messages and logs.
    pub fn type_name(&self) -> &str {
        match self {
            NativeValue::Float(_) => "float",
            NativeValue::Int(_) | NativeValue::UInt(_) => "int",
            NativeValue::Bool(_) => "bool",
            NativeValue::Text(_) => "str",
            NativeValue::List(_) => "list",
            NativeValue::Dict(_) => "dict",
            NativeValue::Image(_) => "image",
            NativeValue::Tensor(_) => "tensor",
            NativeValue::Unrecognized { type_name } => type_name,
        }
    }
}

impl PartialEq for NativeValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NativeValue::Float(a), NativeValue::Float(b)) => a == b,
            (NativeValue::Int(a), NativeValue::Int(b)) => a == b,
            (NativeValue::UInt(a), NativeValue::UInt(b)) => a == b,
            (NativeValue::Bool(a), NativeValue::Bool(b)) => a == b,
            (NativeValue::Text(a), NativeValue::Text(b)) => a == b,
            (NativeValue::List(a), NativeValue::List(b)) => a == b,
            (NativeValue::Dict(a), NativeValue::Dict(b)) => a == b,
            (NativeValue::Image(a), NativeValue::Image(b)) => {
                a.color() == b.color()
                    && a.width() == b.width()
                    && a.height() == b.height()
                    && a.as_bytes() == b.as_bytes()
            }
            (NativeValue::Tensor(a), NativeValue::Tensor(b)) => a == b,
            (
                NativeValue::Unrecognized { type_name: a },
                NativeValue::Unrecognized { type_name: b },
            ) => a == b,
            _ => false,
        }
    }
}
