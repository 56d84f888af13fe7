//! Platform wire format for prediction values.
//!
//! Every value travels as `{ "type": <dtype>, "data": <url>, "shape": [...] }`.
//! Inputs are sent as base64 `data:` URLs. Results may come back as `data:`
//! URLs or as `http(s)` URLs that must be downloaded.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ClientError;
use crate::values::codec::encode_png;
use crate::values::{Dtype, NativeTensor, NativeValue};

const MIME_JSON: &str = "application/json";
const MIME_TEXT: &str = "text/plain";
const MIME_PNG: &str = "image/png";
const MIME_BINARY: &str = "application/octet-stream";

/// A single value on the platform wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteValue {
    /// Platform dtype name. Kept as text so unmapped types survive parsing.
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<usize>>,
}

impl RemoteValue {
    fn new(dtype: Dtype, mime: &str, bytes: &[u8]) -> Self {
        Self {
            type_name: dtype.as_str().to_string(),
            data: Some(data_url(mime, bytes)),
            shape: None,
        }
    }

    /// Parsed dtype, if the platform type has a known name.
    pub fn dtype(&self) -> Option<Dtype> {
        serde_json::from_value(Value::String(self.type_name.clone())).ok()
    }
}

pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Decode a `data:` URL into its payload bytes.
pub fn decode_data_url(url: &str) -> Result<Bytes, ClientError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| ClientError::decode("not a data URL"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| ClientError::decode("data URL has no payload separator"))?;
    if meta.ends_with(";base64") {
        STANDARD
            .decode(payload)
            .map(Bytes::from)
            .map_err(|e| ClientError::decode(format!("invalid base64 in data URL: {}", e)))
    } else {
        Ok(Bytes::copy_from_slice(payload.as_bytes()))
    }
}

fn json_bytes(value: &impl Serialize) -> Result<Vec<u8>, ClientError> {
    serde_json::to_vec(value).map_err(|e| ClientError::invalid_request(e.to_string()))
}

/// Serialize a native input value for the platform.
pub fn to_remote(value: &NativeValue) -> Result<RemoteValue, ClientError> {
    let remote = match value {
        NativeValue::Float(f) => RemoteValue::new(Dtype::Float64, MIME_JSON, &json_bytes(f)?),
        NativeValue::Int(i) => RemoteValue::new(Dtype::Int64, MIME_JSON, &json_bytes(i)?),
        NativeValue::UInt(u) => RemoteValue::new(Dtype::Uint64, MIME_JSON, &json_bytes(u)?),
        NativeValue::Bool(b) => RemoteValue::new(Dtype::Bool, MIME_JSON, &json_bytes(b)?),
        NativeValue::Text(s) => RemoteValue::new(Dtype::String, MIME_TEXT, s.as_bytes()),
        NativeValue::List(items) => RemoteValue::new(Dtype::List, MIME_JSON, &json_bytes(items)?),
        NativeValue::Dict(map) => RemoteValue::new(Dtype::Dict, MIME_JSON, &json_bytes(map)?),
        NativeValue::Image(image) => {
            let png = encode_png(image).map_err(|e| ClientError::invalid_request(e.to_string()))?;
            RemoteValue::new(Dtype::Image, MIME_PNG, &png)
        }
        NativeValue::Tensor(tensor) => RemoteValue {
            shape: Some(tensor.shape().to_vec()),
            ..RemoteValue::new(tensor.dtype(), MIME_BINARY, tensor.data())
        },
        NativeValue::Unrecognized { type_name } => {
            return Err(ClientError::invalid_request(format!(
                "cannot send value of type '{}' to the platform",
                type_name
            )))
        }
    };
    Ok(remote)
}

fn parse_json<T: serde::de::DeserializeOwned>(bytes: &[u8], what: &str) -> Result<T, ClientError> {
    serde_json::from_slice(bytes)
        .map_err(|e| ClientError::decode(format!("invalid {} payload: {}", what, e)))
}

/// Integers that fit `i64` become `Int`; larger unsigned ones become `UInt`.
fn int_value(number: serde_json::Number, dtype: Dtype) -> Result<NativeValue, ClientError> {
    if let Some(i) = number.as_i64() {
        Ok(NativeValue::Int(i))
    } else if let Some(u) = number.as_u64() {
        Ok(NativeValue::UInt(u))
    } else {
        Err(ClientError::decode(format!("{} payload is not an integer: {}", dtype, number)))
    }
}

/// Build a native value from a wire value whose payload is already fetched.
///
/// Numeric and boolean types carry a JSON scalar unless `shape` is present,
/// in which case the payload is raw tensor bytes. Types with no native
/// mapping become [`NativeValue::Unrecognized`].
pub fn from_remote(
    value: &RemoteValue,
    payload: Option<Bytes>,
) -> Result<NativeValue, ClientError> {
    let Some(dtype) = value.dtype() else {
        return Ok(NativeValue::Unrecognized {
            type_name: value.type_name.clone(),
        });
    };
    if matches!(dtype, Dtype::Null | Dtype::Binary) {
        return Ok(NativeValue::Unrecognized {
            type_name: dtype.as_str().to_string(),
        });
    }
    let payload = payload
        .ok_or_else(|| ClientError::decode(format!("{} value has no data", dtype)))?;

    if let Some(shape) = &value.shape {
        let tensor = NativeTensor::new(dtype, shape.clone(), payload)
            .map_err(|e| ClientError::decode(e.to_string()))?;
        return Ok(NativeValue::Tensor(tensor));
    }

    let native = match dtype {
        Dtype::Float16 | Dtype::Float32 | Dtype::Float64 => {
            NativeValue::Float(parse_json(&payload, dtype.as_str())?)
        }
        Dtype::Int8
        | Dtype::Int16
        | Dtype::Int32
        | Dtype::Int64
        | Dtype::Uint8
        | Dtype::Uint16
        | Dtype::Uint32
        | Dtype::Uint64 => int_value(parse_json(&payload, dtype.as_str())?, dtype)?,
        Dtype::Bool => NativeValue::Bool(parse_json(&payload, "bool")?),
        Dtype::String => NativeValue::Text(
            String::from_utf8(payload.to_vec())
                .map_err(|e| ClientError::decode(format!("string is not UTF-8: {}", e)))?,
        ),
        Dtype::List => NativeValue::List(parse_json(&payload, "list")?),
        Dtype::Dict => NativeValue::Dict(parse_json(&payload, "dict")?),
        Dtype::Image => NativeValue::Image(
            image::load_from_memory(&payload)
                .map_err(|e| ClientError::decode(format!("invalid image payload: {}", e)))?,
        ),
        Dtype::Null | Dtype::Binary => NativeValue::Unrecognized {
            type_name: dtype.as_str().to_string(),
        },
    };
    Ok(native)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};
    use serde_json::json;

    fn through_wire(value: NativeValue) -> NativeValue {
        let remote = to_remote(&value).unwrap();
        let payload = remote.data.as_deref().map(|url| decode_data_url(url).unwrap());
        from_remote(&remote, payload).unwrap()
    }

    #[test]
    fn test_data_url_round_trip() {
        let url = data_url("text/plain", b"hello");
        assert_eq!(url, "data:text/plain;base64,aGVsbG8=");
        assert_eq!(decode_data_url(&url).unwrap(), Bytes::from_static(b"hello"));
    }

    #[test]
    fn test_plain_data_url() {
        assert_eq!(
            decode_data_url("data:text/plain,hi there").unwrap(),
            Bytes::from_static(b"hi there")
        );
        assert!(decode_data_url("https://example.com/x").is_err());
        assert!(decode_data_url("data:text/plain;base64").is_err());
    }

    #[test]
    fn test_scalars_cross_the_wire() {
        let map = json!({"a": 1}).as_object().unwrap().clone();
        for value in [
            NativeValue::Float(0.25),
            NativeValue::Int(-9),
            NativeValue::UInt(u64::MAX),
            NativeValue::Bool(true),
            NativeValue::Text("héllo".into()),
            NativeValue::List(vec![json!(1), json!(null)]),
            NativeValue::Dict(map),
        ] {
            assert_eq!(through_wire(value.clone()), value);
        }
    }

    #[test]
    fn test_image_and_tensor_cross_the_wire() {
        let image = NativeValue::Image(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            3,
            2,
            Rgb([10, 20, 30]),
        )));
        assert_eq!(through_wire(image.clone()), image);

        let tensor = NativeValue::Tensor(
            NativeTensor::new(Dtype::Int16, vec![3], vec![1u8, 0, 2, 0, 3, 0]).unwrap(),
        );
        let remote = to_remote(&tensor).unwrap();
        assert_eq!(remote.shape, Some(vec![3]));
        assert_eq!(remote.type_name, "int16");
        assert_eq!(through_wire(tensor.clone()), tensor);
    }

    #[test]
    fn test_unmapped_types_become_unrecognized() {
        let audio = RemoteValue {
            type_name: "audio".into(),
            data: None,
            shape: None,
        };
        assert_eq!(
            from_remote(&audio, None).unwrap(),
            NativeValue::Unrecognized {
                type_name: "audio".into()
            }
        );

        let null = RemoteValue {
            type_name: "null".into(),
            data: None,
            shape: None,
        };
        assert_eq!(from_remote(&null, None).unwrap().type_name(), "null");
    }

    #[test]
    fn test_missing_payload_is_decode_error() {
        let value = RemoteValue {
            type_name: "float32".into(),
            data: None,
            shape: None,
        };
        let err = from_remote(&value, None).unwrap_err();
        assert_eq!(err.kind, super::super::ClientErrorKind::Decode);
    }

    #[test]
    fn test_unrecognized_input_is_rejected() {
        let err = to_remote(&NativeValue::Unrecognized {
            type_name: "audio".into(),
        })
        .unwrap_err();
        assert!(err.message.contains("audio"));
    }
}
