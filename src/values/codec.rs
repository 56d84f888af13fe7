//! Value codec: typed values ⇄ native values.
//!
//! `decode` turns host-supplied inputs into what the platform client accepts;
//! `encode` turns client outputs back into typed values, materializing images
//! and tensors into the artifact store.

use image::{ColorType, DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use super::artifacts::ArtifactStore;
use super::native::{NativeTensor, NativeValue};
use super::typed::{ImageValue, ScalarData, TensorValue, TypedValue};
use crate::types::{Error, Result};

#[derive(Debug, Clone)]
pub struct ValueCodec {
    artifacts: Arc<ArtifactStore>,
}

impl ValueCodec {
    pub fn new(artifacts: Arc<ArtifactStore>) -> Self {
        Self { artifacts }
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    /// Convert a typed value to a native invocation value.
    pub fn decode(&self, value: TypedValue) -> Result<NativeValue> {
        match value {
            TypedValue::Scalar { data } => Ok(match data {
                ScalarData::Bool(b) => NativeValue::Bool(b),
                ScalarData::Int(i) => NativeValue::Int(i),
                ScalarData::UInt(u) => NativeValue::UInt(u),
                ScalarData::Float(f) => NativeValue::Float(f),
                ScalarData::Text(s) => NativeValue::Text(s),
                ScalarData::List(items) => NativeValue::List(items),
                ScalarData::Dict(map) => NativeValue::Dict(map),
            }),
            TypedValue::Image(ImageValue { data }) => load_image(&data).map(NativeValue::Image),
            // Tensor inputs are not decoded yet.
            TypedValue::Tensor(_) => Err(Error::UnsupportedValueKind("tensor".to_string())),
        }
    }

    /// Convert a native result value to a typed value.
    pub fn encode(&self, value: NativeValue) -> Result<TypedValue> {
        match value {
            NativeValue::Float(f) => Ok(TypedValue::scalar(ScalarData::Float(f))),
            NativeValue::Int(i) => Ok(TypedValue::scalar(ScalarData::Int(i))),
            NativeValue::UInt(u) => Ok(TypedValue::scalar(ScalarData::UInt(u))),
            NativeValue::Bool(b) => Ok(TypedValue::scalar(ScalarData::Bool(b))),
            NativeValue::Text(s) => Ok(TypedValue::scalar(ScalarData::Text(s))),
            NativeValue::List(items) => Ok(TypedValue::scalar(ScalarData::List(items))),
            NativeValue::Dict(map) => Ok(TypedValue::scalar(ScalarData::Dict(map))),
            NativeValue::Image(image) => {
                let png = encode_png(&image)?;
                let data = self.artifacts.write(".png", &png)?;
                Ok(TypedValue::Image(ImageValue { data }))
            }
            NativeValue::Tensor(tensor) => self.encode_tensor(&tensor),
            NativeValue::Unrecognized { type_name } => Err(Error::UnsupportedValueType(type_name)),
        }
    }

    fn encode_tensor(&self, tensor: &NativeTensor) -> Result<TypedValue> {
        let data = self.artifacts.write(".bin", tensor.data())?;
        Ok(TypedValue::Tensor(TensorValue {
            data,
            dtype: tensor.dtype(),
            shape: tensor.shape().to_vec(),
        }))
    }
}

/// Read and decode an image file; the format is inferred from its contents.
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    let bytes = std::fs::read(path).map_err(|e| Error::from_io_at(e, path))?;
    Ok(image::load_from_memory(&bytes)?)
}

/// Losslessly encode an image as PNG.
///
/// PNG has no float channels, so float images are widened to 16-bit RGBA.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    match image.color() {
        ColorType::Rgb32F | ColorType::Rgba32F => {
            DynamicImage::ImageRgba16(image.to_rgba16()).write_to(&mut out, ImageFormat::Png)?
        }
        _ => image.write_to(&mut out, ImageFormat::Png)?,
    }
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::Dtype;
    use image::{GrayImage, Luma, Rgba, RgbaImage};
    use proptest::prelude::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn codec() -> ValueCodec {
        ValueCodec::new(Arc::new(ArtifactStore::temporary().unwrap()))
    }

    fn sample_image() -> DynamicImage {
        let mut img = RgbaImage::new(4, 3);
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = Rgba([x as u8 * 60, y as u8 * 80, 7, 255 - x as u8]);
        }
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn test_scalar_decode_is_identity() {
        let codec = codec();
        let cases = vec![
            (ScalarData::Float(1.5), NativeValue::Float(1.5)),
            (ScalarData::Int(-4), NativeValue::Int(-4)),
            (ScalarData::UInt(u64::MAX), NativeValue::UInt(u64::MAX)),
            (ScalarData::Bool(false), NativeValue::Bool(false)),
            (ScalarData::Text("hey".into()), NativeValue::Text("hey".into())),
            (
                ScalarData::List(vec![json!(1), json!("two")]),
                NativeValue::List(vec![json!(1), json!("two")]),
            ),
        ];
        for (data, expected) in cases {
            assert_eq!(codec.decode(TypedValue::scalar(data)).unwrap(), expected);
        }
    }

    #[test]
    fn test_dict_round_trip() {
        let codec = codec();
        let map = json!({"name": "ada", "scores": [1, 2]}).as_object().unwrap().clone();
        let value = TypedValue::scalar(ScalarData::Dict(map));
        let native = codec.decode(value.clone()).unwrap();
        assert_eq!(codec.encode(native).unwrap(), value);
    }

    proptest! {
        #[test]
        fn prop_scalar_round_trip_int(i in any::<i64>()) {
            let codec = codec();
            let value = TypedValue::scalar(ScalarData::Int(i));
            prop_assert_eq!(codec.encode(codec.decode(value.clone()).unwrap()).unwrap(), value);
        }

        #[test]
        fn prop_scalar_round_trip_json_integer(u in any::<u64>()) {
            let codec = codec();
            let raw = json!({"kind": "scalar", "data": u});
            let typed = TypedValue::from_json(raw.clone()).unwrap();
            let back = codec.encode(codec.decode(typed).unwrap()).unwrap();
            prop_assert_eq!(serde_json::to_value(&back).unwrap(), raw);
        }

        #[test]
        fn prop_scalar_round_trip_float(f in any::<f64>().prop_filter("finite", |f| f.is_finite())) {
            let codec = codec();
            let value = TypedValue::scalar(ScalarData::Float(f));
            prop_assert_eq!(codec.encode(codec.decode(value.clone()).unwrap()).unwrap(), value);
        }

        #[test]
        fn prop_scalar_round_trip_text(s in ".*", b in any::<bool>()) {
            let codec = codec();
            for value in [
                TypedValue::scalar(ScalarData::Text(s.clone())),
                TypedValue::scalar(ScalarData::Bool(b)),
                TypedValue::scalar(ScalarData::List(vec![json!(s), json!(b)])),
            ] {
                prop_assert_eq!(codec.encode(codec.decode(value.clone()).unwrap()).unwrap(), value);
            }
        }
    }

    #[test]
    fn test_image_round_trip_is_pixel_identical() {
        let codec = codec();
        let source_dir = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("input.png");
        sample_image().save(&source).unwrap();

        let native = codec
            .decode(TypedValue::Image(ImageValue {
                data: source.clone(),
            }))
            .unwrap();
        let encoded = codec.encode(native).unwrap();

        let TypedValue::Image(ImageValue { data }) = encoded else {
            panic!("expected image value, got {:?}", encoded);
        };
        assert_ne!(data, source);
        assert!(data.starts_with(codec.artifacts().root()));
        assert_eq!(data.extension().unwrap(), "png");

        let reloaded = load_image(&data).unwrap();
        assert_eq!(reloaded.to_rgba8(), sample_image().to_rgba8());
    }

    #[test]
    fn test_grayscale_image_keeps_color_type() {
        let codec = codec();
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(2, 2, Luma([42])));
        let TypedValue::Image(ImageValue { data }) =
            codec.encode(NativeValue::Image(gray.clone())).unwrap()
        else {
            panic!("expected image value");
        };
        let reloaded = load_image(&data).unwrap();
        assert_eq!(NativeValue::Image(reloaded), NativeValue::Image(gray));
    }

    #[test]
    fn test_decode_missing_image_is_not_found() {
        let err = codec()
            .decode(TypedValue::Image(ImageValue {
                data: PathBuf::from("/no/such/image.png"),
            }))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_decode_garbage_image_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.png");
        std::fs::write(&path, b"not an image").unwrap();

        let err = codec()
            .decode(TypedValue::Image(ImageValue { data: path }))
            .unwrap_err();
        assert!(matches!(err, Error::Image(_)));
    }

    #[test]
    fn test_decode_tensor_is_unsupported() {
        let err = codec()
            .decode(TypedValue::Tensor(TensorValue {
                data: PathBuf::from("/tmp/t.bin"),
                dtype: Dtype::Float32,
                shape: vec![2],
            }))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedValueKind(ref k) if k == "tensor"));
    }

    #[test]
    fn test_encode_tensor_writes_raw_bytes() {
        let codec = codec();
        let bytes: Vec<u8> = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]
            .iter()
            .flat_map(|f| f.to_le_bytes())
            .collect();
        let tensor = NativeTensor::new(Dtype::Float32, vec![2, 3], bytes.clone()).unwrap();

        let TypedValue::Tensor(value) = codec.encode(NativeValue::Tensor(tensor)).unwrap() else {
            panic!("expected tensor value");
        };
        assert_eq!(value.dtype, Dtype::Float32);
        assert_eq!(value.shape, vec![2, 3]);
        assert_eq!(value.byte_len().unwrap(), 24);
        assert_eq!(std::fs::read(&value.data).unwrap(), bytes);
    }

    #[test]
    fn test_encode_unrecognized_is_unsupported_type() {
        let err = codec()
            .encode(NativeValue::Unrecognized {
                type_name: "audio".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedValueType(ref t) if t == "audio"));
    }
}
