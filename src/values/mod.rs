//! Prediction values: the typed protocol model, the native client model,
//! and the codec between them.

pub mod artifacts;
pub mod codec;
pub mod native;
pub mod typed;

pub use artifacts::ArtifactStore;
pub use codec::ValueCodec;
pub use native::{NativeTensor, NativeValue};
pub use typed::{Dtype, ImageValue, ScalarData, TensorValue, TypedValue};
