//! Prediction platform boundary: the client seam, its errors, and an HTTP
//! implementation.

pub mod client;
pub mod error;
pub mod http;
pub mod types;
pub mod wire;

pub use client::PredictionClient;
#[cfg(test)]
pub use client::MockPredictionClient;
pub use error::{ClientError, ClientErrorKind};
pub use http::HttpPredictionClient;
pub use types::{
    AccessMode, Acceleration, EnumerationMember, NativePrediction, Parameter, PredictionRequest,
    Predictor, PredictorStatus, Profile, Signature,
};
