//! Prediction platform client seam.

use async_trait::async_trait;

use super::error::ClientError;
use super::types::{NativePrediction, PredictionRequest, Predictor};

/// Operations the server consumes from the prediction platform.
///
/// Implementations own execution, scheduling, retries, and authentication;
/// the server only translates values around these calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PredictionClient: Send + Sync {
    /// Look up a predictor descriptor. Unknown tags fail with
    /// [`ClientErrorKind::NotFound`](super::ClientErrorKind::NotFound).
    async fn retrieve(&self, tag: &str) -> Result<Predictor, ClientError>;

    /// Run a prediction on this host.
    async fn create(&self, request: PredictionRequest) -> Result<NativePrediction, ClientError>;

    /// Run a prediction on platform servers.
    async fn create_remote(
        &self,
        request: PredictionRequest,
    ) -> Result<NativePrediction, ClientError>;
}
